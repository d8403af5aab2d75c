use std::fmt;

/// A scripted face turn: `face` indexes the outward normal, `steps` counts
/// right-hand quarter turns about it. Plain notation ("U") is a clockwise
/// turn looking at the face, which is a negative right-hand step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedMove {
    pub face: usize,
    pub steps: i32,
}

impl ScriptedMove {
    pub fn parse(value: &str) -> Result<Self, MoveParseError> {
        let mut chars = value.chars();
        let Some(letter) = chars.next() else {
            return Err(MoveParseError::Empty);
        };
        let face = face_for_letter(letter).ok_or(MoveParseError::UnknownFace { ch: letter })?;
        let suffix: String = chars.collect();
        let steps = match suffix.as_str() {
            "" => -1,
            "'" => 1,
            "2" => 2,
            _ => return Err(MoveParseError::UnknownSuffix { suffix }),
        };
        Ok(Self { face, steps })
    }
}

impl std::str::FromStr for ScriptedMove {
    type Err = MoveParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for ScriptedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LETTERS: [char; 6] = ['R', 'L', 'U', 'D', 'F', 'B'];
        let letter = LETTERS.get(self.face).copied().unwrap_or('?');
        match self.steps {
            -1 => write!(f, "{letter}"),
            1 => write!(f, "{letter}'"),
            2 => write!(f, "{letter}2"),
            steps => write!(f, "{letter}({steps})"),
        }
    }
}

pub fn face_for_letter(letter: char) -> Option<usize> {
    match letter {
        'R' => Some(0),
        'L' => Some(1),
        'U' => Some(2),
        'D' => Some(3),
        'F' => Some(4),
        'B' => Some(5),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    Empty,
    UnknownFace { ch: char },
    UnknownSuffix { suffix: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::Empty => write!(f, "empty move name"),
            MoveParseError::UnknownFace { ch } => write!(f, "unknown face letter '{ch}'"),
            MoveParseError::UnknownSuffix { suffix } => {
                write!(f, "unknown move suffix '{suffix}'")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

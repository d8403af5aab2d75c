use crate::math::Pose;

pub type HandId = usize;

pub const MAX_HANDS: usize = 2;

/// Inputs the interaction state machine consumes. Grab and hover carry the
/// hand's world pose at event time; snap and unsnap are raised by the
/// per-frame angle check and exposed so scripted control and tests can drive
/// the same path.
#[derive(Clone, Debug, PartialEq)]
pub enum PuzzleAction {
    Grab { hand: HandId, pose: Pose },
    Release { hand: HandId },
    Hover { hand: HandId, pose: Pose },
    Snap,
    Unsnap,
    Scripted { notation: String },
}

use serde::{Deserialize, Serialize};

use crate::action::HandId;
use crate::math::Pose;
use crate::reconcile::{Reconciler, RECONCILE_WINDOW_SECS};
use crate::sides::HOVER_CONFIDENCE_DEFAULT;
use crate::turn::{TurnDescriptor, SNAP_TOLERANCE_DEFAULT_DEG};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Hold,
    Turn,
    Turning,
}

/// Tunables an embedder may carry in its settings. Geometry limits are fixed
/// constants; these are the interaction-feel knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRules {
    pub snap_tolerance_deg: f32,
    pub hover_confidence: f32,
    pub reconcile_secs: f32,
}

impl Default for PuzzleRules {
    fn default() -> Self {
        Self {
            snap_tolerance_deg: SNAP_TOLERANCE_DEFAULT_DEG,
            hover_confidence: HOVER_CONFIDENCE_DEFAULT,
            reconcile_secs: RECONCILE_WINDOW_SECS,
        }
    }
}

/// Session-scoped interaction and authority state. Created once next to the
/// piece store and mutated continuously for the life of the session.
#[derive(Clone, Debug)]
pub struct PuzzleState {
    pub interaction: InteractionState,
    pub active_hands: Vec<HandId>,
    pub turn: Option<TurnDescriptor>,
    pub snapped: bool,
    pub holder_id: Option<u64>,
    pub hover_side: Option<usize>,
    pub grab_offset: Option<Pose>,
    pub cube_pose: Pose,
    pub reconcile: Option<Reconciler>,
}

impl PuzzleState {
    pub fn new() -> Self {
        Self {
            interaction: InteractionState::Idle,
            active_hands: Vec::new(),
            turn: None,
            snapped: true,
            holder_id: None,
            hover_side: None,
            grab_offset: None,
            cube_pose: Pose::IDENTITY,
            reconcile: None,
        }
    }
}

impl Default for PuzzleState {
    fn default() -> Self {
        Self::new()
    }
}

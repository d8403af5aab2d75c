pub mod action;
pub mod math;
pub mod moves;
pub mod pack;
pub mod pieces;
pub mod protocol;
pub mod reconcile;
pub mod scramble;
pub mod sides;
pub mod state;
pub mod turn;

pub use action::{HandId, PuzzleAction, MAX_HANDS};
pub use math::{Pose, Quat, Vec3};
pub use moves::{MoveParseError, ScriptedMove};
pub use pack::{pack_orientations, quantize_quat, unpack_orientations, PACKED_LEN, QUAT_ALPHABET};
pub use pieces::{PieceStore, PIECE_COUNT};
pub use protocol::{decode_message, encode_message, StateMessage};
pub use reconcile::{Reconciler, RECONCILE_WINDOW_SECS};
pub use scramble::{scramble_moves, splitmix32};
pub use sides::{
    best_side, face_normal, face_of, hover_members, side_members, turn_members, FACE_COUNT,
    HOVER_CONFIDENCE_DEFAULT, SIDE_COUNT,
};
pub use state::{InteractionState, PuzzleRules, PuzzleState};
pub use turn::{TurnDescriptor, SNAP_TOLERANCE_DEFAULT_DEG, TURN_STEP_DEG};

pub mod network_sync;
pub mod runtime;
pub mod session;

pub use kyubu_core::{
    pack_orientations, unpack_orientations, HandId, InteractionState, MoveParseError, PieceStore,
    Pose, PuzzleAction, PuzzleRules, PuzzleState, Quat, ScriptedMove, StateMessage, Vec3,
    MAX_HANDS,
};
pub use network_sync::NetworkSync;
pub use runtime::{NetworkGateway, PeerId, SoloGateway};
pub use session::PuzzleSession;

use rkyv::rancor::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// The one wire value peers exchange: who authored it, whether to blend or
/// snap on apply, and the full packed orientation string. Constructed per
/// send/receive, never retained.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StateMessage {
    pub holder_id: Option<u64>,
    pub slerp: bool,
    pub packed: String,
}

pub fn encode_message(message: &StateMessage) -> Option<Vec<u8>> {
    rkyv::to_bytes::<Error>(message)
        .ok()
        .map(|bytes| bytes.into_vec())
}

pub fn decode_message(bytes: &[u8]) -> Option<StateMessage> {
    rkyv::from_bytes::<StateMessage, Error>(bytes).ok()
}

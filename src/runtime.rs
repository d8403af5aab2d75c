pub type PeerId = u64;

/// Transport seam between a session and whatever carries its messages.
/// Implementations deliver inbound payloads to the session via
/// [`crate::PuzzleSession::handle_network_data`].
pub trait NetworkGateway {
    /// Sends an encoded message to one peer, or to everyone when `to` is None.
    fn send(&mut self, bytes: &[u8], to: Option<PeerId>);
    /// Requests write authority. Returns true when the transport grants it
    /// immediately; grants that resolve later arrive through
    /// [`crate::PuzzleSession::handle_ownership_gained`].
    fn take_ownership(&mut self) -> bool;
    fn is_mine(&self) -> bool;
    fn client_id(&self) -> PeerId;
}

/// Gateway for a session with no transport behind it. The local client always
/// holds write authority and outgoing messages go nowhere.
pub struct SoloGateway {
    client_id: PeerId,
}

impl SoloGateway {
    pub fn new(client_id: PeerId) -> Self {
        Self { client_id }
    }
}

impl Default for SoloGateway {
    fn default() -> Self {
        Self::new(0)
    }
}

impl NetworkGateway for SoloGateway {
    fn send(&mut self, _bytes: &[u8], _to: Option<PeerId>) {}

    fn take_ownership(&mut self) -> bool {
        true
    }

    fn is_mine(&self) -> bool {
        true
    }

    fn client_id(&self) -> PeerId {
        self.client_id
    }
}

use std::collections::VecDeque;

use kyubu_core::{
    decode_message, encode_message, pack_orientations, unpack_orientations, InteractionState,
    PieceStore, PuzzleState, Reconciler, StateMessage,
};

use crate::runtime::{NetworkGateway, PeerId};

struct Inbound {
    sender: PeerId,
    bytes: Vec<u8>,
}

/// Enforces the single-writer protocol over a gateway: only the holder's
/// messages change local state, and only the holder authors outbound ones.
/// Inbound payloads are queued as the transport delivers them and applied at
/// the start of the next update, never mid-tick.
pub struct NetworkSync<G> {
    gateway: G,
    inbox: VecDeque<Inbound>,
}

impl<G: NetworkGateway> NetworkSync<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inbox: VecDeque::new(),
        }
    }

    pub fn client_id(&self) -> PeerId {
        self.gateway.client_id()
    }

    pub fn is_mine(&self) -> bool {
        self.gateway.is_mine()
    }

    pub fn take_ownership(&mut self) -> bool {
        self.gateway.take_ownership()
    }

    pub fn queue(&mut self, sender: PeerId, bytes: &[u8]) {
        self.inbox.push_back(Inbound {
            sender,
            bytes: bytes.to_vec(),
        });
    }

    pub fn apply_pending(
        &mut self,
        store: &PieceStore,
        state: &mut PuzzleState,
        reconcile_secs: f32,
    ) {
        while let Some(inbound) = self.inbox.pop_front() {
            self.apply(inbound.sender, &inbound.bytes, store, state, reconcile_secs);
        }
    }

    /// Validates one inbound message and, if it is authoritative, records the
    /// holder and starts reconciling toward its orientations. A sender is
    /// authoritative when it matches the last-known holder or claims the
    /// holder seat under its own id; the seat itself is arbitrated by the
    /// transport, not here.
    fn apply(
        &mut self,
        sender: PeerId,
        bytes: &[u8],
        store: &PieceStore,
        state: &mut PuzzleState,
        reconcile_secs: f32,
    ) {
        let Some(message) = decode_message(bytes) else {
            log::debug!("network data dropped (malformed) from {sender}");
            return;
        };
        let recognized =
            state.holder_id == Some(sender) || message.holder_id == Some(sender);
        if !recognized {
            log::debug!("network data ignored: {sender} is not the holder");
            return;
        }
        if matches!(
            state.interaction,
            InteractionState::Turn | InteractionState::Turning
        ) {
            log::debug!("network data ignored: local turn in progress");
            return;
        }
        let Some(targets) = unpack_orientations(&message.packed) else {
            return;
        };
        if state.holder_id != message.holder_id {
            log::info!("holder is now {:?}", message.holder_id);
            state.holder_id = message.holder_id;
        }
        let duration = if message.slerp { reconcile_secs } else { 0.0 };
        state.reconcile = Some(Reconciler::new(store.snapshot(), targets, duration));
    }

    /// Packs the live orientations and sends them to every peer. Only the
    /// holder speaks; everyone else stays quiet and reconciles.
    pub fn broadcast_state(&mut self, store: &PieceStore, slerp: bool) {
        if !self.gateway.is_mine() {
            log::debug!("broadcast skipped: not the holder");
            return;
        }
        self.send_state(store, slerp, None);
    }

    /// Answers a joining peer with a targeted snapshot that applies instantly.
    pub fn handle_sync_request(&mut self, from: PeerId, store: &PieceStore) {
        if !self.gateway.is_mine() {
            return;
        }
        self.send_state(store, false, Some(from));
    }

    pub fn handle_client_disconnected(&mut self, peer: PeerId, state: &mut PuzzleState) {
        if state.holder_id == Some(peer) {
            log::info!("holder {peer} disconnected, authority released");
            state.holder_id = None;
        }
    }

    /// A deferred ownership grant resolved in our favor: claim the holder
    /// seat and announce the current state so peers never see a gap.
    pub fn handle_ownership_gained(&mut self, store: &PieceStore, state: &mut PuzzleState) {
        state.holder_id = Some(self.gateway.client_id());
        self.broadcast_state(store, true);
    }

    fn send_state(&mut self, store: &PieceStore, slerp: bool, to: Option<PeerId>) {
        let message = StateMessage {
            holder_id: Some(self.gateway.client_id()),
            slerp,
            packed: pack_orientations(&store.orientations),
        };
        if let Some(bytes) = encode_message(&message) {
            self.gateway.send(&bytes, to);
        }
    }
}

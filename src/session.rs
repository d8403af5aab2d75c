use kyubu_core::turn::{
    quarter_quat, quarter_steps, signed_angle, turn_quat, unwrap_near, within_snap,
};
use kyubu_core::{
    best_side, quantize_quat, scramble_moves, turn_members, HandId, InteractionState, PieceStore,
    Pose, PuzzleAction, PuzzleRules, PuzzleState, ScriptedMove, TurnDescriptor, MAX_HANDS,
};

use crate::network_sync::NetworkSync;
use crate::runtime::{NetworkGateway, PeerId};

const SOLVED_EPSILON: f32 = 1e-4;

/// One client's view of the shared puzzle: the piece store, the hand
/// interaction state machine that turns it, and the sync layer that keeps it
/// consistent with peers. Drive it by dispatching actions as hand events
/// arrive and calling [`update`](Self::update) once per frame.
pub struct PuzzleSession<G> {
    store: PieceStore,
    state: PuzzleState,
    rules: PuzzleRules,
    sync: NetworkSync<G>,
    hands: [Option<Pose>; MAX_HANDS],
}

impl<G: NetworkGateway> PuzzleSession<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_rules(gateway, PuzzleRules::default())
    }

    pub fn with_rules(gateway: G, rules: PuzzleRules) -> Self {
        Self {
            store: PieceStore::solved(),
            state: PuzzleState::new(),
            rules,
            sync: NetworkSync::new(gateway),
            hands: [None; MAX_HANDS],
        }
    }

    pub fn store(&self) -> &PieceStore {
        &self.store
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn rules(&self) -> &PuzzleRules {
        &self.rules
    }

    pub fn interaction(&self) -> InteractionState {
        self.state.interaction
    }

    pub fn holder_id(&self) -> Option<PeerId> {
        self.state.holder_id
    }

    pub fn client_id(&self) -> PeerId {
        self.sync.client_id()
    }

    pub fn is_snapped(&self) -> bool {
        self.state.snapped
    }

    pub fn is_solved(&self) -> bool {
        self.store.is_solved(SOLVED_EPSILON)
    }

    pub fn cube_pose(&self) -> Pose {
        self.state.cube_pose
    }

    /// Places the cube root in the world. Embedders that parent the cube to
    /// something else call this so hover projection stays in the right frame.
    pub fn set_cube_pose(&mut self, pose: Pose) {
        self.state.cube_pose = pose;
    }

    pub fn dispatch(&mut self, action: PuzzleAction) {
        match action {
            PuzzleAction::Grab { hand, pose } => self.grab(hand, pose),
            PuzzleAction::Release { hand } => self.release(hand),
            PuzzleAction::Hover { hand, pose } => self.hover(hand, pose),
            PuzzleAction::Snap => self.snap(),
            PuzzleAction::Unsnap => self.unsnap(),
            PuzzleAction::Scripted { notation } => self.run_move(&notation),
        }
    }

    /// Per-frame tick: pending network state first, then any in-flight
    /// reconciliation, then local turn progression. One writer per tick.
    pub fn update(&mut self, dt: f32, hands: [Option<Pose>; MAX_HANDS]) {
        self.hands = hands;
        self.sync
            .apply_pending(&self.store, &mut self.state, self.rules.reconcile_secs);
        self.step_reconcile(dt);
        self.follow_holding_hand();
        self.advance_turn();
    }

    /// Raw payload from the transport. Queued here, applied at the start of
    /// the next update.
    pub fn handle_network_data(&mut self, sender: PeerId, bytes: &[u8]) {
        self.sync.queue(sender, bytes);
    }

    pub fn handle_sync_request(&mut self, from: PeerId) {
        self.sync.handle_sync_request(from, &self.store);
    }

    pub fn handle_client_disconnected(&mut self, peer: PeerId) {
        self.sync.handle_client_disconnected(peer, &mut self.state);
    }

    pub fn handle_ownership_gained(&mut self) {
        self.sync.handle_ownership_gained(&self.store, &mut self.state);
    }

    pub fn broadcast_state(&mut self, slerp: bool) {
        self.sync.broadcast_state(&self.store, slerp);
    }

    /// Applies one move in face notation ("U", "R'", "F2") as an instant
    /// committed turn. Refused while a hand-driven turn is in progress or the
    /// cube sits off a quarter boundary.
    pub fn run_move(&mut self, notation: &str) {
        let scripted = match notation.parse::<ScriptedMove>() {
            Ok(scripted) => scripted,
            Err(err) => {
                log::warn!("scripted move '{notation}' rejected: {err}");
                return;
            }
        };
        if self.turn_in_progress() {
            log::warn!("scripted move ignored: turn in progress");
            return;
        }
        if !self.state.snapped {
            log::warn!("scripted move ignored: puzzle is off a quarter boundary");
            return;
        }
        self.apply_move(scripted);
        self.sync.broadcast_state(&self.store, true);
    }

    /// Applies a deterministic scramble sequence and announces the result
    /// once. The same seed and count produce the same cube on every peer.
    pub fn scramble(&mut self, seed: u32, count: usize) {
        if self.turn_in_progress() {
            log::warn!("scramble ignored: turn in progress");
            return;
        }
        if !self.state.snapped {
            log::warn!("scramble ignored: puzzle is off a quarter boundary");
            return;
        }
        for scripted in scramble_moves(seed, count) {
            self.apply_move(scripted);
        }
        self.sync.broadcast_state(&self.store, true);
    }

    fn turn_in_progress(&self) -> bool {
        matches!(
            self.state.interaction,
            InteractionState::Turn | InteractionState::Turning
        )
    }

    fn apply_move(&mut self, scripted: ScriptedMove) {
        let members = turn_members(&self.store, scripted.face);
        let rotation = quarter_quat(scripted.face, scripted.steps);
        for index in members {
            if let Some(live) = self.store.orientations.get_mut(index) {
                *live = quantize_quat(rotation * *live);
            }
        }
    }

    fn grab(&mut self, hand: HandId, pose: Pose) {
        if hand >= MAX_HANDS {
            return;
        }
        self.hands[hand] = Some(pose);
        match self.state.interaction {
            InteractionState::Idle => {
                if self.state.reconcile.take().is_some() {
                    log::debug!("reconciliation canceled by local grab");
                }
                if self.sync.take_ownership() {
                    self.state.holder_id = Some(self.sync.client_id());
                }
                self.state.interaction = InteractionState::Hold;
                self.state.active_hands.clear();
                self.state.active_hands.push(hand);
                self.state.grab_offset = Some(pose.inverse().transform_pose(self.state.cube_pose));
            }
            InteractionState::Hold => {
                if self.state.active_hands.contains(&hand)
                    || self.state.active_hands.len() >= MAX_HANDS
                {
                    return;
                }
                self.state.active_hands.push(hand);
                self.try_begin_turn(pose);
            }
            InteractionState::Turn | InteractionState::Turning => {}
        }
    }

    /// Second-hand grab while holding. From a snapped cube this starts a
    /// fresh turn on the hovered side; from an unsnapped one it resumes the
    /// in-progress turn, but only if the hand is hovering that same side.
    fn try_begin_turn(&mut self, pose: Pose) {
        let Some(&first) = self.state.active_hands.first() else {
            return;
        };
        let Some(first_pose) = self.hands.get(first).copied().flatten() else {
            return;
        };
        let sign_axis = first_pose.rotation.right();
        let forward = pose.rotation.forward();
        if self.state.snapped {
            let Some(side) = self.state.hover_side else {
                return;
            };
            let members = turn_members(&self.store, side);
            self.state.turn = Some(TurnDescriptor::new(
                side,
                members,
                self.store.snapshot(),
                forward,
                sign_axis,
                0.0,
            ));
            self.state.interaction = InteractionState::Turn;
        } else {
            let Some(turn) = self.state.turn.as_mut() else {
                return;
            };
            if self.state.hover_side != Some(turn.side) {
                return;
            }
            turn.rebase(forward, sign_axis);
            self.state.interaction = InteractionState::Turning;
        }
    }

    fn release(&mut self, hand: HandId) {
        if !self.state.active_hands.contains(&hand) {
            return;
        }
        match self.state.interaction {
            InteractionState::Idle => {}
            InteractionState::Hold => {
                self.state.active_hands.retain(|&held| held != hand);
                if self.state.active_hands.is_empty() {
                    self.drop_to_idle();
                    self.sync.broadcast_state(&self.store, true);
                } else {
                    self.refresh_grab_offset();
                }
            }
            InteractionState::Turn | InteractionState::Turning => {
                self.state.active_hands.retain(|&held| held != hand);
                // The turn survives the release; folding the angle into the
                // start lets a regrab resume exactly where this hand left it.
                if let Some(turn) = self.state.turn.as_mut() {
                    turn.start_angle = turn.angle;
                }
                if self.state.active_hands.is_empty() {
                    self.drop_to_idle();
                    self.sync.broadcast_state(&self.store, true);
                } else {
                    self.state.interaction = InteractionState::Hold;
                    self.refresh_grab_offset();
                }
            }
        }
    }

    fn drop_to_idle(&mut self) {
        self.state.interaction = InteractionState::Idle;
        self.state.grab_offset = None;
        self.state.hover_side = None;
        if self.state.snapped {
            self.state.turn = None;
        }
    }

    fn refresh_grab_offset(&mut self) {
        let Some(&first) = self.state.active_hands.first() else {
            return;
        };
        let Some(hand) = self.hands.get(first).copied().flatten() else {
            self.state.grab_offset = None;
            return;
        };
        self.state.grab_offset = Some(hand.inverse().transform_pose(self.state.cube_pose));
    }

    /// Re-scores which side the hand is pointing at. Only meaningful while
    /// holding; an in-progress turn's side wins when nothing scores above the
    /// confidence threshold.
    fn hover(&mut self, hand: HandId, pose: Pose) {
        if hand >= MAX_HANDS {
            return;
        }
        self.hands[hand] = Some(pose);
        if self.state.interaction != InteractionState::Hold {
            return;
        }
        let local = self.state.cube_pose.inverse_transform_point(pose.position);
        let fallback = self.state.turn.as_ref().map(|turn| turn.side);
        self.state.hover_side = best_side(local, self.rules.hover_confidence, fallback);
    }

    /// Commits the nearest quarter turn exactly and announces it. Fires once
    /// per boundary crossing via the snapped flag, not once per frame.
    fn snap(&mut self) {
        if self.state.interaction != InteractionState::Turning {
            return;
        }
        let Some(turn) = self.state.turn.as_ref() else {
            return;
        };
        let committed = quarter_quat(turn.side, quarter_steps(turn.angle));
        for &index in &turn.members {
            let (Some(start), Some(live)) = (
                turn.start_orientations.get(index),
                self.store.orientations.get_mut(index),
            ) else {
                continue;
            };
            *live = quantize_quat(committed * *start);
        }
        self.state.snapped = true;
        self.state.interaction = InteractionState::Turn;
        self.sync.broadcast_state(&self.store, true);
    }

    fn unsnap(&mut self) {
        match self.state.interaction {
            InteractionState::Turn => {
                self.state.interaction = InteractionState::Turning;
                self.state.snapped = false;
            }
            InteractionState::Turning => {
                self.state.snapped = false;
            }
            InteractionState::Idle | InteractionState::Hold => {}
        }
    }

    fn step_reconcile(&mut self, dt: f32) {
        // Local turning owns the orientation buffer; a pending blend waits.
        if self.turn_in_progress() {
            return;
        }
        let Some(reconcile) = self.state.reconcile.as_mut() else {
            return;
        };
        reconcile.step(dt, &mut self.store.orientations);
        if reconcile.is_finished() {
            self.state.reconcile = None;
        }
    }

    fn follow_holding_hand(&mut self) {
        if self.state.interaction == InteractionState::Idle {
            return;
        }
        let Some(&first) = self.state.active_hands.first() else {
            return;
        };
        let Some(hand) = self.hands.get(first).copied().flatten() else {
            return;
        };
        let Some(offset) = self.state.grab_offset else {
            return;
        };
        self.state.cube_pose = hand.transform_pose(offset);
    }

    /// Measures the turn angle from the second hand's forward vector, applies
    /// the candidate rotation onto the turn-start snapshot, and raises snap or
    /// unsnap when the angle crosses a tolerance boundary.
    fn advance_turn(&mut self) {
        if !self.turn_in_progress() {
            return;
        }
        let Some(&second) = self.state.active_hands.get(1) else {
            return;
        };
        let Some(hand) = self.hands.get(second).copied().flatten() else {
            return;
        };
        let tolerance = self.rules.snap_tolerance_deg.to_radians();
        let Some(turn) = self.state.turn.as_mut() else {
            return;
        };
        let measured = turn.start_angle
            + signed_angle(turn.start_forward, hand.rotation.forward(), turn.sign_axis);
        turn.angle = unwrap_near(measured, turn.angle);
        let candidate = turn_quat(turn.side, turn.angle, tolerance);
        for &index in &turn.members {
            let (Some(start), Some(live)) = (
                turn.start_orientations.get(index),
                self.store.orientations.get_mut(index),
            ) else {
                continue;
            };
            *live = candidate * *start;
        }
        let within = within_snap(turn.angle, tolerance);
        if within && !self.state.snapped {
            self.snap();
        } else if !within && self.state.snapped {
            self.unsnap();
        }
    }
}

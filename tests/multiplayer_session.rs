use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kyubu::{
    InteractionState, NetworkGateway, PeerId, Pose, PuzzleAction, PuzzleSession, Quat,
    SoloGateway, StateMessage, Vec3, MAX_HANDS,
};
use kyubu_core::turn::quarter_quat;
use kyubu_core::{decode_message, encode_message, pack_orientations, PieceStore};

/// Gateway double that records every outgoing payload and lets a test decide
/// whether ownership requests are granted synchronously.
struct RecordingGateway {
    id: PeerId,
    mine: Rc<Cell<bool>>,
    grant_on_take: bool,
    sent: Rc<RefCell<Vec<(Vec<u8>, Option<PeerId>)>>>,
}

impl NetworkGateway for RecordingGateway {
    fn send(&mut self, bytes: &[u8], to: Option<PeerId>) {
        self.sent.borrow_mut().push((bytes.to_vec(), to));
    }

    fn take_ownership(&mut self) -> bool {
        if self.grant_on_take {
            self.mine.set(true);
        }
        self.grant_on_take
    }

    fn is_mine(&self) -> bool {
        self.mine.get()
    }

    fn client_id(&self) -> PeerId {
        self.id
    }
}

struct GatewayProbe {
    mine: Rc<Cell<bool>>,
    sent: Rc<RefCell<Vec<(Vec<u8>, Option<PeerId>)>>>,
}

impl GatewayProbe {
    fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }

    fn last_message(&self) -> Option<(StateMessage, Option<PeerId>)> {
        self.sent
            .borrow()
            .last()
            .and_then(|(bytes, to)| decode_message(bytes).map(|message| (message, *to)))
    }

    fn last_payload(&self) -> Option<Vec<u8>> {
        self.sent.borrow().last().map(|(bytes, _)| bytes.clone())
    }
}

fn recording_session(
    id: PeerId,
    grant_on_take: bool,
) -> (PuzzleSession<RecordingGateway>, GatewayProbe) {
    let mine = Rc::new(Cell::new(false));
    let sent = Rc::new(RefCell::new(Vec::new()));
    let gateway = RecordingGateway {
        id,
        mine: mine.clone(),
        grant_on_take,
        sent: sent.clone(),
    };
    (PuzzleSession::new(gateway), GatewayProbe { mine, sent })
}

const NO_HANDS: [Option<Pose>; MAX_HANDS] = [None, None];

fn first_hand() -> Pose {
    Pose::new(Vec3::new(0.0, 0.0, -2.0), Quat::IDENTITY)
}

fn second_hand(radians: f32) -> Pose {
    Pose::new(
        Vec3::new(2.0, 0.0, 0.0),
        Quat::from_axis_angle(Vec3::X, radians),
    )
}

/// Puts a session into `Turn` on the +X face: first hand grabs, second hand
/// hovers that face, then grabs.
fn begin_turn(session: &mut PuzzleSession<RecordingGateway>) {
    session.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    session.dispatch(PuzzleAction::Hover {
        hand: 1,
        pose: second_hand(0.0),
    });
    session.dispatch(PuzzleAction::Grab {
        hand: 1,
        pose: second_hand(0.0),
    });
}

fn turn_to(session: &mut PuzzleSession<RecordingGateway>, radians: f32) {
    session.update(0.016, [Some(first_hand()), Some(second_hand(radians))]);
}

#[test]
fn grab_from_idle_claims_ownership_and_holds() {
    let (mut session, probe) = recording_session(7, true);
    session.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    assert_eq!(session.interaction(), InteractionState::Hold);
    assert_eq!(session.holder_id(), Some(7));
    assert_eq!(probe.sent_count(), 0, "grab alone must not broadcast");
}

#[test]
fn release_from_hold_broadcasts_exactly_once() {
    let (mut session, probe) = recording_session(7, true);
    session.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    session.dispatch(PuzzleAction::Release { hand: 0 });

    assert_eq!(session.interaction(), InteractionState::Idle);
    assert_eq!(probe.sent_count(), 1);
    let (message, to) = probe.last_message().unwrap();
    assert_eq!(to, None, "release announces to everyone");
    assert_eq!(message.holder_id, Some(7));
    assert!(message.slerp);
    assert_eq!(
        message.packed,
        pack_orientations(&PieceStore::solved().orientations)
    );
}

#[test]
fn deferred_ownership_grant_announces_state() {
    let (mut session, probe) = recording_session(4, false);
    session.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    assert_eq!(session.interaction(), InteractionState::Hold);
    assert_eq!(session.holder_id(), None, "grant has not resolved yet");

    session.dispatch(PuzzleAction::Release { hand: 0 });
    assert_eq!(probe.sent_count(), 0, "non-holders stay quiet");

    // the transport grants ownership later
    probe.mine.set(true);
    session.handle_ownership_gained();
    assert_eq!(session.holder_id(), Some(4));
    assert_eq!(probe.sent_count(), 1);
    assert!(probe.last_message().unwrap().0.slerp);
}

#[test]
fn cube_follows_the_holding_hand() {
    let (mut session, _probe) = recording_session(7, true);
    let start = Pose::new(Vec3::ZERO, Quat::IDENTITY);
    session.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: start,
    });

    let moved = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
    session.update(0.016, [Some(moved), None]);
    assert!((session.cube_pose().position - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
}

#[test]
fn second_grab_on_hovered_side_starts_a_turn() {
    let (mut session, _probe) = recording_session(7, true);
    begin_turn(&mut session);

    assert_eq!(session.interaction(), InteractionState::Turn);
    let turn = session.state().turn.as_ref().unwrap();
    assert_eq!(turn.side, 0);
    assert_eq!(turn.members, (17..26).collect::<Vec<_>>());
    assert_eq!(turn.members.len(), 9);
}

#[test]
fn second_grab_without_hover_stays_hold() {
    let (mut session, _probe) = recording_session(7, true);
    session.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    session.dispatch(PuzzleAction::Grab {
        hand: 1,
        pose: second_hand(0.0),
    });
    assert_eq!(session.interaction(), InteractionState::Hold);
    assert!(session.state().turn.is_none());
    assert_eq!(session.state().active_hands, vec![0, 1]);
}

#[test]
fn hover_outside_hold_is_ignored() {
    let (mut session, _probe) = recording_session(7, true);
    session.dispatch(PuzzleAction::Hover {
        hand: 0,
        pose: second_hand(0.0),
    });
    assert_eq!(session.state().hover_side, None);
    assert_eq!(session.interaction(), InteractionState::Idle);
}

#[test]
fn snap_fires_once_per_boundary_crossing() {
    let (mut session, probe) = recording_session(7, true);
    begin_turn(&mut session);

    // small wiggle inside tolerance of zero: still Turn, nothing committed
    turn_to(&mut session, 0.05);
    assert_eq!(session.interaction(), InteractionState::Turn);
    assert!(session.is_snapped());
    assert_eq!(probe.sent_count(), 0);

    // past tolerance: unsnap into Turning
    turn_to(&mut session, 0.3);
    assert_eq!(session.interaction(), InteractionState::Turning);
    assert!(!session.is_snapped());
    assert_eq!(probe.sent_count(), 0);

    // within tolerance of a quarter: exactly one snap commit
    turn_to(&mut session, 85f32.to_radians());
    assert!(session.is_snapped());
    assert_eq!(probe.sent_count(), 1);
    assert_eq!(session.store().orientations[17], quarter_quat(0, 1));
    assert_eq!(session.store().orientations[0], Quat::IDENTITY);

    // staying within tolerance must not re-fire
    turn_to(&mut session, 87f32.to_radians());
    turn_to(&mut session, 89f32.to_radians());
    assert_eq!(probe.sent_count(), 1);

    // leaving and re-entering tolerance fires again at the next quarter
    turn_to(&mut session, 120f32.to_radians());
    assert!(!session.is_snapped());
    turn_to(&mut session, 175f32.to_radians());
    assert!(session.is_snapped());
    assert_eq!(probe.sent_count(), 2);
    assert_eq!(session.store().orientations[17], quarter_quat(0, 2));
}

#[test]
fn release_mid_turn_folds_the_angle_and_regrab_resumes() {
    let (mut session, probe) = recording_session(7, true);
    begin_turn(&mut session);
    turn_to(&mut session, 0.3);
    assert_eq!(session.interaction(), InteractionState::Turning);

    session.dispatch(PuzzleAction::Release { hand: 1 });
    assert_eq!(session.interaction(), InteractionState::Hold);
    assert!(!session.is_snapped());
    let folded = session.state().turn.as_ref().unwrap().start_angle;
    assert!((folded - 0.3).abs() < 1e-5, "angle folded into the start");
    assert_eq!(probe.sent_count(), 0, "mid-turn release must not broadcast");

    // hovering a corner scores below confidence, so the in-progress side wins
    session.dispatch(PuzzleAction::Hover {
        hand: 1,
        pose: Pose::new(Vec3::new(2.0, 2.0, 2.0), Quat::IDENTITY),
    });
    assert_eq!(session.state().hover_side, Some(0));

    session.dispatch(PuzzleAction::Grab {
        hand: 1,
        pose: second_hand(0.0),
    });
    assert_eq!(session.interaction(), InteractionState::Turning);

    // the fresh hand adds another 0.2 rad on top of the folded 0.3
    turn_to(&mut session, 0.2);
    let angle = session.state().turn.as_ref().unwrap().angle;
    assert!((angle - 0.5).abs() < 1e-5, "turn resumed from the fold");

    turn_to(&mut session, 85f32.to_radians() - 0.3);
    assert!(session.is_snapped());
    assert_eq!(probe.sent_count(), 1);
    assert_eq!(session.store().orientations[17], quarter_quat(0, 1));
}

#[test]
fn two_sessions_converge_through_the_wire() {
    let (mut holder, holder_probe) = recording_session(1, true);
    let (mut peer, peer_probe) = recording_session(2, false);
    holder_probe.mine.set(true);

    holder.run_move("U");
    assert_eq!(holder_probe.sent_count(), 1);
    assert!(!holder.is_solved());

    let payload = holder_probe.last_payload().unwrap();
    peer.handle_network_data(1, &payload);
    peer.update(0.0, NO_HANDS);
    assert!(
        peer.state().reconcile.is_some(),
        "smoothed apply blends over the window"
    );
    peer.update(0.5, NO_HANDS);

    assert!(peer.state().reconcile.is_none());
    assert_eq!(peer.store(), holder.store());
    assert_eq!(peer.holder_id(), Some(1));
    assert_eq!(peer_probe.sent_count(), 0);
}

#[test]
fn non_holder_messages_are_dropped() {
    let (mut holder, holder_probe) = recording_session(1, true);
    let (mut peer, _peer_probe) = recording_session(2, false);
    holder_probe.mine.set(true);

    holder.run_move("U");
    let payload = holder_probe.last_payload().unwrap();
    peer.handle_network_data(1, &payload);
    peer.update(0.5, NO_HANDS);
    peer.update(0.5, NO_HANDS);
    assert_eq!(peer.holder_id(), Some(1));

    // a relayed copy of the holder's message from the wrong sender
    let before = peer.store().clone();
    peer.handle_network_data(3, &payload);
    peer.update(0.5, NO_HANDS);
    assert_eq!(peer.store(), &before);
    assert_eq!(peer.holder_id(), Some(1));

    // garbage from anywhere
    peer.handle_network_data(1, &[0xFF, 0x00, 0x13]);
    peer.update(0.5, NO_HANDS);
    assert_eq!(peer.store(), &before);
}

#[test]
fn holder_handoff_follows_the_message_claim() {
    let (mut peer, _probe) = recording_session(9, false);

    // first holder announces itself
    let mut store = PieceStore::solved();
    let first = StateMessage {
        holder_id: Some(1),
        slerp: false,
        packed: pack_orientations(&store.orientations),
    };
    peer.handle_network_data(1, &encode_message(&first).unwrap());
    peer.update(0.0, NO_HANDS);
    assert_eq!(peer.holder_id(), Some(1));

    // arbitration moved the seat: the new holder claims it under its own id
    let rotation = quarter_quat(2, 1);
    for index in kyubu_core::turn_members(&store, 2) {
        let rotated = rotation * store.orientations[index];
        store.orientations[index] = rotated;
    }
    let second = StateMessage {
        holder_id: Some(5),
        slerp: false,
        packed: pack_orientations(&store.orientations),
    };
    peer.handle_network_data(5, &encode_message(&second).unwrap());
    peer.update(0.0, NO_HANDS);
    assert_eq!(peer.holder_id(), Some(5));
    assert_eq!(peer.store().orientations, store.orientations);

    // a claim for somebody else is not a claim
    let forged = StateMessage {
        holder_id: Some(5),
        slerp: false,
        packed: pack_orientations(&PieceStore::solved().orientations),
    };
    peer.handle_network_data(8, &encode_message(&forged).unwrap());
    peer.update(0.0, NO_HANDS);
    assert_eq!(peer.holder_id(), Some(5));
    assert_eq!(peer.store().orientations, store.orientations);
}

#[test]
fn holder_disconnect_releases_authority() {
    let (mut peer, _probe) = recording_session(2, true);
    let announce = StateMessage {
        holder_id: Some(1),
        slerp: false,
        packed: pack_orientations(&PieceStore::solved().orientations),
    };
    peer.handle_network_data(1, &encode_message(&announce).unwrap());
    peer.update(0.0, NO_HANDS);
    assert_eq!(peer.holder_id(), Some(1));

    peer.handle_client_disconnected(1);
    assert_eq!(peer.holder_id(), None);

    // nobody can speak for the absent holder
    let forged = StateMessage {
        holder_id: Some(9),
        slerp: false,
        packed: pack_orientations(&PieceStore::solved().orientations),
    };
    let before = peer.store().clone();
    peer.handle_network_data(3, &encode_message(&forged).unwrap());
    peer.update(0.0, NO_HANDS);
    assert_eq!(peer.store(), &before);
    assert_eq!(peer.holder_id(), None);

    // geometry stays where the holder left it, and the next grab claims the seat
    peer.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    assert_eq!(peer.holder_id(), Some(2));
}

#[test]
fn disconnect_of_a_bystander_changes_nothing() {
    let (mut peer, _probe) = recording_session(2, false);
    let announce = StateMessage {
        holder_id: Some(1),
        slerp: false,
        packed: pack_orientations(&PieceStore::solved().orientations),
    };
    peer.handle_network_data(1, &encode_message(&announce).unwrap());
    peer.update(0.0, NO_HANDS);

    peer.handle_client_disconnected(6);
    assert_eq!(peer.holder_id(), Some(1));
}

#[test]
fn sync_request_gets_a_targeted_instant_snapshot() {
    let (mut holder, holder_probe) = recording_session(1, true);
    holder_probe.mine.set(true);
    holder.scramble(42, 10);
    assert_eq!(holder_probe.sent_count(), 1, "scramble announces once");

    holder.handle_sync_request(9);
    assert_eq!(holder_probe.sent_count(), 2);
    let (message, to) = holder_probe.last_message().unwrap();
    assert_eq!(to, Some(9), "reply goes to the requester only");
    assert!(!message.slerp, "late joiners snap instead of blending");

    // a non-holder stays quiet on sync requests
    let (mut peer, peer_probe) = recording_session(2, false);
    peer.handle_sync_request(9);
    assert_eq!(peer_probe.sent_count(), 0);

    // the requester lands on the holder's exact state in a single step
    let payload = holder_probe.last_payload().unwrap();
    let (mut joiner, _joiner_probe) = recording_session(9, false);
    joiner.handle_network_data(1, &payload);
    joiner.update(0.0, NO_HANDS);
    assert_eq!(joiner.store(), holder.store());
}

#[test]
fn local_grab_cancels_reconciliation() {
    let (mut holder, holder_probe) = recording_session(1, true);
    let (mut peer, _peer_probe) = recording_session(2, true);
    holder_probe.mine.set(true);

    holder.run_move("F2");
    let payload = holder_probe.last_payload().unwrap();
    peer.handle_network_data(1, &payload);
    peer.update(0.05, NO_HANDS);
    assert!(peer.state().reconcile.is_some());

    peer.dispatch(PuzzleAction::Grab {
        hand: 0,
        pose: first_hand(),
    });
    assert!(peer.state().reconcile.is_none());

    // the blend stays wherever the grab caught it
    let frozen = peer.store().orientations.clone();
    peer.update(0.5, [Some(first_hand()), None]);
    assert_eq!(peer.store().orientations, frozen);
}

#[test]
fn remote_state_is_dropped_during_a_local_turn() {
    let (mut session, _probe) = recording_session(2, true);
    begin_turn(&mut session);
    turn_to(&mut session, 0.0);
    assert_eq!(session.interaction(), InteractionState::Turn);

    let message = StateMessage {
        holder_id: Some(1),
        slerp: true,
        packed: pack_orientations(&PieceStore::solved().orientations),
    };
    session.handle_network_data(1, &encode_message(&message).unwrap());
    turn_to(&mut session, 0.0);

    assert!(session.state().reconcile.is_none());
    assert_eq!(session.holder_id(), Some(2), "local authorship wins");
}

#[test]
fn scripted_inverse_returns_to_solved() {
    let mut session = PuzzleSession::new(SoloGateway::new(0));
    session.run_move("U");
    assert!(!session.is_solved());
    session.run_move("U'");
    assert!(session.is_solved());

    for notation in ["R", "R'", "F2", "F2", "D", "D'"] {
        session.run_move(notation);
    }
    assert!(session.is_solved());
}

#[test]
fn unknown_moves_change_nothing() {
    let (mut session, probe) = recording_session(1, true);
    probe.mine.set(true);
    let before = session.store().clone();

    session.run_move("Q");
    session.run_move("U3");
    session.run_move("");
    assert_eq!(session.store(), &before);
    assert_eq!(probe.sent_count(), 0, "rejected moves must not broadcast");
}

#[test]
fn scripted_moves_are_refused_mid_turn() {
    let (mut session, probe) = recording_session(1, true);
    begin_turn(&mut session);
    turn_to(&mut session, 0.3);

    let before = session.store().clone();
    session.run_move("U");
    assert_eq!(session.store(), &before);
    assert_eq!(probe.sent_count(), 0);
}

#[test]
fn scrambles_match_across_sessions() {
    let mut first = PuzzleSession::new(SoloGateway::new(0));
    let mut second = PuzzleSession::new(SoloGateway::new(1));
    first.scramble(7, 20);
    second.scramble(7, 20);
    assert_eq!(first.store(), second.store());
    assert!(!first.is_solved());

    let mut different = PuzzleSession::new(SoloGateway::new(2));
    different.scramble(8, 20);
    assert_ne!(different.store(), first.store());
}

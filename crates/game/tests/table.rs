use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dropfour::net::read_frame;
use dropfour::{
    DeliveryError, Outbound, Phase, RegistryError, ServerMessage, ServerPacket, Table,
    TableConfig, TableEvent,
};
use dropfour::ClientMessage::{Move, RestartRequest};

#[derive(Clone, Default)]
struct Peer {
    inbox: Arc<Mutex<Vec<Arc<[u8]>>>>,
    broken: Arc<AtomicBool>,
}

impl Outbound for Peer {
    fn deliver(&self, bytes: Arc<[u8]>) -> Result<(), DeliveryError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.inbox.lock().unwrap().push(bytes);
        Ok(())
    }
}

impl Peer {
    fn handshake(&self) -> u8 {
        self.inbox.lock().unwrap()[0][0]
    }

    /// Everything after the handshake, decoded.
    fn messages(&self) -> Vec<ServerMessage> {
        self.inbox.lock().unwrap()[1..]
            .iter()
            .map(|frame| {
                let payload = read_frame(&mut &frame[..]).unwrap();
                ServerPacket::deserialize(&payload).unwrap().payload
            })
            .collect()
    }

    fn last(&self) -> ServerMessage {
        self.messages().pop().expect("no messages")
    }

    fn break_link(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

fn seated() -> (Table<Peer>, [Peer; 2], [dropfour::SlotId; 2]) {
    let mut table = Table::new(TableConfig::default());
    let peers = [Peer::default(), Peer::default()];
    let a = table.join(peers[0].clone()).unwrap();
    let b = table.join(peers[1].clone()).unwrap();
    (table, peers, [a, b])
}

#[test]
fn test_handshake_and_start_reach_both() {
    let (table, peers, slots) = seated();

    assert_eq!(slots[0].player, 0);
    assert_eq!(slots[1].player, 1);
    assert_eq!(peers[0].handshake(), b'0');
    assert_eq!(peers[1].handshake(), b'1');

    for peer in &peers {
        assert!(matches!(
            peer.messages().as_slice(),
            [ServerMessage::GameStart {
                turn: 0,
                game_over: false,
                game_id: 1,
                ..
            }]
        ));
    }
    assert_eq!(table.session().phase(), Phase::InProgress);
}

#[test]
fn test_first_player_waits_alone() {
    let mut table = Table::new(TableConfig::default());
    let peer = Peer::default();
    table.join(peer.clone()).unwrap();

    assert_eq!(peer.handshake(), b'0');
    assert!(peer.messages().is_empty());
    assert_eq!(table.session().phase(), Phase::WaitingForPlayers);
}

#[test]
fn test_third_connection_rejected() {
    let (mut table, _peers, _slots) = seated();
    let extra = Peer::default();

    assert_eq!(table.join(extra.clone()), Err(RegistryError::Full));
    assert!(extra.inbox.lock().unwrap().is_empty());
    assert!(
        table
            .drain_events()
            .any(|e| e == TableEvent::PlayerRejected { reason: RegistryError::Full })
    );
}

#[test]
fn test_valid_move_broadcast_to_both() {
    let (mut table, peers, slots) = seated();
    table.handle(slots[0], Move { column: 3 });

    for peer in &peers {
        match peer.last() {
            ServerMessage::GameUpdate {
                board,
                turn,
                game_over,
                ..
            } => {
                assert_eq!(board[0][3], 1);
                assert_eq!(turn, 1);
                assert!(!game_over);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_invalid_moves_are_silent() {
    let (mut table, peers, slots) = seated();

    table.handle(slots[1], Move { column: 0 });
    table.handle(slots[0], Move { column: 9 });

    assert_eq!(peers[0].messages().len(), 1);
    assert_eq!(peers[1].messages().len(), 1);
    assert_eq!(table.session().turn(), 0);

    let rejected = table
        .drain_events()
        .filter(|e| matches!(e, TableEvent::MoveRejected { .. }))
        .count();
    assert_eq!(rejected, 2);
}

#[test]
fn test_restart_negotiation() {
    let (mut table, peers, slots) = seated();

    table.handle(slots[1], RestartRequest);
    assert_eq!(
        peers[0].last(),
        ServerMessage::RestartRequested {
            player: 1,
            waiting_restart: [false, true],
        }
    );
    assert_eq!(table.session().match_id(), 1);

    table.handle(slots[0], RestartRequest);
    assert!(matches!(
        peers[1].last(),
        ServerMessage::GameStart { game_id: 2, .. }
    ));
    assert_eq!(table.session().restart_requested(), [false, false]);
}

#[test]
fn test_disconnect_mid_game() {
    let (mut table, peers, slots) = seated();
    table.handle(slots[0], Move { column: 0 });

    table.leave(slots[1]);
    table.leave(slots[1]);

    let notices: Vec<_> = peers[0]
        .messages()
        .into_iter()
        .filter(|m| matches!(m, ServerMessage::PlayerDisconnected { .. }))
        .collect();
    assert_eq!(notices, vec![ServerMessage::PlayerDisconnected { player: 1 }]);
    assert_eq!(table.session().phase(), Phase::Abandoned);

    let before = peers[0].messages().len();
    table.handle(slots[0], Move { column: 1 });
    table.handle(slots[0], RestartRequest);
    assert_eq!(peers[0].messages().len(), before);
}

#[test]
fn test_leaving_after_a_win_is_not_announced() {
    let (mut table, peers, slots) = seated();
    for _ in 0..3 {
        table.handle(slots[0], Move { column: 3 });
        table.handle(slots[1], Move { column: 0 });
    }
    table.handle(slots[0], Move { column: 3 });
    table.handle(slots[0], RestartRequest);
    assert_eq!(table.session().phase(), Phase::Won);
    let before = peers[0].messages().len();

    table.leave(slots[1]);

    assert_eq!(peers[0].messages().len(), before);
    assert_eq!(
        peers[0].last(),
        ServerMessage::RestartRequested {
            player: 0,
            waiting_restart: [true, false],
        }
    );
    assert_eq!(table.session().phase(), Phase::Abandoned);
    assert!(
        table
            .drain_events()
            .any(|e| e == TableEvent::MatchAbandoned { player: 1 })
    );

    table.handle(slots[0], RestartRequest);
    assert_eq!(peers[0].messages().len(), before);
}

#[test]
fn test_failed_delivery_retires_peer_and_notifies_other() {
    let (mut table, peers, slots) = seated();
    peers[1].break_link();

    table.handle(slots[0], Move { column: 2 });

    assert!(!table.registry().is_live(slots[1]));
    assert_eq!(
        peers[0].last(),
        ServerMessage::PlayerDisconnected { player: 1 }
    );
    assert_eq!(table.session().phase(), Phase::Abandoned);
}

#[test]
fn test_new_pair_after_everyone_leaves() {
    let (mut table, _peers, slots) = seated();
    table.leave(slots[0]);

    let latecomer = Peer::default();
    assert_eq!(table.join(latecomer.clone()), Err(RegistryError::Draining));

    table.leave(slots[1]);
    assert_eq!(table.session().phase(), Phase::WaitingForPlayers);

    let (a, b) = (Peer::default(), Peer::default());
    let slot = table.join(a.clone()).unwrap();
    table.join(b.clone()).unwrap();

    assert_eq!(slot.player, 0);
    assert!(matches!(a.last(), ServerMessage::GameStart { game_id: 2, .. }));

    // Messages from the previous pairing's slot must not touch the new match.
    table.handle(slots[0], Move { column: 4 });
    assert_eq!(a.messages().len(), 1);
}

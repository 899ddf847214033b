use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

use dropfour::net::{read_frame_async, read_handshake_async, serve, write_frame};
use dropfour::{
    ClientMessage, ClientPacket, EndpointConfig, ServerMessage, ServerPacket, SharedTable, Table,
    TableConfig, TableEvent,
};

const WAIT: Duration = Duration::from_secs(2);

async fn start_server() -> (SocketAddr, SharedTable) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let table: SharedTable = Arc::new(Mutex::new(Table::new(TableConfig::default())));
    tokio::spawn(serve(listener, Arc::clone(&table), EndpointConfig::default()));
    (addr, table)
}

async fn connect(addr: SocketAddr) -> (TcpStream, u8) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let player = timeout(WAIT, read_handshake_async(&mut stream))
        .await
        .expect("handshake timed out")
        .unwrap();
    (stream, player)
}

async fn recv(stream: &mut TcpStream) -> ServerMessage {
    let frame = timeout(WAIT, read_frame_async(stream))
        .await
        .expect("no message from server")
        .unwrap();
    ServerPacket::deserialize(&frame).unwrap().payload
}

async fn send(stream: &mut TcpStream, message: ClientMessage) {
    let mut bytes = Vec::new();
    write_frame(&mut bytes, &ClientPacket::new(message).serialize().unwrap()).unwrap();
    stream.write_all(&bytes).await.unwrap();
}

#[tokio::test]
async fn test_pairing_handshake_and_start() {
    let (addr, _table) = start_server().await;

    let (mut first, first_player) = connect(addr).await;
    let (mut second, second_player) = connect(addr).await;
    assert_eq!((first_player, second_player), (0, 1));

    for stream in [&mut first, &mut second] {
        assert!(matches!(
            recv(stream).await,
            ServerMessage::GameStart { game_id: 1, turn: 0, .. }
        ));
    }
}

#[tokio::test]
async fn test_third_connection_is_closed() {
    let (addr, _table) = start_server().await;
    let (_first, _) = connect(addr).await;
    let (_second, _) = connect(addr).await;

    let mut third = TcpStream::connect(addr).await.unwrap();
    let mut buf = [0u8; 1];
    let read = timeout(WAIT, third.read(&mut buf))
        .await
        .expect("third connection left open");
    assert!(matches!(read, Ok(0) | Err(_)));
}

#[tokio::test]
async fn test_moves_broadcast_and_out_of_turn_ignored() {
    let (addr, table) = start_server().await;
    let (mut first, _) = connect(addr).await;
    let (mut second, _) = connect(addr).await;
    recv(&mut first).await;
    recv(&mut second).await;

    send(&mut second, ClientMessage::Move { column: 0 }).await;
    let silence = timeout(Duration::from_millis(200), read_frame_async(&mut first)).await;
    assert!(silence.is_err(), "out-of-turn move was broadcast");
    let rejected = table
        .lock()
        .await
        .drain_events()
        .filter(|e| matches!(e, TableEvent::MoveRejected { player: 1, .. }))
        .count();
    assert_eq!(rejected, 1);

    send(&mut first, ClientMessage::Move { column: 4 }).await;

    for stream in [&mut first, &mut second] {
        match recv(stream).await {
            ServerMessage::GameUpdate { board, turn, .. } => {
                assert_eq!(board[0][4], 1);
                assert_eq!(board[0][0], 0);
                assert_eq!(turn, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_off_board_column_keeps_connection() {
    let (addr, _table) = start_server().await;
    let (mut first, _) = connect(addr).await;
    let (mut second, _) = connect(addr).await;
    recv(&mut first).await;
    recv(&mut second).await;

    send(&mut first, ClientMessage::Move { column: 9 }).await;
    send(&mut first, ClientMessage::Move { column: 2 }).await;

    match recv(&mut second).await {
        ServerMessage::GameUpdate { board, turn, .. } => {
            assert_eq!(board[0][2], 1);
            assert_eq!(turn, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_notifies_remaining_player_once() {
    let (addr, table) = start_server().await;
    let (mut first, _) = connect(addr).await;
    let (second, _) = connect(addr).await;
    recv(&mut first).await;

    drop(second);
    assert_eq!(
        recv(&mut first).await,
        ServerMessage::PlayerDisconnected { player: 1 }
    );

    send(&mut first, ClientMessage::Move { column: 0 }).await;
    send(&mut first, ClientMessage::RestartRequest).await;
    let silence = timeout(Duration::from_millis(200), read_frame_async(&mut first)).await;
    assert!(silence.is_err(), "server kept talking after abandonment");

    assert_eq!(table.lock().await.session().phase(), dropfour::Phase::Abandoned);
}

#[tokio::test]
async fn test_garbage_is_treated_as_disconnect() {
    let (addr, _table) = start_server().await;
    let (mut first, _) = connect(addr).await;
    let (mut second, _) = connect(addr).await;
    recv(&mut first).await;

    second.write_all(&[0, 0, 0, 3, 0xff, 0xfe, 0xfd]).await.unwrap();

    assert_eq!(
        recv(&mut first).await,
        ServerMessage::PlayerDisconnected { player: 1 }
    );
}

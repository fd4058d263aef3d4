//! End-to-end over real sockets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

use salvo_core::phase::Phase;
use salvo_core::player::PlayerId;
use salvo_server::protocol::ServerMessage;
use salvo_server::server::{self, SharedSession};
use salvo_server::session::{Session, SessionSettings};
use salvo_test_utils::fixtures;

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        let line = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("server went quiet")
            .unwrap()
            .expect("server closed the connection");
        serde_json::from_str(&line).unwrap()
    }

    /// Read until a delta shows the game in `phase`.
    async fn recv_until_phase(&mut self, phase: Phase) -> Vec<ServerMessage> {
        let mut seen = Vec::new();
        loop {
            let message = self.recv().await;
            let done = matches!(&message, ServerMessage::StateDelta { phase: p, .. } if *p == phase);
            seen.push(message);
            if done {
                return seen;
            }
        }
    }
}

async fn start_server(settings: SessionSettings) -> (std::net::SocketAddr, SharedSession) {
    let session = Session::new(fixtures::duel(), "duel", settings, Instant::now()).unwrap();
    let shared = Arc::new(Mutex::new(session));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, Arc::clone(&shared)));
    (addr, shared)
}

#[tokio::test]
async fn test_two_players_join_and_play_a_turn() {
    let (addr, shared) = start_server(SessionSettings::default()).await;

    let mut davion = Client::connect(addr).await;
    davion.send(r#"{"cmd":"join_game","name":"Davion"}"#).await;
    assert_eq!(
        davion.recv().await,
        ServerMessage::Joined {
            player_id: PlayerId(1)
        }
    );
    let ServerMessage::FullSnapshot { view, .. } = davion.recv().await else {
        panic!("expected a snapshot after joining");
    };
    assert_eq!(view.phase, Phase::Lobby);
    assert_eq!(view.entities.len(), 2);

    let mut kurita = Client::connect(addr).await;
    kurita.send(r#"{"cmd":"join_game","name":"Kurita"}"#).await;
    assert!(matches!(kurita.recv().await, ServerMessage::Joined { .. }));
    assert!(matches!(kurita.recv().await, ServerMessage::FullSnapshot { .. }));

    davion.recv_until_phase(Phase::Movement).await;
    let seen = kurita.recv_until_phase(Phase::Movement).await;
    let Some(ServerMessage::StateDelta {
        turn: Some(turn), ..
    }) = seen.last()
    else {
        panic!("movement starts with a turn holder");
    };

    let first = turn.player;
    let (holder, other) = if first == PlayerId(1) {
        (&mut davion, &mut kurita)
    } else {
        (&mut kurita, &mut davion)
    };

    // The waiting player is refused before the game sees anything.
    other.send(r#"{"cmd":"end_turn"}"#).await;
    assert_eq!(
        other.recv().await,
        ServerMessage::ProtocolError {
            message: "it is not your turn".into()
        }
    );

    holder.send(r#"{"cmd":"end_turn"}"#).await;
    let ServerMessage::StateDelta { seq, turn, .. } = other.recv().await else {
        panic!("expected a delta");
    };
    let ServerMessage::StateDelta { seq: same, .. } = holder.recv().await else {
        panic!("expected a delta");
    };
    assert_eq!(seq, same);
    assert_ne!(turn.map(|t| t.player), Some(first));
    assert_eq!(shared.lock().await.seq(), seq);
}

#[tokio::test]
async fn test_garbage_is_answered_not_fatal() {
    let (addr, _shared) = start_server(SessionSettings::default()).await;
    let mut client = Client::connect(addr).await;

    client.send("this is not json").await;
    assert!(matches!(
        client.recv().await,
        ServerMessage::ProtocolError { message } if message.starts_with("malformed")
    ));

    client.send(r#"{"cmd":"request_snapshot"}"#).await;
    assert!(matches!(client.recv().await, ServerMessage::ProtocolError { .. }));

    // The connection is still usable.
    client.send(r#"{"cmd":"join_game","name":"Kurita"}"#).await;
    assert_eq!(
        client.recv().await,
        ServerMessage::Joined {
            player_id: PlayerId(2)
        }
    );
}

#[tokio::test]
async fn test_dropped_connection_marks_player_disconnected() {
    let (addr, shared) = start_server(SessionSettings::default()).await;

    let mut davion = Client::connect(addr).await;
    davion.send(r#"{"cmd":"join_game","name":"Davion"}"#).await;
    davion.recv().await;
    davion.recv().await;
    assert!(shared.lock().await.is_connected(PlayerId(1)));
    drop(davion);

    let mut gone = false;
    for _ in 0..50 {
        if !shared.lock().await.is_connected(PlayerId(1)) {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(gone);

    // The name is free again.
    let mut back = Client::connect(addr).await;
    back.send(r#"{"cmd":"join_game","name":"Davion"}"#).await;
    assert!(matches!(back.recv().await, ServerMessage::Joined { .. }));
}

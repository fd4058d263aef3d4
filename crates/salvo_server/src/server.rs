//! TCP front end.
//!
//! One reader task and one writer task per connection, plus a watchdog.
//! The [`Session`] behind the mutex is the only shared state; messages
//! produced under the lock are delivered after it is dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::{self, ServerMessage};
use crate::session::{Connection, Session};

/// Session handle shared by every task.
pub type SharedSession = Arc<Mutex<Session>>;

/// Boot the configured game and serve it until the process is stopped.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let session = Session::boot(&config, Instant::now())?;
    let listener = TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");

    let shared = Arc::new(Mutex::new(session));
    tokio::spawn(watchdog(Arc::clone(&shared), config.watchdog_interval()));
    serve(listener, shared).await
}

/// Accept connections forever.
pub async fn serve(listener: TcpListener, shared: SharedSession) -> Result<(), ServerError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "connection accepted");
        tokio::spawn(handle_connection(stream, Arc::clone(&shared)));
    }
}

/// Tick the session every `interval`.
pub async fn watchdog(shared: SharedSession, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let out = shared.lock().await.tick(Instant::now());
        out.deliver();
    }
}

async fn handle_connection(stream: TcpStream, shared: SharedSession) {
    let peer = stream.peer_addr().ok();
    let (reader, writer) = stream.into_split();
    let (tx, rx) = unbounded_channel();
    let writer_task = tokio::spawn(write_messages(writer, rx));

    let mut conn = Connection::new(tx);
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(?peer, error = %e, "read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let decoded = protocol::decode(&line);
        let out = {
            let mut session = shared.lock().await;
            match decoded {
                Ok(message) => {
                    debug!(?peer, ?message, "received");
                    session.handle(&mut conn, message, Instant::now())
                }
                Err(error) => session.reject(&conn, error),
            }
        };
        out.deliver();
    }

    let out = shared.lock().await.disconnect(&conn, Instant::now());
    out.deliver();
    info!(?peer, player = ?conn.player(), "connection closed");
    // Dropping the last sender lets the writer drain and exit.
    drop(conn);
    if let Err(e) = writer_task.await {
        error!(?peer, error = %e, "writer task failed");
    }
}

async fn write_messages(mut writer: OwnedWriteHalf, mut rx: UnboundedReceiver<ServerMessage>) {
    while let Some(message) = rx.recv().await {
        let line = match protocol::encode(&message) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            debug!(error = %e, "write failed, closing writer");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

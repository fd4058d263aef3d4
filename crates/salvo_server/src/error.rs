//! Server error types.

use thiserror::Error;

use salvo_core::GameError;

/// A message refused before it reached the game.
///
/// These are reported back to the sender as
/// [`ServerMessage::ProtocolError`](crate::protocol::ServerMessage::ProtocolError)
/// and never close the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line was not a valid client message.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Anything but `join_game` before joining.
    #[error("join the game first")]
    NotJoined,

    /// A second `join_game` on the same connection.
    #[error("already joined as player {0}")]
    AlreadyJoined(u32),

    /// Wrong server password.
    #[error("bad password")]
    BadPassword,

    /// No player of that name in this game.
    #[error("no player named '{0}'")]
    UnknownName(String),

    /// That player already has a live connection.
    #[error("player '{0}' is already connected")]
    AlreadyConnected(String),

    /// Action or turn control while another player holds the turn.
    #[error("it is not your turn")]
    OutOfTurn,
}

/// Failures that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket or file IO.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Building, loading or saving the game.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Bad configuration file.
    #[error("Failed to read config '{path}': {message}")]
    Config {
        /// Config file path.
        path: String,
        /// Error message.
        message: String,
    },
}

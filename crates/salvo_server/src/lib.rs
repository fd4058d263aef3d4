//! # Salvo Dedicated Server
//!
//! Headless server for one authoritative game.
//!
//! Clients connect over TCP and speak newline-delimited JSON
//! ([`protocol`]). Each player claims a slot by name; the [`session`]
//! layer forwards their declarations to the game and broadcasts the
//! resulting events to everyone. A watchdog keeps the game moving when a
//! player disconnects or stalls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use error::{ProtocolError, ServerError};

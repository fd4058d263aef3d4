//! # Salvo Development Tools
//!
//! Command-line tools for development:
//! - Data validators for catalogs and scenarios
//! - Snapshot inspector
//! - Replay verifier

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod inspect;
pub mod validate;
pub mod verify;

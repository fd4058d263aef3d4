//! JSON-lines wire protocol.
//!
//! Every message is one JSON object on one line. Client messages are tagged
//! by `cmd`, server messages by `type`.
//!
//! # Example Session
//!
//! ```text
//! -> {"cmd":"join_game","name":"Davion","password":null}
//! <- {"type":"joined","player_id":1}
//! <- {"type":"full_snapshot","seq":0,"view":{...}}
//! <- {"type":"state_delta","seq":1,"round":1,"phase":"Movement","turn":{"index":0,"player":2},"events":[...]}
//! -> {"cmd":"submit_action","action":{"actor":1,"target":null,"kind":{"Move":{...}}}}
//! <- {"type":"action_accepted","action_id":1}
//! <- {"type":"state_delta","seq":2,...}
//! -> {"cmd":"end_turn"}
//! <- {"type":"protocol_error","message":"it is not your turn"}
//! ```

use serde::{Deserialize, Serialize};

use salvo_core::action::{ActionId, ActionRequest};
use salvo_core::events::GameEvent;
use salvo_core::phase::Phase;
use salvo_core::player::PlayerId;
use salvo_core::view::GameView;

use crate::error::ProtocolError;

// ============================================================================
// Client -> Server
// ============================================================================

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim a player slot by name.
    JoinGame {
        /// Player name from the scenario.
        name: String,
        /// Server password, if one is set.
        #[serde(default)]
        password: Option<String>,
    },
    /// Declare an action.
    SubmitAction {
        /// The declaration.
        action: ActionRequest,
    },
    /// Finish the current turn.
    EndTurn,
    /// Ask for a full resync.
    RequestSnapshot,
}

// ============================================================================
// Server -> Client
// ============================================================================

/// Turn holder carried by a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    /// Index into this phase's turn order.
    pub index: usize,
    /// Player holding the turn.
    pub player: PlayerId,
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join succeeded.
    Joined {
        /// Player slot now bound to this connection.
        player_id: PlayerId,
    },
    /// The submitted action was declared.
    ActionAccepted {
        /// Id assigned to it.
        action_id: ActionId,
    },
    /// The game refused the submitted action or turn control.
    ActionRejected {
        /// Why.
        reason: String,
    },
    /// Events since the previous delta.
    StateDelta {
        /// Sequence number, one higher than the last delta.
        seq: u64,
        /// Round after the events.
        round: u32,
        /// Phase after the events.
        phase: Phase,
        /// Turn holder after the events.
        turn: Option<TurnInfo>,
        /// Events in the order they happened.
        events: Vec<GameEvent>,
    },
    /// Whole visible state, sent on join and on request.
    FullSnapshot {
        /// Sequence number of the last delta the view includes.
        seq: u64,
        /// The state.
        view: GameView,
    },
    /// The message was refused before reaching the game.
    ProtocolError {
        /// Human-readable reason.
        message: String,
    },
}

impl From<ProtocolError> for ServerMessage {
    fn from(error: ProtocolError) -> Self {
        Self::ProtocolError {
            message: error.to_string(),
        }
    }
}

/// Decode one inbound line.
pub fn decode(line: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encode one outbound message, newline included.
pub fn encode(message: &ServerMessage) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

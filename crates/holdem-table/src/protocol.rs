//! Messages exchanged with a room.

use holdem_core::{ActionKind, Chips, HandResult, PlayerId, Seat};
use serde::{Deserialize, Serialize};

use crate::table::TableSnapshot;

/// Player requests, as they would arrive over a wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    Sit {
        name: String,
        seat: Option<Seat>,
        buy_in: Chips,
    },
    Leave,
    SitOut,
    SitIn,
    Action {
        action: ActionKind,
        #[serde(default)]
        amount: Option<Chips>,
    },
    Show,
}

/// Events a room pushes to each connected player or watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Table state filtered for the recipient.
    State { snapshot: Box<TableSnapshot> },
    TurnStarted {
        player_id: PlayerId,
        timeout_secs: u64,
    },
    TimedOut {
        player_id: PlayerId,
        action: ActionKind,
    },
    HandFinished { result: Box<HandResult> },
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "Action", "action": "raise", "amount": 12}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Action {
                action: ActionKind::Raise,
                amount: Some(12)
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "Action", "action": "allin"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Action {
                action: ActionKind::AllIn,
                amount: None
            }
        );
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "Action", "action": "muck"}"#).is_err());
    }

    #[test]
    fn test_server_message_is_tagged() {
        let json = ServerMessage::TurnStarted {
            player_id: 4,
            timeout_secs: 20,
        }
        .to_json()
        .unwrap();
        assert_eq!(json, r#"{"type":"TurnStarted","player_id":4,"timeout_secs":20}"#);
    }
}

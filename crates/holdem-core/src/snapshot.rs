use serde::{Deserialize, Serialize};

use crate::betting::{LegalActions, Street};
use crate::cards::Card;
use crate::participant::LastAction;
use crate::pot::Pot;
use crate::result::HandResult;
use crate::{Chips, PlayerId, Seat};

/// Who a snapshot is rendered for. Hole cards are only ever shown to their
/// owner, or to everyone once disclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewer {
    Player(PlayerId),
    Spectator,
}

impl Viewer {
    pub fn can_see(&self, owner: PlayerId) -> bool {
        matches!(self, Viewer::Player(id) if *id == owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub seat: Seat,
    pub stack: Chips,
    pub round_bet: Chips,
    pub total_bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub last_action: Option<LastAction>,
    /// Whether the player holds cards at all.
    pub has_cards: bool,
    /// Present only when the viewer may see them.
    pub hole_cards: Option<[Card; 2]>,
}

/// Serializable state of a hand as one viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSnapshot {
    pub hand_id: u64,
    pub started: bool,
    pub street: Street,
    pub board: Vec<Card>,
    pub pots: Vec<Pot>,
    pub total_pot: Chips,
    pub dealer_seat: Seat,
    pub small_blind_seat: Seat,
    pub big_blind_seat: Seat,
    pub current_actor: Option<PlayerId>,
    pub target: Chips,
    pub min_raise_to: Chips,
    pub last_aggressor: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    /// Filled in only for the player whose turn it is.
    pub legal_actions: Option<LegalActions>,
    pub is_over: bool,
    pub result: Option<HandResult>,
}

impl HandSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}

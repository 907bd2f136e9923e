use serde::{Deserialize, Serialize};

use crate::betting::Street;
use crate::cards::Card;
use crate::participant::LastAction;
use crate::pot::Pot;
use crate::{Chips, PlayerId, Seat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandEnding {
    /// Two or more players reached the river and compared hands.
    Showdown,
    /// Everyone else folded.
    Uncontested,
    /// Ended early by the table; pots went to the players still in.
    Forced,
    /// Ended early by the table; every commitment was refunded.
    Voided,
}

/// Chips paid out of one pot to one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub player_id: PlayerId,
    pub amount: Chips,
    pub pot_index: usize,
    /// Winning hand description. Absent when nobody had to show.
    pub hand: Option<String>,
}

/// Hole cards made public: at showdown, or shown voluntarily afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosedHand {
    pub player_id: PlayerId,
    pub cards: [Card; 2],
    pub hand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackChange {
    pub player_id: PlayerId,
    pub seat: Seat,
    pub starting: Chips,
    pub ending: Chips,
}

impl StackChange {
    pub fn net(&self) -> i64 {
        self.ending as i64 - self.starting as i64
    }
}

/// One entry in the hand's action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player_id: PlayerId,
    pub street: Street,
    pub action: LastAction,
    /// Chips moved from the stack by this action.
    pub chips: Chips,
    /// The player's round commitment afterwards.
    pub round_total: Chips,
}

/// Everything the table needs once a hand ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    pub hand_id: u64,
    pub ending: HandEnding,
    /// The street reached. Uncontested hands stop where the last fold happened.
    pub street: Street,
    pub board: Vec<Card>,
    pub pots: Vec<Pot>,
    pub winners: Vec<Award>,
    pub disclosed: Vec<DisclosedHand>,
    pub stacks: Vec<StackChange>,
    pub actions: Vec<ActionRecord>,
}

impl HandResult {
    pub fn total_won(&self, player_id: PlayerId) -> Chips {
        self.winners
            .iter()
            .filter(|a| a.player_id == player_id)
            .map(|a| a.amount)
            .sum()
    }

    pub fn stack_of(&self, player_id: PlayerId) -> Option<Chips> {
        self.stacks
            .iter()
            .find(|s| s.player_id == player_id)
            .map(|s| s.ending)
    }

    pub fn is_disclosed(&self, player_id: PlayerId) -> bool {
        self.disclosed.iter().any(|d| d.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> HandResult {
        HandResult {
            hand_id: 7,
            ending: HandEnding::Showdown,
            street: Street::Showdown,
            board: Vec::new(),
            pots: vec![Pot {
                amount: 30,
                eligible: vec![1, 2],
            }],
            winners: vec![
                Award {
                    player_id: 1,
                    amount: 15,
                    pot_index: 0,
                    hand: Some("Pair of Aces".to_string()),
                },
                Award {
                    player_id: 2,
                    amount: 15,
                    pot_index: 0,
                    hand: Some("Pair of Aces".to_string()),
                },
            ],
            disclosed: Vec::new(),
            stacks: vec![
                StackChange {
                    player_id: 1,
                    seat: 0,
                    starting: 100,
                    ending: 100,
                },
                StackChange {
                    player_id: 3,
                    seat: 2,
                    starting: 100,
                    ending: 85,
                },
            ],
            actions: Vec::new(),
        }
    }

    #[test]
    fn test_totals_and_net() {
        let result = result();
        assert_eq!(result.total_won(1), 15);
        assert_eq!(result.total_won(3), 0);
        assert_eq!(result.stack_of(3), Some(85));
        assert_eq!(result.stacks[1].net(), -15);
        assert!(!result.is_disclosed(1));
    }

    #[test]
    fn test_ending_serializes_snake_case() {
        let json = serde_json::to_string(&HandEnding::Uncontested).unwrap();
        assert_eq!(json, "\"uncontested\"");
    }
}

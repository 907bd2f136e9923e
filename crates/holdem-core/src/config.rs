use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::{Chips, PlayerId, Seat};

/// Blind and ante sizes for a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Posted by every dealt player before the blinds. Zero disables antes.
    pub ante: Chips,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            small_blind: 1,
            big_blind: 2,
            ante: 0,
        }
    }
}

impl HandConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.big_blind == 0 {
            return Err(EngineError::InvalidConfig(
                "big blind must be positive".to_string(),
            ));
        }
        if self.small_blind > self.big_blind {
            return Err(EngineError::InvalidConfig(format!(
                "small blind {} is larger than big blind {}",
                self.small_blind, self.big_blind
            )));
        }
        Ok(())
    }
}

/// How to settle a hand the table has to stop early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedEndPolicy {
    /// Split each pot among the players still eligible for it.
    #[default]
    AwardRemaining,
    /// Refund every commitment.
    Void,
}

/// One player as the table seats them for the next hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seating {
    pub player_id: PlayerId,
    pub seat: Seat,
    pub stack: Chips,
    /// Sitting-out players are not dealt in.
    #[serde(default)]
    pub sitting_out: bool,
}

/// Everything needed to start one hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSetup {
    pub hand_id: u64,
    pub config: HandConfig,
    /// Seat holding the dealer button. If nobody dealt in sits there, the
    /// button passes to the next occupied seat clockwise.
    pub dealer_seat: Seat,
    pub players: Vec<Seating>,
}

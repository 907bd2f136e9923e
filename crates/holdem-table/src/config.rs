use std::path::Path;
use std::time::Duration;

use holdem_core::session::MAX_PLAYERS;
use holdem_core::{ForcedEndPolicy, HandConfig};
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Table-level settings. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub blinds: HandConfig,
    pub table_capacity: u8,
    /// Seconds a player has to act before the timeout action is applied.
    pub turn_timer_secs: u64,
    /// Finished hands kept for the history view.
    pub history_len: usize,
    /// What happens to a hand when a player still in it leaves.
    pub forced_end: ForcedEndPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            blinds: HandConfig::default(),
            table_capacity: 9,
            turn_timer_secs: 20,
            history_len: 5,
            forced_end: ForcedEndPolicy::default(),
        }
    }
}

impl TableConfig {
    /// Load a JSON config file and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path)?;
        let config: TableConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TableError> {
        self.blinds.validate()?;
        if self.table_capacity < 2 || usize::from(self.table_capacity) > MAX_PLAYERS {
            return Err(TableError::Config(format!(
                "table capacity must be between 2 and {MAX_PLAYERS}, got {}",
                self.table_capacity
            )));
        }
        if self.turn_timer_secs == 0 {
            return Err(TableError::Config(
                "turn timer must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn turn_timer(&self) -> Duration {
        Duration::from_secs(self.turn_timer_secs)
    }
}

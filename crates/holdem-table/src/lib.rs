//! Cash-game table on top of the hand engine.
//!
//! [`Table`] seats players and carries their stacks from hand to hand;
//! [`room`] runs a table on a tokio task with per-player channels and the
//! turn clock.

pub mod config;
pub mod error;
pub mod protocol;
pub mod room;
pub mod table;

pub use config::TableConfig;
pub use error::TableError;
pub use protocol::{ClientMessage, ServerMessage};
pub use room::{PlayerRx, PlayerTx, RoomHandle};
pub use table::{Departure, HandSummary, SeatView, SeatedPlayer, Table, TableSnapshot};

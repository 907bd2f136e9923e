//! No-limit Texas Hold'em hand engine.
//!
//! A [`HandSession`] runs one hand: it deals, posts blinds, validates
//! actions, builds side pots and settles the showdown. It does no I/O and
//! never reads the clock, so the table layer decides when a player has
//! timed out and feeds that in as an action.

pub mod betting;
pub mod cards;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod participant;
pub mod pot;
pub mod result;
pub mod session;
pub mod snapshot;

/// Chip amounts. Chips are indivisible.
pub type Chips = u64;
pub type PlayerId = u32;
pub type Seat = u8;

pub use betting::{ActionKind, BettingRound, LegalActions, Street};
pub use cards::{Card, Deck, Rank, Suit};
pub use config::{ForcedEndPolicy, HandConfig, HandSetup, Seating};
pub use error::EngineError;
pub use evaluator::{HandCategory, RankedHand};
pub use participant::{LastAction, Participant};
pub use pot::{Pot, PotLedger};
pub use result::{ActionRecord, Award, DisclosedHand, HandEnding, HandResult, StackChange};
pub use session::HandSession;
pub use snapshot::{HandSnapshot, PlayerView, Viewer};

use thiserror::Error;

use crate::Chips;

/// Every way the engine can reject a call.
///
/// All variants are local and recoverable: when an operation returns one of
/// these, the hand session is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed input: unknown action, missing or zero amount.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("cannot check: {to_call} to call")]
    IllegalCheck { to_call: Chips },

    #[error("cannot call: there is nothing to call")]
    IllegalCall,

    #[error("illegal bet: {0}")]
    IllegalBet(String),

    #[error("illegal raise: {0}")]
    IllegalRaise(String),

    #[error("it is not player {0}'s turn")]
    NotYourTurn(u32),

    #[error("the hand is already over")]
    HandOver,

    #[error("the hand has not been started")]
    HandNotStarted,

    #[error("deck exhausted: requested {requested}, {remaining} remaining")]
    DeckExhausted { requested: usize, remaining: usize },

    #[error("at least 2 eligible players are needed, found {0}")]
    InsufficientParticipants(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("a board must have 3 to 5 cards, got {0}")]
    InvalidBoard(usize),

    #[error("invalid card: {0:?}")]
    InvalidCard(String),
}

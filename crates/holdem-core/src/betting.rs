use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::participant::{LastAction, Participant};
use crate::{Chips, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    pub fn next(self) -> Street {
        match self {
            Street::Preflop => Street::Flop,
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River | Street::Showdown => Street::Showdown,
        }
    }

    /// Board cards dealt when this street opens.
    pub fn cards_dealt(self) -> usize {
        match self {
            Street::Flop => 3,
            Street::Turn | Street::River => 1,
            Street::Preflop | Street::Showdown => 0,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Street::Preflop => "preflop",
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
            Street::Showdown => "showdown",
        };
        write!(f, "{name}")
    }
}

/// A betting decision as submitted by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    /// Amount is the player's total for the round.
    Bet,
    /// Amount is the new total for the round, not the increment.
    Raise,
    AllIn,
}

impl FromStr for ActionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fold" => Ok(ActionKind::Fold),
            "check" => Ok(ActionKind::Check),
            "call" => Ok(ActionKind::Call),
            "bet" => Ok(ActionKind::Bet),
            "raise" => Ok(ActionKind::Raise),
            "allin" | "all-in" | "all_in" => Ok(ActionKind::AllIn),
            other => Err(EngineError::InvalidAction(format!("unknown action {other:?}"))),
        }
    }
}

/// State of the betting on the current street.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingRound {
    pub street: Street,
    /// Round commitment every live, non-all-in player has to match.
    pub target: Chips,
    /// Smallest legal raise increment.
    pub min_raise: Chips,
    pub last_aggressor: Option<PlayerId>,
}

impl BettingRound {
    pub fn new(street: Street, target: Chips, big_blind: Chips) -> Self {
        Self {
            street,
            target,
            min_raise: big_blind,
            last_aggressor: None,
        }
    }

    /// Smallest total a raise (or opening bet) may reach without going all-in.
    pub fn min_raise_to(&self, big_blind: Chips) -> Chips {
        if self.target == 0 {
            big_blind
        } else {
            self.target + self.min_raise
        }
    }
}

/// Whether `p` still owes a decision on this street.
pub fn needs_action(p: &Participant, target: Chips) -> bool {
    p.can_act() && !(p.acted && p.round_bet == target)
}

/// The round is over once nobody able to act still owes a decision, or when
/// at most one such player is left and they already match the target.
pub fn is_round_complete(participants: &[Participant], target: Chips) -> bool {
    let actors: Vec<&Participant> = participants.iter().filter(|p| p.can_act()).collect();
    if actors.len() <= 1 && actors.iter().all(|p| p.round_bet >= target) {
        return true;
    }
    actors.iter().all(|p| !needs_action(p, target))
}

/// First participant clockwise after index `after` who owes a decision.
pub fn next_actor(participants: &[Participant], after: usize, target: Chips) -> Option<usize> {
    if is_round_complete(participants, target) {
        return None;
    }
    let n = participants.len();
    (1..=n)
        .map(|step| (after + step) % n)
        .find(|&i| needs_action(&participants[i], target))
}

/// What the engine can tell an acting player about their options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalActions {
    pub can_check: bool,
    pub call_amount: Chips,
    pub can_bet: bool,
    pub can_raise: bool,
    /// Smallest legal bet or raise total, short of going all-in.
    pub min_total: Chips,
    /// Round total if the player shoves.
    pub max_total: Chips,
}

pub fn legal_actions(round: &BettingRound, p: &Participant, big_blind: Chips) -> LegalActions {
    let to_call = round.target.saturating_sub(p.round_bet);
    let max_total = p.round_bet + p.stack;
    LegalActions {
        can_check: to_call == 0,
        call_amount: to_call.min(p.stack),
        can_bet: round.target == 0 && p.stack > 0,
        can_raise: round.target > 0 && !p.acted && max_total > round.target,
        min_total: round.min_raise_to(big_blind).min(max_total),
        max_total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Aggression {
    new_target: Chips,
    /// Full bets and raises reopen the action; short all-ins do not.
    full: bool,
}

/// A validated action, ready to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    Fold,
    Check,
    Commit {
        chips: Chips,
        label: LastAction,
        aggression: Option<Aggression>,
    },
}

fn require_amount(kind: ActionKind, amount: Option<Chips>) -> Result<Chips, EngineError> {
    match amount {
        Some(a) if a > 0 => Ok(a),
        _ => Err(EngineError::InvalidAction(format!(
            "{kind:?} needs a positive amount"
        ))),
    }
}

/// Validate an action against the round without touching any state.
pub(crate) fn plan(
    round: &BettingRound,
    p: &Participant,
    kind: ActionKind,
    amount: Option<Chips>,
    big_blind: Chips,
) -> Result<Plan, EngineError> {
    let to_call = round.target.saturating_sub(p.round_bet);
    match kind {
        ActionKind::Fold => Ok(Plan::Fold),
        ActionKind::Check => {
            if to_call == 0 {
                Ok(Plan::Check)
            } else {
                Err(EngineError::IllegalCheck { to_call })
            }
        }
        ActionKind::Call => {
            if to_call == 0 {
                return Err(EngineError::IllegalCall);
            }
            Ok(Plan::Commit {
                chips: to_call.min(p.stack),
                label: LastAction::Call,
                aggression: None,
            })
        }
        ActionKind::Bet => {
            let amount = require_amount(kind, amount)?;
            if round.target > 0 {
                return Err(EngineError::IllegalBet(format!(
                    "there is already a bet of {}; raise instead",
                    round.target
                )));
            }
            bet_plan(p, amount, big_blind, LastAction::Bet)
        }
        ActionKind::Raise => {
            let amount = require_amount(kind, amount)?;
            if round.target == 0 {
                return Err(EngineError::IllegalRaise(
                    "there is no bet to raise; bet instead".to_string(),
                ));
            }
            raise_plan(round, p, amount, LastAction::Raise)
        }
        ActionKind::AllIn => {
            let max_total = p.round_bet + p.stack;
            if max_total <= round.target {
                Ok(Plan::Commit {
                    chips: p.stack,
                    label: LastAction::AllIn,
                    aggression: None,
                })
            } else if round.target == 0 {
                bet_plan(p, max_total, big_blind, LastAction::AllIn)
            } else {
                raise_plan(round, p, max_total, LastAction::AllIn)
            }
        }
    }
}

fn bet_plan(
    p: &Participant,
    amount: Chips,
    big_blind: Chips,
    label: LastAction,
) -> Result<Plan, EngineError> {
    let chips = amount.saturating_sub(p.round_bet).min(p.stack);
    let total = p.round_bet + chips;
    let all_in = chips == p.stack;
    if total < big_blind && !all_in {
        return Err(EngineError::IllegalBet(format!(
            "a bet must be at least the big blind of {big_blind}"
        )));
    }
    Ok(Plan::Commit {
        chips,
        label,
        aggression: Some(Aggression {
            new_target: total,
            full: true,
        }),
    })
}

fn raise_plan(
    round: &BettingRound,
    p: &Participant,
    amount: Chips,
    label: LastAction,
) -> Result<Plan, EngineError> {
    if p.acted {
        return Err(EngineError::IllegalRaise(
            "betting has not been reopened; call or fold".to_string(),
        ));
    }
    let chips = amount.saturating_sub(p.round_bet).min(p.stack);
    let total = p.round_bet + chips;
    let all_in = chips == p.stack;
    if total <= round.target {
        return Err(EngineError::IllegalRaise(format!(
            "a raise must go above the current bet of {}",
            round.target
        )));
    }
    let min_to = round.target + round.min_raise;
    if total < min_to && !all_in {
        return Err(EngineError::IllegalRaise(format!(
            "a raise must be to at least {min_to}"
        )));
    }
    Ok(Plan::Commit {
        chips,
        label,
        aggression: Some(Aggression {
            new_target: total,
            full: total >= min_to,
        }),
    })
}

/// Apply a validated plan. Returns the chips moved into the pot.
pub(crate) fn execute(
    round: &mut BettingRound,
    participants: &mut [Participant],
    idx: usize,
    plan: Plan,
    big_blind: Chips,
) -> Chips {
    let player_id = participants[idx].id;
    match plan {
        Plan::Fold => {
            let p = &mut participants[idx];
            p.folded = true;
            p.acted = true;
            p.last_action = Some(LastAction::Fold);
            0
        }
        Plan::Check => {
            let p = &mut participants[idx];
            p.acted = true;
            p.last_action = Some(LastAction::Check);
            0
        }
        Plan::Commit {
            chips,
            label,
            aggression,
        } => {
            let paid = {
                let p = &mut participants[idx];
                let paid = p.commit(chips);
                p.acted = true;
                p.last_action = Some(label);
                paid
            };
            if let Some(Aggression { new_target, full }) = aggression {
                if full {
                    let increment = new_target - round.target;
                    round.min_raise = increment.max(big_blind);
                    for (i, other) in participants.iter_mut().enumerate() {
                        if i != idx {
                            other.acted = false;
                        }
                    }
                }
                round.target = new_target;
                round.last_aggressor = Some(player_id);
            }
            paid
        }
    }
}

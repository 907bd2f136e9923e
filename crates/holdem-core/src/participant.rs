use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::config::Seating;
use crate::{Chips, PlayerId, Seat};

/// The last thing a participant did this hand, including forced posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastAction {
    Ante,
    SmallBlind,
    BigBlind,
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// Per-hand view of a player.
///
/// Owned by the hand session; the starting stack plus net result flow back
/// to the table only through the hand result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PlayerId,
    pub seat: Seat,
    pub starting_stack: Chips,
    pub stack: Chips,
    /// Chips committed in the current betting round.
    pub round_bet: Chips,
    /// Chips committed over the whole hand, antes included.
    pub total_bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    /// Has acted since the last full bet or raise on this street.
    pub acted: bool,
    pub last_action: Option<LastAction>,
    pub hole_cards: Option<[Card; 2]>,
}

impl Participant {
    pub fn new(seating: &Seating) -> Self {
        Self {
            id: seating.player_id,
            seat: seating.seat,
            starting_stack: seating.stack,
            stack: seating.stack,
            round_bet: 0,
            total_bet: 0,
            folded: false,
            all_in: false,
            acted: false,
            last_action: None,
            hole_cards: None,
        }
    }

    /// Still contesting the pot.
    pub fn is_live(&self) -> bool {
        !self.folded
    }

    /// Still able to make betting decisions.
    pub fn can_act(&self) -> bool {
        !self.folded && !self.all_in
    }

    /// Move up to `amount` from the stack into this round's bet. Returns the
    /// chips actually moved; emptying the stack marks the player all-in.
    pub(crate) fn commit(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.round_bet += paid;
        self.total_bet += paid;
        if self.stack == 0 && paid > 0 {
            self.all_in = true;
        }
        paid
    }

    /// Like [`commit`](Self::commit) but the chips are dead money that does
    /// not count toward the round bet (antes).
    pub(crate) fn post_dead(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.total_bet += paid;
        if self.stack == 0 && paid > 0 {
            self.all_in = true;
        }
        paid
    }

    /// Clear per-round state when a new street starts.
    pub(crate) fn reset_round(&mut self) {
        self.round_bet = 0;
        self.acted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(stack: Chips) -> Participant {
        Participant::new(&Seating {
            player_id: 1,
            seat: 0,
            stack,
            sitting_out: false,
        })
    }

    #[test]
    fn test_commit_caps_at_stack() {
        let mut p = participant(10);
        assert_eq!(p.commit(4), 4);
        assert_eq!((p.stack, p.round_bet, p.total_bet), (6, 4, 4));
        assert!(!p.all_in);

        assert_eq!(p.commit(50), 6);
        assert_eq!((p.stack, p.round_bet, p.total_bet), (0, 10, 10));
        assert!(p.all_in);
        assert!(!p.can_act());
        assert!(p.is_live());
    }

    #[test]
    fn test_dead_money_skips_round_bet() {
        let mut p = participant(3);
        assert_eq!(p.post_dead(5), 3);
        assert_eq!((p.round_bet, p.total_bet), (0, 3));
        assert!(p.all_in);
    }

    #[test]
    fn test_reset_round_keeps_hand_totals() {
        let mut p = participant(100);
        p.commit(20);
        p.acted = true;
        p.reset_round();
        assert_eq!((p.round_bet, p.total_bet, p.acted), (0, 20, false));
    }
}

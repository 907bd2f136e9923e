use serde::{Deserialize, Serialize};

use crate::participant::Participant;
use crate::{Chips, PlayerId};

/// A slice of the chips in the middle and who can win it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: Chips,
    /// Non-folded participants whose commitment covers this pot's level.
    pub eligible: Vec<PlayerId>,
}

/// Main pot plus side pots, rebuilt from hand commitments after every
/// chip movement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PotLedger {
    pots: Vec<Pot>,
    distributed: Chips,
}

impl PotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recompute(&mut self, participants: &[Participant]) {
        self.pots = compute_pots(participants);
    }

    /// Pots in creation order: main pot first.
    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    /// Every chip committed this hand.
    pub fn total(&self) -> Chips {
        self.pots.iter().map(|p| p.amount).sum()
    }

    /// Committed chips not yet paid back out.
    pub fn outstanding(&self) -> Chips {
        self.total() - self.distributed
    }

    pub(crate) fn mark_distributed(&mut self, amount: Chips) {
        self.distributed += amount;
    }
}

/// Split hand commitments into pots.
///
/// Levels come from the distinct totals of non-folded participants. Each
/// pot collects, from every participant folded or not, the part of their
/// commitment between the previous level and its own. Folded chips above
/// the highest level land in the last pot.
pub fn compute_pots(participants: &[Participant]) -> Vec<Pot> {
    let committed: Chips = participants.iter().map(|p| p.total_bet).sum();
    if committed == 0 {
        return Vec::new();
    }

    let mut levels: Vec<Chips> = participants
        .iter()
        .filter(|p| p.is_live() && p.total_bet > 0)
        .map(|p| p.total_bet)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    if levels.is_empty() {
        return vec![Pot {
            amount: committed,
            eligible: participants
                .iter()
                .filter(|p| p.is_live())
                .map(|p| p.id)
                .collect(),
        }];
    }

    let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
    let mut prev = 0;
    for level in levels {
        let amount = participants
            .iter()
            .map(|p| p.total_bet.min(level) - p.total_bet.min(prev))
            .sum();
        let eligible = participants
            .iter()
            .filter(|p| p.is_live() && p.total_bet >= level)
            .map(|p| p.id)
            .collect();
        pots.push(Pot { amount, eligible });
        prev = level;
    }

    let excess: Chips = participants
        .iter()
        .map(|p| p.total_bet.saturating_sub(prev))
        .sum();
    if let Some(last) = pots.last_mut() {
        last.amount += excess;
    }
    pots
}

/// Divide `amount` between `winners`, which must already be in odd-chip
/// order. The remainder goes out one chip at a time from the front.
pub fn split(amount: Chips, winners: &[PlayerId]) -> Vec<(PlayerId, Chips)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let n = winners.len() as Chips;
    let share = amount / n;
    let remainder = (amount % n) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, share + Chips::from(i < remainder)))
        .collect()
}

/// Sort `ids` by their position in `order`. Unknown ids go last.
pub fn in_order(ids: &[PlayerId], order: &[PlayerId]) -> Vec<PlayerId> {
    let mut sorted = ids.to_vec();
    sorted.sort_by_key(|id| order.iter().position(|o| o == id).unwrap_or(usize::MAX));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Seating;

    fn committed(id: PlayerId, total: Chips, folded: bool) -> Participant {
        let mut p = Participant::new(&Seating {
            player_id: id,
            seat: id as u8,
            stack: 1_000,
            sitting_out: false,
        });
        p.commit(total);
        p.folded = folded;
        p
    }

    #[test]
    fn test_three_way_all_in_levels() {
        let players = vec![
            committed(0, 200, false),
            committed(1, 10, false),
            committed(2, 50, false),
        ];
        let pots = compute_pots(&players);
        assert_eq!(pots.len(), 3);
        assert_eq!(pots[0], Pot { amount: 30, eligible: vec![0, 1, 2] });
        assert_eq!(pots[1], Pot { amount: 80, eligible: vec![0, 2] });
        assert_eq!(pots[2], Pot { amount: 150, eligible: vec![0] });
    }

    #[test]
    fn test_equal_commitments_make_one_pot() {
        let players = vec![committed(0, 40, false), committed(1, 40, false)];
        assert_eq!(
            compute_pots(&players),
            vec![Pot { amount: 80, eligible: vec![0, 1] }]
        );
    }

    #[test]
    fn test_folded_chips_are_dead_money() {
        // Folded player 2 put in 30 before folding to a raise.
        let players = vec![
            committed(0, 100, false),
            committed(1, 100, false),
            committed(2, 30, true),
        ];
        let pots = compute_pots(&players);
        assert_eq!(pots, vec![Pot { amount: 230, eligible: vec![0, 1] }]);
    }

    #[test]
    fn test_folded_excess_goes_to_top_pot() {
        let players = vec![
            committed(0, 20, false),
            committed(1, 50, false),
            committed(2, 80, true),
        ];
        let pots = compute_pots(&players);
        assert_eq!(pots[0], Pot { amount: 60, eligible: vec![0, 1] });
        assert_eq!(pots[1], Pot { amount: 90, eligible: vec![1] });
        let total: Chips = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 150);
    }

    #[test]
    fn test_ledger_matches_commitments() {
        let players = vec![
            committed(0, 7, false),
            committed(1, 13, true),
            committed(2, 29, false),
            committed(3, 29, false),
        ];
        let mut ledger = PotLedger::new();
        ledger.recompute(&players);
        assert_eq!(ledger.total(), 78);
        assert_eq!(ledger.outstanding(), 78);
        ledger.mark_distributed(78);
        assert_eq!(ledger.outstanding(), 0);
    }

    #[test]
    fn test_nothing_committed_means_no_pots() {
        let players = vec![committed(0, 0, false), committed(1, 0, false)];
        assert!(compute_pots(&players).is_empty());
    }

    #[test]
    fn test_split_gives_remainder_in_order() {
        assert_eq!(split(10, &[4, 2]), vec![(4, 5), (2, 5)]);
        assert_eq!(split(11, &[4, 2]), vec![(4, 6), (2, 5)]);
        assert_eq!(split(5, &[1, 2, 3]), vec![(1, 2), (2, 2), (3, 1)]);
        assert!(split(5, &[]).is_empty());
    }

    #[test]
    fn test_in_order_follows_reference() {
        assert_eq!(in_order(&[3, 1, 2], &[2, 3, 1]), vec![2, 3, 1]);
        assert_eq!(in_order(&[9, 1], &[1]), vec![1, 9]);
    }
}

//! Hold'em hand evaluation.
//!
//! [`evaluate`] picks the best five of the (up to) seven available cards and
//! returns a [`RankedHand`]. Ranked hands form a total order that compares
//! category first, then tiebreak ranks; equal hands compare `Equal`, so a
//! chop is detected rather than broken arbitrarily.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;
use crate::cards::{Card, Rank};
use crate::error::EngineError;

/// Hand category, from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandCategory {
    /// No made hand, only high card.
    HighCard,
    /// Two cards of the same rank.
    Pair,
    /// Two different pairs.
    TwoPair,
    /// Three cards of the same rank.
    ThreeOfAKind,
    /// Five consecutive ranks.
    Straight,
    /// Five cards of the same suit.
    Flush,
    /// Three of a kind plus a pair.
    FullHouse,
    /// Four cards of the same rank.
    FourOfAKind,
    /// Five consecutive cards of the same suit.
    StraightFlush,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandCategory::HighCard => write!(f, "High Card"),
            HandCategory::Pair => write!(f, "Pair"),
            HandCategory::TwoPair => write!(f, "Two Pair"),
            HandCategory::ThreeOfAKind => write!(f, "Three of a Kind"),
            HandCategory::Straight => write!(f, "Straight"),
            HandCategory::Flush => write!(f, "Flush"),
            HandCategory::FullHouse => write!(f, "Full House"),
            HandCategory::FourOfAKind => write!(f, "Four of a Kind"),
            HandCategory::StraightFlush => write!(f, "Straight Flush"),
        }
    }
}

/// The best five-card hand a player holds.
///
/// Ordering and equality look only at `category` and `tiebreak`; the
/// concrete `cards` are kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedHand {
    pub category: HandCategory,
    /// Ranks that break ties within the category, most significant first.
    /// Straights carry only their top card (a wheel is five-high).
    pub tiebreak: Vec<Rank>,
    /// The five cards, grouped and ordered by significance.
    pub cards: [Card; 5],
}

impl PartialEq for RankedHand {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedHand {}

impl PartialOrd for RankedHand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedHand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.tiebreak.cmp(&other.tiebreak))
    }
}

impl RankedHand {
    /// Human-readable description, e.g. "Full House, Kings over Fives".
    pub fn describe(&self) -> String {
        let t = &self.tiebreak;
        let first = t.first().copied().unwrap_or(Rank::Two);
        match self.category {
            HandCategory::HighCard => format!("{} High", first.name()),
            HandCategory::Pair => format!("Pair of {}", first.plural()),
            HandCategory::TwoPair => format!(
                "Two Pair, {} and {}",
                first.plural(),
                t.get(1).copied().unwrap_or(Rank::Two).plural()
            ),
            HandCategory::ThreeOfAKind => format!("Three of a Kind, {}", first.plural()),
            HandCategory::Straight => format!("Straight, {} High", first.name()),
            HandCategory::Flush => format!("Flush, {} High", first.name()),
            HandCategory::FullHouse => format!(
                "Full House, {} over {}",
                first.plural(),
                t.get(1).copied().unwrap_or(Rank::Two).plural()
            ),
            HandCategory::FourOfAKind => format!("Four of a Kind, {}", first.plural()),
            HandCategory::StraightFlush if first == Rank::Ace => "Royal Flush".to_string(),
            HandCategory::StraightFlush => format!("Straight Flush, {} High", first.name()),
        }
    }

    /// True when all five cards come from `board`, i.e. the board plays.
    pub fn plays_board(&self, board: &[Card]) -> bool {
        self.cards.iter().all(|c| board.contains(c))
    }
}

impl fmt::Display for RankedHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Rank exactly five cards.
pub fn rank_five(cards: [Card; 5]) -> RankedHand {
    let mut sorted = cards;
    sorted.sort_by(|a, b| b.rank().cmp(&a.rank()));

    let is_flush = sorted.iter().all(|c| c.suit() == sorted[0].suit());

    // (count, rank), sorted by count descending, then rank descending.
    let mut groups: Vec<(usize, Rank)> = Vec::with_capacity(5);
    for card in &sorted {
        match groups.iter_mut().find(|g| g.1 == card.rank()) {
            Some(group) => group.0 += 1,
            None => groups.push((1, card.rank())),
        }
    }
    groups.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    let counts: Vec<usize> = groups.iter().map(|g| g.0).collect();

    let straight_high = straight_high(&sorted, groups.len());

    let category = match (is_flush, straight_high, counts.as_slice()) {
        (true, Some(_), _) => HandCategory::StraightFlush,
        (_, _, [4, 1]) => HandCategory::FourOfAKind,
        (_, _, [3, 2]) => HandCategory::FullHouse,
        (true, None, _) => HandCategory::Flush,
        (false, Some(_), _) => HandCategory::Straight,
        (_, _, [3, 1, 1]) => HandCategory::ThreeOfAKind,
        (_, _, [2, 2, 1]) => HandCategory::TwoPair,
        (_, _, [2, 1, 1, 1]) => HandCategory::Pair,
        _ => HandCategory::HighCard,
    };

    let tiebreak = match straight_high {
        Some(high) if matches!(category, HandCategory::Straight | HandCategory::StraightFlush) => {
            vec![high]
        }
        _ => groups.iter().map(|g| g.1).collect(),
    };

    // Order cards by group significance; a wheel puts its ace last.
    let significance = |card: &Card| groups.iter().position(|g| g.1 == card.rank());
    sorted.sort_by_key(|c| significance(c));
    if straight_high == Some(Rank::Five) {
        sorted.rotate_left(1);
    }

    RankedHand {
        category,
        tiebreak,
        cards: sorted,
    }
}

/// Top rank of a straight among five cards sorted high to low, if any.
fn straight_high(sorted: &[Card; 5], distinct: usize) -> Option<Rank> {
    if distinct != 5 {
        return None;
    }
    let top = sorted[0].rank() as u8;
    let bottom = sorted[4].rank() as u8;
    if top - bottom == 4 {
        return Some(sorted[0].rank());
    }
    // A-2-3-4-5
    if sorted[0].rank() == Rank::Ace && sorted[1].rank() == Rank::Five {
        return Some(Rank::Five);
    }
    None
}

/// Best hand from two hole cards and three to five board cards.
pub fn evaluate(hole: [Card; 2], board: &[Card]) -> Result<RankedHand, EngineError> {
    if !(3..=5).contains(&board.len()) {
        return Err(EngineError::InvalidBoard(board.len()));
    }
    let mut all = Vec::with_capacity(7);
    all.extend_from_slice(&hole);
    all.extend_from_slice(board);
    Ok(best_five(&all))
}

/// Best five-card hand among 5 to 7 cards, by trying every combination.
fn best_five(cards: &[Card]) -> RankedHand {
    let n = cards.len();
    let mut best: Option<RankedHand> = None;
    for mask in 0u32..(1 << n) {
        if mask.count_ones() != 5 {
            continue;
        }
        let mut pick = [cards[0]; 5];
        let mut k = 0;
        for (i, card) in cards.iter().enumerate() {
            if mask & (1 << i) != 0 {
                pick[k] = *card;
                k += 1;
            }
        }
        let ranked = rank_five(pick);
        if best.as_ref().is_none_or(|b| ranked > *b) {
            best = Some(ranked);
        }
    }
    // n >= 5 is guaranteed by `evaluate`, so at least one combination exists.
    best.unwrap_or_else(|| rank_five([cards[0]; 5]))
}

/// Group players into equal-strength buckets, strongest first.
///
/// Everyone in the first bucket is a co-winner. Within a bucket, players
/// keep their input order.
pub fn best_of(
    players: &[(PlayerId, [Card; 2])],
    board: &[Card],
) -> Result<Vec<Vec<PlayerId>>, EngineError> {
    let mut ranked: Vec<(PlayerId, RankedHand)> = players
        .iter()
        .map(|(id, hole)| evaluate(*hole, board).map(|hand| (*id, hand)))
        .collect::<Result<_, _>>()?;
    // Stable sort keeps input order among equals.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut groups: Vec<Vec<PlayerId>> = Vec::new();
    let mut previous: Option<&RankedHand> = None;
    for (id, hand) in &ranked {
        match (previous, groups.last_mut()) {
            (Some(prev), Some(group)) if prev == hand => group.push(*id),
            _ => groups.push(vec![*id]),
        }
        previous = Some(hand);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn hole(text: &str) -> [Card; 2] {
        let cards = parse_cards(text).unwrap();
        [cards[0], cards[1]]
    }

    fn eval(h: &str, board: &str) -> RankedHand {
        evaluate(hole(h), &parse_cards(board).unwrap()).unwrap()
    }

    #[test]
    fn test_categories() {
        let cases = [
            ("As Ks", "Qs Js Ts 2h 3c", HandCategory::StraightFlush),
            ("Ks Kh", "Kd Kc As 2h 3c", HandCategory::FourOfAKind),
            ("Qs Qh", "Qd Jc Js 2h 3c", HandCategory::FullHouse),
            ("Ac Tc", "7c 4c 2c Kh 3d", HandCategory::Flush),
            ("9s 8h", "7c 6d 5s 2h Kc", HandCategory::Straight),
            ("Js Jh", "Jd Ac Ks 2h 3c", HandCategory::ThreeOfAKind),
            ("As Ah", "Kd Kc 2s 3h 4c", HandCategory::TwoPair),
            ("Qs Qh", "Ad Kc Js 2h 3c", HandCategory::Pair),
            ("As Kh", "9d 7c 4s 2h 3c", HandCategory::HighCard),
        ];
        for (h, b, expected) in cases {
            assert_eq!(eval(h, b).category, expected, "{h} on {b}");
        }
    }

    #[test]
    fn test_wheel_is_five_high() {
        let wheel = eval("As 2h", "3c 4d 5s Kh Qc");
        assert_eq!(wheel.category, HandCategory::Straight);
        assert_eq!(wheel.tiebreak, vec![Rank::Five]);
        assert_eq!(wheel.cards[4].rank(), Rank::Ace);

        let six_high = eval("6s 2h", "3c 4d 5s Kh Qc");
        assert!(six_high > wheel);
    }

    #[test]
    fn test_steel_wheel_is_straight_flush() {
        let hand = eval("Ah 2h", "3h 4h 5h Kd Qc");
        assert_eq!(hand.category, HandCategory::StraightFlush);
        assert_eq!(hand.describe(), "Straight Flush, Five High");
    }

    #[test]
    fn test_kicker_breaks_tie() {
        let board = "Ah 9c 7s 6h 2d";
        let ak = eval("As Kh", board);
        let aq = eval("Ad Qc", board);
        assert_eq!(ak.category, HandCategory::Pair);
        assert!(ak > aq);
    }

    #[test]
    fn test_two_pair_uses_best_kicker() {
        // Third pair on board is ignored; the kicker is the ace.
        let hand = eval("Kd Kc", "Qs Qh 5d 5c Ah");
        assert_eq!(hand.category, HandCategory::TwoPair);
        assert_eq!(hand.tiebreak, vec![Rank::King, Rank::Queen, Rank::Ace]);
    }

    #[test]
    fn test_full_house_prefers_higher_trips() {
        let hand = eval("7d 7c", "7s Ks Kh Kd 2c");
        assert_eq!(hand.category, HandCategory::FullHouse);
        assert_eq!(hand.describe(), "Full House, Kings over Sevens");
    }

    #[test]
    fn test_board_plays_is_a_tie() {
        let board = parse_cards("Th Jc Qs Kh Ad").unwrap();
        let a = evaluate(hole("2s 3h"), &board).unwrap();
        let b = evaluate(hole("2d 3c"), &board).unwrap();
        assert_eq!(a, b);
        assert!(a.plays_board(&board));

        let groups = best_of(&[(1, hole("2s 3h")), (2, hole("2d 3c"))], &board).unwrap();
        assert_eq!(groups, vec![vec![1, 2]]);
    }

    #[test]
    fn test_best_of_orders_groups() {
        let board = parse_cards("Ah 9c 7s 6h 2d").unwrap();
        let groups = best_of(
            &[
                (1, hole("Kc Qd")),
                (2, hole("As Kh")),
                (3, hole("Ac Kd")),
                (4, hole("9h 9s")),
            ],
            &board,
        )
        .unwrap();
        assert_eq!(groups, vec![vec![4], vec![2, 3], vec![1]]);
    }

    #[test]
    fn test_flop_only_evaluation() {
        let hand = eval("As Ad", "Ac 7h 2s");
        assert_eq!(hand.category, HandCategory::ThreeOfAKind);
    }

    #[test]
    fn test_board_size_is_checked() {
        let err = evaluate(hole("As Ad"), &parse_cards("Ac 7h").unwrap()).unwrap_err();
        assert_eq!(err, EngineError::InvalidBoard(2));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(eval("As Ks", "Qs Js Ts 2h 3c").describe(), "Royal Flush");
        assert_eq!(eval("Qs Qh", "Ad Kc Js 2h 3c").describe(), "Pair of Queens");
        assert_eq!(eval("As Ah", "Kd Kc 2s 3h 4c").describe(), "Two Pair, Aces and Kings");
        assert_eq!(eval("As Kh", "9d 7c 4s 2h 3c").describe(), "Ace High");
        assert_eq!(eval("5s 6h", "6d 7c 4s 2h 3c").describe(), "Straight, Seven High");
    }

    #[test]
    fn test_category_ordering() {
        assert!(HandCategory::StraightFlush > HandCategory::FourOfAKind);
        assert!(HandCategory::FourOfAKind > HandCategory::FullHouse);
        assert!(HandCategory::FullHouse > HandCategory::Flush);
        assert!(HandCategory::Flush > HandCategory::Straight);
        assert!(HandCategory::Straight > HandCategory::ThreeOfAKind);
        assert!(HandCategory::ThreeOfAKind > HandCategory::TwoPair);
        assert!(HandCategory::TwoPair > HandCategory::Pair);
        assert!(HandCategory::Pair > HandCategory::HighCard);
    }
}

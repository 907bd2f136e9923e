//! Cards and the dealing deck.
//!
//! Cards are plain value types: a [`Rank`] and a [`Suit`].  On the wire a
//! card is its two-character text form (`"As"`, `"Td"`), parsed back with
//! [`FromStr`]. A ten is always `T`, never `10`.
//!
//! # Examples
//!
//! ```
//! use holdem_core::cards::{Card, Rank, Suit};
//!
//! let card: Card = "Ks".parse().unwrap();
//! assert_eq!(card, Card(Rank::King, Suit::Spades));
//! assert_eq!(card.to_string(), "K♠");
//! ```

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Display symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
        }
    }

    /// Single-letter wire form.
    pub fn letter(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    fn from_letter(c: char) -> Option<Suit> {
        match c.to_ascii_lowercase() {
            'c' => Some(Suit::Clubs),
            'd' => Some(Suit::Diamonds),
            'h' => Some(Suit::Hearts),
            's' => Some(Suit::Spades),
            _ => None,
        }
    }
}

/// Card rank (2-14, where 14 = Ace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    /// All ranks, lowest first.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Single-character form (`T` for ten).
    pub fn symbol(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    /// English name, used in hand descriptions.
    pub fn name(self) -> &'static str {
        match self {
            Rank::Two => "Two",
            Rank::Three => "Three",
            Rank::Four => "Four",
            Rank::Five => "Five",
            Rank::Six => "Six",
            Rank::Seven => "Seven",
            Rank::Eight => "Eight",
            Rank::Nine => "Nine",
            Rank::Ten => "Ten",
            Rank::Jack => "Jack",
            Rank::Queen => "Queen",
            Rank::King => "King",
            Rank::Ace => "Ace",
        }
    }

    /// Plural English name ("Sixes", not "Sixs").
    pub fn plural(self) -> &'static str {
        match self {
            Rank::Six => "Sixes",
            Rank::Two => "Twos",
            Rank::Three => "Threes",
            Rank::Four => "Fours",
            Rank::Five => "Fives",
            Rank::Seven => "Sevens",
            Rank::Eight => "Eights",
            Rank::Nine => "Nines",
            Rank::Ten => "Tens",
            Rank::Jack => "Jacks",
            Rank::Queen => "Queens",
            Rank::King => "Kings",
            Rank::Ace => "Aces",
        }
    }

    fn from_symbol(c: char) -> Option<Rank> {
        let upper = c.to_ascii_uppercase();
        Rank::ALL.into_iter().find(|r| r.symbol() == upper)
    }
}

/// A playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card(pub Rank, pub Suit);

impl Card {
    pub fn rank(&self) -> Rank {
        self.0
    }

    pub fn suit(&self) -> Suit {
        self.1
    }

    /// Two-character wire form, e.g. `"Td"`.
    pub fn code(&self) -> String {
        format!("{}{}", self.0.symbol(), self.1.letter())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0.symbol(), self.1.symbol())
    }
}

impl FromStr for Card {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(EngineError::InvalidCard(s.to_string()));
        };
        match (Rank::from_symbol(r), Suit::from_letter(su)) {
            (Some(rank), Some(suit)) => Ok(Card(rank, suit)),
            _ => Err(EngineError::InvalidCard(s.to_string())),
        }
    }
}

impl TryFrom<String> for Card {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.code()
    }
}

/// All 52 cards in a fixed order (suit-major).
pub fn full_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(52);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            cards.push(Card(rank, suit));
        }
    }
    cards
}

/// Parse a whitespace-separated list of cards, e.g. `"As Kd 7c"`.
pub fn parse_cards(text: &str) -> Result<Vec<Card>, EngineError> {
    text.split_whitespace().map(str::parse).collect()
}

/// A deck consumed by drawing from the top.
///
/// Invariant: every card appears at most once, so no card can be drawn
/// twice within a hand.
#[derive(Debug, Clone)]
pub struct Deck {
    /// Remaining cards, top of the deck first.
    cards: Vec<Card>,
}

impl Deck {
    /// A freshly shuffled 52-card deck.
    ///
    /// Uses the thread-local CSPRNG (ChaCha, seeded from the OS) with a
    /// Fisher-Yates shuffle, so upcoming cards cannot be predicted from
    /// earlier ones.
    pub fn new() -> Self {
        let mut cards = full_deck();
        cards.shuffle(&mut rand::rng());
        Self { cards }
    }

    /// A reproducible shuffle for replays. Not for live tables.
    pub fn from_seed(seed: u64) -> Self {
        let mut cards = full_deck();
        let mut rng = StdRng::seed_from_u64(seed);
        cards.shuffle(&mut rng);
        Self { cards }
    }

    /// A deck whose top cards are `top`, in order, followed by the rest of
    /// the 52 cards in fixed order.
    ///
    /// Fails with [`EngineError::InvalidConfig`] if `top` repeats a card.
    pub fn stacked(top: &[Card]) -> Result<Self, EngineError> {
        let mut cards: Vec<Card> = Vec::with_capacity(52);
        for &card in top {
            if cards.contains(&card) {
                return Err(EngineError::InvalidConfig(format!(
                    "card {card} appears twice in stacked deck"
                )));
            }
            cards.push(card);
        }
        cards.extend(full_deck().into_iter().filter(|c| !top.contains(c)));
        Ok(Self { cards })
    }

    /// Draw exactly `n` cards from the top.
    ///
    /// Fails without drawing anything if fewer than `n` remain.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, EngineError> {
        if n > self.cards.len() {
            return Err(EngineError::DeckExhausted {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    /// Draw a single card.
    pub fn draw_one(&mut self) -> Result<Card, EngineError> {
        let mut drawn = self.draw(1)?;
        drawn.pop().ok_or(EngineError::DeckExhausted {
            requested: 1,
            remaining: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_card_display() {
        assert_eq!(Card(Rank::Ace, Suit::Spades).to_string(), "A♠");
        assert_eq!(Card(Rank::Ten, Suit::Hearts).to_string(), "T♥");
        assert_eq!(Card(Rank::Two, Suit::Diamonds).to_string(), "2♦");
    }

    #[test]
    fn test_card_parse() {
        assert_eq!("Td".parse::<Card>().unwrap(), Card(Rank::Ten, Suit::Diamonds));
        assert_eq!("as".parse::<Card>().unwrap(), Card(Rank::Ace, Suit::Spades));
        assert!("10d".parse::<Card>().is_err());
        assert!("Xx".parse::<Card>().is_err());
        assert!("".parse::<Card>().is_err());
    }

    #[test]
    fn test_card_serde_uses_code() {
        let card = Card(Rank::Queen, Suit::Clubs);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, "\"Qc\"");
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
        assert!(serde_json::from_str::<Card>("\"10c\"").is_err());
    }

    #[test]
    fn test_full_deck_has_52_distinct_cards() {
        let cards = full_deck();
        assert_eq!(cards.len(), 52);
        let unique: HashSet<Card> = cards.iter().copied().collect();
        assert_eq!(unique.len(), 52);
        for rank in Rank::ALL {
            assert_eq!(cards.iter().filter(|c| c.rank() == rank).count(), 4);
        }
    }

    #[test]
    fn test_draw_all_cards_are_distinct() {
        let mut deck = Deck::new();
        let drawn = deck.draw(52).unwrap();
        let unique: HashSet<Card> = drawn.iter().copied().collect();
        assert_eq!(unique.len(), 52);
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn test_draw_from_exhausted_deck_fails() {
        let mut deck = Deck::new();
        deck.draw(50).unwrap();
        let err = deck.draw(3).unwrap_err();
        assert_eq!(
            err,
            EngineError::DeckExhausted {
                requested: 3,
                remaining: 2
            }
        );
        // A failed draw takes nothing.
        assert_eq!(deck.remaining(), 2);
        deck.draw(2).unwrap();
        assert!(matches!(deck.draw_one(), Err(EngineError::DeckExhausted { .. })));
    }

    #[test]
    fn test_seeded_decks_repeat() {
        let a = Deck::from_seed(7).draw(52).unwrap();
        let b = Deck::from_seed(7).draw(52).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stacked_deck_order() {
        let top = parse_cards("As Kd 7c").unwrap();
        let mut deck = Deck::stacked(&top).unwrap();
        assert_eq!(deck.remaining(), 52);
        assert_eq!(deck.draw(3).unwrap(), top);
        let rest: HashSet<Card> = deck.draw(49).unwrap().into_iter().collect();
        assert!(top.iter().all(|c| !rest.contains(c)));
    }

    #[test]
    fn test_stacked_deck_rejects_duplicates() {
        let top = parse_cards("As As").unwrap();
        assert!(Deck::stacked(&top).is_err());
    }
}

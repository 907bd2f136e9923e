//! A cash-game table: seats and stacks that outlive individual hands.
//!
//! The table owns at most one [`HandSession`] at a time. Between hands it
//! rotates the button, credits results back to the seats and keeps a short
//! history. It is synchronous; the [`room`](crate::room) module puts it
//! behind an actor with a turn timer.

use std::collections::{BTreeMap, VecDeque};

use holdem_core::{
    ActionKind, ActionRecord, Card, Chips, HandResult, HandSession, HandSetup, HandSnapshot,
    PlayerId, Seat, Seating, Viewer,
};
use serde::{Deserialize, Serialize};

use crate::config::TableConfig;
use crate::error::TableError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatedPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub stack: Chips,
    pub sitting_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat: Seat,
    pub player_id: PlayerId,
    pub name: String,
    pub stack: Chips,
    pub sitting_out: bool,
}

/// The table as one viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub button: Option<Seat>,
    pub hands_played: u64,
    pub seats: Vec<SeatView>,
    pub hand: Option<HandSnapshot>,
}

/// A finished hand as one viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSummary {
    pub result: HandResult,
    /// The viewer's own hole cards, if they were dealt in.
    pub own_cards: Option<[Card; 2]>,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    result: HandResult,
    dealt: Vec<(PlayerId, [Card; 2])>,
}

/// What a player takes with them when they stand up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player_id: PlayerId,
    pub seat: Seat,
    pub stack: Chips,
    /// Set when leaving cut the running hand short.
    pub forced: Option<HandResult>,
}

pub struct Table {
    config: TableConfig,
    seats: BTreeMap<Seat, SeatedPlayer>,
    hand: Option<HandSession>,
    button: Option<Seat>,
    hands_played: u64,
    history: VecDeque<HistoryEntry>,
}

impl Table {
    pub fn new(config: TableConfig) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self {
            config,
            seats: BTreeMap::new(),
            hand: None,
            button: None,
            hands_played: 0,
            history: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Seat a player. Without a requested seat, the lowest free seat is used.
    pub fn sit(
        &mut self,
        player_id: PlayerId,
        name: impl Into<String>,
        seat: Option<Seat>,
        buy_in: Chips,
    ) -> Result<Seat, TableError> {
        if self.seat_of(player_id).is_some() {
            return Err(TableError::AlreadySeated(player_id));
        }
        let seat = match seat {
            Some(s) if s >= self.config.table_capacity => return Err(TableError::InvalidSeat(s)),
            Some(s) if self.seats.contains_key(&s) => return Err(TableError::SeatTaken(s)),
            Some(s) => s,
            None => (0..self.config.table_capacity)
                .find(|s| !self.seats.contains_key(s))
                .ok_or(TableError::TableFull)?,
        };
        let name = name.into();
        tracing::info!(player = player_id, seat, buy_in, %name, "Player sat down");
        self.seats.insert(
            seat,
            SeatedPlayer {
                player_id,
                name,
                stack: buy_in,
                sitting_out: buy_in == 0,
            },
        );
        Ok(seat)
    }

    /// Stand a player up. If they are still contesting the running hand, it
    /// is ended under the configured forced-end policy first.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Departure, TableError> {
        let seat = self
            .seat_of(player_id)
            .ok_or(TableError::UnknownPlayer(player_id))?;

        let mut forced = None;
        if let Some(hand) = self.hand.as_mut().filter(|h| !h.is_over()) {
            let in_hand = hand
                .participants()
                .iter()
                .find(|p| p.id == player_id)
                .map(|p| (p.is_live(), p.stack));
            match in_hand {
                Some((true, _)) => {
                    let result = hand
                        .force_end(self.config.forced_end, &[player_id])?
                        .clone();
                    self.complete_hand();
                    forced = Some(result);
                }
                Some((false, stack)) => {
                    // Folded: their committed chips stay in the pot.
                    if let Some(seated) = self.seats.get_mut(&seat) {
                        seated.stack = stack;
                    }
                }
                None => {}
            }
        }

        let stack = self.seats.remove(&seat).map(|s| s.stack).unwrap_or(0);
        tracing::info!(player = player_id, seat, stack, "Player left");
        Ok(Departure {
            player_id,
            seat,
            stack,
            forced,
        })
    }

    /// Sitting-out players are skipped when the next hand is dealt.
    pub fn set_sitting_out(&mut self, player_id: PlayerId, sitting_out: bool) -> Result<(), TableError> {
        let seat = self
            .seat_of(player_id)
            .ok_or(TableError::UnknownPlayer(player_id))?;
        if let Some(seated) = self.seats.get_mut(&seat) {
            seated.sitting_out = sitting_out;
        }
        Ok(())
    }

    /// Add chips between hands.
    pub fn top_up(&mut self, player_id: PlayerId, chips: Chips) -> Result<Chips, TableError> {
        if self.is_hand_running() && self.in_current_hand(player_id) {
            return Err(TableError::HandInProgress);
        }
        let seat = self
            .seat_of(player_id)
            .ok_or(TableError::UnknownPlayer(player_id))?;
        let seated = self
            .seats
            .get_mut(&seat)
            .ok_or(TableError::UnknownPlayer(player_id))?;
        seated.stack += chips;
        Ok(seated.stack)
    }

    /// Move the button and deal the next hand. Returns its hand id.
    pub fn start_hand(&mut self) -> Result<u64, TableError> {
        if self.is_hand_running() {
            return Err(TableError::HandInProgress);
        }
        let players: Vec<Seating> = self
            .seats
            .iter()
            .map(|(&seat, p)| Seating {
                player_id: p.player_id,
                seat,
                stack: p.stack,
                sitting_out: p.sitting_out,
            })
            .collect();
        let eligible: Vec<Seat> = players
            .iter()
            .filter(|s| !s.sitting_out && s.stack > 0)
            .map(|s| s.seat)
            .collect();
        let dealer_seat = match self.button {
            Some(previous) => eligible
                .iter()
                .copied()
                .find(|&s| s > previous)
                .or_else(|| eligible.first().copied()),
            None => eligible.first().copied(),
        }
        .unwrap_or(0);

        let hand_id = self.hands_played + 1;
        let mut hand = HandSession::new(HandSetup {
            hand_id,
            config: self.config.blinds,
            dealer_seat,
            players,
        })?;
        hand.start()?;

        self.button = Some(hand.dealer_seat());
        self.hands_played = hand_id;
        self.hand = Some(hand);
        if self.hand.as_ref().is_some_and(|h| h.is_over()) {
            self.complete_hand();
        }
        Ok(hand_id)
    }

    /// Forward a betting action to the running hand.
    pub fn act(
        &mut self,
        player_id: PlayerId,
        action: ActionKind,
        amount: Option<Chips>,
    ) -> Result<ActionRecord, TableError> {
        let hand = self
            .hand
            .as_mut()
            .filter(|h| !h.is_over())
            .ok_or(TableError::NoHandInProgress)?;
        let record = hand.apply_action(player_id, action, amount)?;
        if hand.is_over() {
            self.complete_hand();
        }
        Ok(record)
    }

    /// Apply the timeout action for whoever is to act.
    pub fn timeout(&mut self) -> Result<ActionRecord, TableError> {
        let hand = self
            .hand
            .as_mut()
            .filter(|h| !h.is_over())
            .ok_or(TableError::NoHandInProgress)?;
        let record = hand.apply_timeout()?;
        if hand.is_over() {
            self.complete_hand();
        }
        Ok(record)
    }

    /// Show hole cards from the last finished hand.
    pub fn reveal(&mut self, player_id: PlayerId) -> Result<(), TableError> {
        let hand = self.hand.as_mut().ok_or(TableError::NoHandInProgress)?;
        if !hand.is_over() {
            return Err(TableError::HandInProgress);
        }
        hand.reveal(player_id)?;
        if let (Some(result), Some(entry)) = (hand.result(), self.history.front_mut())
            && entry.result.hand_id == result.hand_id
        {
            entry.result = result.clone();
        }
        Ok(())
    }

    pub fn is_hand_running(&self) -> bool {
        self.hand.as_ref().is_some_and(|h| !h.is_over())
    }

    pub fn current_actor(&self) -> Option<PlayerId> {
        self.hand
            .as_ref()
            .filter(|h| !h.is_over())
            .and_then(|h| h.current_actor())
    }

    pub fn hand(&self) -> Option<&HandSession> {
        self.hand.as_ref()
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<Seat> {
        self.seats
            .iter()
            .find(|(_, p)| p.player_id == player_id)
            .map(|(&seat, _)| seat)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&SeatedPlayer> {
        self.seats.values().find(|p| p.player_id == player_id)
    }

    pub fn is_sitting_out(&self, player_id: PlayerId) -> bool {
        self.player(player_id).is_some_and(|p| p.sitting_out)
    }

    /// Chips on the table: stacks plus whatever the running hand holds.
    pub fn chips_in_play(&self) -> Chips {
        match self.hand.as_ref().filter(|h| !h.is_over()) {
            Some(hand) => {
                let dealt: Chips = hand
                    .participants()
                    .iter()
                    .map(|p| p.stack + p.total_bet)
                    .sum();
                let idle: Chips = self
                    .seats
                    .values()
                    .filter(|s| !hand.participants().iter().any(|p| p.id == s.player_id))
                    .map(|s| s.stack)
                    .sum();
                dealt + idle
            }
            None => self.seats.values().map(|s| s.stack).sum(),
        }
    }

    pub fn snapshot(&self, viewer: Viewer) -> TableSnapshot {
        TableSnapshot {
            small_blind: self.config.blinds.small_blind,
            big_blind: self.config.blinds.big_blind,
            button: self.button,
            hands_played: self.hands_played,
            seats: self
                .seats
                .iter()
                .map(|(&seat, p)| SeatView {
                    seat,
                    player_id: p.player_id,
                    name: p.name.clone(),
                    stack: p.stack,
                    sitting_out: p.sitting_out,
                })
                .collect(),
            hand: self.hand.as_ref().map(|h| h.snapshot(viewer)),
        }
    }

    /// Recent hands, newest first.
    pub fn history(&self, viewer: Viewer) -> Vec<HandSummary> {
        self.history
            .iter()
            .map(|entry| HandSummary {
                result: entry.result.clone(),
                own_cards: entry
                    .dealt
                    .iter()
                    .find(|(id, _)| viewer.can_see(*id))
                    .map(|(_, cards)| *cards),
            })
            .collect()
    }

    fn in_current_hand(&self, player_id: PlayerId) -> bool {
        self.hand
            .as_ref()
            .is_some_and(|h| h.participants().iter().any(|p| p.id == player_id))
    }

    /// Credit the finished hand back to the seats and record it.
    fn complete_hand(&mut self) {
        let Some(hand) = self.hand.as_ref() else {
            return;
        };
        let Some(result) = hand.result().cloned() else {
            return;
        };
        for change in &result.stacks {
            if let Some(seated) = self.seats.get_mut(&change.seat)
                && seated.player_id == change.player_id
            {
                seated.stack = change.ending;
                if seated.stack == 0 {
                    seated.sitting_out = true;
                    tracing::info!(player = change.player_id, "Player busted, sitting out");
                }
            }
        }
        let dealt = hand
            .participants()
            .iter()
            .filter_map(|p| p.hole_cards.map(|cards| (p.id, cards)))
            .collect();
        self.history.push_front(HistoryEntry { result, dealt });
        self.history.truncate(self.config.history_len);
    }
}

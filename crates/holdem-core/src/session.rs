use crate::betting::{self, ActionKind, BettingRound, Plan, Street};
use crate::cards::{Card, Deck};
use crate::config::{ForcedEndPolicy, HandConfig, HandSetup};
use crate::error::EngineError;
use crate::evaluator;
use crate::participant::{LastAction, Participant};
use crate::pot::{self, PotLedger};
use crate::result::{ActionRecord, Award, DisclosedHand, HandEnding, HandResult, StackChange};
use crate::snapshot::{HandSnapshot, PlayerView, Viewer};
use crate::{Chips, PlayerId, Seat};

/// Two hole cards each plus five board cards must fit in one deck.
pub const MAX_PLAYERS: usize = (52 - 5) / 2;

/// One hand of no-limit Texas Hold'em, from blinds to payout.
///
/// The session owns its participants, deck, board and pots. It never reads
/// the clock or does I/O: the table feeds it actions (including timeouts)
/// and reads back snapshots and, at the end, a [`HandResult`].
#[derive(Debug, Clone)]
pub struct HandSession {
    hand_id: u64,
    config: HandConfig,
    /// Dealt-in players in seat order.
    participants: Vec<Participant>,
    dealer: usize,
    small_blind: usize,
    big_blind: usize,
    deck: Deck,
    board: Vec<Card>,
    round: BettingRound,
    ledger: PotLedger,
    current: Option<usize>,
    started: bool,
    actions: Vec<ActionRecord>,
    result: Option<HandResult>,
}

impl HandSession {
    /// Seat a hand with a freshly shuffled deck.
    pub fn new(setup: HandSetup) -> Result<Self, EngineError> {
        Self::with_deck(setup, Deck::new())
    }

    /// Seat a hand that will deal from `deck`, top card first.
    pub fn with_deck(setup: HandSetup, deck: Deck) -> Result<Self, EngineError> {
        setup.config.validate()?;

        for (i, a) in setup.players.iter().enumerate() {
            for b in &setup.players[i + 1..] {
                if a.seat == b.seat {
                    return Err(EngineError::InvalidConfig(format!(
                        "seat {} is assigned twice",
                        a.seat
                    )));
                }
                if a.player_id == b.player_id {
                    return Err(EngineError::InvalidConfig(format!(
                        "player {} is seated twice",
                        a.player_id
                    )));
                }
            }
        }

        let mut participants: Vec<Participant> = setup
            .players
            .iter()
            .filter(|s| !s.sitting_out && s.stack > 0)
            .map(Participant::new)
            .collect();
        if participants.len() < 2 {
            return Err(EngineError::InsufficientParticipants(participants.len()));
        }
        if participants.len() > MAX_PLAYERS {
            return Err(EngineError::InvalidConfig(format!(
                "{} players cannot be dealt from one deck (max {MAX_PLAYERS})",
                participants.len()
            )));
        }
        participants.sort_by_key(|p| p.seat);

        let n = participants.len();
        let dealer = participants
            .iter()
            .position(|p| p.seat >= setup.dealer_seat)
            .unwrap_or(0);
        let (small_blind, big_blind) = if n == 2 {
            (dealer, (dealer + 1) % n)
        } else {
            ((dealer + 1) % n, (dealer + 2) % n)
        };

        Ok(Self {
            hand_id: setup.hand_id,
            config: setup.config,
            participants,
            dealer,
            small_blind,
            big_blind,
            deck,
            board: Vec::with_capacity(5),
            round: BettingRound::new(Street::Preflop, 0, setup.config.big_blind),
            ledger: PotLedger::new(),
            current: None,
            started: false,
            actions: Vec::new(),
            result: None,
        })
    }

    /// Deal hole cards, post antes and blinds, and hand the action to the
    /// first player after the big blind.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::InvalidAction(
                "hand already started".to_string(),
            ));
        }
        let n = self.participants.len();
        let cards = self.deck.draw(2 * n)?;
        for (k, step) in (1..=n).enumerate() {
            let i = (self.dealer + step) % n;
            self.participants[i].hole_cards = Some([cards[2 * k], cards[2 * k + 1]]);
        }
        self.started = true;

        if self.config.ante > 0 {
            for step in 1..=n {
                let i = (self.dealer + step) % n;
                let paid = self.participants[i].post_dead(self.config.ante);
                self.record_post(i, LastAction::Ante, paid);
            }
        }
        let paid = self.participants[self.small_blind].commit(self.config.small_blind);
        self.record_post(self.small_blind, LastAction::SmallBlind, paid);
        let paid = self.participants[self.big_blind].commit(self.config.big_blind);
        self.record_post(self.big_blind, LastAction::BigBlind, paid);

        self.round = BettingRound::new(Street::Preflop, self.config.big_blind, self.config.big_blind);

        tracing::info!(
            hand_id = self.hand_id,
            players = n,
            dealer_seat = self.participants[self.dealer].seat,
            small_blind = self.config.small_blind,
            big_blind = self.config.big_blind,
            "Hand started"
        );
        self.advance(self.big_blind)
    }

    fn record_post(&mut self, idx: usize, action: LastAction, paid: Chips) {
        let p = &mut self.participants[idx];
        p.last_action = Some(action);
        self.actions.push(ActionRecord {
            player_id: p.id,
            street: Street::Preflop,
            action,
            chips: paid,
            round_total: p.round_bet,
        });
    }

    /// Validate and apply one betting action from `player_id`.
    ///
    /// Bet and raise amounts are the player's total for the round. On error
    /// nothing changes.
    pub fn apply_action(
        &mut self,
        player_id: PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> Result<ActionRecord, EngineError> {
        if !self.started {
            return Err(EngineError::HandNotStarted);
        }
        if self.result.is_some() {
            return Err(EngineError::HandOver);
        }
        let idx = match self.current {
            Some(i) if self.participants[i].id == player_id => i,
            _ => return Err(EngineError::NotYourTurn(player_id)),
        };

        let plan = betting::plan(
            &self.round,
            &self.participants[idx],
            kind,
            amount,
            self.config.big_blind,
        )
        .inspect_err(|e| {
            tracing::debug!(player = player_id, ?kind, ?amount, error = %e, "Action rejected");
        })?;
        let label = match plan {
            Plan::Fold => LastAction::Fold,
            Plan::Check => LastAction::Check,
            Plan::Commit { label, .. } => label,
        };
        let street = self.round.street;
        let chips = betting::execute(
            &mut self.round,
            &mut self.participants,
            idx,
            plan,
            self.config.big_blind,
        );

        let record = ActionRecord {
            player_id,
            street,
            action: label,
            chips,
            round_total: self.participants[idx].round_bet,
        };
        tracing::debug!(
            hand_id = self.hand_id,
            player = player_id,
            action = ?label,
            chips,
            %street,
            "Player acted"
        );
        self.actions.push(record.clone());
        self.advance(idx)?;
        Ok(record)
    }

    /// What a timed-out player does: check when free, otherwise fold.
    pub fn timeout_action(&self) -> Option<(PlayerId, ActionKind)> {
        if self.result.is_some() {
            return None;
        }
        let p = &self.participants[self.current?];
        let kind = if p.round_bet >= self.round.target {
            ActionKind::Check
        } else {
            ActionKind::Fold
        };
        Some((p.id, kind))
    }

    /// Apply [`timeout_action`](Self::timeout_action) for the player to act.
    pub fn apply_timeout(&mut self) -> Result<ActionRecord, EngineError> {
        if !self.started {
            return Err(EngineError::HandNotStarted);
        }
        let (player_id, kind) = self.timeout_action().ok_or(EngineError::HandOver)?;
        tracing::warn!(hand_id = self.hand_id, player = player_id, ?kind, "Turn timed out");
        self.apply_action(player_id, kind, None)
    }

    /// Stop the hand before it finishes on its own.
    ///
    /// With [`ForcedEndPolicy::AwardRemaining`] each pot is split among its
    /// eligible players who are not in `departed`; a pot only departed
    /// players can win goes back to them. [`ForcedEndPolicy::Void`] refunds
    /// every commitment.
    pub fn force_end(
        &mut self,
        policy: ForcedEndPolicy,
        departed: &[PlayerId],
    ) -> Result<&HandResult, EngineError> {
        if !self.started {
            return Err(EngineError::HandNotStarted);
        }
        if self.result.is_some() {
            return Err(EngineError::HandOver);
        }
        self.ledger.recompute(&self.participants);
        self.current = None;
        tracing::warn!(hand_id = self.hand_id, ?policy, ?departed, "Hand ended early");

        match policy {
            ForcedEndPolicy::Void => {
                let refunded = self.ledger.total();
                for p in &mut self.participants {
                    p.stack += p.total_bet;
                }
                self.ledger.mark_distributed(refunded);
                Ok(self.finish(HandEnding::Voided, Vec::new(), Vec::new()))
            }
            ForcedEndPolicy::AwardRemaining => {
                let order = self.odd_chip_order();
                let mut awards = Vec::new();
                for (index, pot) in self.ledger.pots().iter().enumerate().rev() {
                    let staying: Vec<PlayerId> = pot
                        .eligible
                        .iter()
                        .copied()
                        .filter(|id| !departed.contains(id))
                        .collect();
                    let recipients = if staying.is_empty() {
                        pot.eligible.clone()
                    } else {
                        staying
                    };
                    for (player_id, amount) in pot::split(pot.amount, &pot::in_order(&recipients, &order)) {
                        awards.push(Award {
                            player_id,
                            amount,
                            pot_index: index,
                            hand: None,
                        });
                    }
                }
                self.pay(&awards);
                Ok(self.finish(HandEnding::Forced, awards, Vec::new()))
            }
        }
    }

    /// Show a player's hole cards after the hand is over.
    pub fn reveal(&mut self, player_id: PlayerId) -> Result<(), EngineError> {
        if !self.started {
            return Err(EngineError::HandNotStarted);
        }
        let Some(result) = self.result.as_mut() else {
            return Err(EngineError::InvalidAction(
                "cards can only be shown once the hand is over".to_string(),
            ));
        };
        let cards = self
            .participants
            .iter()
            .find(|p| p.id == player_id)
            .and_then(|p| p.hole_cards)
            .ok_or_else(|| {
                EngineError::InvalidAction(format!("player {player_id} holds no cards"))
            })?;
        if !result.is_disclosed(player_id) {
            let hand = evaluator::evaluate(cards, &self.board)
                .ok()
                .map(|h| h.describe());
            result.disclosed.push(DisclosedHand {
                player_id,
                cards,
                hand,
            });
            tracing::debug!(hand_id = self.hand_id, player = player_id, "Cards shown");
        }
        Ok(())
    }

    /// The hand as `viewer` is allowed to see it.
    pub fn snapshot(&self, viewer: Viewer) -> HandSnapshot {
        let disclosed = |id: PlayerId| self.result.as_ref().is_some_and(|r| r.is_disclosed(id));
        let players = self
            .participants
            .iter()
            .map(|p| PlayerView {
                player_id: p.id,
                seat: p.seat,
                stack: p.stack,
                round_bet: p.round_bet,
                total_bet: p.total_bet,
                folded: p.folded,
                all_in: p.all_in,
                last_action: p.last_action,
                has_cards: p.hole_cards.is_some() && !p.folded,
                hole_cards: p
                    .hole_cards
                    .filter(|_| viewer.can_see(p.id) || disclosed(p.id)),
            })
            .collect();
        let legal_actions = self
            .current
            .filter(|_| self.result.is_none())
            .map(|i| &self.participants[i])
            .filter(|p| viewer.can_see(p.id))
            .map(|p| betting::legal_actions(&self.round, p, self.config.big_blind));

        HandSnapshot {
            hand_id: self.hand_id,
            started: self.started,
            street: self.round.street,
            board: self.board.clone(),
            pots: self.ledger.pots().to_vec(),
            total_pot: self.ledger.total(),
            dealer_seat: self.participants[self.dealer].seat,
            small_blind_seat: self.participants[self.small_blind].seat,
            big_blind_seat: self.participants[self.big_blind].seat,
            current_actor: self.current_actor(),
            target: self.round.target,
            min_raise_to: self.round.min_raise_to(self.config.big_blind),
            last_aggressor: self.round.last_aggressor,
            players,
            legal_actions,
            is_over: self.is_over(),
            result: self.result.clone(),
        }
    }

    pub fn hand_id(&self) -> u64 {
        self.hand_id
    }

    pub fn config(&self) -> &HandConfig {
        &self.config
    }

    pub fn street(&self) -> Street {
        self.round.street
    }

    pub fn round(&self) -> &BettingRound {
        &self.round
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn ledger(&self) -> &PotLedger {
        &self.ledger
    }

    pub fn dealer_seat(&self) -> Seat {
        self.participants[self.dealer].seat
    }

    pub fn current_actor(&self) -> Option<PlayerId> {
        self.current.map(|i| self.participants[i].id)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&HandResult> {
        self.result.as_ref()
    }

    fn live_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_live()).count()
    }

    /// Seat order starting left of the dealer. Odd chips go out in this order.
    fn odd_chip_order(&self) -> Vec<PlayerId> {
        let n = self.participants.len();
        (1..=n)
            .map(|step| self.participants[(self.dealer + step) % n].id)
            .collect()
    }

    /// Move the hand forward after `from` acted (or posted the big blind).
    fn advance(&mut self, from: usize) -> Result<(), EngineError> {
        self.ledger.recompute(&self.participants);
        if self.live_count() == 1 {
            self.finish_uncontested();
            return Ok(());
        }
        match betting::next_actor(&self.participants, from, self.round.target) {
            Some(i) => {
                self.current = Some(i);
                Ok(())
            }
            None => self.close_round(),
        }
    }

    fn close_round(&mut self) -> Result<(), EngineError> {
        self.current = None;
        loop {
            for p in &mut self.participants {
                p.reset_round();
            }
            if self.round.street == Street::River {
                return self.showdown();
            }
            let actors = self.participants.iter().filter(|p| p.can_act()).count();
            let street = self.round.street.next();
            let dealt = self.deck.draw(street.cards_dealt())?;
            self.board.extend(dealt);
            self.round = BettingRound::new(street, 0, self.config.big_blind);
            tracing::debug!(
                hand_id = self.hand_id,
                %street,
                board = ?self.board.iter().map(Card::code).collect::<Vec<_>>(),
                "Dealt street"
            );

            if actors < 2 {
                continue;
            }
            if let Some(i) = betting::next_actor(&self.participants, self.dealer, 0) {
                self.current = Some(i);
                return Ok(());
            }
        }
    }

    fn showdown(&mut self) -> Result<(), EngineError> {
        self.round = BettingRound::new(Street::Showdown, 0, self.config.big_blind);
        self.ledger.recompute(&self.participants);

        let mut disclosed = Vec::new();
        let mut contenders: Vec<(PlayerId, [Card; 2])> = Vec::new();
        for p in self.participants.iter().filter(|p| p.is_live()) {
            if let Some(cards) = p.hole_cards {
                let hand = evaluator::evaluate(cards, &self.board)?;
                disclosed.push(DisclosedHand {
                    player_id: p.id,
                    cards,
                    hand: Some(hand.describe()),
                });
                contenders.push((p.id, cards));
            }
        }

        let order = self.odd_chip_order();
        let mut awards = Vec::new();
        for (index, pot) in self.ledger.pots().iter().enumerate().rev() {
            let in_pot: Vec<(PlayerId, [Card; 2])> = contenders
                .iter()
                .filter(|(id, _)| pot.eligible.contains(id))
                .copied()
                .collect();
            let groups = evaluator::best_of(&in_pot, &self.board)?;
            let Some(winners) = groups.first() else {
                tracing::warn!(hand_id = self.hand_id, pot = index, "Pot has no contenders");
                continue;
            };
            let description = disclosed
                .iter()
                .find(|d| d.player_id == winners[0])
                .and_then(|d| d.hand.clone());
            for (player_id, amount) in pot::split(pot.amount, &pot::in_order(winners, &order)) {
                awards.push(Award {
                    player_id,
                    amount,
                    pot_index: index,
                    hand: description.clone(),
                });
            }
        }
        self.pay(&awards);
        self.finish(HandEnding::Showdown, awards, disclosed);
        Ok(())
    }

    fn finish_uncontested(&mut self) {
        self.current = None;
        let Some(winner) = self.participants.iter().find(|p| p.is_live()).map(|p| p.id) else {
            return;
        };
        let awards: Vec<Award> = self
            .ledger
            .pots()
            .iter()
            .enumerate()
            .filter(|(_, pot)| pot.amount > 0)
            .map(|(index, pot)| Award {
                player_id: winner,
                amount: pot.amount,
                pot_index: index,
                hand: None,
            })
            .collect();
        self.pay(&awards);
        self.finish(HandEnding::Uncontested, awards, Vec::new());
    }

    fn pay(&mut self, awards: &[Award]) {
        for award in awards {
            if let Some(p) = self.participants.iter_mut().find(|p| p.id == award.player_id) {
                p.stack += award.amount;
            }
        }
        self.ledger
            .mark_distributed(awards.iter().map(|a| a.amount).sum());
    }

    fn finish(
        &mut self,
        ending: HandEnding,
        winners: Vec<Award>,
        disclosed: Vec<DisclosedHand>,
    ) -> &HandResult {
        self.current = None;
        let stacks = self
            .participants
            .iter()
            .map(|p| StackChange {
                player_id: p.id,
                seat: p.seat,
                starting: p.starting_stack,
                ending: p.stack,
            })
            .collect();
        tracing::info!(
            hand_id = self.hand_id,
            ?ending,
            pot = self.ledger.total(),
            winners = ?winners.iter().map(|a| (a.player_id, a.amount)).collect::<Vec<_>>(),
            "Hand finished"
        );
        self.result.insert(HandResult {
            hand_id: self.hand_id,
            ending,
            street: self.round.street,
            board: self.board.clone(),
            pots: self.ledger.pots().to_vec(),
            winners,
            disclosed,
            stacks,
            actions: self.actions.clone(),
        })
    }
}

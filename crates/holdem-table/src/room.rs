//! A room runs one [`Table`] on its own task.
//!
//! Commands arrive over an [`mpsc`] channel and are handled one at a time,
//! so at most one action is ever in flight. Every connected player has their
//! own outbound channel and only ever receives state filtered for them (no
//! broadcast fan-out of private data).
//!
//! The room also owns the turn clock: whenever the action moves, the player
//! to act gets a fresh deadline, and when it passes the timeout action is
//! applied through the same path as a player's own action.

use std::collections::HashMap;

use holdem_core::{ActionKind, Chips, LastAction, PlayerId, Viewer};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::TableConfig;
use crate::error::TableError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::table::{HandSummary, Table, TableSnapshot};

/// Outbound channel for one player or watcher.
pub type PlayerTx = mpsc::UnboundedSender<ServerMessage>;
pub type PlayerRx = mpsc::UnboundedReceiver<ServerMessage>;

enum Command {
    Connect {
        player_id: PlayerId,
        outbox: PlayerTx,
    },
    Watch {
        outbox: PlayerTx,
    },
    Message {
        player_id: PlayerId,
        message: ClientMessage,
        reply: oneshot::Sender<Result<(), TableError>>,
    },
    StartHand {
        reply: oneshot::Sender<Result<u64, TableError>>,
    },
    Snapshot {
        viewer: Viewer,
        reply: oneshot::Sender<TableSnapshot>,
    },
    History {
        viewer: Viewer,
        reply: oneshot::Sender<Vec<HandSummary>>,
    },
    Shutdown,
}

/// Cheap, cloneable handle for talking to a running room.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl RoomHandle {
    /// Register `player_id`'s outbound channel. Reconnecting replaces it.
    pub fn connect(&self, player_id: PlayerId) -> Result<PlayerRx, TableError> {
        let (outbox, rx) = mpsc::unbounded_channel();
        self.command(Command::Connect { player_id, outbox })?;
        Ok(rx)
    }

    /// Follow the table as a spectator.
    pub fn watch(&self) -> Result<PlayerRx, TableError> {
        let (outbox, rx) = mpsc::unbounded_channel();
        self.command(Command::Watch { outbox })?;
        Ok(rx)
    }

    pub async fn send(&self, player_id: PlayerId, message: ClientMessage) -> Result<(), TableError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Message {
            player_id,
            message,
            reply,
        })?;
        rx.await.map_err(|_| TableError::RoomClosed)?
    }

    pub async fn sit(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        buy_in: Chips,
    ) -> Result<(), TableError> {
        self.send(
            player_id,
            ClientMessage::Sit {
                name: name.into(),
                seat: None,
                buy_in,
            },
        )
        .await
    }

    pub async fn act(
        &self,
        player_id: PlayerId,
        action: ActionKind,
        amount: Option<Chips>,
    ) -> Result<(), TableError> {
        self.send(player_id, ClientMessage::Action { action, amount })
            .await
    }

    pub async fn start_hand(&self) -> Result<u64, TableError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::StartHand { reply })?;
        rx.await.map_err(|_| TableError::RoomClosed)?
    }

    pub async fn snapshot(&self, viewer: Viewer) -> Result<TableSnapshot, TableError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Snapshot { viewer, reply })?;
        rx.await.map_err(|_| TableError::RoomClosed)
    }

    pub async fn history(&self, viewer: Viewer) -> Result<Vec<HandSummary>, TableError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::History { viewer, reply })?;
        rx.await.map_err(|_| TableError::RoomClosed)
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    fn command(&self, command: Command) -> Result<(), TableError> {
        self.tx.send(command).map_err(|_| TableError::RoomClosed)
    }
}

/// Start a room on the current tokio runtime.
pub fn spawn(config: TableConfig) -> Result<RoomHandle, TableError> {
    let room = Room::new(Table::new(config)?);
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(room.run(rx));
    Ok(RoomHandle { tx })
}

struct Room {
    table: Table,
    /// Per-player outbound senders keyed by player ID.
    players: HashMap<PlayerId, PlayerTx>,
    watchers: Vec<PlayerTx>,
    /// Player on the clock and their deadline.
    turn: Option<(PlayerId, Instant)>,
}

impl Room {
    fn new(table: Table) -> Self {
        Self {
            table,
            players: HashMap::new(),
            watchers: Vec::new(),
            turn: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.turn.map(|(_, at)| at);
            tokio::select! {
                command = rx.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command) {
                        break;
                    }
                }
                _ = sleep_until(deadline) => self.on_timeout(),
            }
        }
        tracing::info!("Room closed");
    }

    /// Returns false once the room should stop.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Connect { player_id, outbox } => {
                let snapshot = self.table.snapshot(Viewer::Player(player_id));
                let _ = outbox.send(ServerMessage::State {
                    snapshot: Box::new(snapshot),
                });
                self.players.insert(player_id, outbox);
                tracing::debug!(player = player_id, "Player connected");
            }
            Command::Watch { outbox } => {
                let snapshot = self.table.snapshot(Viewer::Spectator);
                let _ = outbox.send(ServerMessage::State {
                    snapshot: Box::new(snapshot),
                });
                self.watchers.push(outbox);
            }
            Command::Message {
                player_id,
                message,
                reply,
            } => {
                let outcome = self.on_message(player_id, message);
                if let Err(e) = &outcome {
                    self.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: e.to_string(),
                        },
                    );
                }
                let _ = reply.send(outcome);
            }
            Command::StartHand { reply } => {
                let outcome = self.table.start_hand();
                if outcome.is_ok() {
                    self.after_progress(true);
                }
                let _ = reply.send(outcome);
            }
            Command::Snapshot { viewer, reply } => {
                let _ = reply.send(self.table.snapshot(viewer));
            }
            Command::History { viewer, reply } => {
                let _ = reply.send(self.table.history(viewer));
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn on_message(&mut self, player_id: PlayerId, message: ClientMessage) -> Result<(), TableError> {
        match message {
            ClientMessage::Sit { name, seat, buy_in } => {
                self.table.sit(player_id, name, seat, buy_in)?;
                self.publish();
            }
            ClientMessage::Leave => {
                let was_running = self.table.is_hand_running();
                let departure = self.table.leave(player_id)?;
                if departure.forced.is_some() {
                    self.after_progress(was_running);
                } else {
                    self.publish();
                }
                // The last state they get shows them gone.
                self.players.remove(&player_id);
            }
            ClientMessage::SitOut => {
                self.table.set_sitting_out(player_id, true)?;
                // Someone sitting out on the clock acts immediately.
                let restart = self.table.current_actor() == Some(player_id);
                self.arm_turn(restart);
                self.publish();
            }
            ClientMessage::SitIn => {
                self.table.set_sitting_out(player_id, false)?;
                self.publish();
            }
            ClientMessage::Action { action, amount } => {
                let was_running = self.table.is_hand_running();
                self.table.act(player_id, action, amount)?;
                self.after_progress(was_running);
            }
            ClientMessage::Show => {
                self.table.reveal(player_id)?;
                self.publish();
            }
        }
        Ok(())
    }

    fn on_timeout(&mut self) {
        let Some((player_id, _)) = self.turn.take() else {
            return;
        };
        if self.table.current_actor() != Some(player_id) {
            self.arm_turn(true);
            return;
        }

        let was_running = self.table.is_hand_running();
        match self.table.timeout() {
            Ok(record) => {
                let action = if record.action == LastAction::Fold {
                    ActionKind::Fold
                } else {
                    ActionKind::Check
                };
                tracing::info!(player = player_id, ?action, "Turn timer expired, forcing action");
                if action == ActionKind::Fold && !self.table.is_sitting_out(player_id) {
                    let _ = self.table.set_sitting_out(player_id, true);
                    tracing::info!(player = player_id, "Auto sitting out after timeout fold");
                }
                self.broadcast(ServerMessage::TimedOut { player_id, action });
                self.after_progress(was_running);
            }
            Err(e) => {
                tracing::warn!(player = player_id, error = %e, "Timeout action failed");
            }
        }
    }

    /// Publish state after a hand moved forward and restart the clock.
    fn after_progress(&mut self, was_running: bool) {
        if was_running
            && !self.table.is_hand_running()
            && let Some(result) = self.table.hand().and_then(|h| h.result()).cloned()
        {
            self.broadcast(ServerMessage::HandFinished {
                result: Box::new(result),
            });
        }
        self.publish();
        self.arm_turn(true);
    }

    /// Put the player to act on the clock. Without `restart`, a running
    /// clock for the same player is left alone.
    fn arm_turn(&mut self, restart: bool) {
        let Some(player_id) = self.table.current_actor() else {
            self.turn = None;
            return;
        };
        if !restart && self.turn.is_some_and(|(p, _)| p == player_id) {
            return;
        }
        if self.table.is_sitting_out(player_id) {
            self.turn = Some((player_id, Instant::now()));
            return;
        }
        let timer = self.table.config().turn_timer();
        self.turn = Some((player_id, Instant::now() + timer));
        self.broadcast(ServerMessage::TurnStarted {
            player_id,
            timeout_secs: timer.as_secs(),
        });
    }

    fn send_to_player(&self, player_id: PlayerId, message: ServerMessage) {
        if let Some(tx) = self.players.get(&player_id) {
            // Ignore send failure: the player may have just disconnected.
            let _ = tx.send(message);
        }
    }

    fn broadcast(&mut self, message: ServerMessage) {
        for tx in self.players.values() {
            let _ = tx.send(message.clone());
        }
        self.watchers.retain(|tx| tx.send(message.clone()).is_ok());
    }

    /// Send every player and watcher the table as they may see it.
    fn publish(&mut self) {
        for (&player_id, tx) in &self.players {
            let snapshot = self.table.snapshot(Viewer::Player(player_id));
            let _ = tx.send(ServerMessage::State {
                snapshot: Box::new(snapshot),
            });
        }
        if !self.watchers.is_empty() {
            let snapshot = self.table.snapshot(Viewer::Spectator);
            self.watchers.retain(|tx| {
                tx.send(ServerMessage::State {
                    snapshot: Box::new(snapshot.clone()),
                })
                .is_ok()
            });
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use holdem_core::{HandEnding, Street};

    async fn next_finished(rx: &mut PlayerRx) -> holdem_core::HandResult {
        loop {
            match rx.recv().await {
                Some(ServerMessage::HandFinished { result }) => return *result,
                Some(_) => continue,
                None => panic!("room closed before the hand finished"),
            }
        }
    }

    async fn heads_up_room() -> RoomHandle {
        let room = spawn(TableConfig::default()).unwrap();
        room.sit(1, "ann", 100).await.unwrap();
        room.sit(2, "bob", 100).await.unwrap();
        room
    }

    #[tokio::test]
    async fn test_room_plays_hand_to_showdown() {
        let room = heads_up_room().await;
        let mut watcher = room.watch().unwrap();
        room.start_hand().await.unwrap();

        room.act(1, ActionKind::Call, None).await.unwrap();
        room.act(2, ActionKind::Check, None).await.unwrap();
        for _ in 0..3 {
            room.act(2, ActionKind::Check, None).await.unwrap();
            room.act(1, ActionKind::Check, None).await.unwrap();
        }

        let result = next_finished(&mut watcher).await;
        assert_eq!(result.ending, HandEnding::Showdown);
        let snapshot = room.snapshot(Viewer::Spectator).await.unwrap();
        let total: u64 = snapshot.seats.iter().map(|s| s.stack).sum();
        assert_eq!(total, 200);
        assert_eq!(snapshot.hand.map(|h| h.street), Some(Street::Showdown));

        let history = room.history(Viewer::Player(1)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].own_cards.is_some());
    }

    #[tokio::test]
    async fn test_players_only_see_their_own_cards() {
        let room = heads_up_room().await;
        let mut ann = room.connect(1).unwrap();
        room.start_hand().await.unwrap();

        let mut saw_cards = false;
        while let Ok(message) = ann.try_recv() {
            if let ServerMessage::State { snapshot } = message
                && let Some(hand) = snapshot.hand
                && hand.started
            {
                assert!(hand.player(1).unwrap().hole_cards.is_some());
                assert!(hand.player(2).unwrap().hole_cards.is_none());
                saw_cards = true;
            }
        }
        assert!(saw_cards);
    }

    #[tokio::test]
    async fn test_rejected_action_is_reported() {
        let room = heads_up_room().await;
        let mut bob = room.connect(2).unwrap();
        room.start_hand().await.unwrap();

        let err = room.act(2, ActionKind::Check, None).await.unwrap_err();
        assert!(matches!(
            err,
            TableError::Engine(holdem_core::EngineError::NotYourTurn(2))
        ));
        let mut got_error = false;
        while let Ok(message) = bob.try_recv() {
            if matches!(message, ServerMessage::Error { .. }) {
                got_error = true;
            }
        }
        assert!(got_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_timer_folds_idle_player() {
        let room = heads_up_room().await;
        let mut watcher = room.watch().unwrap();
        room.start_hand().await.unwrap();

        // Nobody acts: the small blind owes chips, so the timeout folds.
        let result = tokio::time::timeout(Duration::from_secs(60), next_finished(&mut watcher))
            .await
            .unwrap();
        assert_eq!(result.ending, HandEnding::Uncontested);
        assert_eq!(result.total_won(2), 3);

        let snapshot = room.snapshot(Viewer::Spectator).await.unwrap();
        let ann = snapshot.seats.iter().find(|s| s.player_id == 1).unwrap();
        assert!(ann.sitting_out);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sitting_out_player_acts_immediately() {
        let room = heads_up_room().await;
        let mut watcher = room.watch().unwrap();
        room.start_hand().await.unwrap();
        room.send(1, ClientMessage::SitOut).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), next_finished(&mut watcher))
            .await
            .unwrap();
        assert_eq!(result.total_won(2), 3);
    }

    #[tokio::test]
    async fn test_leave_mid_hand_and_shutdown() {
        let room = heads_up_room().await;
        let mut bob = room.connect(2).unwrap();
        room.start_hand().await.unwrap();
        room.send(2, ClientMessage::Leave).await.unwrap();

        room.sit(3, "cat", 100).await.unwrap();
        let mut last_state = None;
        let disconnected = loop {
            match bob.try_recv() {
                Ok(ServerMessage::State { snapshot }) => last_state = Some(snapshot),
                Ok(_) => continue,
                Err(e) => break e == mpsc::error::TryRecvError::Disconnected,
            }
        };
        assert!(disconnected);
        let last_state = last_state.unwrap();
        assert!(last_state.seats.iter().all(|s| s.player_id != 2));
        assert!(last_state.seats.iter().all(|s| s.player_id != 3));

        room.send(3, ClientMessage::Leave).await.unwrap();
        let snapshot = room.snapshot(Viewer::Spectator).await.unwrap();
        assert_eq!(snapshot.seats.len(), 1);
        // Bob's big blind beyond the small blind was his alone and went back
        // with him.
        assert_eq!(snapshot.seats[0].stack, 101);

        room.shutdown();
        tokio::task::yield_now().await;
        assert!(matches!(
            room.start_hand().await,
            Err(TableError::RoomClosed)
        ));
    }
}

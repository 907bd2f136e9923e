//! Bot simulation for a hold'em room.
//!
//! Seats a number of random-acting bots, plays hands until the hand limit
//! is reached or only one player has chips, and checks after every hand
//! that no chips were created or lost.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use holdem_core::{ActionKind, Chips, EngineError, LegalActions, PlayerId, Viewer};
use holdem_table::{PlayerRx, RoomHandle, ServerMessage, TableConfig, TableError, room};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "holdem-sim")]
#[command(about = "Play bots against a hold'em room and check chip conservation", long_about = None)]
struct Cli {
    /// JSON table config; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of bots to seat
    #[arg(short, long, default_value_t = 4)]
    players: u32,

    /// Maximum number of hands to play
    #[arg(long, default_value_t = 100)]
    hands: u64,

    /// Starting stack for every bot
    #[arg(short, long, default_value_t = 200)]
    stack: Chips,

    #[arg(long)]
    small_blind: Option<Chips>,

    #[arg(long)]
    big_blind: Option<Chips>,

    #[arg(long)]
    ante: Option<Chips>,

    /// Seed for the bots' decisions (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) if report.conserved => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<TableConfig, TableError> {
    let mut config = match &cli.config {
        Some(path) => TableConfig::from_path(path)?,
        None => TableConfig::default(),
    };
    if let Some(sb) = cli.small_blind {
        config.blinds.small_blind = sb;
    }
    if let Some(bb) = cli.big_blind {
        config.blinds.big_blind = bb;
    }
    if let Some(ante) = cli.ante {
        config.blinds.ante = ante;
    }
    config.validate()?;
    Ok(config)
}

/// Outcome of a simulation run.
#[derive(Debug, Default)]
struct Report {
    hands_played: u64,
    /// Turns that ran out the clock instead of getting a bot decision.
    timeouts: u64,
    /// False if the chip total ever changed.
    conserved: bool,
}

async fn run(cli: Cli) -> Result<Report, TableError> {
    let config = load_config(&cli)?;
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(
        players = cli.players,
        stack = cli.stack,
        small_blind = config.blinds.small_blind,
        big_blind = config.blinds.big_blind,
        seed,
        "Starting simulation"
    );

    let room = room::spawn(config)?;
    let mut watcher = room.watch()?;
    for player_id in 1..=cli.players {
        let rx = room.connect(player_id)?;
        room.sit(player_id, format!("bot-{player_id}"), cli.stack).await?;
        let rng = StdRng::seed_from_u64(seed.wrapping_add(u64::from(player_id)));
        tokio::spawn(bot(room.clone(), player_id, rx, rng));
    }

    let expected = cli.stack * Chips::from(cli.players);
    let mut report = Report::default();
    for _ in 0..cli.hands {
        let hand_id = match room.start_hand().await {
            Ok(id) => id,
            Err(TableError::Engine(EngineError::InsufficientParticipants(n))) => {
                tracing::info!(players_left = n, "Not enough players with chips, stopping");
                break;
            }
            Err(e) => return Err(e),
        };

        let result = loop {
            match watcher.recv().await {
                Some(ServerMessage::HandFinished { result }) => break result,
                Some(ServerMessage::TimedOut { player_id, .. }) => {
                    tracing::warn!(player = player_id, "Bot missed its turn");
                    report.timeouts += 1;
                }
                Some(_) => continue,
                None => return Err(TableError::RoomClosed),
            }
        };

        report.hands_played += 1;
        let snapshot = room.snapshot(Viewer::Spectator).await?;
        let total: Chips = snapshot.seats.iter().map(|s| s.stack).sum();
        tracing::info!(
            hand_id,
            ending = ?result.ending,
            pot = result.pots.iter().map(|p| p.amount).sum::<Chips>(),
            "Hand complete"
        );
        if total != expected {
            tracing::error!(hand_id, total, expected, "Chip total changed");
            room.shutdown();
            return Ok(report);
        }
    }

    let snapshot = room.snapshot(Viewer::Spectator).await?;
    for seat in &snapshot.seats {
        tracing::info!(player = seat.player_id, name = %seat.name, stack = seat.stack, "Final stack");
    }
    room.shutdown();
    report.conserved = true;
    Ok(report)
}

async fn bot(room: RoomHandle, player_id: PlayerId, mut rx: PlayerRx, mut rng: StdRng) {
    while let Some(message) = rx.recv().await {
        // Only the newest state matters; turn and result events that
        // arrive after it carry nothing the bot needs.
        let mut latest = None;
        for message in std::iter::once(message).chain(std::iter::from_fn(|| rx.try_recv().ok())) {
            if let ServerMessage::State { snapshot } = message {
                latest = Some(snapshot);
            }
        }
        let Some(snapshot) = latest else {
            continue;
        };
        let Some(hand) = snapshot.hand else {
            continue;
        };
        if hand.current_actor != Some(player_id) {
            continue;
        }
        let Some(hint) = hand.legal_actions else {
            continue;
        };

        let (action, amount) = choose_action(&mut rng, &hint, hand.target);
        if let Err(e) = room.act(player_id, action, amount).await {
            tracing::debug!(player = player_id, ?action, error = %e, "Bot action rejected");
        }
    }
}

/// A loose-passive bot: mostly checks and calls, sometimes bets, rarely
/// shoves or folds.
fn choose_action(rng: &mut StdRng, hint: &LegalActions, target: Chips) -> (ActionKind, Option<Chips>) {
    let passive = if hint.can_check {
        ActionKind::Check
    } else {
        ActionKind::Call
    };
    match rng.random_range(0..20u32) {
        0..=2 if !hint.can_check => (ActionKind::Fold, None),
        3..=5 if hint.can_bet => (
            ActionKind::Bet,
            Some(rng.random_range(hint.min_total..=hint.max_total)),
        ),
        3..=5 if hint.can_raise => (
            ActionKind::Raise,
            Some(rng.random_range(hint.min_total..=hint.max_total)),
        ),
        6 if hint.can_bet || hint.can_raise || hint.max_total <= target => (ActionKind::AllIn, None),
        _ => (passive, None),
    }
}

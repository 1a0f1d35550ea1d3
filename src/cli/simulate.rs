//! Simulate command implementation.

use super::{CliError, OutputFormat, seed_or_clock};
use conquer::room::{MAX_PLAYERS, MIN_PLAYERS, RoomConfig};
use conquer::{FileReplayStore, GameSummary, MemoryReplayStore, ReplayStore, SelfPlay, SimConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Arguments of the `simulate` command.
#[derive(Debug)]
pub(crate) struct SimulateArgs {
    pub(crate) players: usize,
    pub(crate) games: u64,
    pub(crate) seed: Option<u64>,
    pub(crate) max_turns: u32,
    pub(crate) config: Option<PathBuf>,
    pub(crate) out: Option<PathBuf>,
    pub(crate) threads: Option<usize>,
    pub(crate) format: OutputFormat,
    pub(crate) progress: bool,
}

/// Aggregate over a batch of games.
#[derive(Debug, Default, Serialize)]
struct BatchStats {
    played: u64,
    finished: u64,
    failed_to_start: u64,
    total_turns: u64,
    games: Vec<GameSummary>,
}

impl BatchStats {
    fn add(&mut self, result: Option<GameSummary>) {
        match result {
            Some(summary) => {
                self.played += 1;
                self.finished += u64::from(summary.finished);
                self.total_turns += u64::from(summary.turns);
                self.games.push(summary);
            }
            None => self.failed_to_start += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.played += other.played;
        self.finished += other.finished;
        self.failed_to_start += other.failed_to_start;
        self.total_turns += other.total_turns;
        self.games.extend(other.games);
    }
}

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the arguments or settings are invalid, or the
/// replay directory cannot be created.
pub(crate) fn execute(args: &SimulateArgs) -> Result<(), CliError> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&args.players) {
        return Err(CliError::Usage(format!(
            "players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
        )));
    }

    let mut room = match &args.config {
        Some(path) => load_config(path)?,
        None => RoomConfig::default(),
    };
    room.max_players = room.max_players.max(args.players);
    room.validate()?;
    let config = SimConfig {
        players: args.players,
        max_turns: args.max_turns,
        room,
    };

    let replays: Arc<dyn ReplayStore> = match &args.out {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| CliError::Io {
                context: format!("failed to create {}", dir.display()),
                source,
            })?;
            Arc::new(FileReplayStore::new(dir.clone()))
        }
        None => Arc::new(MemoryReplayStore::new()),
    };

    if let Some(num_threads) = args.threads {
        configure_pool(num_threads);
    }

    let base_seed = seed_or_clock(args.seed);
    let pb = args.progress.then(|| {
        let pb = ProgressBar::new(args.games);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    });

    let start = Instant::now();
    let mut stats = (0..args.games)
        .into_par_iter()
        .fold(BatchStats::default, |mut local, i| {
            let seed = base_seed.wrapping_add(i);
            local.add(play_one(seed, &config, &replays));
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            local
        })
        .reduce(BatchStats::default, |mut a, b| {
            a.merge(b);
            a
        });
    stats.games.sort_by_key(|g| g.seed);

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();

    match args.format {
        OutputFormat::Text => print!("{}", format_text(&stats, duration.as_secs_f64())),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&stats).map_err(|source| CliError::Json {
                context: "JSON serialization failed".into(),
                source,
            })?;
            println!("{json}");
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<RoomConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        context: format!("failed to read {}", path.display()),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        context: format!("failed to parse {}", path.display()),
        source,
    })
}

/// Size the global rayon pool, keeping an existing one.
fn configure_pool(num_threads: usize) {
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        tracing::debug!(num_threads, %err, "keeping existing thread pool");
    }
}

fn play_one(seed: u64, config: &SimConfig, replays: &Arc<dyn ReplayStore>) -> Option<GameSummary> {
    let game = match SelfPlay::new(seed, config, Arc::clone(replays)) {
        Ok(game) => game,
        Err(err) => {
            tracing::debug!(seed, %err, "game did not start");
            return None;
        }
    };
    match game.run() {
        Ok(summary) => Some(summary),
        Err(err) => {
            tracing::error!(seed, %err, "game aborted");
            None
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_text(stats: &BatchStats, seconds: f64) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for game in &stats.games {
        let winners = if game.winners.is_empty() {
            "none".to_string()
        } else {
            game.winners.join(", ")
        };
        let _ = write!(output, "seed {:>20}  turns {:>5}  winners: {winners}", game.seed, game.turns);
        if let Some(id) = &game.replay_id {
            let _ = write!(output, "  replay {id}");
        }
        output.push('\n');
    }

    let average = if stats.played > 0 {
        stats.total_turns as f64 / stats.played as f64
    } else {
        0.0
    };
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Played {} games ({} decided, {} failed to start), {average:.1} turns on average",
        stats.played, stats.finished, stats.failed_to_start
    );
    let _ = writeln!(output, "Duration: {seconds:.2}s");
    output
}

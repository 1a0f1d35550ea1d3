//! Conquer CLI - headless tools for the conquest server core.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Conquer - territory-conquest game server core
#[derive(Parser, Debug)]
#[command(name = "conquer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play games between random bots
    Simulate {
        /// Bots per game (2-16)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop a game without a winner after this many turns
        #[arg(short = 't', long, default_value = "2000")]
        max_turns: u32,

        /// Room settings as JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory to write replays to
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Render a stored replay
    Replay {
        /// Replay file (.json)
        #[arg(required = true)]
        file: PathBuf,

        /// Turn to show (default: last)
        #[arg(short, long)]
        turn: Option<u32>,

        /// Print every turn up to the selected one
        #[arg(short, long)]
        all: bool,
    },

    /// Generate and render one map
    Mapgen {
        /// Map width
        #[arg(long, default_value = "20")]
        width: u16,

        /// Map height
        #[arg(long, default_value = "20")]
        height: u16,

        /// Kings to place
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Mountain ratio
        #[arg(long, default_value = "0.5")]
        mountain: f64,

        /// City ratio
        #[arg(long, default_value = "0.5")]
        city: f64,

        /// Swamp ratio
        #[arg(long, default_value = "0.0")]
        swamp: f64,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Simulate {
            players,
            games,
            seed,
            max_turns,
            config,
            out,
            threads,
            format,
            progress,
        } => cli::simulate::execute(&cli::simulate::SimulateArgs {
            players,
            games,
            seed,
            max_turns,
            config,
            out,
            threads,
            format,
            progress,
        }),

        Commands::Replay { file, turn, all } => cli::replay::execute(&file, turn, all),

        Commands::Mapgen {
            width,
            height,
            players,
            mountain,
            city,
            swamp,
            seed,
        } => cli::mapgen::execute(
            &conquer::game::GenerationParams {
                width,
                height,
                mountain,
                city,
                swamp,
            },
            players,
            seed,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

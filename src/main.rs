//! Bitboard MCTS: move-selection engine for an 8x8 conversion-capture game.
//!
//! ## Usage
//!
//! - `bitboard-mcts` - Play through the referee protocol with default limits
//! - `bitboard-mcts play --time-ms 100` - Play with a custom per-turn budget
//! - `bitboard-mcts bench` - Search the opening position and report throughput

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use bitboard_mcts::constants::{
    BENCH_ITERATIONS, MAX_ITERATIONS, MAX_TIME_MS, MAX_TIME_MS_LOCAL,
};
use bitboard_mcts::logging::setup_logging;
use bitboard_mcts::mcts::{search, SearchConfig};
use bitboard_mcts::position::State;
use bitboard_mcts::protocol::Engine;
use bitboard_mcts::tables;

/// Bitboard MCTS: a move-selection engine for an 8x8 capture game
#[derive(Parser)]
#[command(name = "bitboard-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `bitboard_mcts=trace` (RUST_LOG wins if set)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play through the referee protocol on stdin/stdout
    Play(SearchArgs),
    /// Search the opening position repeatedly and report throughput
    Bench {
        /// Number of searches to run
        #[arg(long, default_value_t = 10)]
        runs: usize,
        /// Iterations per search
        #[arg(long, default_value_t = BENCH_ITERATIONS)]
        max_iterations: usize,
        /// Fixed RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args, Clone, Debug)]
struct SearchArgs {
    /// Per-turn time budget in milliseconds
    #[arg(long, default_value_t = MAX_TIME_MS)]
    time_ms: u64,
    /// Use the local analysis budget instead of `--time-ms`
    #[arg(long)]
    local: bool,
    /// Hard cap on MCTS iterations per turn
    #[arg(long, default_value_t = MAX_ITERATIONS)]
    max_iterations: usize,
    /// Fixed RNG seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

impl From<SearchArgs> for SearchConfig {
    fn from(args: SearchArgs) -> Self {
        let ms = if args.local { MAX_TIME_MS_LOCAL } else { args.time_ms };
        SearchConfig {
            time_budget: Duration::from_millis(ms),
            max_iterations: args.max_iterations,
            seed: args.seed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level).context("failed to start logger")?;

    tables::init();

    match cli.command {
        Some(Commands::Play(args)) => run_play(args.into()),
        None => run_play(SearchConfig::default()),
        Some(Commands::Bench {
            runs,
            max_iterations,
            seed,
        }) => run_bench(runs, max_iterations, seed),
    }
}

fn run_play(config: SearchConfig) -> Result<()> {
    info!(
        "time budget {} ms, iteration cap {}",
        config.time_budget.as_millis(),
        config.max_iterations
    );
    let mut engine = Engine::new(config);
    let turns = engine
        .run(io::stdin().lock(), io::stdout())
        .context("turn protocol failed")?;
    info!("input closed after {turns} turns");
    Ok(())
}

fn run_bench(runs: usize, max_iterations: usize, seed: Option<u64>) -> Result<()> {
    let config = SearchConfig {
        time_budget: Duration::from_millis(MAX_TIME_MS_LOCAL),
        max_iterations,
        seed,
    };
    let mut rng = config.rng();
    let state = State::initial();

    println!("{state}\n");
    println!("Running {runs} searches of {max_iterations} iterations...");

    let start = Instant::now();
    let mut iterations = 0;
    let mut playouts = 0;
    for run in 0..runs {
        let deadline = config.deadline(Instant::now());
        let result = search(&state, deadline, config.max_iterations, &mut rng)
            .context("benchmark search failed")?;
        println!(
            "run {run}: {} visits {} nodes {} in {:.1} ms",
            result.action,
            result.visits,
            result.nodes,
            result.elapsed.as_secs_f64() * 1000.0
        );
        iterations += result.iterations;
        playouts += result.playouts;
    }

    let secs = start.elapsed().as_secs_f64();
    println!(
        "{iterations} iterations, {playouts} playouts in {secs:.2} s ({:.0} iterations/s)",
        iterations as f64 / secs.max(f64::EPSILON)
    );
    Ok(())
}

//! Peg solitaire solver
//!
//! Runs a best-first search from a start board to a goal board, with
//! checkpoint/resume for long searches.
//!
//!   # Standard 33-hole game, symmetric finishes allowed
//!   cargo run --release --bin solver -- --holes 33
//!
//!   # Custom boards, resumable
//!   cargo run --release --bin solver -- --initial start.txt --goal goal.txt \
//!       --checkpoint data/search.bin --output solution.json

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use peg_core::{Board, Cell, Topology, Variant};
use peg_solver::config::{PhaseRelations, SearchConfig};
use peg_solver::score::ScoreStrategy;
use peg_solver::solution::Solution;
use peg_solver::solver::{enumerate_with, search_with, SearchStatus};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Standard board size: 33 or 45 holes
    #[clap(long, default_value_t = 45)]
    holes: usize,

    /// Start board as nine text rows (`*` peg, `.` hole, space illegal)
    #[clap(long)]
    initial: Option<PathBuf>,

    /// Goal board; defaults to the complement of the start board
    #[clap(long)]
    goal: Option<PathBuf>,

    /// TOML settings file; flags below override it
    #[clap(long)]
    config: Option<PathBuf>,

    /// Only the exact goal counts, not its rotations and reflections
    #[clap(long)]
    no_symmetric: bool,

    /// Stop after this many evaluated states
    #[clap(long)]
    max_moves: Option<u64>,

    /// Checkpoint file, resumed from when it exists
    #[clap(long)]
    checkpoint: Option<PathBuf>,

    /// Evaluated states between checkpoints
    #[clap(long)]
    checkpoint_interval: Option<u64>,

    /// Seconds between progress lines
    #[clap(long)]
    log_interval: Option<u64>,

    #[clap(long, value_enum)]
    score: Option<ScoreStrategy>,

    /// Peg surplus at or below which every state scores 0
    #[clap(long)]
    endgame_window: Option<u32>,

    #[clap(long, value_enum)]
    phase_relations: Option<PhaseRelations>,

    /// Disable the trapped-cell and distance-supply checks
    #[clap(long)]
    no_extended_checks: bool,

    /// Allow diagonal jumps
    #[clap(long)]
    diagonal: bool,

    /// Enumerate every solution depth-first instead of searching for one
    #[clap(long)]
    all: bool,

    /// Most solutions to collect with --all
    #[clap(long, default_value_t = 10)]
    limit: usize,

    /// Write the result as JSON
    #[clap(short, long)]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_config(args: &Args) -> Result<SearchConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) if path.exists() => SearchConfig::load(path)?,
        Some(path) => {
            warn!(path = %path.display(), "settings file not found, using defaults");
            SearchConfig::default()
        }
        None => SearchConfig::default(),
    };

    if args.no_symmetric {
        config.allow_symmetric = false;
    }
    if args.max_moves.is_some() {
        config.max_moves = args.max_moves;
    }
    if args.checkpoint.is_some() {
        config.checkpoint_path = args.checkpoint.clone();
    }
    if let Some(n) = args.checkpoint_interval {
        config.checkpoint_interval = n;
    }
    if let Some(n) = args.log_interval {
        config.log_interval_secs = n;
    }
    if let Some(score) = args.score {
        config.score = score;
    }
    if let Some(n) = args.endgame_window {
        config.endgame_window = n;
    }
    if let Some(phase) = args.phase_relations {
        config.phase_relations = phase;
    }
    if args.no_extended_checks {
        config.extended_checks = false;
    }
    if args.diagonal {
        config.topology = Topology::Diagonal;
    }
    config.validate()?;
    Ok(config)
}

fn load_boards(args: &Args) -> Result<(Board, Board), Box<dyn Error>> {
    let initial = match &args.initial {
        Some(path) => Board::parse(&fs::read_to_string(path)?)?,
        None => Board::fill(Cell::Peg, Variant::from_holes(args.holes)?).with_holes(&[(4, 4)]),
    };
    let goal = match &args.goal {
        Some(path) => Board::parse(&fs::read_to_string(path)?)?,
        None => initial.complement(),
    };
    Ok((initial, goal))
}

fn write_output(args: &Args, json: &str) -> Result<(), Box<dyn Error>> {
    if let Some(path) = &args.output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        info!(event = "output", path = %path.display());
    }
    Ok(())
}

fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let config = load_config(&args)?;
    let (initial, goal) = load_boards(&args)?;

    if args.all {
        let solutions = enumerate_with(initial, goal, &config, args.limit)?;
        for (i, state) in solutions.iter().enumerate() {
            println!("Solution {}:\n{}\n", i + 1, Solution::from_state(state).notation());
        }
        let exports: Vec<Solution> = solutions.iter().map(Solution::from_state).collect();
        write_output(&args, &serde_json::to_string_pretty(&exports)?)?;
        return Ok(if solutions.is_empty() { ExitCode::FAILURE } else { ExitCode::SUCCESS });
    }

    let problem = config.build_problem(initial, goal)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if let Some(parent) = config.checkpoint_path.as_deref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    info!(
        event = "start",
        pegs = problem.initial_count(),
        goal_pegs = problem.goal_count(),
        symmetric = problem.allow_symmetric(),
        topology = ?problem.topology(),
        score = %config.score,
    );

    let scheduler = search_with(problem, &config, Some(running));
    let best = scheduler.best();

    println!("{}", best);
    println!();
    match scheduler.status() {
        SearchStatus::Solved => println!("Solved in {} moves:", best.moves().len()),
        SearchStatus::Impossible => println!("The goal cannot be reached from the start position."),
        status => println!("Not solved ({:?}); closest position has {} pegs:", status, best.count()),
    }
    let solution = Solution::from_state(best);
    if !solution.moves.is_empty() {
        println!("{}", solution.notation());
    }
    write_output(&args, &solution.to_json()?)?;

    Ok(if solution.solved { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

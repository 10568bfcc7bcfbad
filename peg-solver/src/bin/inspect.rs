//! Summarise a checkpoint file.
//!
//! Usage:
//!   cargo run --release --bin inspect -- data/search.bin
//!   cargo run --release --bin inspect -- data/search.bin --best solution.json

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use peg_solver::checkpoint::Checkpoint;
use peg_solver::solution::Solution;
use peg_solver::stats::format_bytes;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Checkpoint written by `solver --checkpoint`
    checkpoint: PathBuf,

    /// Export the best state as solution JSON
    #[clap(long)]
    best: Option<PathBuf>,

    /// Rebuild the problem without the trapped-cell and distance-supply checks
    #[clap(long)]
    no_extended_checks: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let size = fs::metadata(&args.checkpoint)?.len();
    let checkpoint = Checkpoint::load(&args.checkpoint, !args.no_extended_checks)?;
    let problem = checkpoint.problem();

    println!("Checkpoint: {} ({})", args.checkpoint.display(), format_bytes(size));
    println!("==========================");
    println!("Start pegs:      {}", problem.initial_count());
    println!("Goal pegs:       {}", problem.goal_count());
    println!("Symmetric:       {}", problem.allow_symmetric());
    println!("Topology:        {:?}", problem.topology());
    println!("Evaluated:       {}", checkpoint.moves_evaluated);
    println!("Skipped:         {}", checkpoint.moves_skipped);
    println!("Seen:            {}", checkpoint.seen.len());
    println!("Frontier:        {}", checkpoint.frontier.len());

    let mut by_pegs: BTreeMap<u32, usize> = BTreeMap::new();
    for (_, state) in &checkpoint.frontier {
        *by_pegs.entry(state.count()).or_default() += 1;
    }
    for (pegs, n) in &by_pegs {
        println!("  {:>3} pegs:      {}", pegs, n);
    }
    if let Some((score, _)) = checkpoint.frontier.first() {
        println!("Next score:      {}", score);
    }

    let best = &checkpoint.best;
    println!();
    println!("Best ({} pegs, IoU {:.3}, solved: {}):", best.count(), best.iou(), best.is_solved());
    println!("{}", best);

    if let Some(path) = args.best {
        fs::write(&path, Solution::from_state(best).to_json()?)?;
        println!("\nWrote {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

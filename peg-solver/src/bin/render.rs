//! Render a solution file to SVG frames.
//!
//! Usage:
//!   # One frame per position, highlighting the move played from it
//!   cargo run --release --bin render -- solution.json --output-dir ./frames/
//!
//!   # Just the final position
//!   cargo run --release --bin render -- solution.json --last -o final.svg

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use peg_solver::render::{board_svg, frames_svg, RenderOptions};
use peg_solver::solution::Solution;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Solution JSON written by `solver --output`
    solution: PathBuf,

    /// Directory for numbered frames
    #[clap(long, default_value = "frames")]
    output_dir: PathBuf,

    /// Render only the final position to this file
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Render only the final position
    #[clap(long)]
    last: bool,

    /// Ring the goal cells
    #[clap(long)]
    show_goal: bool,

    /// Scale factor (1.0 = 48px cells)
    #[clap(long, default_value_t = 1.0)]
    scale: f32,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let solution = Solution::from_json(&fs::read_to_string(&args.solution)?)?;
    let frames = solution.frames()?;
    let goal = solution.goal_board()?;
    let goal = args.show_goal.then_some(&goal);

    if args.last || args.output.is_some() {
        let Some((board, _)) = frames.last() else {
            return Ok(());
        };
        let svg = board_svg(board, &RenderOptions { next_move: None, goal, scale: args.scale });
        let path = args.output.unwrap_or_else(|| PathBuf::from("final.svg"));
        fs::write(&path, svg)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(&args.output_dir)?;
    let svgs = frames_svg(&frames, goal, args.scale);
    for (i, svg) in svgs.iter().enumerate() {
        let path = args.output_dir.join(format!("frame_{:03}.svg", i));
        fs::write(&path, svg)?;
    }
    println!("Wrote {} frames to {}", svgs.len(), args.output_dir.display());
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

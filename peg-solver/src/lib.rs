//! Best-first peg solitaire search.
//!
//! [`solver::Scheduler`] drives the search: it pops the most promising
//! state, expands it with [`movegen`], drops successors that are already
//! seen or that the pruning checks of `peg_core` rule out, and scores the
//! rest with a [`score::Scorer`]. Long searches checkpoint to disk through
//! [`checkpoint`] and resume from there.
//!
//! ```no_run
//! use peg_core::{Board, Cell, Variant};
//! use peg_solver::solver::search;
//!
//! let initial = Board::fill(Cell::Peg, Variant::Holes33).with_holes(&[(4, 4)]);
//! let best = search(initial, initial.complement(), true, None, None, 1_000_000).unwrap();
//! assert!(best.is_solved());
//! assert_eq!(best.moves().len(), 31);
//! ```

pub mod checkpoint;
pub mod config;
pub mod movegen;
pub mod render;
pub mod score;
pub mod solution;
pub mod solver;
pub mod stats;

pub use checkpoint::{Checkpoint, CheckpointError};
pub use config::{PhaseRelations, SearchConfig, SettingsError};
pub use score::{Heuristic, ScoreStrategy, Scorer};
pub use solution::{Solution, SolutionError};
pub use solver::{enumerate_solutions, enumerate_with, search, search_with, Frontier, Scheduler, SearchOptions, SearchStatus};

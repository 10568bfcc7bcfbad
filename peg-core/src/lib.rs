//! Peg solitaire on the 9x9 cross board.
//!
//! # Board Encoding
//!
//! ```text
//! Two u128 masks, one bit per cell at row * 9 + col:
//!   legal: holes that exist on this board (the four 3x3 corners never do)
//!   pegs:  holes that currently hold a peg (always a subset of legal)
//!
//!            0 1 2 3 4 5 6 7 8
//!         0:       . . .
//!         1:       . . .
//!         2:       . . .
//!         3: . . . . . . . . .
//!         4: . . . . x . . . .
//!         5: . . . . . . . . .
//!         6:       . . .
//!         7:       . . .
//!         8:       . . .
//! ```
//!
//! The 45-hole board uses the whole cross; the 33-hole board drops the
//! outer ring of the grid.
//!
//! # Moves
//!
//! A move is `(row, col, direction)`: the peg at `(row, col)` jumps the
//! neighbouring peg in `direction` and lands two cells away on an empty
//! hole. Direction codes are 0 = down, 1 = right, 2 = up, 3 = left, and
//! 4-7 for the diagonals of the marble-board topology.
//!
//! # Pruning
//!
//! [`GameState::is_impossible`] runs the checks in [`prune`], each a
//! necessary condition for the goal to be reachable.

pub mod board;
pub mod error;
pub mod game;
pub mod moves;
pub mod prune;
pub mod symmetry;

pub use board::{Board, Cell, Variant, CELLS, SIZE};
pub use error::ConfigError;
pub use game::{replay, GameState, Problem, ProblemBuilder};
pub use moves::{Direction, Move, Topology};
pub use symmetry::Symmetry;

//! Construction errors for boards and games.

use thiserror::Error;

/// A start/goal pair (or a single board) that cannot describe a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board must be 9x9, got {rows} rows with a {cols}-cell row")]
    Shape { rows: usize, cols: usize },

    #[error("invalid cell value {0} (expected -1, 0 or 1)")]
    CellValue(i8),

    #[error("invalid board character {ch:?} at row {row}")]
    CellChar { ch: char, row: usize },

    #[error("the four 3x3 corner blocks must be illegal")]
    CornersNotIllegal,

    #[error("start and goal boards have different legal holes")]
    MaskMismatch,

    #[error("start board has no empty hole")]
    NoEmptyHole,

    #[error("goal board has no pegs")]
    EmptyGoal,

    #[error("goal needs {goal} pegs but the start board only has {start}")]
    GoalUnreachable { start: u32, goal: u32 },

    #[error("unsupported hole count {0}, expected 33 or 45")]
    Variant(usize),
}

//! Lazy move generation.
//!
//! Moves come out in a fixed order: pegs in row-major order, and for each
//! peg the directions of the board topology in code order (down, right, up,
//! left, then the diagonals). The search keeps the first of several
//! symmetric duplicates it meets, so this order is part of what makes runs
//! reproducible.

use peg_core::board::{bits, SIZE};
use peg_core::{Board, Direction, GameState, Move, Topology};

/// Iterator over the legal jumps of a board.
pub struct MoveGenerator {
    board: Board,
    directions: &'static [Direction],
    /// Pegs not yet visited
    remaining: u128,
    /// Peg being expanded
    source: Option<(usize, usize)>,
    /// Next direction index for `source`
    dir_idx: usize,
}

impl MoveGenerator {
    pub fn new(board: &Board, topology: Topology) -> Self {
        Self {
            board: *board,
            directions: topology.directions(),
            remaining: board.peg_mask(),
            source: None,
            dir_idx: 0,
        }
    }

    fn next_source(&mut self) -> Option<(usize, usize)> {
        let idx = bits(self.remaining).next()?;
        self.remaining &= self.remaining - 1;
        self.dir_idx = 0;
        Some((idx / SIZE, idx % SIZE))
    }
}

impl Iterator for MoveGenerator {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        loop {
            let (row, col) = match self.source {
                Some(cell) => cell,
                None => {
                    let cell = self.next_source()?;
                    self.source = Some(cell);
                    cell
                }
            };
            while self.dir_idx < self.directions.len() {
                let mov = Move::new(row, col, self.directions[self.dir_idx]);
                self.dir_idx += 1;
                if self.board.jump(mov).is_some() {
                    return Some(mov);
                }
            }
            self.source = None;
        }
    }
}

/// Every state one legal move away, produced on demand.
pub fn expand(state: &GameState) -> impl Iterator<Item = GameState> + '_ {
    MoveGenerator::new(state.board(), state.topology()).filter_map(move |mov| state.apply(mov))
}

/// All legal moves of a state, in generation order.
pub fn legal_moves(state: &GameState) -> Vec<Move> {
    MoveGenerator::new(state.board(), state.topology()).collect()
}

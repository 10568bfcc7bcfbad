//! JSON export of a finished search, for rendering and later replay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use peg_core::{replay, Board, ConfigError, GameState, Move, Topology};

#[derive(Debug, Error)]
pub enum SolutionError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid board: {0}")]
    Board(#[from] ConfigError),

    #[error("move {index} ({mov}) is not legal")]
    IllegalMove { index: usize, mov: Move },
}

/// A move sequence with the boards it connects. Boards are stored as text
/// rows (`*` peg, `.` hole, space illegal) so the file reads on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub initial: Vec<String>,
    pub goal: Vec<String>,
    pub moves: Vec<Move>,
    pub solved: bool,
    pub pegs_left: u32,
    #[serde(default)]
    pub allow_symmetric: bool,
    #[serde(default)]
    pub topology: Topology,
}

impl Solution {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            initial: state.initial().rows(),
            goal: state.goal().rows(),
            moves: state.moves().to_vec(),
            solved: state.is_solved(),
            pegs_left: state.count(),
            allow_symmetric: state.allow_symmetric(),
            topology: state.topology(),
        }
    }

    pub fn to_json(&self) -> Result<String, SolutionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SolutionError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn initial_board(&self) -> Result<Board, SolutionError> {
        Ok(Board::parse(&self.initial.join("\n"))?)
    }

    pub fn goal_board(&self) -> Result<Board, SolutionError> {
        Ok(Board::parse(&self.goal.join("\n"))?)
    }

    /// Every board from the start through the last move.
    pub fn boards(&self) -> Result<Vec<Board>, SolutionError> {
        let initial = self.initial_board()?;
        if let Some(index) = self.moves.iter().position(|m| !self.topology.allows(m.direction)) {
            return Err(SolutionError::IllegalMove { index, mov: self.moves[index] });
        }
        match replay(&initial, &self.moves) {
            Some(boards) => Ok(boards),
            None => {
                // find the offending move for the message
                let mut board = initial;
                let mut index = 0;
                while let Some(next) = board.jump(self.moves[index]) {
                    board = next;
                    index += 1;
                }
                Err(SolutionError::IllegalMove { index, mov: self.moves[index] })
            }
        }
    }

    /// Boards paired with the move that leads away from each one. The last
    /// frame has no move.
    pub fn frames(&self) -> Result<Vec<(Board, Option<Move>)>, SolutionError> {
        let boards = self.boards()?;
        Ok(boards
            .into_iter()
            .enumerate()
            .map(|(i, board)| (board, self.moves.get(i).copied()))
            .collect())
    }

    /// Moves in 1-based `row,col,direction` notation, one per line.
    pub fn notation(&self) -> String {
        self.moves
            .iter()
            .map(|m| format!("{},{},{}", m.row + 1, m.col + 1, m.direction))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peg_core::{Direction, Variant};

    fn two_moves() -> GameState {
        GameState::standard(Variant::Holes33, false)
            .unwrap()
            .move_peg(4, 2, Direction::Right)
            .unwrap()
            .move_peg(2, 3, Direction::Down)
            .unwrap()
    }

    #[test]
    fn test_from_state() {
        let state = two_moves();
        let solution = Solution::from_state(&state);
        assert!(!solution.solved);
        assert_eq!(solution.pegs_left, 30);
        assert_eq!(solution.initial[4], " ***.*** ");
        assert_eq!(solution.goal[4], " ...*... ");
        assert_eq!(solution.notation(), "5,3,right\n3,4,down");
    }

    #[test]
    fn test_json_and_replay() {
        let state = two_moves();
        let json = Solution::from_state(&state).to_json().unwrap();
        assert!(json.contains("\"direction\": \"right\""));

        let back = Solution::from_json(&json).unwrap();
        assert_eq!(back.initial_board().unwrap(), *state.initial());
        assert_eq!(back.goal_board().unwrap(), *state.goal());

        let boards = back.boards().unwrap();
        assert_eq!(boards.len(), 3);
        assert_eq!(boards[2], *state.board());

        let frames = back.frames().unwrap();
        assert_eq!(frames[0].1, Some(Move::new(4, 2, Direction::Right)));
        assert_eq!(frames[2].1, None);
    }

    #[test]
    fn test_illegal_move_reported() {
        let mut solution = Solution::from_state(&two_moves());
        solution.moves.push(Move::new(0, 0, Direction::Down));
        assert!(matches!(solution.boards(), Err(SolutionError::IllegalMove { index: 2, .. })));

        solution.moves[2] = Move::new(4, 4, Direction::DownRight);
        assert!(matches!(solution.boards(), Err(SolutionError::IllegalMove { index: 2, .. })));
    }
}

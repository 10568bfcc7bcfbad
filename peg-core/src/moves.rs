//! Jump directions, board topologies and the move triple.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a jump.
///
/// The first four codes match the history format used by checkpoints
/// (0 = down, 1 = right, 2 = up, 3 = left). Diagonals only occur on the
/// [`Topology::Diagonal`] board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Direction {
    Down = 0,
    Right = 1,
    Up = 2,
    Left = 3,
    DownRight = 4,
    UpRight = 5,
    UpLeft = 6,
    DownLeft = 7,
}

impl Direction {
    pub const ORTHOGONAL: [Direction; 4] =
        [Direction::Down, Direction::Right, Direction::Up, Direction::Left];

    pub const ALL: [Direction; 8] = [
        Direction::Down,
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::DownRight,
        Direction::UpRight,
        Direction::UpLeft,
        Direction::DownLeft,
    ];

    /// Row and column step for one cell in this direction.
    #[inline]
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Down => (1, 0),
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Left => (0, -1),
            Direction::DownRight => (1, 1),
            Direction::UpRight => (-1, 1),
            Direction::UpLeft => (-1, -1),
            Direction::DownLeft => (1, -1),
        }
    }

    /// The direction pointing back the way this one came.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::DownRight => Direction::UpLeft,
            Direction::UpRight => Direction::DownLeft,
            Direction::UpLeft => Direction::DownRight,
            Direction::DownLeft => Direction::UpRight,
        }
    }

    /// Convert from the stored code (0-7).
    pub fn from_code(code: u8) -> Option<Direction> {
        Direction::ALL.get(code as usize).copied()
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_diagonal(self) -> bool {
        self.code() >= 4
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::DownRight => "down-right",
            Direction::UpRight => "up-right",
            Direction::UpLeft => "up-left",
            Direction::DownLeft => "down-left",
        }
    }

    pub fn from_name(name: &str) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which jumps the board allows.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// Peg solitaire: horizontal and vertical jumps only.
    #[default]
    Orthogonal,
    /// Marble-board variant that also allows diagonal jumps.
    Diagonal,
}

impl Topology {
    /// Directions in enumeration order. Expansion order follows this slice.
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Topology::Orthogonal => &Direction::ORTHOGONAL,
            Topology::Diagonal => &Direction::ALL,
        }
    }

    pub fn allows(self, direction: Direction) -> bool {
        self == Topology::Diagonal || !direction.is_diagonal()
    }
}

/// A jump from `(row, col)` over the neighbour in `direction`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Move {
    pub row: u8,
    pub col: u8,
    pub direction: Direction,
}

impl Move {
    pub fn new(row: usize, col: usize, direction: Direction) -> Move {
        debug_assert!(row < 9 && col < 9);
        Move { row: row as u8, col: col as u8, direction }
    }

    /// Cell `steps` cells away from the source, if it is on the 9x9 grid.
    pub fn offset(&self, steps: i8) -> Option<(usize, usize)> {
        let (dr, dc) = self.direction.delta();
        let row = self.row as i8 + steps * dr;
        let col = self.col as i8 + steps * dc;
        if (0..9).contains(&row) && (0..9).contains(&col) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    /// The cell being jumped over.
    pub fn jumped(&self) -> Option<(usize, usize)> {
        self.offset(1)
    }

    /// Where the jumping peg lands.
    pub fn landing(&self) -> Option<(usize, usize)> {
        self.offset(2)
    }

    /// Decode a stored `(row, col, direction)` byte triple.
    pub fn from_bytes(bytes: [u8; 3]) -> Option<Move> {
        let [row, col, code] = bytes;
        if row >= 9 || col >= 9 {
            return None;
        }
        Some(Move { row, col, direction: Direction::from_code(code)? })
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.row, self.col, self.direction.code()]
    }
}

/// Printed 1-based, e.g. `(5, 3, right)`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.row + 1, self.col + 1, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_codes_roundtrip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_code(d.code()), Some(d));
            assert_eq!(Direction::from_name(d.name()), Some(d));
        }
        assert_eq!(Direction::from_code(8), None);
    }

    #[test]
    fn test_opposite_negates_delta() {
        for d in Direction::ALL {
            let (dr, dc) = d.delta();
            assert_eq!(d.opposite().delta(), (-dr, -dc));
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn test_topology_directions() {
        assert_eq!(Topology::Orthogonal.directions().len(), 4);
        assert_eq!(Topology::Diagonal.directions().len(), 8);
        assert!(!Topology::Orthogonal.allows(Direction::UpLeft));
        assert!(Topology::Diagonal.allows(Direction::UpLeft));
    }

    #[test]
    fn test_move_cells() {
        let mov = Move::new(4, 2, Direction::Right);
        assert_eq!(mov.jumped(), Some((4, 3)));
        assert_eq!(mov.landing(), Some((4, 4)));

        let edge = Move::new(1, 4, Direction::Up);
        assert_eq!(edge.jumped(), Some((0, 4)));
        assert_eq!(edge.landing(), None);
    }

    #[test]
    fn test_move_bytes() {
        let mov = Move::new(3, 7, Direction::Left);
        assert_eq!(Move::from_bytes(mov.to_bytes()), Some(mov));
        assert_eq!(Move::from_bytes([9, 0, 0]), None);
        assert_eq!(Move::from_bytes([0, 0, 9]), None);
    }

    #[test]
    fn test_move_display_is_one_based() {
        assert_eq!(Move::new(0, 3, Direction::Down).to_string(), "(1, 4, down)");
    }
}

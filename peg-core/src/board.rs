//! Compact 9x9 board: a legality mask and a peg mask, one bit per cell.
//!
//! ```text
//! Bit index = row * 9 + col (row-major, bits 0-80)
//!
//!            0 1 2 3 4 5 6 7 8
//!         0:       C A C
//!         1:       B D B
//!         2:       C A C
//!         3: D B D B D B D B D
//!         4: A C A C A C A C A
//!         5: D B D B D B D B D
//!         6:       C A C
//!         7:       B D B
//!         8:       C A C
//! ```
//!
//! Letters are the peg classes by `(row mod 2, col mod 2)`: A = (0,0),
//! B = (1,1), C = (0,1), D = (1,0).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::moves::Move;
use crate::symmetry::{Symmetry, HASH_WEIGHTS};

/// Board width and height.
pub const SIZE: usize = 9;
/// Number of cells on the grid.
pub const CELLS: usize = SIZE * SIZE;

/// Row-major bit index of a cell.
#[inline]
pub const fn index(row: usize, col: usize) -> usize {
    row * SIZE + col
}

/// Iterate the indices of the set bits of a cell mask, lowest first.
#[inline]
pub fn bits(mut mask: u128) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if mask == 0 {
            None
        } else {
            let idx = mask.trailing_zeros() as usize;
            mask &= mask - 1;
            Some(idx)
        }
    })
}

const fn in_corner(row: usize, col: usize) -> bool {
    (row < 3 || row > 5) && (col < 3 || col > 5)
}

const fn build_corner_mask() -> u128 {
    let mut mask = 0u128;
    let mut idx = 0;
    while idx < CELLS {
        if in_corner(idx / SIZE, idx % SIZE) {
            mask |= 1u128 << idx;
        }
        idx += 1;
    }
    mask
}

const fn build_rim_mask() -> u128 {
    let mut mask = 0u128;
    let mut idx = 0;
    while idx < CELLS {
        let (row, col) = (idx / SIZE, idx % SIZE);
        if row == 0 || row == SIZE - 1 || col == 0 || col == SIZE - 1 {
            mask |= 1u128 << idx;
        }
        idx += 1;
    }
    mask
}

const fn build_class_masks() -> [u128; 4] {
    let mut masks = [0u128; 4];
    let mut idx = 0;
    while idx < CELLS {
        masks[class_of(idx / SIZE, idx % SIZE)] |= 1u128 << idx;
        idx += 1;
    }
    masks
}

const fn build_diagonal_masks(north_east: bool) -> [u128; 3] {
    let mut masks = [0u128; 3];
    let mut idx = 0;
    while idx < CELLS {
        let (row, col) = (idx / SIZE, idx % SIZE);
        let k = if north_east { (row + col) % 3 } else { (SIZE + row - col) % 3 };
        masks[k] |= 1u128 << idx;
        idx += 1;
    }
    masks
}

/// All 81 cells.
pub const FULL_MASK: u128 = (1u128 << CELLS) - 1;
/// The four 3x3 corner blocks, illegal on every cross board.
pub const CORNER_MASK: u128 = build_corner_mask();
/// Outer ring of the grid; illegal on the 33-hole board.
pub const RIM_MASK: u128 = build_rim_mask();
/// Cells of classes A, B, C, D.
pub const CLASS_MASKS: [u128; 4] = build_class_masks();
/// Cells grouped by `(row + col) mod 3`.
pub const NE_DIAGONAL_MASKS: [u128; 3] = build_diagonal_masks(true);
/// Cells grouped by `(row - col) mod 3`.
pub const SE_DIAGONAL_MASKS: [u128; 3] = build_diagonal_masks(false);

/// Peg class of a cell (0 = A, 1 = B, 2 = C, 3 = D).
#[inline]
pub const fn class_of(row: usize, col: usize) -> usize {
    match (row % 2, col % 2) {
        (0, 0) => 0,
        (1, 1) => 1,
        (0, _) => 2,
        _ => 3,
    }
}

/// Letter used when printing a class.
pub const CLASS_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Contents of a single hole.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Cell {
    Illegal = -1,
    Empty = 0,
    Peg = 1,
}

impl Cell {
    pub fn from_i8(value: i8) -> Option<Cell> {
        match value {
            -1 => Some(Cell::Illegal),
            0 => Some(Cell::Empty),
            1 => Some(Cell::Peg),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i8(self) -> i8 {
        self as i8
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Illegal => ' ',
            Cell::Empty => '.',
            Cell::Peg => '*',
        }
    }

    /// Accepts `*`, `o`, `O`, `x`, `X`, `1` for pegs, `.`, `0` for holes and
    /// space, `#`, `-` for illegal cells.
    pub fn from_char(ch: char) -> Option<Cell> {
        match ch {
            '*' | 'o' | 'O' | 'x' | 'X' | '1' => Some(Cell::Peg),
            '.' | '0' => Some(Cell::Empty),
            ' ' | '#' | '-' => Some(Cell::Illegal),
            _ => None,
        }
    }
}

/// Standard cross-board sizes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
pub enum Variant {
    /// English board: a 7x7 cross centred in the 9x9 grid.
    #[serde(rename = "33")]
    Holes33,
    /// Full 9x9 cross.
    #[default]
    #[serde(rename = "45")]
    Holes45,
}

impl Variant {
    pub fn holes(self) -> usize {
        match self {
            Variant::Holes33 => 33,
            Variant::Holes45 => 45,
        }
    }

    pub fn from_holes(holes: usize) -> Result<Variant, ConfigError> {
        match holes {
            33 => Ok(Variant::Holes33),
            45 => Ok(Variant::Holes45),
            n => Err(ConfigError::Variant(n)),
        }
    }

    /// Legal cells of this variant.
    pub fn legal_mask(self) -> u128 {
        match self {
            Variant::Holes45 => FULL_MASK & !CORNER_MASK,
            Variant::Holes33 => FULL_MASK & !CORNER_MASK & !RIM_MASK,
        }
    }
}

/// A board value. Copying it is the way to branch a position.
///
/// Invariant: `pegs` is a subset of `legal`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    legal: u128,
    pegs: u128,
}

impl Board {
    /// Board of the given variant with every legal hole set to `value`.
    /// `Cell::Illegal` yields a board with no legal holes.
    pub fn fill(value: Cell, variant: Variant) -> Board {
        let legal = match value {
            Cell::Illegal => 0,
            _ => variant.legal_mask(),
        };
        let pegs = if value == Cell::Peg { legal } else { 0 };
        Board { legal, pegs }
    }

    /// Build from raw masks. Pegs outside `legal` are dropped.
    pub fn from_masks(legal: u128, pegs: u128) -> Board {
        let legal = legal & FULL_MASK;
        Board { legal, pegs: pegs & legal }
    }

    /// Build from a grid of `-1 / 0 / 1` values.
    pub fn from_grid<R: AsRef<[i8]>>(rows: &[R]) -> Result<Board, ConfigError> {
        if rows.len() != SIZE {
            let cols = rows.first().map_or(0, |r| r.as_ref().len());
            return Err(ConfigError::Shape { rows: rows.len(), cols });
        }
        let mut board = Board { legal: 0, pegs: 0 };
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != SIZE {
                return Err(ConfigError::Shape { rows: SIZE, cols: values.len() });
            }
            for (col, &value) in values.iter().enumerate() {
                let cell = Cell::from_i8(value).ok_or(ConfigError::CellValue(value))?;
                board.set(row, col, cell);
            }
        }
        Ok(board)
    }

    /// Decode 81 row-major bytes, each an `i8` cell value.
    pub fn from_bytes(bytes: &[u8]) -> Result<Board, ConfigError> {
        if bytes.len() != CELLS {
            return Err(ConfigError::Shape { rows: bytes.len() / SIZE, cols: SIZE });
        }
        let mut board = Board { legal: 0, pegs: 0 };
        for (idx, &byte) in bytes.iter().enumerate() {
            let value = byte as i8;
            let cell = Cell::from_i8(value).ok_or(ConfigError::CellValue(value))?;
            board.set(idx / SIZE, idx % SIZE, cell);
        }
        Ok(board)
    }

    /// Encode as 81 row-major bytes (`-1` stored as `0xFF`).
    pub fn to_bytes(&self) -> [u8; CELLS] {
        let mut out = [0u8; CELLS];
        for (idx, byte) in out.iter_mut().enumerate() {
            *byte = self.cell_at(idx).to_i8() as u8;
        }
        out
    }

    /// Parse nine text rows. Short rows are padded with illegal cells.
    pub fn parse(text: &str) -> Result<Board, ConfigError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() != SIZE {
            let cols = lines.first().map_or(0, |l| l.chars().count());
            return Err(ConfigError::Shape { rows: lines.len(), cols });
        }
        let mut board = Board { legal: 0, pegs: 0 };
        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width > SIZE {
                return Err(ConfigError::Shape { rows: SIZE, cols: width });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or(ConfigError::CellChar { ch, row })?;
                board.set(row, col, cell);
            }
        }
        Ok(board)
    }

    /// The board as nine printable rows.
    pub fn rows(&self) -> Vec<String> {
        (0..SIZE)
            .map(|row| (0..SIZE).map(|col| self.cell(row, col).to_char()).collect())
            .collect()
    }

    #[inline]
    pub fn legal_mask(&self) -> u128 {
        self.legal
    }

    #[inline]
    pub fn peg_mask(&self) -> u128 {
        self.pegs
    }

    /// Legal cells without a peg.
    #[inline]
    pub fn hole_mask(&self) -> u128 {
        self.legal & !self.pegs
    }

    #[inline]
    fn cell_at(&self, idx: usize) -> Cell {
        let bit = 1u128 << idx;
        if self.pegs & bit != 0 {
            Cell::Peg
        } else if self.legal & bit != 0 {
            Cell::Empty
        } else {
            Cell::Illegal
        }
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cell_at(index(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let bit = 1u128 << index(row, col);
        match cell {
            Cell::Illegal => {
                self.legal &= !bit;
                self.pegs &= !bit;
            }
            Cell::Empty => {
                self.legal |= bit;
                self.pegs &= !bit;
            }
            Cell::Peg => {
                self.legal |= bit;
                self.pegs |= bit;
            }
        }
    }

    /// Copy with the given cells holding pegs.
    pub fn with_pegs(&self, cells: &[(usize, usize)]) -> Board {
        let mut board = *self;
        for &(row, col) in cells {
            board.set(row, col, Cell::Peg);
        }
        board
    }

    /// Copy with the given cells emptied.
    pub fn with_holes(&self, cells: &[(usize, usize)]) -> Board {
        let mut board = *self;
        for &(row, col) in cells {
            board.set(row, col, Cell::Empty);
        }
        board
    }

    /// Swap pegs and holes on every legal cell.
    pub fn complement(&self) -> Board {
        Board { legal: self.legal, pegs: self.legal & !self.pegs }
    }

    #[inline]
    pub fn is_peg(&self, row: usize, col: usize) -> bool {
        self.pegs & (1u128 << index(row, col)) != 0
    }

    #[inline]
    pub fn is_hole(&self, row: usize, col: usize) -> bool {
        self.hole_mask() & (1u128 << index(row, col)) != 0
    }

    #[inline]
    pub fn is_legal(&self, row: usize, col: usize) -> bool {
        self.legal & (1u128 << index(row, col)) != 0
    }

    #[inline]
    pub fn peg_count(&self) -> u32 {
        self.pegs.count_ones()
    }

    #[inline]
    pub fn hole_count(&self) -> u32 {
        self.hole_mask().count_ones()
    }

    /// Coordinates of every peg in row-major order.
    pub fn pegs(&self) -> impl Iterator<Item = (usize, usize)> {
        bits(self.pegs).map(|idx| (idx / SIZE, idx % SIZE))
    }

    /// Perform a jump. `None` unless the source and jumped cells hold pegs
    /// and the landing cell is an empty hole on the grid.
    pub fn jump(&self, mov: Move) -> Option<Board> {
        let (row, col) = (mov.row as usize, mov.col as usize);
        if row >= SIZE || col >= SIZE || !self.is_peg(row, col) {
            return None;
        }
        let (mr, mc) = mov.jumped()?;
        let (lr, lc) = mov.landing()?;
        if !self.is_peg(mr, mc) || !self.is_hole(lr, lc) {
            return None;
        }
        let mut pegs = self.pegs;
        pegs &= !(1u128 << index(row, col));
        pegs &= !(1u128 << index(mr, mc));
        pegs |= 1u128 << index(lr, lc);
        Some(Board { legal: self.legal, pegs })
    }

    /// Reverse a jump: the landing peg flies back over the refilled jumped
    /// cell to its source. `None` unless the board looks like `mov` was
    /// just played.
    pub fn unjump(&self, mov: Move) -> Option<Board> {
        let (row, col) = (mov.row as usize, mov.col as usize);
        if row >= SIZE || col >= SIZE || !self.is_hole(row, col) {
            return None;
        }
        let (mr, mc) = mov.jumped()?;
        let (lr, lc) = mov.landing()?;
        if !self.is_hole(mr, mc) || !self.is_peg(lr, lc) {
            return None;
        }
        let mut pegs = self.pegs;
        pegs |= 1u128 << index(row, col);
        pegs |= 1u128 << index(mr, mc);
        pegs &= !(1u128 << index(lr, lc));
        Some(Board { legal: self.legal, pegs })
    }

    /// Image of the board (holes and pegs) under a symmetry.
    pub fn transform(&self, sym: Symmetry) -> Board {
        Board { legal: sym.permute(self.legal), pegs: sym.permute(self.pegs) }
    }

    /// All eight images, in [`Symmetry::ALL`] order.
    pub fn all_symmetries(&self) -> [Board; 8] {
        Symmetry::ALL.map(|sym| self.transform(sym))
    }

    /// Equal up to rotation and reflection.
    pub fn symmetric_eq(&self, other: &Board) -> bool {
        if self == other {
            return true;
        }
        if self.peg_count() != other.peg_count() || self.weight_hash() != other.weight_hash() {
            return false;
        }
        Symmetry::ALL[1..].iter().any(|&sym| self.transform(sym) == *other)
    }

    /// Weighted peg sum, invariant under every symmetry.
    pub fn weight_hash(&self) -> u64 {
        bits(self.pegs).map(|idx| HASH_WEIGHTS[idx]).sum()
    }

    /// Peg counts of classes A, B, C, D.
    pub fn class_counts(&self) -> [u8; 4] {
        CLASS_MASKS.map(|mask| (self.pegs & mask).count_ones() as u8)
    }

    /// Phase relations: for each of the three north-east and three
    /// south-east diagonal classes (mod 3), whether its peg count has the
    /// same parity as the total. Orthogonal jumps preserve all six.
    pub fn phase_relations(&self) -> [bool; 6] {
        let total = self.peg_count() % 2;
        let mut out = [false; 6];
        for k in 0..3 {
            out[k] = (self.pegs & NE_DIAGONAL_MASKS[k]).count_ones() % 2 == total;
            out[3 + k] = (self.pegs & SE_DIAGONAL_MASKS[k]).count_ones() % 2 == total;
        }
        out
    }

    /// Bounding box `(top, left, bottom, right)` of the pegs in `mask`.
    pub fn bounding_box(mask: u128) -> Option<(usize, usize, usize, usize)> {
        let mut it = bits(mask);
        let first = it.next()?;
        let (mut top, mut left) = (first / SIZE, first % SIZE);
        let (mut bottom, mut right) = (top, left);
        for idx in it {
            let (row, col) = (idx / SIZE, idx % SIZE);
            top = top.min(row);
            bottom = bottom.max(row);
            left = left.min(col);
            right = right.max(col);
        }
        Some((top, left, bottom, right))
    }

    /// Mask of the rectangle `(top, left, bottom, right)`, inclusive.
    pub fn rect_mask(top: usize, left: usize, bottom: usize, right: usize) -> u128 {
        let mut mask = 0u128;
        for row in top..=bottom {
            for col in left..=right {
                mask |= 1u128 << index(row, col);
            }
        }
        mask
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::fill(Cell::Peg, Variant::Holes45).with_holes(&[(4, 4)])
    }
}

impl FromStr for Board {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::parse(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

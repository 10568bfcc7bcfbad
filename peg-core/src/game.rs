//! Game states: a board plus the history that produced it, tied to the
//! shared start/goal problem it belongs to.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::board::{class_of, Board, Cell, Variant, CLASS_LETTERS, CORNER_MASK, SIZE};
use crate::error::ConfigError;
use crate::moves::{Direction, Move, Topology};
use crate::prune::{self, PruneCheck};
use crate::symmetry::Symmetry;

/// A goal layout the search may finish on, with its class counts.
#[derive(Clone, Debug)]
pub(crate) struct GoalImage {
    pub board: Board,
    pub classes: [u8; 4],
}

/// The fixed part of a game: where it starts, where it must end and the
/// rules in play. Shared by every state of a search.
#[derive(Debug)]
pub struct Problem {
    initial: Board,
    goal: Board,
    /// Distinct goal layouts that count as solved. Just the goal unless
    /// symmetric play is allowed.
    goal_images: Vec<GoalImage>,
    initial_count: u32,
    goal_count: u32,
    allow_symmetric: bool,
    topology: Topology,
    extended_checks: bool,
    checks: Vec<PruneCheck>,
    checks_with_phase: Vec<PruneCheck>,
}

/// Collects the optional settings of a [`Problem`].
#[derive(Clone, Debug)]
pub struct ProblemBuilder {
    initial: Board,
    goal: Board,
    allow_symmetric: bool,
    topology: Topology,
    extended_checks: bool,
}

impl ProblemBuilder {
    pub fn allow_symmetric(mut self, allow: bool) -> Self {
        self.allow_symmetric = allow;
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Enable the trapped-cell and distance-supply checks (default on).
    pub fn extended_checks(mut self, enabled: bool) -> Self {
        self.extended_checks = enabled;
        self
    }

    /// Validate the boards and freeze the problem.
    pub fn build(self) -> Result<Arc<Problem>, ConfigError> {
        let ProblemBuilder { initial, goal, allow_symmetric, topology, extended_checks } = self;

        if initial.legal_mask() & CORNER_MASK != 0 {
            return Err(ConfigError::CornersNotIllegal);
        }
        if initial.legal_mask() != goal.legal_mask() {
            return Err(ConfigError::MaskMismatch);
        }
        if initial.hole_count() == 0 {
            return Err(ConfigError::NoEmptyHole);
        }
        let goal_count = goal.peg_count();
        if goal_count == 0 {
            return Err(ConfigError::EmptyGoal);
        }
        let initial_count = initial.peg_count();
        if goal_count > initial_count {
            return Err(ConfigError::GoalUnreachable { start: initial_count, goal: goal_count });
        }

        let mut goal_images: Vec<GoalImage> = Vec::with_capacity(8);
        let symmetries: &[Symmetry] = if allow_symmetric { &Symmetry::ALL } else { &Symmetry::ALL[..1] };
        for &sym in symmetries {
            let image = goal.transform(sym);
            if image.legal_mask() == goal.legal_mask() && !goal_images.iter().any(|g| g.board == image) {
                goal_images.push(GoalImage { board: image, classes: image.class_counts() });
            }
        }

        Ok(Arc::new(Problem {
            initial,
            goal,
            goal_images,
            initial_count,
            goal_count,
            allow_symmetric,
            topology,
            extended_checks,
            checks: prune::checks(topology, extended_checks, false),
            checks_with_phase: prune::checks(topology, extended_checks, true),
        }))
    }
}

impl Problem {
    pub fn builder(initial: Board, goal: Board) -> ProblemBuilder {
        ProblemBuilder {
            initial,
            goal,
            allow_symmetric: false,
            topology: Topology::Orthogonal,
            extended_checks: true,
        }
    }

    pub fn initial(&self) -> &Board {
        &self.initial
    }

    pub fn goal(&self) -> &Board {
        &self.goal
    }

    pub fn initial_count(&self) -> u32 {
        self.initial_count
    }

    pub fn goal_count(&self) -> u32 {
        self.goal_count
    }

    pub fn allow_symmetric(&self) -> bool {
        self.allow_symmetric
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn extended_checks(&self) -> bool {
        self.extended_checks
    }

    /// Moves a solution takes: one peg is removed per jump.
    pub fn solution_length(&self) -> usize {
        (self.initial_count - self.goal_count) as usize
    }

    /// The goal layouts that count as solved.
    pub fn goal_boards(&self) -> impl Iterator<Item = &Board> {
        self.goal_images.iter().map(|g| &g.board)
    }

    pub(crate) fn goal_images(&self) -> &[GoalImage] {
        &self.goal_images
    }

    pub(crate) fn checks(&self, check_phase_relations: bool) -> &[PruneCheck] {
        if check_phase_relations {
            &self.checks_with_phase
        } else {
            &self.checks
        }
    }

    /// Same start, goal and rules. Pruning settings are not compared.
    pub fn same_game(&self, other: &Problem) -> bool {
        self.initial == other.initial
            && self.goal == other.goal
            && self.allow_symmetric == other.allow_symmetric
            && self.topology == other.topology
    }

    pub fn is_solved_board(&self, board: &Board) -> bool {
        board.peg_count() == self.goal_count && self.goal_images.iter().any(|g| g.board == *board)
    }
}

/// A position reached from the start of a [`Problem`].
///
/// States are values: every move returns a fresh state and never touches
/// the parent.
#[derive(Clone)]
pub struct GameState {
    board: Board,
    count: u32,
    moves: Vec<Move>,
    problem: Arc<Problem>,
}

impl GameState {
    /// Root state of an orthogonal game.
    pub fn new(initial: Board, goal: Board, allow_symmetric: bool) -> Result<GameState, ConfigError> {
        let problem = Problem::builder(initial, goal).allow_symmetric(allow_symmetric).build()?;
        Ok(GameState::root(problem))
    }

    /// Standard game: every hole filled except the centre, finishing with a
    /// single peg in the centre.
    pub fn standard(variant: Variant, allow_symmetric: bool) -> Result<GameState, ConfigError> {
        let initial = Board::fill(Cell::Peg, variant).with_holes(&[(4, 4)]);
        GameState::new(initial, initial.complement(), allow_symmetric)
    }

    pub fn root(problem: Arc<Problem>) -> GameState {
        GameState {
            board: problem.initial,
            count: problem.initial_count,
            moves: Vec::with_capacity(problem.solution_length()),
            problem,
        }
    }

    /// Rebuild a state by playing `moves` from the start.
    pub fn from_history(problem: Arc<Problem>, moves: &[Move]) -> Option<GameState> {
        let mut state = GameState::root(problem);
        for &mov in moves {
            state = state.apply(mov)?;
        }
        Some(state)
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn problem(&self) -> &Arc<Problem> {
        &self.problem
    }

    pub fn initial(&self) -> &Board {
        &self.problem.initial
    }

    pub fn goal(&self) -> &Board {
        &self.problem.goal
    }

    pub fn initial_count(&self) -> u32 {
        self.problem.initial_count
    }

    pub fn goal_count(&self) -> u32 {
        self.problem.goal_count
    }

    pub fn allow_symmetric(&self) -> bool {
        self.problem.allow_symmetric
    }

    pub fn topology(&self) -> Topology {
        self.problem.topology
    }

    /// Moves played so far, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Jump the peg at `(row, col)` in `direction`. `None` if the jump is
    /// not legal here, including directions the topology forbids.
    pub fn move_peg(&self, row: usize, col: usize, direction: Direction) -> Option<GameState> {
        if row >= SIZE || col >= SIZE {
            return None;
        }
        self.apply(Move::new(row, col, direction))
    }

    pub fn apply(&self, mov: Move) -> Option<GameState> {
        if !self.problem.topology.allows(mov.direction) {
            return None;
        }
        let board = self.board.jump(mov)?;
        let mut moves = Vec::with_capacity(self.problem.solution_length());
        moves.extend_from_slice(&self.moves);
        moves.push(mov);
        Some(GameState { board, count: self.count - 1, moves, problem: Arc::clone(&self.problem) })
    }

    /// The board matches the goal, or one of its images when symmetric play
    /// is allowed.
    pub fn is_solved(&self) -> bool {
        self.problem.is_solved_board(&self.board)
    }

    /// True when some necessary condition for reaching the goal fails.
    /// Never true for a solved state.
    pub fn is_impossible(&self, check_phase_relations: bool) -> bool {
        prune::is_impossible(&self.problem, &self.board, check_phase_relations)
    }

    /// Name of the first check that proves the state hopeless.
    pub fn impossible_reason(&self, check_phase_relations: bool) -> Option<&'static str> {
        prune::explain(&self.problem, &self.board, check_phase_relations)
    }

    /// Intersection over union of the pegs with the closest goal image.
    pub fn iou(&self) -> f64 {
        let pegs = self.board.peg_mask();
        self.problem
            .goal_images
            .iter()
            .map(|g| {
                let goal = g.board.peg_mask();
                let union = (pegs | goal).count_ones();
                if union == 0 {
                    1.0
                } else {
                    (pegs & goal).count_ones() as f64 / union as f64
                }
            })
            .fold(0.0, f64::max)
    }

    fn union_box(&self) -> (usize, usize, usize, usize) {
        let union = self.board.peg_mask() | self.problem.goal.peg_mask();
        // the goal always holds at least one peg
        Board::bounding_box(union).unwrap_or((4, 4, 4, 4))
    }

    /// Area of the bounding box around the pegs of the board and the goal.
    pub fn bounding_area(&self) -> u32 {
        let (top, left, bottom, right) = self.union_box();
        ((bottom - top + 1) * (right - left + 1)) as u32
    }

    /// Illegal, empty and peg cell counts inside [`bounding_area`](Self::bounding_area).
    pub fn counts_in_bounding_area(&self) -> (u32, u32, u32) {
        let (top, left, bottom, right) = self.union_box();
        let rect = Board::rect_mask(top, left, bottom, right);
        let legal = self.board.legal_mask() & rect;
        let pegs = self.board.peg_mask() & rect;
        let illegal = rect.count_ones() - legal.count_ones();
        (illegal, (legal & !pegs).count_ones(), pegs.count_ones())
    }
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        if self.count != other.count {
            return false;
        }
        if self.problem.allow_symmetric {
            self.board.symmetric_eq(&other.board)
        } else {
            self.board == other.board
        }
    }
}

impl Eq for GameState {}

impl Hash for GameState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.board.weight_hash());
        if !self.problem.allow_symmetric {
            state.write_u128(self.board.peg_mask());
        }
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("count", &self.count)
            .field("board", &self.board)
            .field("moves", &self.moves)
            .finish()
    }
}

/// Start, current board with pegs labelled by class, and goal, side by side.
impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.problem.initial.rows();
        let goal = self.problem.goal.rows();
        for row in 0..SIZE {
            if row > 0 {
                writeln!(f)?;
            }
            let current: String = (0..SIZE)
                .map(|col| match self.board.cell(row, col) {
                    Cell::Peg => CLASS_LETTERS[class_of(row, col)],
                    cell => cell.to_char(),
                })
                .collect();
            let goal_row = goal[row].replace('*', "X");
            write!(f, "{}\t{}\t{}", start[row], current, goal_row)?;
        }
        Ok(())
    }
}

/// Every board from `initial` through the last move. `None` at the first
/// move that is not legal.
pub fn replay(initial: &Board, moves: &[Move]) -> Option<Vec<Board>> {
    let mut frames = Vec::with_capacity(moves.len() + 1);
    frames.push(*initial);
    let mut board = *initial;
    for &mov in moves {
        board = board.jump(mov)?;
        frames.push(board);
    }
    Some(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn empty45() -> Board {
        Board::fill(Cell::Empty, Variant::Holes45)
    }

    #[test]
    fn test_standard_counts() {
        let game = GameState::standard(Variant::Holes45, false).unwrap();
        assert_eq!(game.count(), 44);
        assert_eq!(game.goal_count(), 1);
        assert_eq!(game.problem().solution_length(), 43);

        let game = GameState::standard(Variant::Holes33, true).unwrap();
        assert_eq!(game.count(), 32);
        assert_eq!(game.problem().solution_length(), 31);
    }

    #[test]
    fn test_invalid_configurations() {
        let full = Board::fill(Cell::Peg, Variant::Holes45);
        let one = empty45().with_pegs(&[(4, 4)]);
        assert_eq!(GameState::new(full, one, false).unwrap_err(), ConfigError::NoEmptyHole);

        let start = Board::default();
        assert_eq!(GameState::new(start, empty45(), false).unwrap_err(), ConfigError::EmptyGoal);

        let small = Board::fill(Cell::Peg, Variant::Holes33).with_holes(&[(4, 4)]);
        let goal = Board::fill(Cell::Empty, Variant::Holes45).with_pegs(&[(4, 4)]);
        assert_eq!(GameState::new(small, goal, false).unwrap_err(), ConfigError::MaskMismatch);

        let two = empty45().with_pegs(&[(4, 3)]);
        let three = empty45().with_pegs(&[(4, 4), (4, 5)]);
        assert_eq!(
            GameState::new(two, three, false).unwrap_err(),
            ConfigError::GoalUnreachable { start: 1, goal: 2 }
        );

        let mut corner = Board::default();
        corner.set(0, 0, Cell::Empty);
        let goal = corner.complement();
        assert_eq!(GameState::new(corner, goal, false).unwrap_err(), ConfigError::CornersNotIllegal);
    }

    #[test]
    fn test_move_updates_state() {
        let game = GameState::standard(Variant::Holes45, false).unwrap();
        let next = game.move_peg(4, 2, Direction::Right).unwrap();
        assert_eq!(next.count(), game.count() - 1);
        assert_eq!(next.moves(), &[Move::new(4, 2, Direction::Right)]);
        assert!(next.board().is_peg(4, 4));
        // parent untouched
        assert!(game.board().is_hole(4, 4));
        assert!(game.moves().is_empty());
    }

    #[test]
    fn test_move_rejections() {
        let game = GameState::standard(Variant::Holes45, false).unwrap();
        assert!(game.move_peg(4, 4, Direction::Up).is_none());
        assert!(game.move_peg(9, 0, Direction::Up).is_none());

        // diagonal jumps need the diagonal topology
        let initial = empty45().with_pegs(&[(3, 3), (4, 4), (4, 3)]);
        let goal = empty45().with_pegs(&[(5, 5), (4, 3)]);
        let root = GameState::root(Problem::builder(initial, goal).build().unwrap());
        assert!(root.move_peg(3, 3, Direction::DownRight).is_none());
    }

    #[test]
    fn test_diagonal_jump() {
        let initial = empty45().with_pegs(&[(3, 3), (4, 4), (4, 3)]);
        let goal = empty45().with_pegs(&[(5, 5), (4, 3)]);
        let problem = Problem::builder(initial, goal).topology(Topology::Diagonal).build().unwrap();
        let root = GameState::root(problem);
        let next = root.move_peg(3, 3, Direction::DownRight).unwrap();
        assert!(next.is_solved());
    }

    #[test]
    fn test_is_solved_symmetric() {
        let goal = empty45().with_pegs(&[(4, 0)]);
        let left = GameState::new(empty45().with_pegs(&[(4, 1), (4, 2)]), goal, false).unwrap();
        assert!(!left.is_solved());
        assert!(left.move_peg(4, 2, Direction::Left).unwrap().is_solved());

        // finishing on the mirror image only counts with symmetric play
        let mirror = empty45().with_pegs(&[(4, 6), (4, 7)]);
        let sym = GameState::new(mirror, goal, true).unwrap();
        let exact = GameState::new(mirror, goal, false).unwrap();
        assert!(sym.move_peg(4, 6, Direction::Right).unwrap().is_solved());
        assert!(!exact.move_peg(4, 6, Direction::Right).unwrap().is_solved());
    }

    #[test]
    fn test_symmetric_dedup_in_hashset() {
        let game = GameState::standard(Variant::Holes45, true).unwrap();
        let mut seen = HashSet::new();
        for &direction in &Direction::ORTHOGONAL {
            let (dr, dc) = direction.delta();
            let row = (4 - 2 * dr as i32) as usize;
            let col = (4 - 2 * dc as i32) as usize;
            seen.insert(game.move_peg(row, col, direction).unwrap());
        }
        // all four opening moves are the same position up to symmetry
        assert_eq!(seen.len(), 1);

        let exact = GameState::standard(Variant::Holes45, false).unwrap();
        let mut seen = HashSet::new();
        seen.insert(exact.move_peg(4, 2, Direction::Right).unwrap());
        seen.insert(exact.move_peg(4, 6, Direction::Left).unwrap());
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_from_history() {
        let game = GameState::standard(Variant::Holes33, false).unwrap();
        let a = game.move_peg(4, 2, Direction::Right).unwrap();
        let b = a.move_peg(4, 5, Direction::Left).unwrap();
        let rebuilt = GameState::from_history(Arc::clone(game.problem()), b.moves()).unwrap();
        assert_eq!(rebuilt.board(), b.board());
        assert_eq!(rebuilt.count(), b.count());

        let bad = [Move::new(4, 4, Direction::Up)];
        assert!(GameState::from_history(Arc::clone(game.problem()), &bad).is_none());
    }

    #[test]
    fn test_iou_and_bounding_area() {
        let initial = empty45().with_pegs(&[(4, 2), (4, 3)]);
        let goal = empty45().with_pegs(&[(4, 4)]);
        let game = GameState::new(initial, goal, false).unwrap();
        assert_eq!(game.iou(), 0.0);
        assert_eq!(game.bounding_area(), 3);
        assert_eq!(game.counts_in_bounding_area(), (0, 1, 2));

        let done = game.move_peg(4, 2, Direction::Right).unwrap();
        assert_eq!(done.iou(), 1.0);
        assert_eq!(done.bounding_area(), 1);
    }

    #[test]
    fn test_replay_frames() {
        let game = GameState::standard(Variant::Holes45, false).unwrap();
        let a = game.move_peg(4, 2, Direction::Right).unwrap();
        let b = a.move_peg(4, 0, Direction::Right).unwrap();
        let frames = replay(game.initial(), b.moves()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1], *a.board());
        assert_eq!(frames[2], *b.board());
        assert!(replay(game.initial(), &[Move::new(0, 0, Direction::Down)]).is_none());
    }

    #[test]
    fn test_display_layout() {
        let game = GameState::standard(Variant::Holes45, false).unwrap();
        let text = game.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[4], "****.****\tACAC.CACA\t....X....");
    }
}

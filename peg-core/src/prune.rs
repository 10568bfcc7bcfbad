//! Necessary conditions for reaching the goal.
//!
//! Each check is a pure function of the current board, one goal layout and
//! their class counts. It returns `true` when it proves the goal out of
//! reach. Checks run cheapest first and stop at the first that fires.
//!
//! Two facts carry most of the proofs. A jump lands on the same class it
//! started from, so only the jumped peg's class shrinks and class counts
//! never grow. On the orthogonal board a class A or B peg only ever jumps
//! (or is jumped by) class C or D pegs, and vice versa.

use crate::board::{bits, class_of, Board, CLASS_MASKS, SIZE};
use crate::game::Problem;
use crate::moves::{Direction, Topology};

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;
const D: usize = 3;

/// Everything a check may look at.
#[derive(Clone, Copy, Debug)]
pub struct Inputs<'a> {
    pub board: &'a Board,
    pub goal: &'a Board,
    pub board_classes: [u8; 4],
    pub goal_classes: [u8; 4],
    pub topology: Topology,
}

/// A named impossibility test.
#[derive(Clone, Copy)]
pub struct PruneCheck {
    pub name: &'static str,
    pub test: fn(&Inputs<'_>) -> bool,
}

impl std::fmt::Debug for PruneCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Checks that apply to a game, in evaluation order.
pub fn checks(topology: Topology, extended: bool, phase_relations: bool) -> Vec<PruneCheck> {
    let orthogonal = topology == Topology::Orthogonal;
    let mut out = vec![PruneCheck { name: "class-counts", test: class_counts }];
    if orthogonal {
        out.push(PruneCheck { name: "legal-move-classes", test: legal_move_classes });
    }
    if extended {
        out.push(PruneCheck { name: "trapped-cells", test: trapped_cells });
        if orthogonal {
            out.push(PruneCheck { name: "distance-supply", test: distance_supply });
        }
    }
    if phase_relations && orthogonal {
        out.push(PruneCheck { name: "phase-relations", test: self::phase_relations });
    }
    out
}

/// Some goal class needs more pegs than the board still has in it.
pub fn class_counts(inputs: &Inputs<'_>) -> bool {
    inputs.board_classes.iter().zip(&inputs.goal_classes).any(|(have, want)| have < want)
}

/// Every peg sits in A/B, or every peg sits in C/D: no peg has a neighbour
/// to jump.
pub fn legal_move_classes(inputs: &Inputs<'_>) -> bool {
    let [a, b, c, d] = inputs.board_classes;
    a as u32 + b as u32 == 0 || c as u32 + d as u32 == 0
}

/// Diagonal parities differ from the goal's.
pub fn phase_relations(inputs: &Inputs<'_>) -> bool {
    inputs.board.phase_relations() != inputs.goal.phase_relations()
}

#[inline]
fn step(row: usize, col: usize, direction: Direction, steps: i32) -> Option<(usize, usize)> {
    let (dr, dc) = direction.delta();
    let r = row as i32 + steps * dr as i32;
    let c = col as i32 + steps * dc as i32;
    if (0..SIZE as i32).contains(&r) && (0..SIZE as i32).contains(&c) {
        Some((r as usize, c as usize))
    } else {
        None
    }
}

/// `cell` is on the board and its class still has pegs.
fn legal_and_live(board: &Board, live: [bool; 4], cell: Option<(usize, usize)>) -> bool {
    matches!(cell, Some((r, c)) if board.is_legal(r, c) && live[class_of(r, c)])
}

/// A peg can still land on `(row, col)`: its class is alive and some jump
/// path into it runs over a cell whose class is alive.
fn can_fill(board: &Board, live: [bool; 4], topology: Topology, row: usize, col: usize) -> bool {
    if !live[class_of(row, col)] {
        return false;
    }
    topology.directions().iter().any(|&d| {
        let from = step(row, col, d, -2);
        let over = step(row, col, d, -1);
        matches!(from, Some((r, c)) if board.is_legal(r, c)) && legal_and_live(board, live, over)
    })
}

/// The peg on `(row, col)` can still leave, by jumping out or being jumped.
fn can_vacate(board: &Board, live: [bool; 4], topology: Topology, row: usize, col: usize) -> bool {
    topology.directions().iter().any(|&d| {
        let jump_out = legal_and_live(board, live, step(row, col, d, 1))
            && matches!(step(row, col, d, 2), Some((r, c)) if board.is_legal(r, c));
        let jumped = legal_and_live(board, live, step(row, col, d, -1))
            && matches!(step(row, col, d, 1), Some((r, c)) if board.is_legal(r, c));
        jump_out || jumped
    })
}

/// A cell that differs from the goal can never change again: the only
/// jumps that would fill or empty it need a peg from an exhausted class.
pub fn trapped_cells(inputs: &Inputs<'_>) -> bool {
    let board = inputs.board;
    let live = inputs.board_classes.map(|n| n > 0);
    let diff = board.peg_mask() ^ inputs.goal.peg_mask();
    bits(diff).any(|idx| {
        let (row, col) = (idx / SIZE, idx % SIZE);
        if board.is_peg(row, col) {
            !can_vacate(board, live, inputs.topology, row, col)
        } else {
            !can_fill(board, live, inputs.topology, row, col)
        }
    })
}

/// Sum over the goal pegs of `class` of the fewest jumps along one axis
/// that any current peg of that class needs to reach it.
fn axis_distance(board: &Board, goal: &Board, class: usize, vertical: bool) -> u32 {
    let mut total = 0u32;
    for target in bits(goal.peg_mask() & CLASS_MASKS[class]) {
        let want = if vertical { target / SIZE } else { target % SIZE } as i32;
        let nearest = bits(board.peg_mask() & CLASS_MASKS[class])
            .map(|idx| {
                let have = if vertical { idx / SIZE } else { idx % SIZE } as i32;
                (have - want).unsigned_abs() / 2
            })
            .min();
        match nearest {
            Some(jumps) => total += jumps,
            None => return u32::MAX,
        }
    }
    total
}

/// Each jump consumes one peg of the class it passes over. A pegs move
/// horizontally over C and vertically over D, B pegs vertically over C and
/// horizontally over D, and the same holds with A/B and C/D swapped. The
/// jumps needed to bring pegs home may not exceed the pegs each class can
/// still give up.
pub fn distance_supply(inputs: &Inputs<'_>) -> bool {
    let (board, goal) = (inputs.board, inputs.goal);
    let supply = |class: usize| {
        inputs.board_classes[class].saturating_sub(inputs.goal_classes[class]) as u32
    };
    let need = |h_class: usize, v_class: usize| {
        axis_distance(board, goal, h_class, false).saturating_add(axis_distance(board, goal, v_class, true))
    };
    need(A, B) > supply(C) || need(B, A) > supply(D) || need(C, D) > supply(A) || need(D, C) > supply(B)
}

/// Run the checks against every goal image; the state is hopeless only if
/// every image is out of reach.
pub fn is_impossible(problem: &Problem, board: &Board, check_phase_relations: bool) -> bool {
    explain(problem, board, check_phase_relations).is_some()
}

/// Like [`is_impossible`], naming the check that fired (against the last
/// goal image tried).
pub fn explain(problem: &Problem, board: &Board, check_phase_relations: bool) -> Option<&'static str> {
    if problem.is_solved_board(board) {
        return None;
    }
    if board.peg_count() <= problem.goal_count() {
        return Some("peg-count");
    }
    let board_classes = board.class_counts();
    let checks = problem.checks(check_phase_relations);
    let mut reason = None;
    for image in problem.goal_images() {
        let inputs = Inputs {
            board,
            goal: &image.board,
            board_classes,
            goal_classes: image.classes,
            topology: problem.topology(),
        };
        match checks.iter().find(|check| (check.test)(&inputs)) {
            Some(check) => reason = Some(check.name),
            None => return None,
        }
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, Variant};
    use crate::game::GameState;

    fn empty45() -> Board {
        Board::fill(Cell::Empty, Variant::Holes45)
    }

    fn inputs<'a>(board: &'a Board, goal: &'a Board) -> Inputs<'a> {
        Inputs {
            board,
            goal,
            board_classes: board.class_counts(),
            goal_classes: goal.class_counts(),
            topology: Topology::Orthogonal,
        }
    }

    #[test]
    fn test_standard_game_passes_every_check() {
        for variant in [Variant::Holes33, Variant::Holes45] {
            for symmetric in [false, true] {
                let game = GameState::standard(variant, symmetric).unwrap();
                assert!(!game.is_impossible(true), "{:?} {}", variant, symmetric);
            }
        }
    }

    #[test]
    fn test_class_counts() {
        // goal peg is class A, board has only C and D pegs
        let board = empty45().with_pegs(&[(4, 3), (3, 4)]);
        let goal = empty45().with_pegs(&[(4, 4)]);
        assert!(class_counts(&inputs(&board, &goal)));
        let goal = empty45().with_pegs(&[(4, 3)]);
        assert!(!class_counts(&inputs(&board, &goal)));
    }

    #[test]
    fn test_legal_move_classes() {
        let board = empty45().with_pegs(&[(4, 4), (3, 3)]);
        let goal = empty45().with_pegs(&[(4, 4)]);
        assert!(legal_move_classes(&inputs(&board, &goal)));
        let board = empty45().with_pegs(&[(4, 4), (4, 3)]);
        assert!(!legal_move_classes(&inputs(&board, &goal)));
    }

    #[test]
    fn test_phase_relations() {
        let board = empty45().with_pegs(&[(4, 2), (4, 3)]);
        let reachable = empty45().with_pegs(&[(4, 4)]);
        let unreachable = empty45().with_pegs(&[(4, 0)]);
        assert!(!phase_relations(&inputs(&board, &reachable)));
        assert!(phase_relations(&inputs(&board, &unreachable)));
    }

    #[test]
    fn test_trapped_cell() {
        // no A pegs left, so (0, 4) (class A) can never be filled again
        let board = empty45().with_pegs(&[(1, 4), (3, 3), (3, 4)]);
        let goal = empty45().with_pegs(&[(0, 4)]);
        let ins = inputs(&board, &goal);
        assert_eq!(ins.board_classes[A], 0);
        assert!(trapped_cells(&ins));
    }

    #[test]
    fn test_trapped_peg_cannot_leave() {
        // (0, 3) leaves only by jumping (1, 3) or (0, 4); with no A or B
        // pegs on the board it is stuck
        let goal = empty45().with_pegs(&[(4, 3)]);
        let board = empty45().with_pegs(&[(0, 3), (4, 3), (3, 4)]);
        assert!(trapped_cells(&inputs(&board, &goal)));

        let board = empty45().with_pegs(&[(0, 3), (1, 3), (4, 3)]);
        assert!(!trapped_cells(&inputs(&board, &goal)));
    }

    #[test]
    fn test_distance_supply() {
        // the A peg at (4, 0) needs four horizontal jumps to reach (4, 8),
        // each over a C peg, and only one C peg exists
        let board = empty45().with_pegs(&[(4, 0), (4, 1), (3, 4)]);
        let goal = empty45().with_pegs(&[(4, 8)]);
        let ins = inputs(&board, &goal);
        assert!(distance_supply(&ins));

        let board = empty45().with_pegs(&[(4, 2), (4, 3), (3, 4)]);
        let goal = empty45().with_pegs(&[(4, 4)]);
        assert!(!distance_supply(&inputs(&board, &goal)));
    }

    #[test]
    fn test_isolated_peg_is_impossible() {
        let initial = empty45().with_pegs(&[(4, 4), (0, 4)]);
        let goal = empty45().with_pegs(&[(4, 4), (4, 3)]);
        let game = GameState::new(initial, goal, false).unwrap();
        assert!(game.is_impossible(true));
        assert!(game.is_impossible(false));
        assert_eq!(game.impossible_reason(false), Some("peg-count"));
    }

    #[test]
    fn test_solved_is_never_impossible() {
        let board = empty45().with_pegs(&[(4, 4)]);
        let game = GameState::new(empty45().with_pegs(&[(4, 2), (4, 3)]), board, false).unwrap();
        let done = game.move_peg(4, 2, Direction::Right).unwrap();
        assert!(done.is_solved());
        assert!(!done.is_impossible(true));
    }

    #[test]
    fn test_symmetric_needs_every_image_to_fail() {
        // (4, 0) is reachable only as a mirror image of (4, 8)
        let initial = empty45().with_pegs(&[(4, 6), (4, 7)]);
        let goal = empty45().with_pegs(&[(4, 0)]);
        let exact = GameState::new(initial, goal, false).unwrap();
        let sym = GameState::new(initial, goal, true).unwrap();
        assert!(exact.is_impossible(true));
        assert!(!sym.is_impossible(true));
    }

    #[test]
    fn test_check_lists() {
        let names = |list: Vec<PruneCheck>| list.iter().map(|c| c.name).collect::<Vec<_>>();
        assert_eq!(
            names(checks(Topology::Orthogonal, true, true)),
            vec!["class-counts", "legal-move-classes", "trapped-cells", "distance-supply", "phase-relations"]
        );
        assert_eq!(names(checks(Topology::Orthogonal, false, false)), vec!["class-counts", "legal-move-classes"]);
        assert_eq!(names(checks(Topology::Diagonal, true, true)), vec!["class-counts", "trapped-cells"]);
    }
}

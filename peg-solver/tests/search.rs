//! End-to-end searches and checkpoint resume.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use peg_core::{replay, Board, Cell, GameState, Variant};
use peg_solver::checkpoint::{sidecar_path, Checkpoint};
use peg_solver::config::SearchConfig;
use peg_solver::score::Scorer;
use peg_solver::solution::Solution;
use peg_solver::solver::{search, Scheduler, SearchOptions, SearchStatus};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("peg_{}_{}.bin", name, std::process::id()))
}

fn cleanup(path: &PathBuf) {
    fs::remove_file(path).ok();
    fs::remove_file(sidecar_path(path)).ok();
}

fn standard(variant: Variant) -> (Board, Board) {
    let initial = Board::fill(Cell::Peg, variant).with_holes(&[(4, 4)]);
    (initial, initial.complement())
}

fn assert_replays(state: &GameState) {
    let boards = replay(state.initial(), state.moves()).unwrap();
    assert_eq!(boards.len(), state.moves().len() + 1);
    assert_eq!(boards.last(), Some(state.board()));
    for pair in boards.windows(2) {
        assert_eq!(pair[1].peg_count(), pair[0].peg_count() - 1);
    }
}

#[test]
fn test_33_hole_symmetric() {
    let (initial, goal) = standard(Variant::Holes33);
    let best = search(initial, goal, true, None, None, 1_000_000).unwrap();
    assert!(best.is_solved());
    assert_eq!(best.moves().len(), 31);
    assert_eq!(best.count(), 1);
    assert_replays(&best);
}

// The 45-hole centre game needs 43 jumps (44 pegs down to one).
// Slow in debug builds: cargo test --release -- --ignored
#[test]
#[ignore]
fn test_45_hole_exact() {
    let (initial, goal) = standard(Variant::Holes45);
    let best = search(initial, goal, false, None, None, 10_000_000).unwrap();
    assert!(best.is_solved());
    assert_eq!(best.moves().len(), 43);
    assert_eq!(*best.board(), goal);
    assert_replays(&best);
}

#[test]
fn test_isolated_pegs_fail_at_root() {
    let empty = Board::fill(Cell::Empty, Variant::Holes45);
    let root = GameState::new(empty.with_pegs(&[(0, 4), (8, 4)]), empty.with_pegs(&[(4, 4)]), false).unwrap();
    assert!(root.is_impossible(true));

    let mut scheduler = Scheduler::new(root, Scorer::default(), SearchOptions::default());
    assert_eq!(scheduler.run(), SearchStatus::Impossible);
    assert_eq!(scheduler.stats().moves_evaluated, 0);
    assert!(scheduler.best().moves().is_empty());
}

#[test]
fn test_budget_returns_best_so_far() {
    let (initial, goal) = standard(Variant::Holes45);
    let best = search(initial, goal, false, Some(40), None, 1_000_000).unwrap();
    assert!(!best.is_solved());
    assert_replays(&best);
}

fn membership(states: impl Iterator<Item = Vec<u8>>) -> HashSet<Vec<u8>> {
    states.collect()
}

fn key(state: &GameState) -> Vec<u8> {
    state.board().to_bytes().to_vec()
}

#[test]
fn test_checkpoint_preserves_search() {
    // a solution needs at least 32 pops, so 30 always stops early
    let root = GameState::standard(Variant::Holes33, false).unwrap();
    let options = SearchOptions { max_moves: Some(30), ..SearchOptions::default() };
    let mut live = Scheduler::new(root, Scorer::default(), options.clone());
    assert_eq!(live.run(), SearchStatus::BudgetExceeded);

    let bytes = live.to_checkpoint().encode();
    let mut resumed = Scheduler::resume(Checkpoint::decode(&bytes, true).unwrap(), Scorer::default(), options);

    assert_eq!(resumed.stats().moves_evaluated, 30);
    assert_eq!(resumed.stats().moves_skipped, live.stats().moves_skipped);
    assert_eq!(
        membership(resumed.frontier().iter().map(|(_, s)| key(s))),
        membership(live.frontier().iter().map(|(_, s)| key(s)))
    );
    assert_eq!(
        membership(resumed.seen().iter().map(key)),
        membership(live.seen().iter().map(key))
    );

    // both continue identically
    live.set_max_moves(Some(60));
    resumed.set_max_moves(Some(60));
    live.run();
    resumed.run();
    assert_eq!(resumed.best().moves(), live.best().moves());
    assert_eq!(resumed.frontier().len(), live.frontier().len());
    assert_eq!(resumed.seen().len(), live.seen().len());
}

#[test]
fn test_search_resumes_from_file() {
    let path = temp_path("resume");
    cleanup(&path);
    let (initial, goal) = standard(Variant::Holes33);

    let first = search(initial, goal, true, Some(5), Some(path.clone()), 1_000_000).unwrap();
    assert!(!first.is_solved());
    assert!(path.exists());
    assert!(sidecar_path(&path).exists());
    assert_eq!(Checkpoint::load(&path, true).unwrap().moves_evaluated, 5);

    let best = search(initial, goal, true, None, Some(path.clone()), 1_000_000).unwrap();
    assert!(best.is_solved());
    assert_eq!(best.moves().len(), 31);

    cleanup(&path);
}

#[test]
fn test_corrupt_checkpoint_starts_fresh() {
    let path = temp_path("corrupt");
    cleanup(&path);
    fs::write(&path, b"not a checkpoint").unwrap();

    let (initial, goal) = standard(Variant::Holes33);
    let config = SearchConfig { max_moves: Some(3), checkpoint_path: Some(path.clone()), ..SearchConfig::default() };
    let problem = config.build_problem(initial, goal).unwrap();
    let scheduler = Scheduler::open(problem, &config, None);
    assert_eq!(scheduler.status(), SearchStatus::Ready);
    assert_eq!(scheduler.stats().moves_evaluated, 0);
    assert_eq!(scheduler.frontier().len(), 1);

    cleanup(&path);
}

#[test]
fn test_solution_export_replays() {
    let (initial, goal) = standard(Variant::Holes33);
    let best = search(initial, goal, true, None, None, 1_000_000).unwrap();
    let solution = Solution::from_state(&best);
    let back = Solution::from_json(&solution.to_json().unwrap()).unwrap();
    assert!(back.solved);
    assert_eq!(back.pegs_left, 1);
    let boards = back.boards().unwrap();
    assert_eq!(boards.len(), 32);
    assert_eq!(boards[31], *best.board());
}

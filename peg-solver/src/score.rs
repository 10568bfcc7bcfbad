//! Frontier priorities. Lower scores are expanded first.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use peg_core::GameState;

/// Anything that can rank a state for expansion.
pub trait Heuristic {
    fn evaluate(&self, state: &GameState) -> i32;
}

impl<F> Heuristic for F
where
    F: Fn(&GameState) -> i32,
{
    fn evaluate(&self, state: &GameState) -> i32 {
        self(state)
    }
}

/// Built-in priority formulas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreStrategy {
    /// Pegs left on the board.
    PegCount,
    /// Bounding-box area of board and goal pegs, minus pegs left.
    BoundingArea,
    /// Empty holes times pegs inside the board/goal bounding box.
    #[default]
    EmptyPegs,
    /// Bounding-box area of the pegs minus pegs left, plus the longest edge
    /// of their L1 minimum spanning tree.
    Mst,
}

impl ScoreStrategy {
    pub fn name(self) -> &'static str {
        match self {
            ScoreStrategy::PegCount => "peg-count",
            ScoreStrategy::BoundingArea => "bounding-area",
            ScoreStrategy::EmptyPegs => "empty-pegs",
            ScoreStrategy::Mst => "mst",
        }
    }
}

impl fmt::Display for ScoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Heuristic for ScoreStrategy {
    fn evaluate(&self, state: &GameState) -> i32 {
        match self {
            ScoreStrategy::PegCount => state.count() as i32,
            ScoreStrategy::BoundingArea => state.bounding_area() as i32 - state.count() as i32,
            ScoreStrategy::EmptyPegs => {
                let (_, empty, pegs) = state.counts_in_bounding_area();
                (empty * pegs) as i32
            }
            ScoreStrategy::Mst => {
                let tree = SpanningTree::of(state);
                tree.area as i32 - state.count() as i32 + tree.longest_edge as i32
            }
        }
    }
}

/// L1 minimum spanning tree over the pegs of a board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpanningTree {
    pub total: u32,
    pub longest_edge: u32,
    /// Largest L1 distance between two pegs.
    pub diameter: u32,
    /// Area of the bounding box of the pegs.
    pub area: u32,
}

impl SpanningTree {
    pub fn of(state: &GameState) -> SpanningTree {
        let pegs: Vec<(i32, i32)> = state.board().pegs().map(|(r, c)| (r as i32, c as i32)).collect();
        if pegs.len() <= 1 {
            return SpanningTree { area: pegs.len() as u32, ..Default::default() };
        }
        let dist = |a: (i32, i32), b: (i32, i32)| (a.0 - b.0).unsigned_abs() + (a.1 - b.1).unsigned_abs();

        let mut tree = SpanningTree::default();
        for (i, &a) in pegs.iter().enumerate() {
            for &b in &pegs[..i] {
                tree.diameter = tree.diameter.max(dist(a, b));
            }
        }
        let (rows, cols): (Vec<i32>, Vec<i32>) = pegs.iter().copied().unzip();
        let span = |v: &[i32]| (v.iter().max().unwrap_or(&0) - v.iter().min().unwrap_or(&0) + 1) as u32;
        tree.area = span(&rows) * span(&cols);

        // Prim's algorithm from the first peg
        let mut in_tree = vec![false; pegs.len()];
        let mut best = vec![u32::MAX; pegs.len()];
        in_tree[0] = true;
        for (i, &p) in pegs.iter().enumerate().skip(1) {
            best[i] = dist(pegs[0], p);
        }
        for _ in 1..pegs.len() {
            let Some(next) = (0..pegs.len()).filter(|&i| !in_tree[i]).min_by_key(|&i| best[i]) else {
                break;
            };
            in_tree[next] = true;
            tree.total += best[next];
            tree.longest_edge = tree.longest_edge.max(best[next]);
            for i in 0..pegs.len() {
                if !in_tree[i] {
                    best[i] = best[i].min(dist(pegs[next], pegs[i]));
                }
            }
        }
        tree
    }
}

/// A heuristic plus the endgame rule: once the peg surplus over the goal is
/// within `endgame_window`, every state scores 0 so the search dives
/// depth-first to the finish.
pub struct Scorer {
    heuristic: Box<dyn Heuristic>,
    endgame_window: u32,
}

impl Scorer {
    pub fn new(heuristic: Box<dyn Heuristic>, endgame_window: u32) -> Self {
        Self { heuristic, endgame_window }
    }

    pub fn from_strategy(strategy: ScoreStrategy, endgame_window: u32) -> Self {
        Self::new(Box::new(strategy), endgame_window)
    }

    pub fn score(&self, state: &GameState) -> i32 {
        if state.count().saturating_sub(state.goal_count()) <= self.endgame_window {
            0
        } else {
            self.heuristic.evaluate(state)
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::from_strategy(ScoreStrategy::default(), 3)
    }
}

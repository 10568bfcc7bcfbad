//! Best-first search over peg positions.
//!
//! The scheduler pops the lowest-scored state, stops if it is solved, and
//! otherwise pushes every successor that is neither already seen nor
//! provably hopeless. Popped states with no surviving successor are dead
//! ends; the one closest to the goal (by IoU) is kept as a fallback answer.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use xxhash_rust::xxh64::Xxh64Builder;

use peg_core::{Board, ConfigError, GameState, Problem};

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::config::{PhaseRelations, SearchConfig};
use crate::movegen::expand;
use crate::score::Scorer;
use crate::stats::{Progress, SearchStats};

/// States already queued or expanded. Equality follows the problem's
/// symmetry mode.
pub type SeenSet = HashSet<GameState, Xxh64Builder>;

fn new_seen_set() -> SeenSet {
    HashSet::with_hasher(Xxh64Builder::new(0))
}

struct Entry {
    score: i32,
    count: u32,
    /// Push order; later pushes win ties
    seq: u64,
    state: GameState,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // BinaryHeap pops the greatest: lowest score, then fewest pegs, then newest.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-priority queue of scored states.
///
/// Ties on score go to the state with fewer pegs, then to the most recently
/// pushed one, so equal scores behave like a stack and the search dives.
#[derive(Default)]
pub struct Frontier {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a frontier from entries listed in pop order.
    pub fn from_pop_order(entries: Vec<(i32, GameState)>) -> Self {
        let mut frontier = Frontier::new();
        for (score, state) in entries.into_iter().rev() {
            frontier.push(score, state);
        }
        frontier
    }

    pub fn push(&mut self, score: i32, state: GameState) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { score, count: state.count(), seq, state });
    }

    pub fn pop(&mut self) -> Option<(i32, GameState)> {
        self.heap.pop().map(|e| (e.score, e.state))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &GameState)> {
        self.heap.iter().map(|e| (e.score, &e.state))
    }

    /// Entries in the order `pop` would return them.
    pub fn pop_order(&self) -> Vec<(i32, GameState)> {
        let mut entries: Vec<&Entry> = self.heap.iter().collect();
        entries.sort_unstable_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| (e.score, e.state.clone())).collect()
    }

    /// Fewest and most pegs among queued states.
    pub fn peg_range(&self) -> Option<(u32, u32)> {
        self.heap.iter().fold(None, |range, e| match range {
            None => Some((e.count, e.count)),
            Some((lo, hi)) => Some((lo.min(e.count), hi.max(e.count))),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// Nothing popped yet this session.
    Ready,
    Running,
    /// A popped state matched the goal.
    Solved,
    /// The frontier ran dry.
    Exhausted,
    /// The evaluation budget was reached; raising it allows resuming.
    BudgetExceeded,
    /// The running flag was cleared.
    Interrupted,
    /// The start position already fails a pruning check.
    Impossible,
}

impl SearchStatus {
    /// No further step can change the outcome.
    pub fn is_final(self) -> bool {
        matches!(self, SearchStatus::Solved | SearchStatus::Exhausted | SearchStatus::Impossible)
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_moves: Option<u64>,
    pub phase_relations: PhaseRelations,
    pub checkpoint_path: Option<PathBuf>,
    /// Evaluated states between checkpoints
    pub checkpoint_interval: u64,
    pub log_interval_secs: u64,
    /// Cleared from outside to stop the loop
    pub running: Option<Arc<AtomicBool>>,
}

impl SearchOptions {
    pub fn from_config(config: &SearchConfig, running: Option<Arc<AtomicBool>>) -> Self {
        Self {
            max_moves: config.max_moves,
            phase_relations: config.phase_relations,
            checkpoint_path: config.checkpoint_path.clone(),
            checkpoint_interval: config.checkpoint_interval.max(1),
            log_interval_secs: config.log_interval_secs,
            running,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default(), None)
    }
}

pub struct Scheduler {
    frontier: Frontier,
    seen: SeenSet,
    best: GameState,
    status: SearchStatus,
    stats: SearchStats,
    scorer: Scorer,
    options: SearchOptions,
    /// Evaluated count when this session started
    session_start: u64,
    last_checkpoint: u64,
}

impl Scheduler {
    /// Fresh search from `root`. A root that fails the pruning checks ends
    /// the search immediately as [`SearchStatus::Impossible`].
    pub fn new(root: GameState, scorer: Scorer, options: SearchOptions) -> Self {
        let mut frontier = Frontier::new();
        let mut seen = new_seen_set();
        let status = match root.impossible_reason(options.phase_relations.at_root()) {
            Some(reason) => {
                info!(event = "impossible", check = reason, "start position cannot reach the goal");
                SearchStatus::Impossible
            }
            None => {
                seen.insert(root.clone());
                frontier.push(scorer.score(&root), root.clone());
                SearchStatus::Ready
            }
        };
        Self {
            frontier,
            seen,
            best: root,
            status,
            stats: SearchStats::new(),
            scorer,
            options,
            session_start: 0,
            last_checkpoint: 0,
        }
    }

    /// Continue a saved search.
    pub fn resume(checkpoint: Checkpoint, scorer: Scorer, options: SearchOptions) -> Self {
        let Checkpoint { moves_evaluated, moves_skipped, frontier, seen, best } = checkpoint;
        let mut seen_set = new_seen_set();
        seen_set.extend(seen);

        let status = if best.is_solved() {
            SearchStatus::Solved
        } else if best.moves().is_empty() && best.is_impossible(options.phase_relations.at_root()) {
            SearchStatus::Impossible
        } else {
            SearchStatus::Ready
        };
        Self {
            frontier: Frontier::from_pop_order(frontier),
            seen: seen_set,
            best,
            status,
            stats: SearchStats::resumed(moves_evaluated, moves_skipped),
            scorer,
            options,
            session_start: moves_evaluated,
            last_checkpoint: moves_evaluated,
        }
    }

    /// Resume from `config.checkpoint_path` when it holds a usable
    /// checkpoint of the same game, otherwise start fresh.
    pub fn open(problem: Arc<Problem>, config: &SearchConfig, running: Option<Arc<AtomicBool>>) -> Self {
        let scorer = Scorer::from_strategy(config.score, config.endgame_window);
        let options = SearchOptions::from_config(config, running);

        if let Some(path) = config.checkpoint_path.as_deref().filter(|p| p.exists()) {
            let start = Instant::now();
            match Checkpoint::load(path, problem.extended_checks()) {
                Ok(checkpoint) if checkpoint.problem().same_game(&problem) => {
                    info!(
                        event = "resume",
                        path = %path.display(),
                        evaluated = checkpoint.moves_evaluated,
                        frontier = checkpoint.frontier.len(),
                        seen = checkpoint.seen.len(),
                        seconds = %format!("{:.2}", start.elapsed().as_secs_f64()),
                    );
                    return Scheduler::resume(checkpoint, scorer, options);
                }
                Ok(_) => warn!(path = %path.display(), "checkpoint belongs to a different game, starting fresh"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to load checkpoint, starting fresh"),
            }
        }
        Scheduler::new(GameState::root(problem), scorer, options)
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// The solution once solved, otherwise the dead end closest to the goal
    /// (the root until a dead end is found).
    pub fn best(&self) -> &GameState {
        &self.best
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Change the evaluation budget; a search stopped by the old budget can
    /// then continue.
    pub fn set_max_moves(&mut self, max_moves: Option<u64>) {
        self.options.max_moves = max_moves;
    }

    /// One pop-expand-push iteration.
    pub fn step(&mut self) -> SearchStatus {
        if self.status.is_final() {
            return self.status;
        }
        if let Some(max) = self.options.max_moves {
            if self.stats.moves_evaluated >= max {
                self.status = SearchStatus::BudgetExceeded;
                return self.status;
            }
        }
        let Some((_, state)) = self.frontier.pop() else {
            self.status = SearchStatus::Exhausted;
            return self.status;
        };
        self.stats.moves_evaluated += 1;
        self.status = SearchStatus::Running;

        if state.is_solved() {
            self.best = state;
            self.status = SearchStatus::Solved;
            return self.status;
        }

        let check_phase = self.options.phase_relations.on_successors();
        let mut accepted = 0usize;
        for next in expand(&state) {
            if self.seen.contains(&next) {
                self.stats.record_duplicate();
                continue;
            }
            if next.is_impossible(check_phase) {
                self.stats.record_pruned();
                continue;
            }
            let score = self.scorer.score(&next);
            self.seen.insert(next.clone());
            self.frontier.push(score, next);
            accepted += 1;
        }

        if accepted == 0 {
            self.stats.dead_ends += 1;
            let iou = state.iou();
            if iou > self.best.iou() {
                debug!(event = "best", pegs = state.count(), iou = %format!("{:.3}", iou));
                self.best = state;
            }
        }
        self.status
    }

    /// Step until the search ends, the budget runs out or the running flag
    /// is cleared, checkpointing and logging along the way.
    pub fn run(&mut self) -> SearchStatus {
        loop {
            if let Some(running) = &self.options.running {
                if !running.load(Ordering::SeqCst) {
                    self.status = SearchStatus::Interrupted;
                    break;
                }
            }
            if self.step() != SearchStatus::Running {
                break;
            }
            if self.stats.moves_evaluated - self.last_checkpoint >= self.options.checkpoint_interval {
                self.last_checkpoint = self.stats.moves_evaluated;
                if let Err(e) = self.save_checkpoint() {
                    warn!(error = %e, "failed to write checkpoint");
                }
            }
            if self.stats.should_log(self.options.log_interval_secs) {
                let progress = self.progress();
                self.stats.log_progress(&progress);
            }
        }
        info!(
            event = "finished",
            status = ?self.status,
            pegs = self.best.count(),
            moves = self.best.moves().len(),
        );
        self.stats.log_summary(self.stats.moves_evaluated - self.session_start);
        self.status
    }

    pub fn progress(&self) -> Progress {
        Progress {
            frontier: self.frontier.len(),
            peg_range: self.frontier.peg_range(),
            seen: self.seen.len(),
            best_count: self.best.count(),
            best_iou: self.best.iou(),
        }
    }

    /// Snapshot of everything needed to resume.
    pub fn to_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            moves_evaluated: self.stats.moves_evaluated,
            moves_skipped: self.stats.moves_skipped,
            frontier: self.frontier.pop_order(),
            seen: self.seen.iter().cloned().collect(),
            best: self.best.clone(),
        }
    }

    /// Write a checkpoint to the configured path. Does nothing without one.
    pub fn save_checkpoint(&self) -> Result<Option<usize>, CheckpointError> {
        let Some(path) = &self.options.checkpoint_path else {
            return Ok(None);
        };
        let start = Instant::now();
        let bytes = self.to_checkpoint().save(path)?;
        info!(
            event = "checkpoint",
            path = %path.display(),
            frontier = self.frontier.len(),
            seen = self.seen.len(),
            bytes,
            seconds = %format!("{:.2}", start.elapsed().as_secs_f64()),
        );
        Ok(Some(bytes))
    }
}

/// Run a complete search and return the best state found. Inspect
/// [`GameState::is_solved`] on the result.
///
/// With a checkpoint path, an existing checkpoint of the same game is
/// resumed and a final checkpoint is written when the search stops.
pub fn search(
    initial: Board,
    goal: Board,
    allow_symmetric: bool,
    max_moves: Option<u64>,
    checkpoint_path: Option<PathBuf>,
    checkpoint_interval: u64,
) -> Result<GameState, ConfigError> {
    let config = SearchConfig {
        allow_symmetric,
        max_moves,
        checkpoint_path,
        checkpoint_interval,
        ..SearchConfig::default()
    };
    let problem = config.build_problem(initial, goal)?;
    let scheduler = search_with(problem, &config, None);
    Ok(scheduler.best().clone())
}

/// Open (or resume), run, and write the final checkpoint.
pub fn search_with(problem: Arc<Problem>, config: &SearchConfig, running: Option<Arc<AtomicBool>>) -> Scheduler {
    let mut scheduler = Scheduler::open(problem, config, running);
    scheduler.run();
    if let Err(e) = scheduler.save_checkpoint() {
        warn!(error = %e, "failed to write final checkpoint");
    }
    scheduler
}

/// Depth-first enumeration of every solution, without a seen-set and
/// without symmetry. Stops after `limit` solutions or `max_moves` popped
/// states.
pub fn enumerate_solutions(
    initial: Board,
    goal: Board,
    max_moves: Option<u64>,
    limit: usize,
) -> Result<Vec<GameState>, ConfigError> {
    let config = SearchConfig { max_moves, ..SearchConfig::default() };
    enumerate_with(initial, goal, &config, limit)
}

/// [`enumerate_solutions`] under the topology, pruning and budget of
/// `config`. `allow_symmetric` is ignored: every exact solution is listed.
pub fn enumerate_with(
    initial: Board,
    goal: Board,
    config: &SearchConfig,
    limit: usize,
) -> Result<Vec<GameState>, ConfigError> {
    let exact = SearchConfig { allow_symmetric: false, ..config.clone() };
    let root = GameState::root(exact.build_problem(initial, goal)?);
    let max_moves = config.max_moves;
    let check_phase = config.phase_relations.on_successors();

    let mut solutions = Vec::new();
    let mut stack = Vec::new();
    if !root.is_impossible(config.phase_relations.at_root()) {
        stack.push(root);
    }
    let mut evaluated = 0u64;

    while let Some(state) = stack.pop() {
        if solutions.len() >= limit || max_moves.is_some_and(|max| evaluated >= max) {
            break;
        }
        evaluated += 1;
        if state.is_solved() {
            debug!(event = "solution", index = solutions.len());
            solutions.push(state);
            continue;
        }
        let children: Vec<GameState> = expand(&state).filter(|next| !next.is_impossible(check_phase)).collect();
        // first generated move is explored first
        stack.extend(children.into_iter().rev());
    }

    info!(event = "enumerated", solutions = solutions.len(), evaluated);
    Ok(solutions)
}

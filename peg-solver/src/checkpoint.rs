//! Binary checkpoint format for search state.
//!
//! All integers are big-endian. Layout:
//! - moves evaluated: u32
//! - moves skipped: u32
//! - frontier length: u32, then per entry a score (i32) and a game
//! - seen-set length: u32, then one game per member
//! - the best game found so far
//!
//! A game is:
//! - initial board, goal board, current board: 81 bytes each, one `i8`
//!   cell value per byte in row-major order (-1 illegal, 0 empty, 1 peg)
//! - move history: `initial pegs - goal pegs` slots of `(row, col,
//!   direction)` bytes, played moves first, unused slots zero
//! - flags: u32 (bit 0 symmetric play, bit 1 diagonal jumps)
//!
//! Counters above `u32::MAX` are saved as `u32::MAX`. Files are written to
//! a temporary path and renamed into place, with an xxh64 digest of the
//! payload in a `<file>.xxh64` sidecar that is checked on load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use xxhash_rust::xxh64::xxh64;

use peg_core::board::CELLS;
use peg_core::{Board, ConfigError, GameState, Move, Problem, Topology};

const FLAG_SYMMETRIC: u32 = 1;
const FLAG_DIAGONAL: u32 = 1 << 1;
const DIGEST_SEED: u64 = 0;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint truncated at byte {0}")]
    Truncated(usize),

    #[error("{0} unexpected bytes after the best game")]
    TrailingBytes(usize),

    #[error("invalid board: {0}")]
    Board(#[from] ConfigError),

    #[error("unknown flag bits {0:#x}")]
    Flags(u32),

    #[error("checkpoint mixes games with different start, goal or rules")]
    MixedProblems,

    #[error("move history does not replay to the stored board")]
    BadHistory,

    #[error("checksum mismatch: sidecar says {expected:016x}, data hashes to {found:016x}")]
    Checksum { expected: u64, found: u64 },

    #[error("malformed checksum sidecar")]
    Sidecar,
}

/// Everything needed to resume a search.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub moves_evaluated: u64,
    pub moves_skipped: u64,
    /// Frontier entries in the order they would be popped
    pub frontier: Vec<(i32, GameState)>,
    pub seen: Vec<GameState>,
    pub best: GameState,
}

impl Checkpoint {
    /// The problem every stored game belongs to.
    pub fn problem(&self) -> &Arc<Problem> {
        self.best.problem()
    }

    /// Serialize to the binary layout.
    pub fn encode(&self) -> Vec<u8> {
        let game_size = game_size(self.problem());
        let mut out = Vec::with_capacity(16 + (self.frontier.len() + self.seen.len() + 1) * (game_size + 4));
        put_u32(&mut out, saturate(self.moves_evaluated));
        put_u32(&mut out, saturate(self.moves_skipped));
        put_u32(&mut out, self.frontier.len() as u32);
        for (score, game) in &self.frontier {
            out.extend_from_slice(&score.to_be_bytes());
            encode_game(&mut out, game);
        }
        put_u32(&mut out, self.seen.len() as u32);
        for game in &self.seen {
            encode_game(&mut out, game);
        }
        encode_game(&mut out, &self.best);
        out
    }

    /// Parse the binary layout. `extended_checks` configures the pruning of
    /// the rebuilt problem, which the file does not record.
    pub fn decode(bytes: &[u8], extended_checks: bool) -> Result<Checkpoint, CheckpointError> {
        let mut reader = Reader { bytes, pos: 0, problem: None, extended_checks };

        let moves_evaluated = reader.u32()? as u64;
        let moves_skipped = reader.u32()? as u64;

        let n = reader.u32()? as usize;
        let mut frontier = Vec::with_capacity(n.min(bytes.len() / 256));
        for _ in 0..n {
            let score = reader.u32()? as i32;
            frontier.push((score, reader.game()?));
        }

        let n = reader.u32()? as usize;
        let mut seen = Vec::with_capacity(n.min(bytes.len() / 256));
        for _ in 0..n {
            seen.push(reader.game()?);
        }

        let best = reader.game()?;
        let rest = bytes.len() - reader.pos;
        if rest != 0 {
            return Err(CheckpointError::TrailingBytes(rest));
        }
        Ok(Checkpoint { moves_evaluated, moves_skipped, frontier, seen, best })
    }

    /// Write atomically, with the digest sidecar. Returns bytes written.
    pub fn save(&self, path: &Path) -> Result<usize, CheckpointError> {
        let data = self.encode();
        let digest = xxh64(&data, DIGEST_SEED);

        let tmp = with_suffix(path, ".tmp");
        fs::write(&tmp, &data)?;
        let sidecar = sidecar_path(path);
        let sidecar_tmp = with_suffix(&sidecar, ".tmp");
        fs::write(&sidecar_tmp, format!("{:016x}\n", digest))?;

        install_data(&tmp, path)?;
        fs::rename(&sidecar_tmp, &sidecar)?;
        Ok(data.len())
    }

    /// Read a checkpoint file, verifying the sidecar digest when present.
    pub fn load(path: &Path, extended_checks: bool) -> Result<Checkpoint, CheckpointError> {
        let data = fs::read(path)?;
        match fs::read_to_string(sidecar_path(path)) {
            Ok(text) => {
                let expected = u64::from_str_radix(text.trim(), 16).map_err(|_| CheckpointError::Sidecar)?;
                let found = xxh64(&data, DIGEST_SEED);
                if expected != found {
                    return Err(CheckpointError::Checksum { expected, found });
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Checkpoint::decode(&data, extended_checks)
    }

    /// Approximate file size for a given number of stored games.
    pub fn estimate_size(problem: &Problem, frontier: usize, seen: usize) -> usize {
        16 + frontier * 4 + (frontier + seen + 1) * game_size(problem)
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn put_u32(out: &mut Vec<u8>, n: u32) {
    out.extend_from_slice(&n.to_be_bytes());
}

fn game_size(problem: &Problem) -> usize {
    3 * CELLS + 3 * problem.solution_length() + 4
}

fn flags(problem: &Problem) -> u32 {
    let mut flags = 0;
    if problem.allow_symmetric() {
        flags |= FLAG_SYMMETRIC;
    }
    if problem.topology() == Topology::Diagonal {
        flags |= FLAG_DIAGONAL;
    }
    flags
}

fn encode_game(out: &mut Vec<u8>, game: &GameState) {
    let problem = game.problem();
    out.extend_from_slice(&problem.initial().to_bytes());
    out.extend_from_slice(&problem.goal().to_bytes());
    out.extend_from_slice(&game.board().to_bytes());
    for mov in game.moves() {
        out.extend_from_slice(&mov.to_bytes());
    }
    let unused = problem.solution_length() - game.moves().len();
    out.resize(out.len() + 3 * unused, 0);
    put_u32(out, flags(problem));
}

/// Move staged data over `path`. The previous sidecar is removed first, so
/// the data file is never paired with a digest of older contents.
fn install_data(tmp: &Path, path: &Path) -> io::Result<()> {
    match fs::remove_file(sidecar_path(path)) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::rename(tmp, path)
}

pub fn sidecar_path(path: &Path) -> PathBuf {
    with_suffix(path, ".xxh64")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Problem of the first game; every later game must match it
    problem: Option<Arc<Problem>>,
    extended_checks: bool,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CheckpointError> {
        let bytes = self.bytes;
        let end = self.pos.checked_add(n).filter(|&end| end <= bytes.len());
        match end {
            Some(end) => {
                let slice = &bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(CheckpointError::Truncated(self.bytes.len())),
        }
    }

    fn u32(&mut self) -> Result<u32, CheckpointError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn game(&mut self) -> Result<GameState, CheckpointError> {
        let initial = Board::from_bytes(self.take(CELLS)?)?;
        let goal = Board::from_bytes(self.take(CELLS)?)?;
        let board = Board::from_bytes(self.take(CELLS)?)?;

        let capacity = initial.peg_count().saturating_sub(goal.peg_count()) as usize;
        let history = self.take(3 * capacity)?;
        let flags = self.u32()?;
        if flags & !(FLAG_SYMMETRIC | FLAG_DIAGONAL) != 0 {
            return Err(CheckpointError::Flags(flags));
        }

        let problem = self.problem_for(initial, goal, flags)?;
        let played = (initial.peg_count() - board.peg_count().min(initial.peg_count())) as usize;
        if played > capacity {
            return Err(CheckpointError::BadHistory);
        }
        let moves = history
            .chunks_exact(3)
            .take(played)
            .map(|c| Move::from_bytes([c[0], c[1], c[2]]))
            .collect::<Option<Vec<Move>>>()
            .ok_or(CheckpointError::BadHistory)?;

        let game = GameState::from_history(problem, &moves).ok_or(CheckpointError::BadHistory)?;
        if *game.board() != board {
            return Err(CheckpointError::BadHistory);
        }
        Ok(game)
    }

    fn problem_for(&mut self, initial: Board, goal: Board, flags: u32) -> Result<Arc<Problem>, CheckpointError> {
        let allow_symmetric = flags & FLAG_SYMMETRIC != 0;
        let topology = if flags & FLAG_DIAGONAL != 0 { Topology::Diagonal } else { Topology::Orthogonal };
        if let Some(problem) = &self.problem {
            let same = *problem.initial() == initial
                && *problem.goal() == goal
                && problem.allow_symmetric() == allow_symmetric
                && problem.topology() == topology;
            return if same { Ok(Arc::clone(problem)) } else { Err(CheckpointError::MixedProblems) };
        }
        let problem = Problem::builder(initial, goal)
            .allow_symmetric(allow_symmetric)
            .topology(topology)
            .extended_checks(self.extended_checks)
            .build()?;
        self.problem = Some(Arc::clone(&problem));
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peg_core::{Direction, Variant};

    fn sample() -> Checkpoint {
        let root = GameState::standard(Variant::Holes33, true).unwrap();
        let a = root.move_peg(4, 2, Direction::Right).unwrap();
        let b = a.move_peg(4, 5, Direction::Left).unwrap();
        let c = a.move_peg(2, 3, Direction::Down).unwrap();
        Checkpoint {
            moves_evaluated: 2,
            moves_skipped: 5,
            frontier: vec![(0, b.clone()), (12, c.clone())],
            seen: vec![root.clone(), a.clone(), b, c],
            best: a,
        }
    }

    #[test]
    fn test_layout_size() {
        let cp = sample();
        let bytes = cp.encode();
        // 33-hole centre game: 31 history slots
        let game = 3 * 81 + 3 * 31 + 4;
        assert_eq!(bytes.len(), 4 * 4 + 2 * (4 + game) + 4 * game + game);
        assert_eq!(bytes.len(), Checkpoint::estimate_size(cp.problem(), 2, 4));
        assert_eq!(&bytes[0..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 5]);
        // last four bytes: flags of the best game, symmetric
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 1]);
    }

    #[test]
    fn test_decode_roundtrip() {
        let cp = sample();
        let back = Checkpoint::decode(&cp.encode(), true).unwrap();
        assert_eq!(back.moves_evaluated, 2);
        assert_eq!(back.moves_skipped, 5);
        assert_eq!(back.frontier.len(), 2);
        assert_eq!(back.frontier[1].0, 12);
        assert_eq!(back.frontier[1].1.moves(), cp.frontier[1].1.moves());
        assert_eq!(back.seen.len(), 4);
        assert_eq!(back.best.board(), cp.best.board());
        // every game shares one problem
        assert!(Arc::ptr_eq(back.problem(), back.seen[0].problem()));
    }

    #[test]
    fn test_counters_saturate() {
        let mut cp = sample();
        cp.moves_evaluated = u64::from(u32::MAX) + 10;
        let back = Checkpoint::decode(&cp.encode(), true).unwrap();
        assert_eq!(back.moves_evaluated, u32::MAX as u64);
    }

    #[test]
    fn test_corruption_detected() {
        let bytes = sample().encode();
        assert!(matches!(
            Checkpoint::decode(&bytes[..bytes.len() - 1], true),
            Err(CheckpointError::Truncated(_))
        ));

        let mut extra = bytes.clone();
        extra.push(0);
        assert!(matches!(Checkpoint::decode(&extra, true), Err(CheckpointError::TrailingBytes(1))));

        // first history slot of the first frontier game points nowhere
        let mut bad = bytes.clone();
        let history = 12 + 4 + 3 * 81;
        bad[history..history + 3].copy_from_slice(&[0, 0, 0]);
        assert!(matches!(Checkpoint::decode(&bad, true), Err(CheckpointError::BadHistory)));

        let mut bad_cell = bytes;
        bad_cell[12 + 4] = 9;
        assert!(matches!(Checkpoint::decode(&bad_cell, true), Err(CheckpointError::Board(_))));
    }

    #[test]
    fn test_file_roundtrip_and_digest() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("peg_checkpoint_test_{}.bin", std::process::id()));

        let cp = sample();
        let written = cp.save(&path).unwrap();
        assert_eq!(written, fs::metadata(&path).unwrap().len() as usize);
        assert!(sidecar_path(&path).exists());

        let loaded = Checkpoint::load(&path, true).unwrap();
        assert_eq!(loaded.seen.len(), 4);

        // flip one byte of the payload
        let mut data = fs::read(&path).unwrap();
        data[1] ^= 0xFF;
        fs::write(&path, &data).unwrap();
        assert!(matches!(Checkpoint::load(&path, true), Err(CheckpointError::Checksum { .. })));

        // without a sidecar the file is trusted as-is
        fs::remove_file(sidecar_path(&path)).unwrap();
        let loaded = Checkpoint::load(&path, true).unwrap();
        assert_ne!(loaded.moves_evaluated, 2);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_interrupted_commit_still_loads() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("peg_checkpoint_commit_{}.bin", std::process::id()));
        sample().save(&path).unwrap();

        // new data lands but the process dies before its sidecar does
        let mut next = sample();
        next.moves_evaluated = 7;
        let tmp = with_suffix(&path, ".tmp");
        fs::write(&tmp, next.encode()).unwrap();
        install_data(&tmp, &path).unwrap();

        assert!(!sidecar_path(&path).exists());
        let loaded = Checkpoint::load(&path, true).unwrap();
        assert_eq!(loaded.moves_evaluated, 7);

        // the next full save restores the sidecar
        next.save(&path).unwrap();
        assert!(sidecar_path(&path).exists());
        assert_eq!(Checkpoint::load(&path, true).unwrap().moves_evaluated, 7);

        fs::remove_file(&path).ok();
        fs::remove_file(sidecar_path(&path)).ok();
    }
}

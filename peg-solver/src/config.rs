//! Search settings, loadable from a TOML file.
//!
//! ```
//! use peg_solver::config::{PhaseRelations, SearchConfig};
//!
//! let config = SearchConfig::from_toml_str(r#"
//!     allow_symmetric = false
//!     max_moves = 500000
//!     score = "bounding-area"
//!     phase_relations = "always"
//! "#).unwrap();
//!
//! assert_eq!(config.max_moves, Some(500_000));
//! assert_eq!(config.phase_relations, PhaseRelations::Always);
//! ```
//!
//! A missing file is not an error for the CLI:
//!
//! ```
//! use peg_solver::config::SearchConfig;
//!
//! let config = SearchConfig::load("solver.toml").unwrap_or_default();
//! assert_eq!(config.endgame_window, 3);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use peg_core::{Board, ConfigError, Problem, Topology};

use crate::score::ScoreStrategy;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// When the phase-relation check runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRelations {
    /// Only when checking the start position.
    #[default]
    Root,
    /// On the start position and every successor.
    Always,
    /// Never.
    Never,
}

impl PhaseRelations {
    pub fn at_root(self) -> bool {
        self != PhaseRelations::Never
    }

    pub fn on_successors(self) -> bool {
        self == PhaseRelations::Always
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Rotations and reflections of the goal also count as solved.
    pub allow_symmetric: bool,

    /// Stop after this many states have been popped.
    pub max_moves: Option<u64>,

    /// Where to save and resume the search.
    pub checkpoint_path: Option<PathBuf>,

    /// Evaluated states between checkpoints.
    pub checkpoint_interval: u64,

    /// Seconds between progress lines.
    pub log_interval_secs: u64,

    pub score: ScoreStrategy,

    /// Peg surplus over the goal at or below which every state scores 0.
    pub endgame_window: u32,

    pub phase_relations: PhaseRelations,

    /// Trapped-cell and distance-supply pruning.
    pub extended_checks: bool,

    pub topology: Topology,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            allow_symmetric: true,
            max_moves: None,
            checkpoint_path: None,
            checkpoint_interval: 1_000_000,
            log_interval_secs: 10,
            score: ScoreStrategy::default(),
            endgame_window: 3,
            phase_relations: PhaseRelations::default(),
            extended_checks: true,
            topology: Topology::default(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        let config: SearchConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.checkpoint_interval == 0 {
            return Err(SettingsError::Invalid("checkpoint_interval must be positive".into()));
        }
        if self.max_moves == Some(0) {
            return Err(SettingsError::Invalid("max_moves must be positive".into()));
        }
        Ok(())
    }

    /// The game these settings describe, starting at `initial`.
    pub fn build_problem(&self, initial: Board, goal: Board) -> Result<Arc<Problem>, ConfigError> {
        Problem::builder(initial, goal)
            .allow_symmetric(self.allow_symmetric)
            .topology(self.topology)
            .extended_checks(self.extended_checks)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::from_toml_str("").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert!(config.allow_symmetric);
        assert_eq!(config.score, ScoreStrategy::EmptyPegs);
        assert!(config.phase_relations.at_root());
        assert!(!config.phase_relations.on_successors());
    }

    #[test]
    fn test_full_file() {
        let config = SearchConfig::from_toml_str(
            r#"
            allow_symmetric = false
            max_moves = 100
            checkpoint_path = "search.bin"
            checkpoint_interval = 50
            log_interval_secs = 1
            score = "mst"
            endgame_window = 0
            phase_relations = "never"
            extended_checks = false
            topology = "diagonal"
            "#,
        )
        .unwrap();
        assert!(!config.allow_symmetric);
        assert_eq!(config.checkpoint_path, Some(PathBuf::from("search.bin")));
        assert_eq!(config.score, ScoreStrategy::Mst);
        assert_eq!(config.topology, Topology::Diagonal);
        assert!(!config.phase_relations.at_root());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(SearchConfig::from_toml_str("score = \"fastest\""), Err(SettingsError::Toml(_))));
        assert!(matches!(
            SearchConfig::from_toml_str("checkpoint_interval = 0"),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn test_build_problem() {
        let config = SearchConfig { topology: Topology::Diagonal, extended_checks: false, ..Default::default() };
        let initial = Board::default();
        let problem = config.build_problem(initial, initial.complement()).unwrap();
        assert!(problem.allow_symmetric());
        assert_eq!(problem.topology(), Topology::Diagonal);
        assert!(!problem.extended_checks());
    }

    #[test]
    fn test_missing_file() {
        let err = SearchConfig::load("/nonexistent/solver.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}

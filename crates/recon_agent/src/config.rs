//! Agent configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it wants to
//! change:
//!
//! ```toml
//! seed = 7
//!
//! [engine]
//! path = "/opt/stockfish/stockfish"
//! threads = 2
//!
//! [sampling]
//! max_sampled_boards = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable consulted when no engine path is configured.
pub const ENGINE_PATH_ENV: &str = "STOCKFISH_EXECUTABLE";

/// Longest per-member engine query a config may ask for.
const MAX_QUERY_LIMIT_SECS: f64 = 3600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Seed for every random choice the agent makes. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Move White plays on its first turn when legal, in UCI notation.
    pub opening_move: Option<String>,
    pub engine: EngineConfig,
    pub sensing: SensingPolicy,
    pub sampling: SamplingPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            seed: None,
            opening_move: Some("e2e4".to_string()),
            engine: EngineConfig::default(),
            sensing: SensingPolicy::default(),
            sampling: SamplingPolicy::default(),
        }
    }
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sampling;
        let shares = [
            ("sampling.known_king_share", s.known_king_share),
            ("sampling.mate_share_threshold", s.mate_share_threshold),
            ("sampling.time_fraction", s.time_fraction),
            ("sensing.check_alert_threshold", self.sensing.check_alert_threshold),
        ];
        for (name, value) in shares {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if s.max_sampled_boards == 0 {
            return Err(ConfigError::Invalid(
                "sampling.max_sampled_boards must be at least 1".into(),
            ));
        }
        if s.vote_top_k == 0 {
            return Err(ConfigError::Invalid(
                "sampling.vote_top_k must be at least 1".into(),
            ));
        }
        let secs = [
            ("sampling.vote_budget_secs", s.vote_budget_secs),
            ("sampling.min_query_secs", s.min_query_secs),
            ("sampling.max_query_secs", s.max_query_secs),
        ];
        for (name, value) in secs {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite number of seconds, got {value}"
                )));
            }
        }
        if s.min_query_secs <= 0.0
            || s.min_query_secs > s.max_query_secs
            || s.max_query_secs > MAX_QUERY_LIMIT_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "query time bounds must satisfy 0 < min <= max <= {MAX_QUERY_LIMIT_SECS}, got {} and {}",
                s.min_query_secs, s.max_query_secs
            )));
        }
        if let Some(mv) = &self.opening_move
            && chess_core::parse_uci_squares(mv).is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "opening_move '{mv}' is not a UCI move"
            )));
        }
        Ok(())
    }
}

/// How to start and talk to the external evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable; see [`EngineConfig::resolve_path`].
    pub path: Option<PathBuf>,
    pub threads: u32,
    pub hash_mb: u32,
    /// Deadline for the `uci`/`isready` handshake.
    pub startup_timeout_ms: u64,
    /// Extra time granted on top of a query's own limit before the process is
    /// declared dead.
    pub grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            threads: 2,
            hash_mb: 128,
            startup_timeout_ms: 10_000,
            grace_ms: 2_000,
        }
    }
}

impl EngineConfig {
    /// Configured path, else `$STOCKFISH_EXECUTABLE`, else `stockfish` on PATH.
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        match std::env::var_os(ENGINE_PATH_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from("stockfish"),
        }
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// Knobs of the sensing planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingPolicy {
    /// Own turns during which a fixed central square is sensed.
    pub opening_plies: u32,
    /// Share of members with our king attacked above which check squares are
    /// sensed first.
    pub check_alert_threshold: f64,
    /// Below this many interior candidates, edge squares are allowed again.
    pub min_interior_candidates: usize,
    /// Above this many candidates, only a sample is scored.
    pub full_scan_candidate_limit: usize,
    /// Above this many members, only a sample of candidates is scored.
    pub full_scan_belief_limit: usize,
    pub sampled_candidates: usize,
    /// Highest-occupancy squares always added to a sample.
    pub likely_squares: usize,
}

impl Default for SensingPolicy {
    fn default() -> Self {
        Self {
            opening_plies: 4,
            check_alert_threshold: 0.1,
            min_interior_candidates: 10,
            full_scan_candidate_limit: 25,
            full_scan_belief_limit: 20_000,
            sampled_candidates: 15,
            likely_squares: 5,
        }
    }
}

/// Knobs of the move selector's member sampling and engine budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
    /// Hard cap on members sent to the engine per decision.
    pub max_sampled_boards: usize,
    /// Share of the sample drawn from members whose opponent king sits on the
    /// last sensed king square.
    pub known_king_share: f64,
    pub mate_depth: u32,
    /// Longest forced mate, in our own moves, that counts as mate evidence.
    pub max_mate_distance: u32,
    /// Share of sampled members that must show a mate before it is played.
    pub mate_share_threshold: f64,
    /// Multiplier lifting mate votes above ordinary votes.
    pub mate_vote_scale: u32,
    pub vote_top_k: usize,
    /// Total engine time spent on ensemble voting, before the clock cap.
    pub vote_budget_secs: f64,
    /// Share of the remaining game clock the ensemble vote may use.
    pub time_fraction: f64,
    pub min_query_secs: f64,
    pub max_query_secs: f64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            max_sampled_boards: 100,
            known_king_share: 0.6,
            mate_depth: 8,
            max_mate_distance: 4,
            mate_share_threshold: 0.1,
            mate_vote_scale: 10,
            vote_top_k: 3,
            vote_budget_secs: 5.0,
            time_fraction: 0.1,
            min_query_secs: 0.001,
            max_query_secs: 0.05,
        }
    }
}

impl SamplingPolicy {
    /// Per-member time for the ensemble vote over `members` positions.
    pub fn query_time(&self, members: usize, time_remaining: Duration) -> Duration {
        let budget = self
            .vote_budget_secs
            .min(time_remaining.as_secs_f64() * self.time_fraction);
        let per = budget / members.max(1) as f64;
        Duration::from_secs_f64(per.clamp(self.min_query_secs, self.max_query_secs))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

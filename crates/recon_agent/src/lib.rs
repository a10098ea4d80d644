//! Belief-state agent for reconnaissance blind chess.
//!
//! The agent never sees the opponent's pieces. It keeps every position that
//! is still consistent with what it has observed ([`BeliefSet`]), narrows the
//! set with each sense window, capture report and move result
//! ([`filter`]), chooses where to look next ([`sensing`]) and picks moves by
//! polling a full-information engine over a sample of the set
//! ([`selector`], [`Oracle`]).
//!
//! [`Session`] ties these together behind the [`Player`] callbacks a game
//! harness drives.

pub mod belief;
pub mod config;
pub mod error;
pub mod filter;
pub mod observation;
pub mod occupancy;
pub mod oracle;
pub mod selector;
pub mod sensing;
pub mod session;
pub mod uci_client;

pub use belief::BeliefSet;
pub use config::{AgentConfig, EngineConfig, SamplingPolicy, SensingPolicy};
pub use error::{ConfigError, EngineError, ReplayError};
pub use filter::FilterOutcome;
pub use observation::{
    CaptureEvent, GameHistory, MoveOutcome, Observation, SenseObservation, WinReason,
};
pub use occupancy::OccupancyMap;
pub use oracle::{Limit, Line, NoEngine, Oracle, Score};
pub use selector::{ChoiceSource, MoveChoice, MoveRequest};
pub use sensing::SenseContext;
pub use session::{BeliefTracker, Player, ReplayStep, Session};
pub use uci_client::UciEngine;

//! Contract for the external move-evaluation engine.

use std::time::Duration;

use chess_core::{Move, Position};

use crate::error::EngineError;

/// How long the engine may think about one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Depth(u32),
    Time(Duration),
}

/// Evaluation from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Positive: the side to move mates in that many of its own moves.
    /// Negative: it gets mated.
    Mate(i32),
}

impl Score {
    /// Moves to a forced mate for the side to move, if it has one.
    pub fn mate_in(self) -> Option<u32> {
        match self {
            Score::Mate(n) if n > 0 => Some(n as u32),
            _ => None,
        }
    }
}

/// One principal variation from a multi-line analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// 1-based; 1 is the engine's preferred line.
    pub rank: usize,
    pub first_move: Move,
    pub score: Score,
}

/// A chess engine that sees the whole board.
///
/// Implementations must return within the limit plus a bounded grace period,
/// and must recover from their own failures: after an `Err`, the next call is
/// expected to work again if the engine can be brought back at all.
pub trait Oracle {
    /// Up to `top_k` best lines for `position`, best first.
    fn analyze(
        &mut self,
        position: &Position,
        limit: Limit,
        top_k: usize,
    ) -> Result<Vec<Line>, EngineError>;

    /// The single move the engine would play.
    fn play(&mut self, position: &Position, limit: Limit) -> Result<Move, EngineError>;

    fn restart(&mut self) -> Result<(), EngineError>;

    /// Bring the engine up unless it is already running.
    fn ensure_running(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Stop the engine. Must tolerate an engine that is already gone.
    fn shutdown(&mut self);
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn analyze(
        &mut self,
        position: &Position,
        limit: Limit,
        top_k: usize,
    ) -> Result<Vec<Line>, EngineError> {
        (**self).analyze(position, limit, top_k)
    }

    fn play(&mut self, position: &Position, limit: Limit) -> Result<Move, EngineError> {
        (**self).play(position, limit)
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        (**self).restart()
    }

    fn ensure_running(&mut self) -> Result<(), EngineError> {
        (**self).ensure_running()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

/// An oracle with no engine behind it; every query fails.
///
/// Lets a session run on its fallbacks alone, e.g. when replaying a record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEngine;

impl Oracle for NoEngine {
    fn analyze(&mut self, _: &Position, _: Limit, _: usize) -> Result<Vec<Line>, EngineError> {
        Err(EngineError::Unavailable("no engine configured".into()))
    }

    fn play(&mut self, _: &Position, _: Limit) -> Result<Move, EngineError> {
        Err(EngineError::Unavailable("no engine configured".into()))
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}

//! What the harness tells the agent, and the per-game log of it.
//!
//! Records serialize with human-readable squares (`"e4"`), moves in UCI
//! notation and pieces as FEN letters, so a game can be written out by hand
//! for the replay tool:
//!
//! ```toml
//! color = "white"
//!
//! [[events]]
//! kind = "sense"
//! window = { d5 = ".", e5 = "p" }
//!
//! [[events]]
//! kind = "own_move"
//! requested = "e2e4"
//! taken = "e2e4"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chess_core::{Color, Move, Piece, START_FEN};
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// Result of the opponent's move as far as we can see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureEvent {
    #[serde(default)]
    pub occurred: bool,
    #[serde(default, with = "opt_square", skip_serializing_if = "Option::is_none")]
    pub square: Option<u8>,
}

impl CaptureEvent {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at(square: u8) -> Self {
        Self {
            occurred: true,
            square: Some(square),
        }
    }

    /// Square of our captured piece, if a capture happened and was located.
    pub fn capture_square(self) -> Option<u8> {
        if self.occurred { self.square } else { None }
    }
}

/// Contents of a sensed 3x3 window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SenseObservation {
    #[serde(rename = "window", with = "window")]
    pub squares: Vec<(u8, Option<Piece>)>,
}

impl SenseObservation {
    pub fn new(squares: Vec<(u8, Option<Piece>)>) -> Self {
        Self { squares }
    }

    /// Where the window shows the king of `color`.
    pub fn king_square(&self, color: Color) -> Option<u8> {
        self.squares.iter().find_map(|(sq, pc)| match pc {
            Some(p) if p.color == color && p.kind == chess_core::PieceKind::King => Some(*sq),
            _ => None,
        })
    }
}

/// Result of our own move attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveOutcome {
    #[serde(default, with = "opt_move", skip_serializing_if = "Option::is_none")]
    pub requested: Option<Move>,
    /// `None` when the requested move turned out to be illegal.
    #[serde(default, with = "opt_move", skip_serializing_if = "Option::is_none")]
    pub taken: Option<Move>,
    #[serde(default)]
    pub captured_opponent_piece: bool,
    #[serde(default, with = "opt_square", skip_serializing_if = "Option::is_none")]
    pub capture_square: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    OpponentMove(CaptureEvent),
    Sense(SenseObservation),
    OwnMove(MoveOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    KingCapture,
    Timeout,
    Resign,
    TurnLimit,
    MoveLimit,
}

/// Everything one game revealed to us, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistory {
    pub color: Color,
    #[serde(default = "default_start_fen")]
    pub start_fen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    #[serde(default)]
    pub events: Vec<Observation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<WinReason>,
}

fn default_start_fen() -> String {
    START_FEN.to_string()
}

impl GameHistory {
    pub fn new(color: Color, start_fen: impl Into<String>) -> Self {
        Self {
            color,
            start_fen: start_fen.into(),
            opponent: None,
            events: Vec::new(),
            winner: None,
            reason: None,
        }
    }

    pub fn push(&mut self, observation: Observation) {
        self.events.push(observation);
    }

    /// Read a record from disk; `.json` files are JSON, anything else TOML.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ReplayError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod opt_square {
    use chess_core::{coord_to_sq, sq_to_coord};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(sq: &Option<u8>, s: S) -> Result<S::Ok, S::Error> {
        match sq {
            Some(sq) => s.serialize_some(&sq_to_coord(*sq)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(txt) => coord_to_sq(&txt)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid square '{txt}'"))),
            None => Ok(None),
        }
    }
}

mod opt_move {
    use chess_core::{Move, move_to_uci, parse_uci_squares};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(mv: &Option<Move>, s: S) -> Result<S::Ok, S::Error> {
        match mv {
            Some(mv) => s.serialize_some(&move_to_uci(*mv)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Move>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(txt) => parse_uci_squares(&txt)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid move '{txt}'"))),
            None => Ok(None),
        }
    }
}

/// Sense windows as a `square -> piece letter` map, `"."` for empty.
mod window {
    use super::*;
    use chess_core::{coord_to_sq, sq_to_coord};
    use serde::{Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(squares: &[(u8, Option<Piece>)], s: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<String, String> = squares
            .iter()
            .map(|(sq, pc)| {
                let letter = pc.map_or('.', |p| p.symbol());
                (sq_to_coord(*sq), letter.to_string())
            })
            .collect();
        map.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<(u8, Option<Piece>)>, D::Error> {
        let map = BTreeMap::<String, String>::deserialize(d)?;
        let mut squares = Vec::with_capacity(map.len());
        for (coord, letter) in map {
            let sq = coord_to_sq(&coord)
                .ok_or_else(|| de::Error::custom(format!("invalid square '{coord}'")))?;
            let piece = match letter.as_str() {
                "." | "" => None,
                txt => {
                    let mut chars = txt.chars();
                    let piece = match (chars.next(), chars.next()) {
                        (Some(ch), None) => Piece::from_symbol(ch),
                        _ => None,
                    };
                    Some(piece.ok_or_else(|| {
                        de::Error::custom(format!("invalid piece '{txt}' on {coord}"))
                    })?)
                }
            };
            squares.push((sq, piece));
        }
        // BTreeMap orders by coordinate text; keep board order instead.
        squares.sort_by_key(|(sq, _)| *sq);
        Ok(squares)
    }
}

#[cfg(test)]
#[path = "observation_tests.rs"]
mod observation_tests;

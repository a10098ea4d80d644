//! Belief-set transitions, one per kind of observation.
//!
//! Each transition replaces the belief set wholesale with the successors that
//! agree with the observation. Successors without exactly one king per side
//! are dropped. When nothing survives, opponent-move updates keep the old set
//! and sense or own-move updates fall back to the standard start position.

use chess_core::{Color, Move, Position, pseudo_legal_moves};

use crate::belief::BeliefSet;
use crate::observation::{CaptureEvent, MoveOutcome, SenseObservation};

/// What a transition did to the belief set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Updated { before: usize, after: usize },
    /// No member survived; the previous set was kept.
    Reverted { before: usize },
    /// No member survived; the set was rebuilt from the start position.
    Reseeded { before: usize },
}

impl FilterOutcome {
    pub fn is_fallback(self) -> bool {
        !matches!(self, FilterOutcome::Updated { .. })
    }
}

/// Update after the opponent moved, given what we saw of it.
pub fn after_opponent_move(belief: &mut BeliefSet, me: Color, event: CaptureEvent) -> FilterOutcome {
    let opponent = me.other();
    let next: Vec<Position> = if event.occurred {
        belief
            .to_move(opponent)
            .flat_map(|pos| capture_successors(pos, event.square))
            .collect()
    } else {
        belief
            .to_move(opponent)
            .flat_map(quiet_successors)
            .collect()
    };
    replace_or_revert(belief, next)
}

/// Keep members that show exactly the sensed contents on every square.
pub fn after_sense(belief: &mut BeliefSet, me: Color, observation: &SenseObservation) -> FilterOutcome {
    let next: Vec<Position> = belief
        .iter()
        .filter(|pos| agrees_with_window(pos, observation))
        .cloned()
        .collect();
    replace_or_reseed(belief, next, || start_position_for(me))
}

/// Advance members where we are to move by our own move's reported result.
pub fn after_own_move(belief: &mut BeliefSet, me: Color, outcome: &MoveOutcome) -> FilterOutcome {
    let next: Vec<Position> = belief
        .to_move(me)
        .filter_map(|pos| own_move_successor(pos, outcome))
        .collect();
    replace_or_reseed(belief, next, || own_move_fallback(me, outcome))
}

/// The generated move in `pos` with the squares and promotion of `mv`, with
/// its en-passant and castle flags set. `None` if the variant rules do not
/// allow it there.
pub fn playable(pos: &Position, mv: Move) -> Option<Move> {
    pseudo_legal_moves(pos).into_iter().find(|m| *m == mv)
}

/// Whether `mv` takes a piece on `square`. An en-passant capture matches on
/// both the passed pawn's square and its own destination.
pub fn captures_on(pos: &Position, mv: Move, square: u8) -> bool {
    pos.captured_square(mv) == Some(square) || (mv.is_en_passant && mv.to == square)
}

/// Successors of an opponent move that captured nothing: every non-capturing
/// pseudo-legal move, castling as generated by the rules, and a pass.
fn quiet_successors(pos: &Position) -> Vec<Position> {
    let mut out: Vec<Position> = pseudo_legal_moves(pos)
        .into_iter()
        .filter(|mv| !pos.is_capture(*mv))
        .map(|mv| pos.play(mv))
        .collect();
    out.push(pos.null_move());
    out
}

fn capture_successors(pos: &Position, square: Option<u8>) -> Vec<Position> {
    pseudo_legal_moves(pos)
        .into_iter()
        .filter(|mv| match square {
            Some(sq) => captures_on(pos, *mv, sq),
            None => pos.is_capture(*mv),
        })
        .map(|mv| pos.play(mv))
        .collect()
}

fn agrees_with_window(pos: &Position, observation: &SenseObservation) -> bool {
    observation
        .squares
        .iter()
        .all(|(sq, piece)| pos.piece_at(*sq) == *piece)
}

fn own_move_successor(pos: &Position, outcome: &MoveOutcome) -> Option<Position> {
    match outcome.taken {
        // Our request was refused: it must not have been playable here, and
        // the turn passed all the same.
        None => {
            let refused = outcome
                .requested
                .is_none_or(|mv| playable(pos, mv).is_none());
            refused.then(|| pos.null_move())
        }
        Some(taken) => {
            let mv = playable(pos, taken)?;
            capture_agrees(pos, mv, outcome).then(|| pos.play(mv))
        }
    }
}

fn capture_agrees(pos: &Position, mv: Move, outcome: &MoveOutcome) -> bool {
    match (pos.is_capture(mv), outcome.captured_opponent_piece) {
        (false, false) => true,
        (true, true) => outcome
            .capture_square
            .is_none_or(|sq| captures_on(pos, mv, sq)),
        _ => false,
    }
}

/// The standard start position with `color` to move.
pub fn start_position_for(color: Color) -> Position {
    let start = Position::startpos();
    if start.side_to_move == color {
        start
    } else {
        start.null_move()
    }
}

fn own_move_fallback(me: Color, outcome: &MoveOutcome) -> Position {
    let start = start_position_for(me);
    match outcome.taken.and_then(|mv| playable(&start, mv)) {
        Some(mv) => start.play(mv),
        None => start.null_move(),
    }
}

fn replace_or_revert(belief: &mut BeliefSet, next: Vec<Position>) -> FilterOutcome {
    let before = belief.len();
    match BeliefSet::try_from_positions(valid(next)) {
        Some(set) => {
            *belief = set;
            FilterOutcome::Updated {
                before,
                after: belief.len(),
            }
        }
        None => FilterOutcome::Reverted { before },
    }
}

fn replace_or_reseed(
    belief: &mut BeliefSet,
    next: Vec<Position>,
    fallback: impl FnOnce() -> Position,
) -> FilterOutcome {
    let before = belief.len();
    match BeliefSet::try_from_positions(valid(next)) {
        Some(set) => {
            *belief = set;
            FilterOutcome::Updated {
                before,
                after: belief.len(),
            }
        }
        None => {
            *belief = BeliefSet::single(fallback());
            FilterOutcome::Reseeded { before }
        }
    }
}

fn valid(positions: Vec<Position>) -> impl Iterator<Item = Position> {
    positions
        .into_iter()
        .filter(Position::is_structurally_valid)
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod filter_tests;

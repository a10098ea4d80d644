//! Turning a belief set into one move.
//!
//! The selector asks the engine about a bounded sample of belief members and
//! lets each answer vote. Cheaper certainties come first: a book move, then a
//! king capture available in some member, then a forced mate seen in enough
//! of the sample. Without any usable vote it plays a random legal move.

use std::time::Duration;

use chess_core::{Color, Move, PieceKind, Position};
use rand::Rng;
use rand::seq::{IteratorRandom, SliceRandom};
use tracing::{Level, event};

use crate::belief::BeliefSet;
use crate::config::SamplingPolicy;
use crate::oracle::{Limit, Oracle};

/// Everything about the current turn the selector needs besides the belief.
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest<'a> {
    pub color: Color,
    pub legal_moves: &'a [Move],
    pub time_remaining: Duration,
    /// Where we last saw the opponent king.
    pub opponent_king_hint: Option<u8>,
    /// Played outright when legal.
    pub book_move: Option<Move>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSource {
    Book,
    KingCapture,
    Mate,
    Vote,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveChoice {
    pub mv: Move,
    pub source: ChoiceSource,
}

/// Pick a move from `request.legal_moves`; `None` only if there are none.
pub fn choose_move<O: Oracle, R: Rng>(
    belief: &BeliefSet,
    request: &MoveRequest<'_>,
    policy: &SamplingPolicy,
    oracle: &mut O,
    rng: &mut R,
) -> Option<MoveChoice> {
    if request.legal_moves.is_empty() {
        return None;
    }

    if let Some(book) = request.book_move
        && let Some(mv) = legal_match(request.legal_moves, book)
    {
        return Some(chosen(mv, ChoiceSource::Book));
    }

    if let Some(mv) = king_capture(belief, request) {
        return Some(chosen(mv, ChoiceSource::KingCapture));
    }

    let sample = sample_members(belief, request, policy, rng);

    if let Some(mv) = mate_vote(&sample, request.legal_moves, policy, oracle) {
        return Some(chosen(mv, ChoiceSource::Mate));
    }

    let per_query = policy.query_time(sample.len(), request.time_remaining);
    if let Some(mv) = ensemble_vote(&sample, request.legal_moves, per_query, policy, oracle) {
        return Some(chosen(mv, ChoiceSource::Vote));
    }

    let mv = *request.legal_moves.choose(rng)?;
    Some(chosen(mv, ChoiceSource::Random))
}

fn chosen(mv: Move, source: ChoiceSource) -> MoveChoice {
    event!(
        target: "recon_agent::selector",
        Level::DEBUG,
        mv = %chess_core::move_to_uci(mv),
        source = ?source,
        "move chosen"
    );
    MoveChoice { mv, source }
}

/// The legal move with the squares and promotion of `mv`.
fn legal_match(legal: &[Move], mv: Move) -> Option<Move> {
    legal.iter().find(|m| **m == mv).copied()
}

/// A legal move that takes the opponent king in some member where we are to
/// move. Promotion does not matter for the capture.
fn king_capture(belief: &BeliefSet, request: &MoveRequest<'_>) -> Option<Move> {
    let me = request.color;
    for pos in belief.to_move(me) {
        let Some(king) = pos.king_sq(me.other()) else {
            continue;
        };
        let mut attackers = pos.attackers(king, me);
        while let Some(from) = attackers.pop_lsb() {
            if let Some(mv) = request
                .legal_moves
                .iter()
                .find(|m| m.from == from && m.to == king)
            {
                return Some(*mv);
            }
        }
    }
    None
}

/// Up to `max_sampled_boards` members with us to move. When there are more
/// than that, a `known_king_share` of the sample comes from members whose
/// opponent king sits on the hinted square, the rest from the others, and
/// any room the others leave is filled with further known-king members.
pub fn sample_members<'b, R: Rng>(
    belief: &'b BeliefSet,
    request: &MoveRequest<'_>,
    policy: &SamplingPolicy,
    rng: &mut R,
) -> Vec<&'b Position> {
    let cap = policy.max_sampled_boards;
    let opponent = request.color.other();
    let candidates: Vec<&Position> = belief.to_move(request.color).collect();
    if candidates.len() <= cap {
        return candidates;
    }
    let (mut known, unknown): (Vec<&Position>, Vec<&Position>) =
        candidates.into_iter().partition(|pos| {
            request
                .opponent_king_hint
                .is_some_and(|sq| pos.pieces(opponent, PieceKind::King).contains(sq))
        });

    known.shuffle(rng);
    let quota = ((cap as f64 * policy.known_king_share).round() as usize).min(cap);
    let spare = known.split_off(quota.min(known.len()));
    let mut sample = known;
    sample.extend(unknown.into_iter().choose_multiple(rng, cap - sample.len()));
    let room = cap - sample.len();
    sample.extend(spare.into_iter().take(room));
    sample
}

/// Votes for moves leading to a forced mate. Returns the top move only when
/// enough of the sample shows a mate.
fn mate_vote<O: Oracle>(
    sample: &[&Position],
    legal: &[Move],
    policy: &SamplingPolicy,
    oracle: &mut O,
) -> Option<Move> {
    let mut tally = Tally::default();
    let mut mating_members = 0usize;
    for pos in sample {
        let lines = match oracle.analyze(pos, Limit::Depth(policy.mate_depth), 1) {
            Ok(lines) => lines,
            Err(err) => {
                event!(
                    target: "recon_agent::selector",
                    Level::DEBUG,
                    error = %err,
                    "mate query dropped"
                );
                continue;
            }
        };
        let Some(line) = lines.first() else { continue };
        let Some(n) = line.score.mate_in() else {
            continue;
        };
        if n > policy.max_mate_distance {
            continue;
        }
        mating_members += 1;
        if let Some(mv) = legal_match(legal, line.first_move) {
            let weight = (policy.max_mate_distance + 1 - n) * policy.mate_vote_scale;
            tally.add(mv, weight);
        }
    }

    let needed = (sample.len() as f64 * policy.mate_share_threshold).max(1.0);
    if mating_members as f64 >= needed {
        let best = tally.winner();
        if let Some(mv) = best {
            event!(
                target: "recon_agent::selector",
                Level::DEBUG,
                mating_members,
                sampled = sample.len(),
                "forced mate found"
            );
            return Some(mv);
        }
    }
    None
}

/// Plurality vote over each member's top lines; rank r of k votes k + 1 - r.
fn ensemble_vote<O: Oracle>(
    sample: &[&Position],
    legal: &[Move],
    per_query: Duration,
    policy: &SamplingPolicy,
    oracle: &mut O,
) -> Option<Move> {
    let k = policy.vote_top_k;
    let mut tally = Tally::default();
    let mut failures = 0usize;
    for pos in sample {
        let lines = match oracle.analyze(pos, Limit::Time(per_query), k) {
            Ok(lines) => lines,
            Err(_) => {
                failures += 1;
                continue;
            }
        };
        for line in lines.iter().filter(|l| (1..=k).contains(&l.rank)) {
            if let Some(mv) = legal_match(legal, line.first_move) {
                tally.add(mv, (k + 1 - line.rank) as u32);
            }
        }
    }
    if failures > 0 {
        event!(
            target: "recon_agent::selector",
            Level::WARN,
            failures,
            sampled = sample.len(),
            "engine queries failed during voting"
        );
    }
    tally.winner()
}

/// Vote totals in first-vote order.
#[derive(Debug, Default)]
struct Tally {
    votes: Vec<(Move, u32)>,
}

impl Tally {
    fn add(&mut self, mv: Move, weight: u32) {
        match self.votes.iter_mut().find(|(m, _)| *m == mv) {
            Some((_, total)) => *total += weight,
            None => self.votes.push((mv, weight)),
        }
    }

    /// Highest total; the earliest voted move wins ties.
    fn winner(&self) -> Option<Move> {
        let mut best: Option<(Move, u32)> = None;
        for &(mv, total) in &self.votes {
            if best.is_none_or(|(_, b)| total > b) {
                best = Some((mv, total));
            }
        }
        best.map(|(mv, _)| mv)
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod selector_tests;

//! Choosing which 3x3 window to sense.
//!
//! In priority order:
//! 1. a fixed central square during the opening,
//! 2. the square where the opponent just captured one of our pieces,
//! 3. the squares implicated in checks against our king, when enough members
//!    put it in check,
//! 4. the window minimising the expected number of surviving members.
//!
//! Edge squares waste part of the window and are skipped while enough
//! interior candidates remain.

use std::collections::HashMap;

use chess_core::{Bitboard, Color, Piece, between, coord_to_sq, is_edge_square, window_3x3};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{Level, event};

use crate::belief::BeliefSet;
use crate::config::SensingPolicy;
use crate::occupancy::OccupancyMap;

/// Where in the game the agent is when it senses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseContext {
    pub color: Color,
    /// Own turns completed before this one.
    pub ply: u32,
    /// Square where the opponent's last move captured one of our pieces.
    pub last_capture_square: Option<u8>,
}

pub fn choose_sense<R: Rng>(
    candidates: &[u8],
    belief: &BeliefSet,
    occupancy: &OccupancyMap,
    ctx: &SenseContext,
    policy: &SensingPolicy,
    rng: &mut R,
) -> Option<u8> {
    if candidates.is_empty() {
        return None;
    }

    if ctx.ply < policy.opening_plies
        && let Some(sq) = opening_square(ctx.color, rng)
        && candidates.contains(&sq)
    {
        event!(target: "recon_agent::sensing", Level::DEBUG, square = sq, "opening sense");
        return Some(sq);
    }

    if let Some(sq) = ctx.last_capture_square
        && candidates.contains(&sq)
    {
        event!(target: "recon_agent::sensing", Level::DEBUG, square = sq, "sensing capture square");
        return Some(sq);
    }

    let pool = interior_pool(candidates, policy.min_interior_candidates);

    let threats = CheckThreats::collect(belief, ctx.color);
    if threats.share > policy.check_alert_threshold
        && let Some(sq) = threats.best_window(&pool)
    {
        event!(
            target: "recon_agent::sensing",
            Level::DEBUG,
            square = sq,
            share = threats.share,
            "sensing possible check"
        );
        return Some(sq);
    }

    let evaluated = if pool.len() > policy.full_scan_candidate_limit
        || belief.len() > policy.full_scan_belief_limit
    {
        sample_pool(&pool, occupancy, policy, rng)
    } else {
        pool.clone()
    };

    let mut best: Option<(u8, f64)> = None;
    for &sq in &evaluated {
        let score = expected_residual(belief, sq);
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((sq, score));
        }
    }
    if let Some((sq, score)) = best {
        event!(
            target: "recon_agent::sensing",
            Level::DEBUG,
            square = sq,
            expected_members = score,
            evaluated = evaluated.len(),
            "sensing by expected residual"
        );
        return Some(sq);
    }

    candidates.choose(rng).copied()
}

/// One of the two central squares looked at during the opening.
fn opening_square<R: Rng>(color: Color, rng: &mut R) -> Option<u8> {
    let choices = match color {
        Color::White => ["e6", "d6"],
        Color::Black => ["e4", "d4"],
    };
    choices.choose(rng).and_then(|c| coord_to_sq(c))
}

fn interior_pool(candidates: &[u8], min_interior: usize) -> Vec<u8> {
    let interior: Vec<u8> = candidates
        .iter()
        .copied()
        .filter(|sq| !is_edge_square(*sq))
        .collect();
    if interior.len() < min_interior {
        candidates.to_vec()
    } else {
        interior
    }
}

/// A random subset of `pool` plus its most likely occupied squares.
fn sample_pool<R: Rng>(
    pool: &[u8],
    occupancy: &OccupancyMap,
    policy: &SensingPolicy,
    rng: &mut R,
) -> Vec<u8> {
    let mut picked: Vec<u8> = pool
        .choose_multiple(rng, policy.sampled_candidates)
        .copied()
        .collect();
    let likely = occupancy
        .top_squares(64)
        .into_iter()
        .filter(|sq| occupancy.get(*sq) > 0.0 && pool.contains(sq))
        .take(policy.likely_squares);
    for sq in likely {
        if !picked.contains(&sq) {
            picked.push(sq);
        }
    }
    picked
}

/// Expected number of members left after sensing at `center`: the members
/// split by what the window would show, scored as sum of n_i^2 / N.
pub fn expected_residual(belief: &BeliefSet, center: u8) -> f64 {
    let window: Vec<u8> = window_3x3(center).collect();
    let mut groups: HashMap<[Option<Piece>; 9], usize> = HashMap::new();
    for pos in belief {
        let mut key = [None; 9];
        for (slot, sq) in key.iter_mut().zip(&window) {
            *slot = pos.piece_at(*sq);
        }
        *groups.entry(key).or_insert(0) += 1;
    }
    let total = belief.len().max(1) as f64;
    groups
        .values()
        .map(|&n| (n * n) as f64)
        .sum::<f64>()
        / total
}

/// How often our king is attacked across the belief set, and from where.
struct CheckThreats {
    share: f64,
    implicated: Bitboard,
}

impl CheckThreats {
    fn collect(belief: &BeliefSet, me: Color) -> Self {
        let mut checked = 0usize;
        let mut implicated = Bitboard::EMPTY;
        for pos in belief {
            let Some(king) = pos.king_sq(me) else {
                continue;
            };
            let mut attackers = pos.attackers(king, me.other());
            if attackers.is_empty() {
                continue;
            }
            checked += 1;
            while let Some(from) = attackers.pop_lsb() {
                implicated.set(from);
                if pos.piece_at(from).is_some_and(|pc| pc.kind.is_slider()) {
                    implicated |= between(from, king);
                }
            }
        }
        Self {
            share: checked as f64 / belief.len().max(1) as f64,
            implicated,
        }
    }

    /// Candidate whose window covers the most implicated squares; `None` when
    /// no window covers any.
    fn best_window(&self, pool: &[u8]) -> Option<u8> {
        let mut best: Option<(u8, u32)> = None;
        for &center in pool {
            let covered = (Bitboard::window(center) & self.implicated).popcount();
            if covered > 0 && best.is_none_or(|(_, c)| covered > c) {
                best = Some((center, covered));
            }
        }
        best.map(|(sq, _)| sq)
    }
}

#[cfg(test)]
#[path = "sensing_tests.rs"]
mod sensing_tests;

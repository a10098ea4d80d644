use chess_core::Color;

use crate::belief::BeliefSet;

/// Per-square share of belief members with an opponent piece on the square.
///
/// Derived data: always rebuilt from a [`BeliefSet`] through [`OccupancyMap::recompute`].
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyMap {
    probs: [f32; 64],
}

impl Default for OccupancyMap {
    fn default() -> Self {
        Self { probs: [0.0; 64] }
    }
}

impl OccupancyMap {
    pub fn recompute(belief: &BeliefSet, opponent: Color) -> Self {
        let mut counts = [0u32; 64];
        for pos in belief {
            for (sq, slot) in pos.board.iter().enumerate() {
                if let Some(pc) = slot
                    && pc.color == opponent
                {
                    counts[sq] += 1;
                }
            }
        }
        let total = belief.len().max(1) as f32;
        let mut probs = [0.0; 64];
        for (p, c) in probs.iter_mut().zip(counts) {
            *p = c as f32 / total;
        }
        Self { probs }
    }

    pub fn get(&self, sq: u8) -> f32 {
        self.probs[sq as usize]
    }

    /// The `k` squares most likely to hold an opponent piece, highest first.
    /// Equal probabilities keep square order.
    pub fn top_squares(&self, k: usize) -> Vec<u8> {
        let mut squares: Vec<u8> = (0..64).collect();
        squares.sort_by(|a, b| self.get(*b).total_cmp(&self.get(*a)));
        squares.truncate(k);
        squares
    }
}

#[cfg(test)]
#[path = "occupancy_tests.rs"]
mod occupancy_tests;

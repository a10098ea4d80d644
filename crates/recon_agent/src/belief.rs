//! The set of positions still consistent with everything observed.

use std::collections::HashSet;
use std::hash::{BuildHasherDefault, DefaultHasher};

use chess_core::{Color, Position};

/// Fixed-key hasher so iteration order, and therefore seeded sampling, is
/// reproducible across runs.
type Members = HashSet<Position, BuildHasherDefault<DefaultHasher>>;

/// Deduplicated, never-empty set of candidate positions.
///
/// The only constructors either take a single position or refuse an empty
/// input, so every `BeliefSet` in existence has at least one member.
#[derive(Debug, Clone)]
pub struct BeliefSet {
    members: Members,
}

impl BeliefSet {
    pub fn single(position: Position) -> Self {
        let mut members = Members::default();
        members.insert(position);
        Self { members }
    }

    /// `None` if `positions` yields nothing.
    pub fn try_from_positions(positions: impl IntoIterator<Item = Position>) -> Option<Self> {
        let members: Members = positions.into_iter().collect();
        if members.is_empty() {
            None
        } else {
            Some(Self { members })
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.members.contains(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.members.iter()
    }

    /// Members where `color` is the side to move.
    pub fn to_move(&self, color: Color) -> impl Iterator<Item = &Position> {
        self.members
            .iter()
            .filter(move |p| p.side_to_move == color)
    }

    /// The only member, if exactly one remains.
    pub fn resolved(&self) -> Option<&Position> {
        if self.members.len() == 1 {
            self.members.iter().next()
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a BeliefSet {
    type Item = &'a Position;
    type IntoIter = std::collections::hash_set::Iter<'a, Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

#[cfg(test)]
#[path = "belief_tests.rs"]
mod belief_tests;

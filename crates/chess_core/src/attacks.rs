//! Attack sets for every piece kind.
//!
//! Leaper tables (knight, king, pawn) and the eight ray tables are built at
//! compile time from step offsets. A slider's attack along a ray stops at the
//! first occupied square and includes it.

use crate::bitboard::Bitboard;
use crate::types::{Color, PieceKind};

/// (file, rank) steps. Indices 0..4 are orthogonal, 4..8 diagonal.
const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const fn offset(sq: u8, df: i8, dr: i8) -> Option<u8> {
    let f = (sq % 8) as i8 + df;
    let r = (sq / 8) as i8 + dr;
    if f >= 0 && f < 8 && r >= 0 && r < 8 {
        Some((r * 8 + f) as u8)
    } else {
        None
    }
}

const fn leaper_table(steps: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let mut bits = 0u64;
        let mut i = 0;
        while i < steps.len() {
            if let Some(to) = offset(sq as u8, steps[i].0, steps[i].1) {
                bits |= 1u64 << to;
            }
            i += 1;
        }
        table[sq] = Bitboard(bits);
        sq += 1;
    }
    table
}

const fn ray_table() -> [[Bitboard; 64]; 8] {
    let mut rays = [[Bitboard::EMPTY; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let (df, dr) = DIRECTIONS[dir];
        let mut sq = 0;
        while sq < 64 {
            let mut bits = 0u64;
            let mut next = offset(sq as u8, df, dr);
            while let Some(to) = next {
                bits |= 1u64 << to;
                next = offset(to, df, dr);
            }
            rays[dir][sq] = Bitboard(bits);
            sq += 1;
        }
        dir += 1;
    }
    rays
}

static KNIGHT: [Bitboard; 64] = leaper_table(&KNIGHT_STEPS);
static KING: [Bitboard; 64] = leaper_table(&DIRECTIONS);
static WHITE_PAWN: [Bitboard; 64] = leaper_table(&[(-1, 1), (1, 1)]);
static BLACK_PAWN: [Bitboard; 64] = leaper_table(&[(-1, -1), (1, -1)]);

/// `RAYS[dir][sq]`: every square from `sq` towards the board edge along
/// `DIRECTIONS[dir]`, `sq` excluded.
static RAYS: [[Bitboard; 64]; 8] = ray_table();

/// Squares a `color` pawn on `sq` captures on.
#[inline(always)]
pub fn pawn_attacks(sq: u8, color: Color) -> Bitboard {
    match color {
        Color::White => WHITE_PAWN[sq as usize],
        Color::Black => BLACK_PAWN[sq as usize],
    }
}

#[inline(always)]
pub fn knight_attacks(sq: u8) -> Bitboard {
    KNIGHT[sq as usize]
}

#[inline(always)]
pub fn king_attacks(sq: u8) -> Bitboard {
    KING[sq as usize]
}

fn ray_attacks(sq: u8, dir: usize, occupied: Bitboard) -> Bitboard {
    let ray = RAYS[dir][sq as usize];
    let blockers = ray & occupied;
    let (df, dr) = DIRECTIONS[dir];
    // Rays towards higher squares meet their nearest blocker at the lowest bit.
    let nearest = if dr > 0 || (dr == 0 && df > 0) {
        blockers.lsb()
    } else {
        blockers.msb()
    };
    match nearest {
        Some(stop) => ray & !RAYS[dir][stop as usize],
        None => ray,
    }
}

pub fn rook_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    (0..4).fold(Bitboard::EMPTY, |acc, dir| acc | ray_attacks(sq, dir, occupied))
}

pub fn bishop_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    (4..8).fold(Bitboard::EMPTY, |acc, dir| acc | ray_attacks(sq, dir, occupied))
}

pub fn queen_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Squares a non-pawn piece of `kind` on `sq` attacks. Pawns attack by color
/// and are handled by [`pawn_attacks`]; this returns nothing for them.
pub fn piece_attacks(kind: PieceKind, sq: u8, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Pawn => Bitboard::EMPTY,
        PieceKind::Knight => knight_attacks(sq),
        PieceKind::Bishop => bishop_attacks(sq, occupied),
        PieceKind::Rook => rook_attacks(sq, occupied),
        PieceKind::Queen => queen_attacks(sq, occupied),
        PieceKind::King => king_attacks(sq),
    }
}

/// Squares strictly between `a` and `b` when they share a rank, file or
/// diagonal; empty otherwise.
pub fn between(a: u8, b: u8) -> Bitboard {
    let target = Bitboard::from_square(b);
    (0..8)
        .find(|&dir| RAYS[dir][a as usize].contains(b))
        .map_or(Bitboard::EMPTY, |dir| ray_attacks(a, dir, target) & !target)
}

#[cfg(test)]
#[path = "attacks_tests.rs"]
mod attacks_tests;

//! Zobrist keys for position identity.
//!
//! Belief sets hold many thousands of positions and are rebuilt every ply, so
//! hashing a position must not walk a string encoding. The key XORs together
//! random values for:
//! - Each piece on each square (12 pieces × 64 squares = 768 values)
//! - Side to move (1 value)
//! - Castling rights (4 values)
//! - En passant file (8 values), only when the capture is actually available
//!
//! Move counters never contribute, matching `Position`'s equality.

use crate::board::Position;
use crate::types::{Color, Piece};

/// Pre-computed random values, generated from a fixed seed.
pub struct ZobristKeys {
    /// Indexed by [color][piece_kind][square]
    pub pieces: [[[u64; 64]; 6]; 2],
    /// XOR-ed in when Black is to move
    pub side_to_move: u64,
    /// [wk, wq, bk, bq]
    pub castling: [u64; 4],
    /// En passant file (0-7)
    pub en_passant: [u64; 8],
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl ZobristKeys {
    /// Keys from a xorshift64 stream with a fixed seed.
    pub const fn new() -> Self {
        const fn xorshift64(mut state: u64) -> u64 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        }

        let mut state = 0x9E37_79B9_7F4A_7C15u64;

        let mut pieces = [[[0u64; 64]; 6]; 2];
        let mut color = 0;
        while color < 2 {
            let mut piece = 0;
            while piece < 6 {
                let mut sq = 0;
                while sq < 64 {
                    state = xorshift64(state);
                    pieces[color][piece][sq] = state;
                    sq += 1;
                }
                piece += 1;
            }
            color += 1;
        }

        state = xorshift64(state);
        let side_to_move = state;

        let mut castling = [0u64; 4];
        let mut i = 0;
        while i < 4 {
            state = xorshift64(state);
            castling[i] = state;
            i += 1;
        }

        let mut en_passant = [0u64; 8];
        let mut i = 0;
        while i < 8 {
            state = xorshift64(state);
            en_passant[i] = state;
            i += 1;
        }

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant,
        }
    }

    #[inline(always)]
    pub fn piece_key(&self, piece: Piece, sq: u8) -> u64 {
        self.pieces[piece.color.idx()][piece.kind.idx()][sq as usize]
    }

    /// Index 0=wk, 1=wq, 2=bk, 3=bq.
    #[inline(always)]
    pub fn castling_key(&self, index: usize) -> u64 {
        self.castling[index]
    }

    #[inline(always)]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }

    /// Full key of `pos`, computed from scratch.
    pub fn position_key(&self, pos: &Position) -> u64 {
        let mut key = 0u64;
        for (i, slot) in pos.board.iter().enumerate() {
            if let Some(pc) = slot {
                key ^= self.piece_key(*pc, i as u8);
            }
        }
        if pos.side_to_move == Color::Black {
            key ^= self.side_to_move;
        }
        for (i, on) in pos.castling.as_array().iter().enumerate() {
            if *on {
                key ^= self.castling_key(i);
            }
        }
        if let Some(ep) = pos.effective_en_passant() {
            key ^= self.ep_key(ep % 8);
        }
        key
    }
}

/// Global static Zobrist keys, computed at compile time.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
#[path = "zobrist_tests.rs"]
mod zobrist_tests;

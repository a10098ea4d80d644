//! Chess rules for fully visible positions: board representation, attack
//! tables, move generation, FEN and UCI notation.
//!
//! The belief tracker in `recon_agent` treats this crate as the ground truth
//! for legality; it never sees anything the opponent hides.

pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod movegen;
pub mod types;
pub mod uci;
pub mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use board::*;
pub use movegen::*;
pub use types::*;
pub use uci::*;
pub use zobrist::ZOBRIST;

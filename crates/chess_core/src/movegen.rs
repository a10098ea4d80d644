//! Move generation.
//!
//! [`pseudo_legal_moves`] is the move set of the blind variant: a move may
//! leave the mover's own king attacked, and kings are captured rather than
//! mated. Castling still follows the standard rules (rights held, path empty,
//! king neither in check nor crossing an attacked square). [`legal_moves`]
//! adds the standard own-king-safety filter on top.

use crate::attacks::{pawn_attacks, piece_attacks};
use crate::bitboard::Bitboard;
use crate::board::Position;
use crate::types::*;

const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// One castle: the king's move, the squares that must be empty and the ones
/// the king passes through.
struct Castle {
    king_from: u8,
    king_to: u8,
    empty: &'static [u8],
    crossed: &'static [u8],
}

const WHITE_KINGSIDE: Castle = Castle {
    king_from: 4,
    king_to: 6,
    empty: &[5, 6],
    crossed: &[5, 6],
};
const WHITE_QUEENSIDE: Castle = Castle {
    king_from: 4,
    king_to: 2,
    empty: &[3, 2, 1],
    crossed: &[3, 2],
};
const BLACK_KINGSIDE: Castle = Castle {
    king_from: 60,
    king_to: 62,
    empty: &[61, 62],
    crossed: &[61, 62],
};
const BLACK_QUEENSIDE: Castle = Castle {
    king_from: 60,
    king_to: 58,
    empty: &[59, 58, 57],
    crossed: &[59, 58],
};

/// Every move of the side to move under the variant's rules.
pub fn pseudo_legal_moves(pos: &Position) -> Vec<Move> {
    let mut out = Vec::with_capacity(48);
    generate(pos, &mut out);
    out
}

/// Pseudo-legal moves that do not leave the mover's king attacked.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut tmp = pos.clone();
    let mut out = Vec::with_capacity(48);
    legal_moves_into(&mut tmp, &mut out);
    out
}

/// [`legal_moves`] into a reused buffer; `pos` is restored before returning.
pub fn legal_moves_into(pos: &mut Position, out: &mut Vec<Move>) {
    out.clear();
    generate(pos, out);
    let mover = pos.side_to_move;
    out.retain(|&mv| {
        let undo = pos.make_move(mv);
        let exposed = pos.in_check(mover);
        pos.unmake_move(mv, undo);
        !exposed
    });
}

fn generate(pos: &Position, out: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let own = pos.pieces_of(us);
    let theirs = pos.pieces_of(us.other());
    let occupied = own | theirs;

    for from in own {
        let Some(pc) = pos.piece_at(from) else {
            continue;
        };
        match pc.kind {
            PieceKind::Pawn => pawn_moves(pos, from, us, theirs, occupied, out),
            kind => {
                for to in piece_attacks(kind, from, occupied) & !own {
                    out.push(Move::new(from, to));
                }
            }
        }
    }

    let castles: [(bool, &Castle); 2] = match us {
        Color::White => [
            (pos.castling.wk, &WHITE_KINGSIDE),
            (pos.castling.wq, &WHITE_QUEENSIDE),
        ],
        Color::Black => [
            (pos.castling.bk, &BLACK_KINGSIDE),
            (pos.castling.bq, &BLACK_QUEENSIDE),
        ],
    };
    for (right, castle) in castles {
        if right && can_castle(pos, castle, occupied) {
            let mut mv = Move::new(castle.king_from, castle.king_to);
            mv.is_castle = true;
            out.push(mv);
        }
    }
}

fn pawn_moves(
    pos: &Position,
    from: u8,
    us: Color,
    theirs: Bitboard,
    occupied: Bitboard,
    out: &mut Vec<Move>,
) {
    let (step, start_rank, last_rank): (i8, i8, i8) = match us {
        Color::White => (1, 1, 7),
        Color::Black => (-1, 6, 0),
    };
    let file = file_of(from);
    let rank = rank_of(from);

    if let Some(one) = sq(file, rank + step)
        && !occupied.contains(one)
    {
        push_pawn_move(from, one, last_rank, out);
        if rank == start_rank
            && let Some(two) = sq(file, rank + 2 * step)
            && !occupied.contains(two)
        {
            out.push(Move::new(from, two));
        }
    }

    for to in pawn_attacks(from, us) {
        if theirs.contains(to) {
            push_pawn_move(from, to, last_rank, out);
        } else if pos.en_passant == Some(to) && !occupied.contains(to) {
            let mut mv = Move::new(from, to);
            mv.is_en_passant = true;
            out.push(mv);
        }
    }
}

fn push_pawn_move(from: u8, to: u8, last_rank: i8, out: &mut Vec<Move>) {
    if rank_of(to) == last_rank {
        out.extend(PROMOTIONS.iter().map(|&kind| Move::with_promo(from, to, kind)));
    } else {
        out.push(Move::new(from, to));
    }
}

fn can_castle(pos: &Position, castle: &Castle, occupied: Bitboard) -> bool {
    let us = pos.side_to_move;
    let them = us.other();
    let king_home = pos
        .piece_at(castle.king_from)
        .is_some_and(|pc| pc.color == us && pc.kind == PieceKind::King);
    king_home
        && castle.empty.iter().all(|&s| !occupied.contains(s))
        && !pos.is_square_attacked(castle.king_from, them)
        && castle
            .crossed
            .iter()
            .all(|&s| !pos.is_square_attacked(s, them))
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;

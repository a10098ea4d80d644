use std::hash::{Hash, Hasher};

use thiserror::Error;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::types::*;
use crate::zobrist::ZOBRIST;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, got {0}")]
    MissingFields(usize),
    #[error("board section must have 8 ranks, got {0}")]
    RankCount(usize),
    #[error("rank {0} does not describe exactly 8 files")]
    RankWidth(usize),
    #[error("invalid piece character '{0}'")]
    Piece(char),
    #[error("invalid side to move '{0}'")]
    SideToMove(String),
    #[error("invalid castling character '{0}'")]
    Castling(char),
    #[error("invalid en-passant square '{0}'")]
    EnPassant(String),
    #[error("invalid move counter '{0}'")]
    Counter(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub wk: bool,
    pub wq: bool,
    pub bk: bool,
    pub bq: bool,
}

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights {
        wk: false,
        wq: false,
        bk: false,
        bq: false,
    };

    pub fn as_array(self) -> [bool; 4] {
        [self.wk, self.wq, self.bk, self.bq]
    }
}

/// One fully specified chess position.
///
/// Positions are treated as values: `play` and `null_move` return successors
/// and leave `self` untouched. Equality and hashing cover the piece placement,
/// side to move, castling rights and the en-passant square when it can
/// actually be captured on; the halfmove and fullmove counters are ignored so
/// that the same placement reached along different paths is one position.
#[derive(Clone, Debug)]
pub struct Position {
    pub board: [Option<Piece>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>, // square behind a pawn that just advanced 2
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

#[derive(Clone, Debug)]
pub struct Undo {
    pub captured: Option<Piece>,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub moved_piece: Piece,
    pub rook_move: Option<(u8, u8)>, // (rook_from, rook_to) for castling
    pub ep_captured_sq: Option<u8>,  // square actually captured in en-passant
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.effective_en_passant() == other.effective_en_passant()
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.zobrist_key());
    }
}

impl Position {
    pub fn startpos() -> Self {
        let mut p = Position {
            board: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights {
                wk: true,
                wq: true,
                bk: true,
                bq: true,
            },
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };

        // Pawns
        for f in 0..8 {
            p.board[8 + f] = Some(Piece::new(Color::White, PieceKind::Pawn));
            p.board[48 + f] = Some(Piece::new(Color::Black, PieceKind::Pawn));
        }
        // Back ranks
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in back.iter().enumerate() {
            p.board[f] = Some(Piece::new(Color::White, kind));
            p.board[56 + f] = Some(Piece::new(Color::Black, kind));
        }
        p
    }

    /// Parse Forsyth-Edwards Notation. The move counters are optional.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::MissingFields(parts.len()));
        }

        let board_part = parts[0];
        let stm_part = parts[1];
        let castle_part = parts[2];
        let ep_part = parts[3];
        let halfmove_part = parts.get(4).copied().unwrap_or("0");
        let fullmove_part = parts.get(5).copied().unwrap_or("1");

        let mut board = [None; 64];
        let ranks: Vec<&str> = board_part.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let mut file: i8 = 0;
            let rank: i8 = 7 - rank_idx as i8; // FEN lists rank 8 .. 1
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as i8;
                } else {
                    let piece = Piece::from_symbol(ch).ok_or(FenError::Piece(ch))?;
                    let s = sq(file, rank).ok_or(FenError::RankWidth(8 - rank_idx))?;
                    board[s as usize] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::RankWidth(8 - rank_idx));
                }
            }
            if file != 8 {
                return Err(FenError::RankWidth(8 - rank_idx));
            }
        }

        let side_to_move = match stm_part {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let mut castling = CastlingRights::NONE;
        if castle_part != "-" {
            for c in castle_part.chars() {
                match c {
                    'K' => castling.wk = true,
                    'Q' => castling.wq = true,
                    'k' => castling.bk = true,
                    'q' => castling.bq = true,
                    _ => return Err(FenError::Castling(c)),
                }
            }
        }

        let en_passant = if ep_part == "-" {
            None
        } else {
            Some(coord_to_sq(ep_part).ok_or_else(|| FenError::EnPassant(ep_part.to_string()))?)
        };

        let halfmove_clock: u32 = halfmove_part
            .parse()
            .map_err(|_| FenError::Counter(halfmove_part.to_string()))?;
        let fullmove_number: u32 = fullmove_part
            .parse()
            .map_err(|_| FenError::Counter(fullmove_part.to_string()))?;

        Ok(Position {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[rank * 8 + file] {
                    Some(pc) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(pc.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        let rights: String = self
            .castling
            .as_array()
            .iter()
            .zip(['K', 'Q', 'k', 'q'])
            .filter(|(on, _)| **on)
            .map(|(_, ch)| ch)
            .collect();
        out.push_str(if rights.is_empty() { "-" } else { &rights });

        out.push(' ');
        match self.effective_en_passant() {
            Some(ep) => out.push_str(&sq_to_coord(ep)),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }

    pub fn king_sq(&self, c: Color) -> Option<u8> {
        for i in 0..64 {
            if let Some(pc) = self.board[i]
                && pc.color == c
                && pc.kind == PieceKind::King
            {
                return Some(i as u8);
            }
        }
        None
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board[sq as usize]
    }
    pub fn set_piece(&mut self, sq: u8, pc: Option<Piece>) {
        self.board[sq as usize] = pc;
    }

    /// Every square holding a piece.
    pub fn occupied(&self) -> Bitboard {
        self.squares_where(|_| true)
    }

    /// Squares holding any piece of color `c`.
    pub fn pieces_of(&self, c: Color) -> Bitboard {
        self.squares_where(|pc| pc.color == c)
    }

    /// Squares holding `kind` pieces of color `c`.
    pub fn pieces(&self, c: Color, kind: PieceKind) -> Bitboard {
        self.squares_where(|pc| pc.color == c && pc.kind == kind)
    }

    fn squares_where(&self, pred: impl Fn(Piece) -> bool) -> Bitboard {
        let mut bb = Bitboard::EMPTY;
        for (i, slot) in self.board.iter().enumerate() {
            if let Some(pc) = slot
                && pred(*pc)
            {
                bb.set(i as u8);
            }
        }
        bb
    }

    /// Exactly one king per side.
    pub fn is_structurally_valid(&self) -> bool {
        self.pieces(Color::White, PieceKind::King).popcount() == 1
            && self.pieces(Color::Black, PieceKind::King).popcount() == 1
    }

    /// The en-passant square, but only when a pawn of the side to move could
    /// capture onto it.
    pub fn effective_en_passant(&self) -> Option<u8> {
        let ep = self.en_passant?;
        // Squares a pawn of the mover attacks `ep` from are the squares an
        // opposing pawn on `ep` would attack.
        let from = pawn_attacks(ep, self.side_to_move.other());
        let pawns = self.pieces(self.side_to_move, PieceKind::Pawn);
        if (from & pawns).is_empty() {
            None
        } else {
            Some(ep)
        }
    }

    /// Zobrist key over the same fields that take part in equality.
    pub fn zobrist_key(&self) -> u64 {
        ZOBRIST.position_key(self)
    }

    pub fn in_check(&self, c: Color) -> bool {
        let ksq = match self.king_sq(c) {
            Some(s) => s,
            None => return false,
        };
        self.is_square_attacked(ksq, c.other())
    }

    pub fn is_square_attacked(&self, target: u8, by: Color) -> bool {
        !self.attackers(target, by).is_empty()
    }

    /// Squares of `by` pieces that attack `target`.
    pub fn attackers(&self, target: u8, by: Color) -> Bitboard {
        let occupied = self.occupied();
        let queens = self.pieces(by, PieceKind::Queen);
        let diagonal = self.pieces(by, PieceKind::Bishop) | queens;
        let straight = self.pieces(by, PieceKind::Rook) | queens;

        // A `by` pawn attacks `target` from where an opposing pawn on
        // `target` would attack.
        (pawn_attacks(target, by.other()) & self.pieces(by, PieceKind::Pawn))
            | (knight_attacks(target) & self.pieces(by, PieceKind::Knight))
            | (king_attacks(target) & self.pieces(by, PieceKind::King))
            | (bishop_attacks(target, occupied) & diagonal)
            | (rook_attacks(target, occupied) & straight)
    }

    /// Whether `mv` removes an opposing piece, en passant included.
    pub fn is_capture(&self, mv: Move) -> bool {
        self.captured_square(mv).is_some()
    }

    /// The square whose piece `mv` captures. For en passant this is the
    /// square of the passed pawn, not the destination.
    pub fn captured_square(&self, mv: Move) -> Option<u8> {
        let mover = self.piece_at(mv.from)?;
        if let Some(target) = self.piece_at(mv.to) {
            return (target.color != mover.color).then_some(mv.to);
        }
        if mover.kind == PieceKind::Pawn
            && self.en_passant == Some(mv.to)
            && file_of(mv.from) != file_of(mv.to)
        {
            return sq(file_of(mv.to), rank_of(mv.from));
        }
        None
    }

    /// Successor position after `mv`; `self` is unchanged. `mv` must come
    /// from the move generator for this position.
    pub fn play(&self, mv: Move) -> Position {
        let mut next = self.clone();
        next.make_move(mv);
        next
    }

    /// Successor position in which the side to move passes.
    pub fn null_move(&self) -> Position {
        let mut next = self.clone();
        next.en_passant = None;
        next.halfmove_clock += 1;
        if next.side_to_move == Color::Black {
            next.fullmove_number += 1;
        }
        next.side_to_move = next.side_to_move.other();
        next
    }

    pub fn make_move(&mut self, mv: Move) -> Undo {
        let from = mv.from;
        let to = mv.to;
        let moved = self.piece_at(from).expect("no piece on from-square");
        let mut captured = self.piece_at(to);
        let prev_castling = self.castling;
        let prev_ep = self.en_passant;
        let prev_hmc = self.halfmove_clock;
        let prev_fmn = self.fullmove_number;

        self.en_passant = None;

        // Halfmove clock reset on capture or pawn move
        let mut reset_hmc = moved.kind == PieceKind::Pawn || captured.is_some();

        // Handle en-passant capture
        let mut ep_captured_sq = None;
        if mv.is_en_passant {
            let dir = match moved.color {
                Color::White => -1,
                Color::Black => 1,
            };
            let cap_rank = rank_of(to) + dir;
            let cap_file = file_of(to);
            if let Some(cs) = sq(cap_file, cap_rank) {
                captured = self.piece_at(cs);
                self.set_piece(cs, None);
                ep_captured_sq = Some(cs);
                reset_hmc = true;
            }
        }

        // Move piece (promotion handled after)
        self.set_piece(from, None);
        self.set_piece(to, Some(moved));

        // Promotion
        if moved.kind == PieceKind::Pawn {
            let r = rank_of(to);
            if (moved.color == Color::White && r == 7) || (moved.color == Color::Black && r == 0) {
                let promo = mv.promo.unwrap_or(PieceKind::Queen);
                self.set_piece(to, Some(Piece::new(moved.color, promo)));
                reset_hmc = true;
            }
        }

        // Castling rook move
        let mut rook_move = None;
        if mv.is_castle && moved.kind == PieceKind::King {
            // White: e1->g1 rook h1->f1, e1->c1 rook a1->d1
            // Black: e8->g8 rook h8->f8, e8->c8 rook a8->d8
            let rook_squares = match (moved.color, from, to) {
                (Color::White, 4, 6) => Some((7, 5)),
                (Color::White, 4, 2) => Some((0, 3)),
                (Color::Black, 60, 62) => Some((63, 61)),
                (Color::Black, 60, 58) => Some((56, 59)),
                _ => None,
            };
            if let Some((rf, rt)) = rook_squares
                && let Some(rook) = self.piece_at(rf)
            {
                self.set_piece(rf, None);
                self.set_piece(rt, Some(rook));
                rook_move = Some((rf, rt));
            }
        }

        // Update castling rights if king/rook moved or rook captured
        match moved.color {
            Color::White => {
                if moved.kind == PieceKind::King {
                    self.castling.wk = false;
                    self.castling.wq = false;
                }
                if moved.kind == PieceKind::Rook {
                    if from == 0 {
                        self.castling.wq = false;
                    }
                    if from == 7 {
                        self.castling.wk = false;
                    }
                }
            }
            Color::Black => {
                if moved.kind == PieceKind::King {
                    self.castling.bk = false;
                    self.castling.bq = false;
                }
                if moved.kind == PieceKind::Rook {
                    if from == 56 {
                        self.castling.bq = false;
                    }
                    if from == 63 {
                        self.castling.bk = false;
                    }
                }
            }
        }
        // If rook captured on its home square, remove right
        if let Some(cp) = captured
            && cp.kind == PieceKind::Rook
        {
            match cp.color {
                Color::White => {
                    if to == 0 {
                        self.castling.wq = false;
                    }
                    if to == 7 {
                        self.castling.wk = false;
                    }
                }
                Color::Black => {
                    if to == 56 {
                        self.castling.bq = false;
                    }
                    if to == 63 {
                        self.castling.bk = false;
                    }
                }
            }
        }

        // Double pawn push sets en-passant square
        if moved.kind == PieceKind::Pawn {
            let fr = rank_of(from);
            let tr = rank_of(to);
            if (moved.color == Color::White && fr == 1 && tr == 3)
                || (moved.color == Color::Black && fr == 6 && tr == 4)
            {
                // ep square is the square passed over
                let ep_rank = (fr + tr) / 2;
                let ep_file = file_of(from);
                self.en_passant = sq(ep_file, ep_rank);
            }
        }

        self.halfmove_clock = if reset_hmc {
            0
        } else {
            self.halfmove_clock + 1
        };

        // Switch side
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.other();

        Undo {
            captured,
            castling: prev_castling,
            en_passant: prev_ep,
            halfmove_clock: prev_hmc,
            fullmove_number: prev_fmn,
            moved_piece: moved,
            rook_move,
            ep_captured_sq,
        }
    }

    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        // Restore side
        self.side_to_move = self.side_to_move.other();
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;

        let from = mv.from;
        let to = mv.to;

        // Undo castling rook move
        if let Some((rf, rt)) = undo.rook_move {
            let rook = self.piece_at(rt);
            self.set_piece(rt, None);
            self.set_piece(rf, rook);
        }

        // Move piece back; a promoted piece reverts to the pawn that moved
        let piece_on_to = if undo.moved_piece.kind == PieceKind::Pawn {
            Some(undo.moved_piece)
        } else {
            self.piece_at(to)
        };

        self.set_piece(to, None);
        self.set_piece(from, piece_on_to);

        // Restore captured piece
        if mv.is_en_passant {
            if let Some(cs) = undo.ep_captured_sq {
                self.set_piece(cs, undo.captured);
            }
        } else {
            self.set_piece(to, undo.captured);
        }
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;

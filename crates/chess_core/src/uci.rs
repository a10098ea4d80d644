use crate::{board::Position, movegen::legal_moves, types::*};

pub fn move_to_uci(mv: Move) -> String {
    let mut s = String::new();
    s.push_str(&sq_to_coord(mv.from));
    s.push_str(&sq_to_coord(mv.to));
    if let Some(p) = mv.promo {
        let ch = match p {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            _ => 'q',
        };
        s.push(ch);
    }
    s
}

/// Parse the squares and promotion of a UCI move without consulting a
/// position. Castle/en-passant flags are left unset.
pub fn parse_uci_squares(txt: &str) -> Option<Move> {
    if txt.len() < 4 || txt.len() > 5 || !txt.is_ascii() {
        return None;
    }
    let from = coord_to_sq(&txt[0..2])?;
    let to = coord_to_sq(&txt[2..4])?;
    let promo = match txt.as_bytes().get(4).map(|b| *b as char) {
        None => None,
        Some('q' | 'Q') => Some(PieceKind::Queen),
        Some('r' | 'R') => Some(PieceKind::Rook),
        Some('b' | 'B') => Some(PieceKind::Bishop),
        Some('n' | 'N') => Some(PieceKind::Knight),
        Some(_) => return None,
    };
    Some(Move {
        promo,
        ..Move::new(from, to)
    })
}

/// Parse a UCI move and match it against the legal moves of `pos` so the
/// castle/en-passant flags are correct.
pub fn parse_uci_move(pos: &Position, txt: &str) -> Option<Move> {
    let wanted = parse_uci_squares(txt)?;
    legal_moves(pos).into_iter().find(|m| *m == wanted)
}

/// The `position` command that sets up `pos` on a UCI engine.
pub fn position_command(pos: &Position) -> String {
    format!("position fen {}", pos.to_fen())
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;

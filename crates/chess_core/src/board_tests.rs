use super::*;
use std::collections::HashSet;

#[test]
fn test_fen_round_trip() {
    let fens = [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];
    for fen in fens {
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }
}

#[test]
fn test_startpos_matches_start_fen() {
    assert_eq!(Position::startpos(), Position::from_fen(START_FEN).unwrap());
    assert_eq!(Position::startpos().to_fen(), START_FEN);
}

#[test]
fn test_fen_errors() {
    assert_eq!(
        Position::from_fen("8/8/8 w - -"),
        Err(FenError::RankCount(3))
    );
    assert_eq!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq -"),
        Err(FenError::SideToMove("x".to_string()))
    );
    assert!(matches!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq -"),
        Err(FenError::Piece('X'))
    ));
    assert!(matches!(
        Position::from_fen("w KQkq"),
        Err(FenError::MissingFields(2))
    ));
}

#[test]
fn test_identity_ignores_move_clocks() {
    let a = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let b = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 17 40").unwrap();
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    set.insert(b);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_identity_ignores_uncapturable_en_passant() {
    // After 1.e4 no black pawn can take on e3.
    let with_ep = Position::startpos().play(Move::new(12, 28));
    assert_eq!(with_ep.en_passant, Some(20));
    let mut without_ep = with_ep.clone();
    without_ep.en_passant = None;
    assert_eq!(with_ep, without_ep);
    assert_eq!(with_ep.zobrist_key(), without_ep.zobrist_key());
}

#[test]
fn test_identity_keeps_capturable_en_passant() {
    let with_ep = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
    let mut without_ep = with_ep.clone();
    without_ep.en_passant = None;
    assert_eq!(with_ep.effective_en_passant(), Some(43));
    assert_ne!(with_ep, without_ep);
}

#[test]
fn test_identity_distinguishes_side_to_move() {
    let white = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_ne!(white, white.null_move());
}

#[test]
fn test_play_leaves_original_untouched() {
    let start = Position::startpos();
    let next = start.play(Move::new(6, 21)); // Ng1-f3
    assert_eq!(start, Position::startpos());
    assert_eq!(next.side_to_move, Color::Black);
    assert!(next.piece_at(6).is_none());
    assert_eq!(next.piece_at(21), Some(Piece::new(Color::White, PieceKind::Knight)));
}

#[test]
fn test_null_move_flips_turn_and_clears_en_passant() {
    let pos = Position::startpos().play(Move::new(12, 28));
    let passed = pos.null_move();
    assert_eq!(passed.side_to_move, Color::White);
    assert_eq!(passed.en_passant, None);
    assert_eq!(passed.fullmove_number, pos.fullmove_number + 1);
    assert_eq!(passed.board, pos.board);
}

#[test]
fn test_attackers() {
    // Rook a1, knight f3 and king e1 against a lone black king.
    let pos = Position::from_fen("4k3/8/8/8/8/5N2/8/R3K3 w - - 0 1").unwrap();
    // e5 (36) is hit by the knight on f3 (21)
    let att = pos.attackers(36, Color::White);
    assert_eq!(att.collect::<Vec<u8>>(), vec![21]);
    // a8 (56) is hit by the rook on a1 (0)
    assert!(pos.attackers(56, Color::White).contains(0));
    // The white king defends d2 (11)
    assert!(pos.attackers(11, Color::White).contains(4));
    assert!(pos.attackers(36, Color::Black).is_empty());
}

#[test]
fn test_pawn_attackers_direction() {
    let pos = Position::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
    // White pawn e4 (28) attacks d5 (35); black pawn d5 attacks e4.
    assert!(pos.attackers(35, Color::White).contains(28));
    assert!(pos.attackers(28, Color::Black).contains(35));
    assert!(!pos.attackers(20, Color::Black).contains(35));
}

#[test]
fn test_captured_square_en_passant() {
    let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
    let mut mv = Move::new(36, 43);
    mv.is_en_passant = true;
    assert_eq!(pos.captured_square(mv), Some(35));
    assert!(pos.is_capture(mv));
    let after = pos.play(mv);
    assert!(after.piece_at(35).is_none());
    assert!(!pos.is_capture(Move::new(36, 44)));
}

#[test]
fn test_structural_validity() {
    assert!(Position::startpos().is_structurally_valid());
    let no_black_king = Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert!(!no_black_king.is_structurally_valid());
    let two_kings = Position::from_fen("4k3/8/8/8/8/8/8/3KK3 w - - 0 1").unwrap();
    assert!(!two_kings.is_structurally_valid());
}

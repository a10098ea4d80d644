use super::*;

#[test]
fn test_startpos_moves() {
    let pos = Position::startpos();
    let moves = legal_moves(&pos);
    // Starting position has 20 legal moves
    assert_eq!(moves.len(), 20);
    assert_eq!(pseudo_legal_moves(&pos).len(), 20);
}

#[test]
fn test_kiwipete_moves() {
    // Kiwipete position - complex with many move types
    let pos =
        Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -")
            .unwrap();
    let moves = legal_moves(&pos);
    assert_eq!(moves.len(), 48);
}

#[test]
fn test_pseudo_legal_includes_moves_into_check() {
    // The white king may step next to the black rook's file only pseudo-legally.
    let pos = Position::from_fen("4k3/8/8/8/8/8/3r4/4K3 w - - 0 1").unwrap();
    let pseudo = pseudo_legal_moves(&pos);
    let legal = legal_moves(&pos);
    assert!(pseudo.contains(&Move::new(4, 3))); // Kd1, attacked by the rook
    assert!(!legal.contains(&Move::new(4, 3)));
    assert!(legal.contains(&Move::new(4, 11))); // Kxd2
    assert!(pseudo.len() > legal.len());
}

#[test]
fn test_castling_through_attacked_square_not_generated() {
    // Black rook on f8 covers f1, so white may not castle king side.
    let pos = Position::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let pseudo = pseudo_legal_moves(&pos);
    assert!(!pseudo.iter().any(|m| m.is_castle && m.to == 6));
    assert!(pseudo.iter().any(|m| m.is_castle && m.to == 2));
}

#[test]
fn test_promotion_generates_four_pieces() {
    let pos = Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let promos: Vec<Move> = legal_moves(&pos)
        .into_iter()
        .filter(|m| m.from == 48)
        .collect();
    assert_eq!(promos.len(), 4);
    assert!(promos.contains(&Move::with_promo(48, 56, PieceKind::Queen)));
    assert!(promos.contains(&Move::with_promo(48, 56, PieceKind::Knight)));
}

#[test]
fn test_king_capture_is_generated() {
    // Black left its king en prise; taking it is an ordinary move here.
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/4RK2 w - - 0 1").unwrap();
    let take = pseudo_legal_moves(&pos)
        .into_iter()
        .find(|m| m.from == 4 && m.to == 60);
    assert!(take.is_some());
    assert!(pos.is_capture(take.unwrap()));
}

#[test]
fn test_en_passant_flagged() {
    let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
    let ep: Vec<Move> = pseudo_legal_moves(&pos)
        .into_iter()
        .filter(|m| m.is_en_passant)
        .collect();
    assert_eq!(ep.len(), 1);
    assert_eq!((ep[0].from, ep[0].to), (36, 43));
    assert_eq!(pos.captured_square(ep[0]), Some(35));
}

#[test]
fn test_black_castles_both_sides() {
    let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/4K3 b kq - 0 1").unwrap();
    let castles: Vec<u8> = pseudo_legal_moves(&pos)
        .into_iter()
        .filter(|m| m.is_castle)
        .map(|m| m.to)
        .collect();
    assert_eq!(castles, vec![62, 58]);
}

#[test]
fn test_no_castling_out_of_check() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K2q w Q - 0 1").unwrap();
    assert!(!pseudo_legal_moves(&pos).iter().any(|m| m.is_castle));
}

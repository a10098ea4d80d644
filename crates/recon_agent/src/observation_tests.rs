use super::*;
use chess_core::{PieceKind, coord_to_sq};

fn s(coord: &str) -> u8 {
    coord_to_sq(coord).unwrap()
}

#[test]
fn test_capture_event_square_only_when_occurred() {
    assert_eq!(CaptureEvent::none().capture_square(), None);
    assert_eq!(CaptureEvent::at(s("e4")).capture_square(), Some(s("e4")));
    let odd = CaptureEvent {
        occurred: false,
        square: Some(s("e4")),
    };
    assert_eq!(odd.capture_square(), None);
}

#[test]
fn test_king_square_in_window() {
    let obs = SenseObservation::new(vec![
        (s("d7"), Some(Piece::new(Color::Black, PieceKind::Pawn))),
        (s("e8"), Some(Piece::new(Color::Black, PieceKind::King))),
        (s("f8"), None),
    ]);
    assert_eq!(obs.king_square(Color::Black), Some(s("e8")));
    assert_eq!(obs.king_square(Color::White), None);
}

#[test]
fn test_history_parses_hand_written_toml() {
    let history = GameHistory::from_toml_str(
        r#"
        color = "black"
        opponent = "random"

        [[events]]
        kind = "opponent_move"

        [[events]]
        kind = "sense"
        window = { e4 = "P", d4 = ".", e5 = "" }

        [[events]]
        kind = "own_move"
        requested = "e7e5"
        taken = "e7e5"

        [[events]]
        kind = "opponent_move"
        occurred = true
        square = "e5"
        "#,
    )
    .unwrap();

    assert_eq!(history.color, Color::Black);
    assert_eq!(history.start_fen, START_FEN);
    assert_eq!(history.opponent.as_deref(), Some("random"));
    assert_eq!(history.events.len(), 4);
    assert_eq!(history.events[0], Observation::OpponentMove(CaptureEvent::none()));
    assert_eq!(
        history.events[1],
        Observation::Sense(SenseObservation::new(vec![
            (s("d4"), None),
            (s("e4"), Some(Piece::new(Color::White, PieceKind::Pawn))),
            (s("e5"), None),
        ]))
    );
    match history.events[2] {
        Observation::OwnMove(outcome) => {
            assert_eq!(outcome.taken, Some(Move::new(s("e7"), s("e5"))));
            assert!(!outcome.captured_opponent_piece);
        }
        ref other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        history.events[3],
        Observation::OpponentMove(CaptureEvent::at(s("e5")))
    );
}

#[test]
fn test_history_json_keeps_events() {
    let mut history = GameHistory::new(Color::White, START_FEN);
    history.push(Observation::Sense(SenseObservation::new(vec![(
        s("e6"),
        Some(Piece::new(Color::Black, PieceKind::Knight)),
    )])));
    history.push(Observation::OwnMove(MoveOutcome {
        requested: Some(Move::with_promo(s("a7"), s("a8"), PieceKind::Queen)),
        taken: None,
        captured_opponent_piece: false,
        capture_square: None,
    }));
    history.winner = Some(Color::White);
    history.reason = Some(WinReason::KingCapture);

    let json = history.to_json().unwrap();
    assert!(json.contains("\"a7a8q\""));
    assert!(json.contains("\"king_capture\""));
    let back = GameHistory::from_json_str(&json).unwrap();
    assert_eq!(back, history);
}

#[test]
fn test_bad_square_and_piece_rejected() {
    let bad_square = "color = \"white\"\n[[events]]\nkind = \"opponent_move\"\noccurred = true\nsquare = \"z9\"\n";
    assert!(matches!(
        GameHistory::from_toml_str(bad_square),
        Err(ReplayError::Toml(_))
    ));

    let bad_piece = "color = \"white\"\n[[events]]\nkind = \"sense\"\nwindow = { e4 = \"x\" }\n";
    assert!(GameHistory::from_toml_str(bad_piece).is_err());
}

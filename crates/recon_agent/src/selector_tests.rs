use super::*;
use crate::error::EngineError;
use crate::oracle::{Line, Score};
use chess_core::{coord_to_sq, legal_moves, parse_uci_squares, pseudo_legal_moves};
use rand::SeedableRng;
use rand::rngs::StdRng;

type Respond = dyn FnMut(&Position, Limit, usize) -> Result<Vec<Line>, EngineError>;

/// Oracle answering from a closure and recording every limit it was given.
struct Scripted {
    respond: Box<Respond>,
    limits: Vec<Limit>,
}

impl Scripted {
    fn new(
        respond: impl FnMut(&Position, Limit, usize) -> Result<Vec<Line>, EngineError> + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            limits: Vec::new(),
        }
    }

    fn failing() -> Self {
        Self::new(|_, _, _| Err(EngineError::Unavailable("process died".into())))
    }
}

impl Oracle for Scripted {
    fn analyze(&mut self, position: &Position, limit: Limit, top_k: usize) -> Result<Vec<Line>, EngineError> {
        self.limits.push(limit);
        (self.respond)(position, limit, top_k)
    }

    fn play(&mut self, _: &Position, _: Limit) -> Result<Move, EngineError> {
        Err(EngineError::Unavailable("not scripted".into()))
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}

fn mv(txt: &str) -> Move {
    parse_uci_squares(txt).unwrap()
}

fn line(rank: usize, txt: &str, score: Score) -> Line {
    Line {
        rank,
        first_move: mv(txt),
        score,
    }
}

fn request<'a>(legal: &'a [Move]) -> MoveRequest<'a> {
    MoveRequest {
        color: Color::White,
        legal_moves: legal,
        time_remaining: Duration::from_secs(600),
        opponent_king_hint: None,
        book_move: None,
    }
}

/// Twenty positions with White to move, one per Black reply from the start.
fn black_reply_belief() -> BeliefSet {
    let passed = Position::startpos().null_move();
    BeliefSet::try_from_positions(legal_moves(&passed).into_iter().map(|m| passed.play(m))).unwrap()
}

#[test]
fn test_no_legal_moves() {
    let belief = BeliefSet::single(Position::startpos());
    let mut oracle = Scripted::failing();
    let mut rng = StdRng::seed_from_u64(0);
    let choice = choose_move(&belief, &request(&[]), &SamplingPolicy::default(), &mut oracle, &mut rng);
    assert_eq!(choice, None);
}

#[test]
fn test_book_move_when_legal() {
    let belief = BeliefSet::single(Position::startpos());
    let legal = legal_moves(&Position::startpos());
    let req = MoveRequest {
        book_move: Some(mv("e2e4")),
        ..request(&legal)
    };
    let mut oracle = Scripted::new(|_, _, _| panic!("engine consulted before book"));
    let mut rng = StdRng::seed_from_u64(0);
    let choice = choose_move(&belief, &req, &SamplingPolicy::default(), &mut oracle, &mut rng).unwrap();
    assert_eq!(choice.mv, mv("e2e4"));
    assert_eq!(choice.source, ChoiceSource::Book);
}

#[test]
fn test_king_capture_first() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/4QK2 w - - 0 1").unwrap();
    let legal = pseudo_legal_moves(&pos);
    let belief = BeliefSet::single(pos);
    let mut oracle = Scripted::new(|_, _, _| panic!("engine consulted before king capture"));
    let mut rng = StdRng::seed_from_u64(0);
    let choice = choose_move(&belief, &request(&legal), &SamplingPolicy::default(), &mut oracle, &mut rng)
        .unwrap();
    assert_eq!(choice.mv, mv("e1e8"));
    assert_eq!(choice.source, ChoiceSource::KingCapture);
}

#[test]
fn test_unanimous_mate_beats_ensemble_preference() {
    let belief = black_reply_belief();
    let legal = legal_moves(&Position::startpos());
    let mut oracle = Scripted::new(|_, limit, _| match limit {
        Limit::Depth(_) => Ok(vec![line(1, "g1f3", Score::Mate(1))]),
        Limit::Time(_) => Ok(vec![
            line(1, "e2e4", Score::Centipawns(40)),
            line(2, "d2d4", Score::Centipawns(35)),
        ]),
    });
    let mut rng = StdRng::seed_from_u64(1);
    let choice = choose_move(&belief, &request(&legal), &SamplingPolicy::default(), &mut oracle, &mut rng)
        .unwrap();
    assert_eq!(choice.mv, mv("g1f3"));
    assert_eq!(choice.source, ChoiceSource::Mate);
    assert!(oracle.limits.iter().all(|l| matches!(l, Limit::Depth(8))));
}

#[test]
fn test_rare_mate_falls_back_to_vote() {
    let belief = black_reply_belief();
    let legal = legal_moves(&Position::startpos());
    let a6 = coord_to_sq("a6").unwrap();
    let mut oracle = Scripted::new(move |pos, limit, _| match limit {
        // Only the a7a6 member shows a mate: 1 of 20 is under the 10% bar.
        Limit::Depth(_) if pos.piece_at(a6).is_some_and(|p| p.kind == PieceKind::Pawn) => {
            Ok(vec![line(1, "g1f3", Score::Mate(2))])
        }
        Limit::Depth(_) => Ok(vec![line(1, "e2e4", Score::Centipawns(30))]),
        Limit::Time(_) => Ok(vec![line(1, "d2d4", Score::Centipawns(25))]),
    });
    let mut rng = StdRng::seed_from_u64(2);
    let choice = choose_move(&belief, &request(&legal), &SamplingPolicy::default(), &mut oracle, &mut rng)
        .unwrap();
    assert_eq!(choice.mv, mv("d2d4"));
    assert_eq!(choice.source, ChoiceSource::Vote);
}

#[test]
fn test_vote_uses_per_member_time_budget() {
    let belief = black_reply_belief();
    let legal = legal_moves(&Position::startpos());
    let policy = SamplingPolicy::default();
    let mut oracle = Scripted::new(|_, limit, k| match limit {
        Limit::Depth(_) => Ok(Vec::new()),
        Limit::Time(_) => {
            assert_eq!(k, 3);
            Ok(vec![
                line(1, "c2c4", Score::Centipawns(20)),
                line(2, "e2e4", Score::Centipawns(18)),
                line(3, "d2d4", Score::Centipawns(15)),
            ])
        }
    });
    let mut rng = StdRng::seed_from_u64(3);
    let req = request(&legal);
    let choice = choose_move(&belief, &req, &policy, &mut oracle, &mut rng).unwrap();
    assert_eq!(choice.mv, mv("c2c4"));

    let expected = Limit::Time(policy.query_time(20, req.time_remaining));
    let timed: Vec<_> = oracle.limits.iter().filter(|l| matches!(l, Limit::Time(_))).collect();
    assert_eq!(timed.len(), 20);
    assert!(timed.iter().all(|l| **l == expected));
}

#[test]
fn test_engine_failure_still_returns_legal_move() {
    let belief = black_reply_belief();
    let legal = legal_moves(&Position::startpos());
    let mut oracle = Scripted::failing();
    let mut rng = StdRng::seed_from_u64(4);
    let choice = choose_move(&belief, &request(&legal), &SamplingPolicy::default(), &mut oracle, &mut rng)
        .unwrap();
    assert_eq!(choice.source, ChoiceSource::Random);
    assert!(legal.contains(&choice.mv));
}

#[test]
fn test_illegal_engine_moves_do_not_vote() {
    let belief = black_reply_belief();
    let legal = vec![mv("a2a3"), mv("h2h3")];
    let mut oracle = Scripted::new(|_, _, _| Ok(vec![line(1, "e2e4", Score::Mate(1))]));
    let mut rng = StdRng::seed_from_u64(5);
    let choice = choose_move(&belief, &request(&legal), &SamplingPolicy::default(), &mut oracle, &mut rng)
        .unwrap();
    assert_eq!(choice.source, ChoiceSource::Random);
    assert!(legal.contains(&choice.mv));
}

#[test]
fn test_tally_ties_go_to_first_vote() {
    let mut tally = Tally::default();
    tally.add(mv("e2e4"), 2);
    tally.add(mv("d2d4"), 3);
    tally.add(mv("e2e4"), 1);
    assert_eq!(tally.winner(), Some(mv("e2e4")));
    tally.add(mv("d2d4"), 1);
    assert_eq!(tally.winner(), Some(mv("d2d4")));
    assert_eq!(Tally::default().winner(), None);
}

#[test]
fn test_sample_prefers_known_king_members() {
    let mut positions = Vec::new();
    for king in ["e8", "d8"] {
        for file in "abcdefgh".chars() {
            let mut pos = Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
            pos.set_piece(coord_to_sq(king).unwrap(), Some(chess_core::Piece::new(Color::Black, PieceKind::King)));
            let pawn = coord_to_sq(&format!("{file}7")).unwrap();
            pos.set_piece(pawn, Some(chess_core::Piece::new(Color::Black, PieceKind::Pawn)));
            positions.push(pos);
        }
    }
    // Black to move: never sampled for White.
    positions.push(Position::startpos().null_move());
    let belief = BeliefSet::try_from_positions(positions).unwrap();
    let e8 = coord_to_sq("e8").unwrap();

    let policy = SamplingPolicy {
        max_sampled_boards: 5,
        ..SamplingPolicy::default()
    };
    let legal: Vec<Move> = Vec::new();
    let req = MoveRequest {
        opponent_king_hint: Some(e8),
        ..request(&legal)
    };
    let mut rng = StdRng::seed_from_u64(6);
    let sample = sample_members(&belief, &req, &policy, &mut rng);
    assert_eq!(sample.len(), 5);
    let known = sample
        .iter()
        .filter(|p| p.king_sq(Color::Black) == Some(e8))
        .count();
    assert_eq!(known, 3);
    assert!(sample.iter().all(|p| p.side_to_move == Color::White));

    let unhinted = sample_members(&belief, &request(&legal), &policy, &mut rng);
    assert_eq!(unhinted.len(), 5);
}

/// White to move, Black king on e8 and a Black knight on each square of
/// ranks 3 to 6.
fn known_king_belief() -> BeliefSet {
    let mut positions = Vec::new();
    for knight in 16u8..48 {
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        pos.set_piece(knight, Some(chess_core::Piece::new(Color::Black, PieceKind::Knight)));
        positions.push(pos);
    }
    BeliefSet::try_from_positions(positions).unwrap()
}

#[test]
fn test_sample_takes_every_member_under_cap() {
    let belief = known_king_belief();
    let legal: Vec<Move> = Vec::new();
    let req = MoveRequest {
        opponent_king_hint: coord_to_sq("e8"),
        ..request(&legal)
    };
    let mut rng = StdRng::seed_from_u64(2);
    let sample = sample_members(&belief, &req, &SamplingPolicy::default(), &mut rng);
    assert_eq!(sample.len(), belief.len());
}

#[test]
fn test_sample_fills_cap_from_known_king_members() {
    let belief = known_king_belief();
    let legal: Vec<Move> = Vec::new();
    let req = MoveRequest {
        opponent_king_hint: coord_to_sq("e8"),
        ..request(&legal)
    };
    let policy = SamplingPolicy {
        max_sampled_boards: 10,
        ..SamplingPolicy::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let sample = sample_members(&belief, &req, &policy, &mut rng);
    assert_eq!(sample.len(), 10);
    let mut keys: Vec<u64> = sample.iter().map(|p| p.zobrist_key()).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 10);
}

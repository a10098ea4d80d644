//! One game's worth of agent state, driven by the harness callbacks.

use std::time::Duration;

use chess_core::{Color, Move, Piece, Position, move_to_uci, parse_uci_squares, sq_to_coord};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

use crate::belief::BeliefSet;
use crate::config::AgentConfig;
use crate::error::ReplayError;
use crate::filter::{self, FilterOutcome};
use crate::observation::{
    CaptureEvent, GameHistory, MoveOutcome, Observation, SenseObservation, WinReason,
};
use crate::occupancy::OccupancyMap;
use crate::oracle::Oracle;
use crate::selector::{self, MoveRequest};
use crate::sensing::{self, SenseContext};

/// The callbacks a reconnaissance-chess harness makes, in turn order.
pub trait Player {
    fn handle_game_start(&mut self, color: Color, board: &Position, opponent_name: &str);

    fn handle_opponent_move_result(&mut self, captured_my_piece: bool, capture_square: Option<u8>);

    fn choose_sense(
        &mut self,
        sense_actions: &[u8],
        move_actions: &[Move],
        seconds_left: Duration,
    ) -> Option<u8>;

    fn handle_sense_result(&mut self, sense_result: &[(u8, Option<Piece>)]);

    fn choose_move(&mut self, move_actions: &[Move], seconds_left: Duration) -> Option<Move>;

    fn handle_move_result(
        &mut self,
        requested_move: Option<Move>,
        taken_move: Option<Move>,
        captured_opponent_piece: bool,
        capture_square: Option<u8>,
    );

    fn handle_game_end(
        &mut self,
        winner: Option<Color>,
        reason: Option<WinReason>,
        history: &GameHistory,
    );
}

/// Belief set plus the bookkeeping that decides how observations apply to it.
#[derive(Debug, Clone)]
pub struct BeliefTracker {
    color: Color,
    belief: BeliefSet,
    occupancy: OccupancyMap,
    own_moves: u32,
    last_capture_square: Option<u8>,
    opponent_king_hint: Option<u8>,
}

/// One replayed observation and its effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep {
    pub index: usize,
    pub observation: Observation,
    /// `None` when the observation carried no information to filter on.
    pub outcome: Option<FilterOutcome>,
    pub members: usize,
}

impl BeliefTracker {
    pub fn new(color: Color, start: Position) -> Self {
        let belief = BeliefSet::single(start);
        let occupancy = OccupancyMap::recompute(&belief, color.other());
        Self {
            color,
            belief,
            occupancy,
            own_moves: 0,
            last_capture_square: None,
            opponent_king_hint: None,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn belief(&self) -> &BeliefSet {
        &self.belief
    }

    pub fn occupancy(&self) -> &OccupancyMap {
        &self.occupancy
    }

    /// Own moves completed so far.
    pub fn own_moves(&self) -> u32 {
        self.own_moves
    }

    pub fn opponent_king_hint(&self) -> Option<u8> {
        self.opponent_king_hint
    }

    pub fn sense_context(&self) -> SenseContext {
        SenseContext {
            color: self.color,
            ply: self.own_moves,
            last_capture_square: self.last_capture_square,
        }
    }

    /// Apply one observation. Returns `None` when it was skipped.
    pub fn apply(&mut self, observation: &Observation) -> Option<FilterOutcome> {
        let outcome = match observation {
            Observation::OpponentMove(event) => self.on_opponent_move(*event)?,
            Observation::Sense(sense) => self.on_sense(sense),
            Observation::OwnMove(outcome) => self.on_own_move(outcome),
        };
        self.occupancy = OccupancyMap::recompute(&self.belief, self.color.other());
        log_outcome(observation, outcome, self.belief.len());
        Some(outcome)
    }

    fn on_opponent_move(&mut self, event: CaptureEvent) -> Option<FilterOutcome> {
        self.last_capture_square = event.capture_square();
        // White's first turn has no opponent move before it.
        if self.color == Color::White && self.own_moves == 0 {
            return None;
        }
        Some(filter::after_opponent_move(&mut self.belief, self.color, event))
    }

    fn on_sense(&mut self, sense: &SenseObservation) -> FilterOutcome {
        let opponent = self.color.other();
        if let Some(king) = sense.king_square(opponent) {
            self.opponent_king_hint = Some(king);
        } else if let Some(hint) = self.opponent_king_hint
            && sense.squares.iter().any(|(sq, _)| *sq == hint)
        {
            self.opponent_king_hint = None;
        }
        filter::after_sense(&mut self.belief, self.color, sense)
    }

    fn on_own_move(&mut self, outcome: &MoveOutcome) -> FilterOutcome {
        self.own_moves += 1;
        filter::after_own_move(&mut self.belief, self.color, outcome)
    }

    /// Rebuild a tracker by replaying `history` from its start position.
    pub fn replay(history: &GameHistory) -> Result<(Self, Vec<ReplayStep>), ReplayError> {
        let start = Position::from_fen(&history.start_fen)?;
        let mut tracker = Self::new(history.color, start);
        let steps = history
            .events
            .iter()
            .enumerate()
            .map(|(index, observation)| {
                let outcome = tracker.apply(observation);
                ReplayStep {
                    index,
                    observation: observation.clone(),
                    outcome,
                    members: tracker.belief.len(),
                }
            })
            .collect();
        Ok((tracker, steps))
    }
}

fn log_outcome(observation: &Observation, outcome: FilterOutcome, members: usize) {
    let kind = match observation {
        Observation::OpponentMove(_) => "opponent_move",
        Observation::Sense(_) => "sense",
        Observation::OwnMove(_) => "own_move",
    };
    match outcome {
        FilterOutcome::Updated { before, after } => event!(
            target: "recon_agent::belief",
            Level::DEBUG,
            kind,
            before,
            after,
            "belief updated"
        ),
        FilterOutcome::Reverted { before } => event!(
            target: "recon_agent::belief",
            Level::WARN,
            kind,
            before,
            "no member explains the opponent move; keeping previous belief"
        ),
        FilterOutcome::Reseeded { before } => event!(
            target: "recon_agent::belief",
            Level::WARN,
            kind,
            before,
            members,
            "belief emptied; reseeded from the start position"
        ),
    }
}

/// The agent for one game at a time: belief tracking, sensing and move
/// selection over an engine `O`.
pub struct Session<O: Oracle> {
    config: AgentConfig,
    book_move: Option<Move>,
    oracle: O,
    rng: StdRng,
    tracker: BeliefTracker,
    history: GameHistory,
}

impl<O: Oracle> Session<O> {
    /// Seeded from `config.seed`, or from entropy when unset.
    pub fn new(config: AgentConfig, oracle: O) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, oracle, rng)
    }

    pub fn with_rng(config: AgentConfig, oracle: O, rng: StdRng) -> Self {
        let book_move = config.opening_move.as_deref().and_then(parse_uci_squares);
        let start = Position::startpos();
        Self {
            history: GameHistory::new(Color::White, start.to_fen()),
            tracker: BeliefTracker::new(Color::White, start),
            config,
            book_move,
            oracle,
            rng,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tracker(&self) -> &BeliefTracker {
        &self.tracker
    }

    pub fn belief(&self) -> &BeliefSet {
        self.tracker.belief()
    }

    /// Everything observed in the current game so far.
    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Replace the current state with the one `history` leads to.
    pub fn replay(&mut self, history: &GameHistory) -> Result<Vec<ReplayStep>, ReplayError> {
        let (tracker, steps) = BeliefTracker::replay(history)?;
        self.tracker = tracker;
        self.history = history.clone();
        event!(
            target: "recon_agent::session",
            Level::INFO,
            events = steps.len(),
            members = self.tracker.belief().len(),
            "history replayed"
        );
        Ok(steps)
    }

    fn record(&mut self, observation: Observation) {
        self.tracker.apply(&observation);
        self.history.push(observation);
    }
}

impl<O: Oracle> Player for Session<O> {
    fn handle_game_start(&mut self, color: Color, board: &Position, opponent_name: &str) {
        self.tracker = BeliefTracker::new(color, board.clone());
        self.history = GameHistory::new(color, board.to_fen());
        self.history.opponent = Some(opponent_name.to_string());
        if let Err(err) = self.oracle.ensure_running() {
            event!(
                target: "recon_agent::session",
                Level::WARN,
                error = %err,
                "engine unavailable at game start"
            );
        }
        event!(
            target: "recon_agent::session",
            Level::INFO,
            color = ?color,
            opponent = opponent_name,
            "game started"
        );
    }

    fn handle_opponent_move_result(&mut self, captured_my_piece: bool, capture_square: Option<u8>) {
        self.record(Observation::OpponentMove(CaptureEvent {
            occurred: captured_my_piece,
            square: capture_square,
        }));
    }

    fn choose_sense(
        &mut self,
        sense_actions: &[u8],
        _move_actions: &[Move],
        _seconds_left: Duration,
    ) -> Option<u8> {
        let ctx = self.tracker.sense_context();
        let choice = sensing::choose_sense(
            sense_actions,
            self.tracker.belief(),
            self.tracker.occupancy(),
            &ctx,
            &self.config.sensing,
            &mut self.rng,
        );
        event!(
            target: "recon_agent::session",
            Level::DEBUG,
            square = ?choice.map(sq_to_coord),
            members = self.tracker.belief().len(),
            "sense chosen"
        );
        choice
    }

    fn handle_sense_result(&mut self, sense_result: &[(u8, Option<Piece>)]) {
        self.record(Observation::Sense(SenseObservation::new(sense_result.to_vec())));
    }

    fn choose_move(&mut self, move_actions: &[Move], seconds_left: Duration) -> Option<Move> {
        let first_white_move = self.tracker.color() == Color::White && self.tracker.own_moves() == 0;
        let request = MoveRequest {
            color: self.tracker.color(),
            legal_moves: move_actions,
            time_remaining: seconds_left,
            opponent_king_hint: self.tracker.opponent_king_hint(),
            book_move: self.book_move.filter(|_| first_white_move),
        };
        let choice = selector::choose_move(
            self.tracker.belief(),
            &request,
            &self.config.sampling,
            &mut self.oracle,
            &mut self.rng,
        )?;
        event!(
            target: "recon_agent::session",
            Level::INFO,
            mv = %move_to_uci(choice.mv),
            source = ?choice.source,
            members = self.tracker.belief().len(),
            "move chosen"
        );
        Some(choice.mv)
    }

    fn handle_move_result(
        &mut self,
        requested_move: Option<Move>,
        taken_move: Option<Move>,
        captured_opponent_piece: bool,
        capture_square: Option<u8>,
    ) {
        self.record(Observation::OwnMove(MoveOutcome {
            requested: requested_move,
            taken: taken_move,
            captured_opponent_piece,
            capture_square,
        }));
    }

    fn handle_game_end(
        &mut self,
        winner: Option<Color>,
        reason: Option<WinReason>,
        history: &GameHistory,
    ) {
        self.history.winner = winner;
        self.history.reason = reason;
        event!(
            target: "recon_agent::session",
            Level::INFO,
            winner = ?winner,
            reason = ?reason,
            won = winner == Some(self.tracker.color()),
            harness_events = history.events.len(),
            members = self.tracker.belief().len(),
            "game over"
        );
        self.oracle.shutdown();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;

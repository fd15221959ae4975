//! One game at a time between humans and/or the engine.
//!
//! A [`Session`] owns the [`Game`], the clock and the running ratings. The
//! front end feeds it human moves and, when the engine is to move, lends it
//! a [`SearchOracle`]. Every call returns the [`GameEvent`]s it caused.

use crate::clock::GameClock;
use crate::config::PlayConfig;
use crate::difficulty::Difficulty;
use crate::events::{end_message, GameEvent, GameSummary};
use crate::rating::{Ratings, Score, Statistics};
use chess_core::{Color, Move, PieceKind, Square};
use chess_engine::notation::numbered_move_list;
use chess_engine::rules::{DrawReason, GameOutcome};
use chess_engine::{AppliedMove, Game, GameError, IllegalMoveError, UndoError};
use chess_oracle::{OracleError, RepetitionGuard, SearchOracle};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Who moves for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    Human,
    Engine(Difficulty),
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Human => f.write_str("human"),
            Player::Engine(difficulty) => write!(f, "engine ({})", difficulty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    HumanVsHuman,
    /// The human plays `human`; the engine plays the other colour.
    HumanVsAi {
        human: Color,
        difficulty: Difficulty,
    },
    /// Two engine players, each with its own level.
    AiVsAi {
        white: Difficulty,
        black: Difficulty,
    },
}

impl GameMode {
    pub fn player(self, color: Color) -> Player {
        match self {
            GameMode::HumanVsHuman => Player::Human,
            GameMode::HumanVsAi { human, .. } if human == color => Player::Human,
            GameMode::HumanVsAi { difficulty, .. } => Player::Engine(difficulty),
            GameMode::AiVsAi { white, .. } if color == Color::White => Player::Engine(white),
            GameMode::AiVsAi { black, .. } => Player::Engine(black),
        }
    }

    /// The human's colour in a game against the engine.
    pub fn human_color(self) -> Option<Color> {
        match self {
            GameMode::HumanVsAi { human, .. } => Some(human),
            _ => None,
        }
    }

    pub fn is_engine_only(self) -> bool {
        matches!(self, GameMode::AiVsAi { .. })
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    IllegalMove(#[from] IllegalMoveError),

    #[error(transparent)]
    Undo(#[from] UndoError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("it is the engine's turn to move")]
    EngineToMove,

    #[error("it is not the engine's turn to move")]
    HumanToMove,

    #[error("moves cannot be taken back when two engines play")]
    UndoUnavailable,

    #[error("the engine found no move in a position that has legal moves")]
    NoEngineMove,

    #[error("engine error: {0}")]
    Oracle(#[from] OracleError),
}

pub struct Session {
    game: Game,
    mode: GameMode,
    clock: GameClock,
    clock_seconds: u64,
    ratings: Ratings,
    statistics: Statistics,
    guard: RepetitionGuard,
    ai_move_delay: Duration,
    status: Option<String>,
}

impl Session {
    pub fn new(mode: GameMode, config: &PlayConfig) -> Self {
        Self::with_game(mode, Game::new(), config)
    }

    /// Starts from an arbitrary position.
    pub fn from_fen(mode: GameMode, fen: &str, config: &PlayConfig) -> Result<Self, SessionError> {
        Ok(Self::with_game(mode, Game::from_fen(fen)?, config))
    }

    fn with_game(mode: GameMode, game: Game, config: &PlayConfig) -> Self {
        Session {
            game,
            mode,
            clock: GameClock::new(config.clock_seconds),
            clock_seconds: config.clock_seconds,
            ratings: config.ratings,
            statistics: Statistics::default(),
            guard: RepetitionGuard::new(),
            ai_move_delay: config.ai_move_delay(),
            status: None,
        }
    }

    /// Replaces the clock, e.g. with a faster tick.
    pub fn with_clock(mut self, clock: GameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the repetition guard, e.g. with a seeded one.
    pub fn with_guard(mut self, guard: RepetitionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn ratings(&self) -> Ratings {
        self.ratings
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Latest message for the status line: the end of game sentence or an
    /// engine problem.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn ai_move_delay(&self) -> Duration {
        self.ai_move_delay
    }

    pub fn player_to_move(&self) -> Player {
        self.mode.player(self.game.side_to_move())
    }

    pub fn is_engine_turn(&self) -> bool {
        !self.game.is_over() && matches!(self.player_to_move(), Player::Engine(_))
    }

    /// Plays a human move.
    ///
    /// A pawn move to the last rank without a promotion piece changes
    /// nothing and returns [`GameEvent::PromotionRequested`]; submit it
    /// again with the chosen piece.
    pub fn submit_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Vec<GameEvent>, SessionError> {
        if self.game.is_over() {
            return Err(IllegalMoveError::GameOver.into());
        }
        if let Player::Engine(_) = self.player_to_move() {
            return Err(SessionError::EngineToMove);
        }
        let m = match promotion {
            Some(kind) => Move::with_promotion(from, to, kind),
            None if self.game.needs_promotion(from, to) => {
                return Ok(vec![GameEvent::PromotionRequested {
                    color: self.game.side_to_move(),
                    from,
                    to,
                }]);
            }
            None => Move::new(from, to),
        };
        let applied = self.game.apply_move(m)?;
        self.status = None;
        Ok(self.commit(applied))
    }

    /// [`submit_move`](Self::submit_move) for a UCI token such as `e7e8q`.
    pub fn submit_uci(&mut self, token: &str) -> Result<Vec<GameEvent>, SessionError> {
        let m = Move::from_uci(token)
            .ok_or_else(|| IllegalMoveError::InvalidUci(token.to_string()))?;
        self.submit_move(m.from(), m.to(), m.promotion())
    }

    /// Asks the engine for its move and plays it.
    ///
    /// The side's clock keeps running while the engine thinks. If the flag
    /// falls first the game ends on time and the engine's answer, whenever
    /// it comes, is thrown away by the oracle. Engine failures end an
    /// engine-only game as a draw; otherwise they are returned so the
    /// caller can retry.
    pub async fn play_engine_move(
        &mut self,
        oracle: &mut SearchOracle,
    ) -> Result<Vec<GameEvent>, SessionError> {
        if self.game.is_over() {
            return Err(IllegalMoveError::GameOver.into());
        }
        let color = self.game.side_to_move();
        let Player::Engine(difficulty) = self.mode.player(color) else {
            return Err(SessionError::HumanToMove);
        };
        let depth = difficulty.depth(&self.ratings);
        tracing::debug!(%color, %difficulty, depth, "engine to move");

        let answer = tokio::select! {
            answer = oracle.request_move(self.game.position(), depth) => answer,
            loser = self.clock.run_down(color) => {
                tracing::info!(%loser, "flag fell while the engine was thinking");
                return Ok(self.time_out(loser));
            }
        };

        let proposed = match answer {
            Ok(Some(m)) => m,
            Ok(None) => return self.engine_failed(SessionError::NoEngineMove),
            Err(e) => return self.engine_failed(e.into()),
        };

        let mut events = Vec::new();
        let mut m = proposed;
        if self.mode.is_engine_only() {
            let legal = self.game.legal_moves();
            m = self.guard.review(color, proposed, legal.as_slice());
            if m != proposed {
                events.push(GameEvent::MoveSubstituted {
                    color,
                    proposed: proposed.to_uci(),
                    played: m.to_uci(),
                });
            }
        }
        let reviewed = m;
        if m.promotion().is_none() && self.game.needs_promotion(m.from(), m.to()) {
            m = m.promote_to(PieceKind::Queen);
        }

        match self.game.apply_move(m) {
            Ok(applied) => {
                tracing::debug!(mv = %m, label = %applied.label, "engine moved");
                if self.mode.is_engine_only() {
                    self.guard.record(color, reviewed);
                }
                events.extend(self.commit(applied));
                Ok(events)
            }
            Err(e) => {
                tracing::warn!(mv = %m, error = %e, "engine chose an illegal move");
                self.engine_failed(e.into())
            }
        }
    }

    /// Runs the clock of the side to move until the flag falls.
    ///
    /// Race this against waiting for a human move. Never completes once
    /// the game is over or when the clock is off.
    pub async fn run_clock(&mut self) -> Vec<GameEvent> {
        if self.game.is_over() {
            return std::future::pending().await;
        }
        let loser = self.clock.run_down(self.game.side_to_move()).await;
        self.time_out(loser)
    }

    /// Lets two engines play the game out, pausing before each move.
    pub async fn play_engines(
        &mut self,
        oracle: &mut SearchOracle,
        mut on_event: impl FnMut(&GameEvent),
    ) -> Result<GameSummary, SessionError> {
        if !self.mode.is_engine_only() {
            return Err(SessionError::HumanToMove);
        }
        let delay = self.ai_move_delay;
        while !self.game.is_over() {
            let events = tokio::select! {
                _ = tokio::time::sleep(delay) => self.play_engine_move(oracle).await?,
                events = self.run_clock() => events,
            };
            for event in &events {
                on_event(event);
            }
        }
        Ok(self.summary())
    }

    /// Takes back the last move, or the last two (the engine's reply and
    /// the human's move) against the engine.
    pub fn undo(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        if self.game.is_over() {
            return Err(UndoError::GameOver.into());
        }
        let plies = match self.mode {
            GameMode::AiVsAi { .. } => return Err(SessionError::UndoUnavailable),
            GameMode::HumanVsHuman => 1,
            GameMode::HumanVsAi { human, .. } => {
                if self.game.side_to_move() != human {
                    return Err(SessionError::EngineToMove);
                }
                2
            }
        };
        if self.game.ply_count() < plies {
            return Err(UndoError::NothingToUndo.into());
        }
        for _ in 0..plies {
            self.game.undo()?;
        }
        self.status = None;
        tracing::debug!(plies, "moves taken back");
        Ok(vec![self.board_changed()])
    }

    /// The human gives up (the side to move, when there is no single human).
    pub fn resign(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        let loser = self
            .mode
            .human_color()
            .unwrap_or_else(|| self.game.side_to_move());
        let outcome = self.game.resign(loser)?;
        Ok(vec![self.conclude(outcome)])
    }

    /// Starts over in `mode`, keeping ratings and statistics.
    pub fn new_game(&mut self, mode: GameMode) -> Vec<GameEvent> {
        self.game = Game::new();
        self.mode = mode;
        self.clock.reset(self.clock_seconds);
        self.guard.reset();
        self.status = None;
        tracing::info!(?mode, "new game");
        vec![self.board_changed()]
    }

    pub fn summary(&self) -> GameSummary {
        let outcome = self.game.outcome();
        GameSummary {
            white: self.mode.player(Color::White).to_string(),
            black: self.mode.player(Color::Black).to_string(),
            result: GameSummary::result_name(outcome),
            reason: outcome.map(|o| o.reason().to_string()),
            moves: self.game.history().iter().map(|e| e.mv.to_uci()).collect(),
            move_list: numbered_move_list(self.game.history()),
            final_fen: self.game.to_fen(),
            ratings: self.mode.human_color().map(|_| self.ratings),
        }
    }

    fn board_changed(&self) -> GameEvent {
        GameEvent::BoardChanged {
            fen: self.game.to_fen(),
            last_move: None,
            label: None,
        }
    }

    fn commit(&mut self, applied: AppliedMove) -> Vec<GameEvent> {
        let mut events = vec![GameEvent::BoardChanged {
            fen: self.game.to_fen(),
            last_move: Some(applied.mv.to_uci()),
            label: Some(applied.label),
        }];
        if let Some(piece) = applied.captured {
            events.push(GameEvent::CaptureOccurred { piece });
        }
        if applied.check {
            events.push(GameEvent::CheckDeclared {
                color: self.game.side_to_move(),
            });
        }
        if let Some(outcome) = applied.outcome {
            events.push(self.conclude(outcome));
        }
        events
    }

    fn time_out(&mut self, loser: Color) -> Vec<GameEvent> {
        match self.game.flag_fall(loser) {
            Ok(outcome) => vec![self.conclude(outcome)],
            Err(_) => Vec::new(),
        }
    }

    fn engine_failed(&mut self, error: SessionError) -> Result<Vec<GameEvent>, SessionError> {
        if self.mode.is_engine_only() {
            tracing::error!(%error, "engine failure ends the game");
            let outcome = self.game.declare_draw(DrawReason::OracleFailure)?;
            return Ok(vec![self.conclude(outcome)]);
        }
        tracing::warn!(%error, "engine failure");
        self.status = Some(format!("Engine error: {}", error));
        Err(error)
    }

    /// Records a finished game and builds its event.
    fn conclude(&mut self, outcome: GameOutcome) -> GameEvent {
        let human = self.mode.human_color();
        self.statistics.record(outcome, human);
        if let Some(color) = human {
            let change = self.ratings.record(Score::for_player(outcome, color));
            tracing::info!(
                change,
                player = self.ratings.player,
                ai = self.ratings.ai,
                "ratings updated"
            );
        }
        self.status = Some(end_message(outcome));
        tracing::info!(%outcome, plies = self.game.ply_count(), "game over");
        GameEvent::game_ended(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn config() -> PlayConfig {
        PlayConfig {
            clock_seconds: 0,
            ..PlayConfig::default()
        }
    }

    fn vs_engine() -> GameMode {
        GameMode::HumanVsAi {
            human: Color::White,
            difficulty: Difficulty::Regular,
        }
    }

    #[test]
    fn players_by_mode() {
        assert_eq!(GameMode::HumanVsHuman.player(Color::Black), Player::Human);
        assert_eq!(vs_engine().player(Color::White), Player::Human);
        assert_eq!(
            vs_engine().player(Color::Black),
            Player::Engine(Difficulty::Regular)
        );
        let engines = GameMode::AiVsAi {
            white: Difficulty::Noob,
            black: Difficulty::Magnus,
        };
        assert_eq!(engines.player(Color::White), Player::Engine(Difficulty::Noob));
        assert_eq!(engines.player(Color::Black), Player::Engine(Difficulty::Magnus));
        assert_eq!(engines.human_color(), None);
        assert_eq!(Player::Engine(Difficulty::Hard).to_string(), "engine (hard)");
    }

    #[test]
    fn human_move_reports_board_capture_and_check() {
        let mut session = Session::from_fen(
            GameMode::HumanVsHuman,
            "4k3/8/8/3p4/4Q3/8/8/4K3 w - - 0 1",
            &config(),
        )
        .unwrap();
        let events = session.submit_move(sq("e4"), sq("d5"), None).unwrap();
        assert!(matches!(
            &events[0],
            GameEvent::BoardChanged { last_move: Some(m), label: Some(l), .. }
                if m == "e4d5" && l == "Qxd5"
        ));
        assert!(events.iter().any(|e| matches!(e, GameEvent::CaptureOccurred { .. })));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::CheckDeclared { .. })));

        let events = session.submit_uci("e8e7").unwrap();
        assert_eq!(events.len(), 1);
        let events = session.submit_uci("d5d7").unwrap();
        assert!(events.contains(&GameEvent::CheckDeclared {
            color: Color::Black
        }));
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let mut session = Session::new(GameMode::HumanVsHuman, &config());
        let err = session.submit_uci("e2e5").unwrap_err();
        assert!(matches!(err, SessionError::IllegalMove(IllegalMoveError::NotLegal(_))));
        assert_eq!(session.game().ply_count(), 0);
        assert!(matches!(
            session.submit_uci("e2"),
            Err(SessionError::IllegalMove(IllegalMoveError::InvalidUci(_)))
        ));
    }

    #[test]
    fn promotion_is_requested_then_completed() {
        let mut session = Session::from_fen(
            GameMode::HumanVsHuman,
            "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1",
            &config(),
        )
        .unwrap();
        let events = session.submit_move(sq("a7"), sq("b8"), None).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::PromotionRequested {
                color: Color::White,
                from: sq("a7"),
                to: sq("b8"),
            }]
        );
        assert_eq!(session.game().ply_count(), 0);

        let events = session
            .submit_move(sq("a7"), sq("b8"), Some(PieceKind::Rook))
            .unwrap();
        assert!(matches!(
            &events[0],
            GameEvent::BoardChanged { label: Some(l), .. } if l == "axb8=R"
        ));
    }

    #[test]
    fn human_cannot_move_for_the_engine() {
        let mut session = Session::new(
            GameMode::HumanVsAi {
                human: Color::Black,
                difficulty: Difficulty::Easy,
            },
            &config(),
        );
        assert!(session.is_engine_turn());
        assert!(matches!(
            session.submit_uci("e2e4"),
            Err(SessionError::EngineToMove)
        ));
    }

    #[test]
    fn mate_against_engine_updates_ratings_and_statistics() {
        let mut session =
            Session::from_fen(vs_engine(), "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", &config())
                .unwrap();
        let events = session.submit_uci("a1a8").unwrap();
        assert!(events.contains(&GameEvent::game_ended(GameOutcome::Checkmate {
            winner: Color::White
        })));
        assert_eq!(session.ratings(), Ratings { player: 1216, ai: 1184 });
        assert_eq!(session.statistics().wins, 1);
        assert_eq!(session.status(), Some("Checkmate! White wins."));
        assert!(!session.is_engine_turn());

        let summary = session.summary();
        assert_eq!(summary.result, "white");
        assert_eq!(summary.reason.as_deref(), Some("checkmate"));
        assert_eq!(summary.moves, vec!["a1a8"]);
        assert_eq!(summary.move_list, vec!["1. Ra8"]);
        assert!(summary.ratings.is_some());
    }

    #[test]
    fn human_games_leave_ratings_alone() {
        let mut session = Session::new(GameMode::HumanVsHuman, &config());
        for token in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            session.submit_uci(token).unwrap();
        }
        assert_eq!(session.ratings(), Ratings::default());
        let stats = session.statistics();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.wins + stats.losses + stats.draws, 0);
        assert_eq!(session.summary().result, "black");
    }

    #[test]
    fn undo_takes_back_one_ply_between_humans() {
        let mut session = Session::new(GameMode::HumanVsHuman, &config());
        assert!(matches!(
            session.undo(),
            Err(SessionError::Undo(UndoError::NothingToUndo))
        ));
        session.submit_uci("e2e4").unwrap();
        session.submit_uci("e7e5").unwrap();
        let events = session.undo().unwrap();
        assert_eq!(session.game().ply_count(), 1);
        assert!(matches!(
            &events[0],
            GameEvent::BoardChanged { last_move: None, .. }
        ));
    }

    #[test]
    fn undo_waits_for_the_humans_turn() {
        let mut session = Session::from_fen(
            vs_engine(),
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            &config(),
        )
        .unwrap();
        session.submit_uci("e2e4").unwrap();
        assert!(matches!(session.undo(), Err(SessionError::EngineToMove)));
    }

    #[test]
    fn undo_is_refused_between_engines_and_after_the_end() {
        let mut engines = Session::new(
            GameMode::AiVsAi {
                white: Difficulty::Easy,
                black: Difficulty::Easy,
            },
            &config(),
        );
        assert!(matches!(engines.undo(), Err(SessionError::UndoUnavailable)));

        let mut session = Session::new(GameMode::HumanVsHuman, &config());
        session.submit_uci("e2e4").unwrap();
        session.resign().unwrap();
        assert!(matches!(
            session.undo(),
            Err(SessionError::Undo(UndoError::GameOver))
        ));
    }

    #[test]
    fn resigning_against_the_engine_is_a_loss() {
        let mut session = Session::new(vs_engine(), &config());
        let events = session.resign().unwrap();
        assert_eq!(
            events,
            vec![GameEvent::game_ended(GameOutcome::Resignation {
                winner: Color::Black
            })]
        );
        assert_eq!(session.statistics().losses, 1);
        assert!(session.ratings().player < 1200);
        assert!(matches!(session.resign(), Err(SessionError::Game(_))));
    }

    #[test]
    fn new_game_keeps_ratings() {
        let mut session = Session::new(vs_engine(), &config());
        session.resign().unwrap();
        let ratings = session.ratings();
        let events = session.new_game(GameMode::HumanVsHuman);
        assert_eq!(events.len(), 1);
        assert!(!session.game().is_over());
        assert_eq!(session.ratings(), ratings);
        assert_eq!(session.statistics().games_played, 1);
        assert_eq!(session.status(), None);
        assert_eq!(session.mode(), GameMode::HumanVsHuman);
    }

    #[tokio::test]
    async fn clock_flag_ends_a_human_game() {
        let mut session = Session::new(GameMode::HumanVsHuman, &config())
            .with_clock(GameClock::with_tick(2, Duration::from_millis(5)));
        let events = session.run_clock().await;
        assert_eq!(
            events,
            vec![GameEvent::game_ended(GameOutcome::Timeout {
                winner: Color::Black
            })]
        );
        assert_eq!(session.game().outcome().map(|o| o.reason()), Some("time forfeit"));
    }
}

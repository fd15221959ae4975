//! Full game management with history tracking.
//!
//! [`Game`] owns the canonical [`Position`], validates every move before it
//! touches anything, keeps a [`HistoryEntry`] per ply for undo and
//! repetition detection, and decides when the game is over.

use crate::movegen::{self, is_king_attacked, legal::has_legal_move, make_move, MoveList};
use crate::notation;
use crate::rules::{is_insufficient_material, DrawReason, GameOutcome};
use crate::{Bitboard, Position};
use chess_core::{Color, FenError, Move, MoveFlag, Piece, PieceKind, Square};
use thiserror::Error;

/// Why a move was rejected. The game is unchanged when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalMoveError {
    #[error("the game is already over")]
    GameOver,

    #[error("'{0}' is not a move in UCI notation")]
    InvalidUci(String),

    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("the piece on {square} belongs to {color}, who is not to move")]
    WrongColor { square: Square, color: Color },

    #[error("{0} is not a legal move")]
    NotLegal(Move),

    #[error("{0} reaches the last rank and needs a promotion piece")]
    PromotionRequired(Move),

    #[error("{0} has an invalid promotion piece")]
    InvalidPromotion(Move),
}

/// Why an undo was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UndoError {
    #[error("no move to take back")]
    NothingToUndo,

    #[error("the game is already over")]
    GameOver,
}

/// Errors from setting up or ending a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("expected exactly one {color} king, found {count}")]
    KingCount { color: Color, count: usize },

    #[error("{0} is in check but it is not their move")]
    OpponentInCheck(Color),

    #[error("the game has already ended")]
    GameAlreadyOver,
}

/// One played move, with the position it was played from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Position before the move.
    pub position_before: Position,
    /// The move as played.
    pub mv: Move,
    /// The piece that moved.
    pub piece: Piece,
    /// The piece captured, if any.
    pub captured: Option<Piece>,
    /// Which special rule the move used.
    pub flag: MoveFlag,
    /// Move-list label such as `Nf3` or `O-O`.
    pub label: String,
}

/// What happened when a move was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub flag: MoveFlag,
    pub label: String,
    /// True if the side now to move is in check.
    pub check: bool,
    /// Set when this move ended the game.
    pub outcome: Option<GameOutcome>,
}

/// A chess game in progress or finished.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    start_position: Position,
    history: Vec<HistoryEntry>,
    outcome: Option<GameOutcome>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        let position = Position::startpos();
        Game {
            start_position: position.clone(),
            position,
            history: Vec::new(),
            outcome: None,
        }
    }

    /// Creates a game from a custom starting position.
    ///
    /// Each side must have exactly one king and the side not to move must
    /// not be in check. A position that is already decided starts finished.
    pub fn from_position(position: Position) -> Result<Self, GameError> {
        for color in Color::ALL {
            let count = position.board.count(PieceKind::King, color);
            if count != 1 {
                return Err(GameError::KingCount { color, count });
            }
        }
        let waiting = position.side_to_move.opposite();
        if is_king_attacked(&position.board, waiting) {
            return Err(GameError::OpponentInCheck(waiting));
        }

        let mut game = Game {
            start_position: position.clone(),
            position,
            history: Vec::new(),
            outcome: None,
        };
        game.outcome = game.evaluate();
        Ok(game)
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Self::from_position(Position::from_fen(fen)?)
    }

    /// Returns a reference to the current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Returns the starting position.
    pub fn start_position(&self) -> &Position {
        &self.start_position
    }

    /// Returns the side to move.
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    /// Returns the played moves, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Returns the last move played, if any.
    pub fn last_move(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Returns the number of half-moves (plies) played.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Returns how the game ended, if it has.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Returns true if the game has ended.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        is_king_attacked(&self.position.board, self.position.side_to_move)
    }

    /// Returns the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// Legal destinations of the piece on `sq`; empty once the game is over.
    pub fn legal_destinations(&self, sq: Square) -> Bitboard {
        if self.is_over() {
            return Bitboard::EMPTY;
        }
        movegen::legal_destinations(&self.position, sq)
    }

    /// All legal moves for the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> MoveList {
        if self.is_over() {
            return MoveList::new();
        }
        movegen::legal_moves(&self.position)
    }

    /// Returns true if moving from `from` to `to` would promote a pawn.
    ///
    /// Lets a caller ask for the promotion piece before submitting the move.
    pub fn needs_promotion(&self, from: Square, to: Square) -> bool {
        self.position
            .piece_at(from)
            .is_some_and(|p| p.kind == PieceKind::Pawn && to.row() == p.color.promotion_row())
            && self.legal_destinations(from).contains(to)
    }

    /// Validates and plays a move.
    ///
    /// Every check runs before the position changes, so an error leaves the
    /// game exactly as it was.
    pub fn apply_move(&mut self, m: Move) -> Result<AppliedMove, IllegalMoveError> {
        if self.is_over() {
            return Err(IllegalMoveError::GameOver);
        }
        let piece = self
            .position
            .piece_at(m.from())
            .ok_or(IllegalMoveError::EmptySquare(m.from()))?;
        if piece.color != self.position.side_to_move {
            return Err(IllegalMoveError::WrongColor {
                square: m.from(),
                color: piece.color,
            });
        }
        if !movegen::legal_destinations(&self.position, m.from()).contains(m.to()) {
            return Err(IllegalMoveError::NotLegal(m));
        }

        let promotes = piece.kind == PieceKind::Pawn && m.to().row() == piece.color.promotion_row();
        match (promotes, m.promotion()) {
            (true, None) => return Err(IllegalMoveError::PromotionRequired(m)),
            (true, Some(kind)) if !kind.is_promotion_target() => {
                return Err(IllegalMoveError::InvalidPromotion(m))
            }
            (false, Some(_)) => return Err(IllegalMoveError::InvalidPromotion(m)),
            _ => {}
        }

        let made = make_move(&self.position, m);
        let label = notation::label(made.piece, m, made.flag, made.captured.is_some());
        let position_before = std::mem::replace(&mut self.position, made.position);
        self.history.push(HistoryEntry {
            position_before,
            mv: m,
            piece: made.piece,
            captured: made.captured,
            flag: made.flag,
            label: label.clone(),
        });

        self.outcome = self.evaluate();

        Ok(AppliedMove {
            mv: m,
            piece: made.piece,
            captured: made.captured,
            flag: made.flag,
            label,
            check: self.is_check(),
            outcome: self.outcome,
        })
    }

    /// Finds the legal move matching a UCI token and plays it.
    pub fn apply_uci(&mut self, uci: &str) -> Result<AppliedMove, IllegalMoveError> {
        let m = Move::from_uci(uci).ok_or_else(|| IllegalMoveError::InvalidUci(uci.to_string()))?;
        self.apply_move(m)
    }

    /// Checks the new side to move for the end of the game.
    ///
    /// Conditions are tried in a fixed order and the first match wins.
    fn evaluate(&self) -> Option<GameOutcome> {
        let position = &self.position;
        if !has_legal_move(position) {
            return Some(if self.is_check() {
                GameOutcome::Checkmate {
                    winner: position.side_to_move.opposite(),
                }
            } else {
                GameOutcome::Stalemate
            });
        }
        if position.halfmove_clock >= 100 {
            return Some(GameOutcome::Draw(DrawReason::FiftyMoveRule));
        }
        if self.repetition_count() >= 3 {
            return Some(GameOutcome::Draw(DrawReason::ThreefoldRepetition));
        }
        if is_insufficient_material(&position.board) {
            return Some(GameOutcome::Draw(DrawReason::InsufficientMaterial));
        }
        None
    }

    /// Counts how many times the current position has occurred, this one included.
    pub fn repetition_count(&self) -> usize {
        let key = self.position.repetition_key();
        1 + self
            .history
            .iter()
            .filter(|entry| entry.position_before.repetition_key() == key)
            .count()
    }

    /// Takes back the last move.
    pub fn undo(&mut self) -> Result<HistoryEntry, UndoError> {
        if self.is_over() {
            return Err(UndoError::GameOver);
        }
        let entry = self.history.pop().ok_or(UndoError::NothingToUndo)?;
        self.position = entry.position_before.clone();
        Ok(entry)
    }

    /// Ends the game with `loser` resigning.
    pub fn resign(&mut self, loser: Color) -> Result<GameOutcome, GameError> {
        self.finish(GameOutcome::Resignation {
            winner: loser.opposite(),
        })
    }

    /// Ends the game with `loser` out of time.
    pub fn flag_fall(&mut self, loser: Color) -> Result<GameOutcome, GameError> {
        self.finish(GameOutcome::Timeout {
            winner: loser.opposite(),
        })
    }

    /// Ends the game as a draw for a reason decided outside the rules,
    /// such as an engine that stopped answering.
    pub fn declare_draw(&mut self, reason: DrawReason) -> Result<GameOutcome, GameError> {
        self.finish(GameOutcome::Draw(reason))
    }

    fn finish(&mut self, outcome: GameOutcome) -> Result<GameOutcome, GameError> {
        if self.is_over() {
            return Err(GameError::GameAlreadyOver);
        }
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    /// Pieces captured by `color`, in the order they were taken.
    pub fn captured_by(&self, color: Color) -> Vec<Piece> {
        self.history
            .iter()
            .filter(|entry| entry.piece.color == color)
            .filter_map(|entry| entry.captured)
            .collect()
    }

    /// White's captured material minus Black's (pawn 1, minor 3, rook 5, queen 9).
    pub fn material_balance(&self) -> i32 {
        let value = |color: Color| -> i32 {
            self.captured_by(color)
                .iter()
                .map(|p| p.kind.value() as i32)
                .sum()
        };
        value(Color::White) - value(Color::Black)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(uci: &str) -> Move {
        Move::from_uci(uci).unwrap()
    }

    fn play(game: &mut Game, moves: &[&str]) {
        for uci in moves {
            game.apply_move(mv(uci)).unwrap();
        }
    }

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn new_game() {
        let game = Game::new();
        assert_eq!(game.ply_count(), 0);
        assert!(!game.is_over());
        assert!(!game.is_check());
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn apply_move_reports_effects() {
        let mut game = Game::new();
        let applied = game.apply_move(mv("e2e4")).unwrap();
        assert_eq!(applied.label, "e4");
        assert_eq!(applied.flag, MoveFlag::DoublePush);
        assert_eq!(applied.captured, None);
        assert!(!applied.check);
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn illegal_moves_leave_the_game_untouched() {
        let mut game = Game::new();
        let before = game.to_fen();
        assert_eq!(
            game.apply_move(mv("e2e5")),
            Err(IllegalMoveError::NotLegal(mv("e2e5")))
        );
        assert_eq!(
            game.apply_move(mv("e4e5")),
            Err(IllegalMoveError::EmptySquare(sq("e4")))
        );
        assert_eq!(
            game.apply_move(mv("e7e5")),
            Err(IllegalMoveError::WrongColor {
                square: sq("e7"),
                color: Color::Black
            })
        );
        assert_eq!(game.to_fen(), before);
        assert_eq!(game.ply_count(), 0);
    }

    #[test]
    fn apply_uci_rejects_garbage() {
        let mut game = Game::new();
        assert_eq!(
            game.apply_uci("e2"),
            Err(IllegalMoveError::InvalidUci("e2".to_string()))
        );
        assert_eq!(game.apply_uci("g1f3").map(|a| a.label), Ok("Nf3".to_string()));
    }

    #[test]
    fn checkmate_fools_mate() {
        let mut game = Game::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4"]);
        let applied = game.apply_move(mv("d8h4")).unwrap();
        assert!(applied.check);
        assert_eq!(
            applied.outcome,
            Some(GameOutcome::Checkmate {
                winner: Color::Black
            })
        );
        assert!(game.is_over());
        assert_eq!(game.apply_move(mv("a2a3")), Err(IllegalMoveError::GameOver));
    }

    #[test]
    fn stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.outcome(), Some(GameOutcome::Stalemate));
    }

    #[test]
    fn stalemate_reached_by_a_move() {
        let mut game = Game::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        let applied = game.apply_move(mv("f1f7")).unwrap();
        assert_eq!(applied.outcome, Some(GameOutcome::Stalemate));
        assert!(!applied.check);
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert!(game.legal_destinations(sq("e5")).contains(sq("d6")));

        let applied = game.apply_move(mv("e5d6")).unwrap();
        assert_eq!(applied.flag, MoveFlag::EnPassant);
        assert_eq!(
            applied.captured,
            Some(Piece::new(PieceKind::Pawn, Color::Black))
        );
        assert_eq!(game.position().piece_at(sq("d5")), None);
        assert_eq!(
            game.position().piece_at(sq("d6")),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
    }

    #[test]
    fn en_passant_expires_after_one_move() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "h7h6"]);
        assert!(!game.legal_destinations(sq("e5")).contains(sq("d6")));
    }

    #[test]
    fn threefold_repetition_on_the_third_occurrence() {
        let mut game = Game::new();
        play(
            &mut game,
            &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"],
        );
        assert_eq!(game.repetition_count(), 2);
        assert!(!game.is_over());

        let applied = game.apply_move(mv("f6g8")).unwrap();
        assert_eq!(game.repetition_count(), 3);
        assert_eq!(
            applied.outcome,
            Some(GameOutcome::Draw(DrawReason::ThreefoldRepetition))
        );
    }

    #[test]
    fn fifty_move_rule() {
        let mut game = Game::from_fen("8/8/8/8/8/8/8/R3K2k w Q - 99 1").unwrap();
        let applied = game.apply_move(mv("a1a2")).unwrap();
        assert_eq!(
            applied.outcome,
            Some(GameOutcome::Draw(DrawReason::FiftyMoveRule))
        );
    }

    #[test]
    fn checkmate_beats_the_fifty_move_rule() {
        let mut game = Game::from_fen("7k/8/6K1/8/8/8/8/R7 w - - 99 60").unwrap();
        let applied = game.apply_move(mv("a1a8")).unwrap();
        assert_eq!(
            applied.outcome,
            Some(GameOutcome::Checkmate {
                winner: Color::White
            })
        );
    }

    #[test]
    fn insufficient_material_after_capture() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/3q4/4K3 w - - 0 1").unwrap();
        let applied = game.apply_move(mv("e1d2")).unwrap();
        assert_eq!(
            applied.outcome,
            Some(GameOutcome::Draw(DrawReason::InsufficientMaterial))
        );
    }

    #[test]
    fn castling_right_never_returns() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        play(&mut game, &["h1h2", "e8d8", "h2h1", "d8e8"]);
        assert!(!game.position().castling.can_castle_kingside(Color::White));
        assert!(!game.legal_destinations(Square::E1).contains(Square::G1));
    }

    #[test]
    fn castling_moves_the_rook() {
        let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let applied = game.apply_move(mv("e1g1")).unwrap();
        assert_eq!(applied.label, "O-O");
        assert_eq!(game.to_fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");
    }

    #[test]
    fn promotion_needs_a_piece() {
        let mut game = Game::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(game.needs_promotion(sq("b7"), sq("b8")));
        assert_eq!(
            game.apply_move(mv("b7b8")),
            Err(IllegalMoveError::PromotionRequired(mv("b7b8")))
        );
        let king = Move::with_promotion(sq("b7"), sq("b8"), PieceKind::King);
        assert_eq!(
            game.apply_move(king),
            Err(IllegalMoveError::InvalidPromotion(king))
        );
        let applied = game.apply_move(mv("b7b8q")).unwrap();
        assert_eq!(applied.label, "b8=Q");
        assert!(applied.check);
        assert_eq!(
            game.position().piece_at(sq("b8")),
            Some(Piece::new(PieceKind::Queen, Color::White))
        );
    }

    #[test]
    fn promotion_piece_on_an_ordinary_move_is_rejected() {
        let mut game = Game::new();
        assert_eq!(
            game.apply_move(mv("e2e4q")),
            Err(IllegalMoveError::InvalidPromotion(mv("e2e4q")))
        );
    }

    #[test]
    fn undo_restores_the_previous_position() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "d7d5", "e4d5"]);
        let entry = game.undo().unwrap();
        assert_eq!(entry.label, "exd5");
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2"
        );
        assert!(game.captured_by(Color::White).is_empty());
        game.undo().unwrap();
        game.undo().unwrap();
        assert_eq!(game.undo(), Err(UndoError::NothingToUndo));
        assert_eq!(game.to_fen(), chess_core::Fen::STARTPOS);
    }

    #[test]
    fn undo_refused_after_game_over() {
        let mut game = Game::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(game.undo(), Err(UndoError::GameOver));
    }

    #[test]
    fn resign_and_timeout() {
        let mut game = Game::new();
        assert_eq!(
            game.resign(Color::White),
            Ok(GameOutcome::Resignation {
                winner: Color::Black
            })
        );
        assert_eq!(game.flag_fall(Color::Black), Err(GameError::GameAlreadyOver));

        let mut game = Game::new();
        assert_eq!(
            game.flag_fall(Color::Black),
            Ok(GameOutcome::Timeout {
                winner: Color::White
            })
        );
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn captured_pieces_and_balance() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a2"]);
        assert_eq!(
            game.captured_by(Color::White),
            vec![Piece::new(PieceKind::Pawn, Color::Black)]
        );
        assert_eq!(game.captured_by(Color::Black).len(), 2);
        assert_eq!(game.material_balance(), -1);
    }

    #[test]
    fn from_position_validates_kings() {
        assert_eq!(
            Game::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").unwrap_err(),
            GameError::KingCount {
                color: Color::Black,
                count: 0
            }
        );
        assert!(matches!(
            Game::from_fen("not a fen"),
            Err(GameError::Fen(_))
        ));
        assert_eq!(
            Game::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").map(|g| g.is_check()),
            Ok(true)
        );
        assert_eq!(
            Game::from_fen("4k3/8/8/8/8/8/8/4K2r b - - 0 1").unwrap_err(),
            GameError::OpponentInCheck(Color::White)
        );
    }
}

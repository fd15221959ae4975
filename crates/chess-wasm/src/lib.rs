//! WebAssembly bindings for the chess rules engine.
//!
//! The browser owns rendering, sounds and timers; this crate answers the
//! questions a board UI asks and keeps the game honest.
//!
//! # Usage
//!
//! ```javascript
//! import init, { Game } from 'chess-wasm';
//!
//! await init();
//!
//! const game = new Game();
//! game.legalDestinations("e2");            // ["e4", "e3"]
//!
//! if (game.needsPromotion("e7", "e8")) {
//!     // ask the player, then
//!     game.applyMove("e7", "e8", "q");
//! }
//! const info = game.applyMove("e2", "e4"); // { uci, label, captured, check, ... }
//! console.log(game.status().message);
//! ```

use chess_core::{Color, Move, PieceKind, Square};
use chess_engine::notation::numbered_move_list;
use chess_engine::{AppliedMove, IllegalMoveError};
use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

fn js_error(e: impl Display) -> JsError {
    JsError::new(&e.to_string())
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn parse_color(color: &str) -> Option<Color> {
    match color {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}

/// What happened on one move, handed to JavaScript as a plain object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInfo {
    pub uci: String,
    pub label: String,
    /// FEN letter of the captured piece, e.g. "n".
    pub captured: Option<String>,
    pub castled: bool,
    pub check: bool,
    pub game_over: bool,
}

impl From<&AppliedMove> for MoveInfo {
    fn from(applied: &AppliedMove) -> Self {
        MoveInfo {
            uci: applied.mv.to_uci(),
            label: applied.label.clone(),
            captured: applied.captured.map(|p| p.to_fen_char().to_string()),
            castled: applied.flag.is_castling(),
            check: applied.check,
            game_over: applied.outcome.is_some(),
        }
    }
}

/// Status line data for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub side_to_move: &'static str,
    pub check: bool,
    pub over: bool,
    /// "white", "black", or null for a draw or a game in progress.
    pub winner: Option<&'static str>,
    pub reason: Option<&'static str>,
    pub message: String,
}

/// A chess game that can be manipulated from JavaScript.
#[wasm_bindgen]
pub struct Game {
    game: chess_engine::Game,
}

#[wasm_bindgen]
impl Game {
    /// Creates a new game with the standard starting position.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Game {
            game: chess_engine::Game::new(),
        }
    }

    /// Creates a game from a FEN string.
    ///
    /// Returns an error if the FEN is malformed or the position cannot be
    /// played (missing king, side not to move in check).
    #[wasm_bindgen(js_name = fromFen)]
    pub fn from_fen(fen: &str) -> Result<Game, JsError> {
        let game = chess_engine::Game::from_fen(fen).map_err(js_error)?;
        Ok(Game { game })
    }

    /// Returns the current position as a FEN string.
    #[wasm_bindgen(js_name = toFen)]
    pub fn to_fen(&self) -> String {
        self.game.to_fen()
    }

    /// Squares the piece on `square` may move to, for highlighting.
    ///
    /// Empty for an empty square, an opponent's piece, or a finished game.
    #[wasm_bindgen(js_name = legalDestinations)]
    pub fn legal_destinations(&self, square: &str) -> Vec<String> {
        let Some(sq) = Square::from_algebraic(square) else {
            return Vec::new();
        };
        self.game
            .legal_destinations(sq)
            .into_iter()
            .map(|to| to.to_algebraic())
            .collect()
    }

    /// Returns an array of legal moves in UCI format.
    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Vec<String> {
        self.game
            .legal_moves()
            .as_slice()
            .iter()
            .map(|m| m.to_uci())
            .collect()
    }

    /// True if moving `from` to `to` promotes, so the UI should ask for a piece.
    #[wasm_bindgen(js_name = needsPromotion)]
    pub fn needs_promotion(&self, from: &str, to: &str) -> bool {
        match (Square::from_algebraic(from), Square::from_algebraic(to)) {
            (Some(from), Some(to)) => self.game.needs_promotion(from, to),
            _ => false,
        }
    }

    /// Plays a move from square names and an optional promotion letter
    /// ("q", "r", "b", "n").
    ///
    /// Returns a [`MoveInfo`] object, or an error if the move is illegal.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<String>,
    ) -> Result<JsValue, JsError> {
        let from = Square::from_algebraic(from)
            .ok_or_else(|| JsError::new(&format!("Invalid square: {}", from)))?;
        let to = Square::from_algebraic(to)
            .ok_or_else(|| JsError::new(&format!("Invalid square: {}", to)))?;
        let m = match promotion.as_deref().and_then(|p| p.chars().next()) {
            Some(c) => {
                let kind = PieceKind::from_char(c)
                    .ok_or_else(|| JsError::new(&format!("Invalid promotion piece: {}", c)))?;
                Move::with_promotion(from, to, kind)
            }
            None => Move::new(from, to),
        };
        let info = self.play(m).map_err(js_error)?;
        serde_wasm_bindgen::to_value(&info).map_err(js_error)
    }

    /// Makes a move given in UCI format (e.g., "e2e4", "e7e8q").
    ///
    /// Returns a [`MoveInfo`] object, or an error if the move is invalid or illegal.
    #[wasm_bindgen(js_name = makeMove)]
    pub fn make_move(&mut self, uci: &str) -> Result<JsValue, JsError> {
        let m = Move::from_uci(uci)
            .ok_or_else(|| JsError::new(&format!("Invalid move format: {}", uci)))?;
        let info = self.play(m).map_err(js_error)?;
        serde_wasm_bindgen::to_value(&info).map_err(js_error)
    }

    /// Takes back the last move.
    pub fn undo(&mut self) -> Result<(), JsError> {
        self.game.undo().map(|_| ()).map_err(js_error)
    }

    /// The side to move gives up.
    pub fn resign(&mut self) -> Result<(), JsError> {
        let loser = self.game.side_to_move();
        self.game.resign(loser).map(|_| ()).map_err(js_error)
    }

    /// `color` ran out of time; the UI owns the clock.
    #[wasm_bindgen(js_name = flagFall)]
    pub fn flag_fall(&mut self, color: &str) -> Result<(), JsError> {
        let loser =
            parse_color(color).ok_or_else(|| JsError::new(&format!("Invalid color: {}", color)))?;
        self.game.flag_fall(loser).map(|_| ()).map_err(js_error)
    }

    /// Returns true if the current side to move is in check.
    #[wasm_bindgen(js_name = isCheck)]
    pub fn is_check(&self) -> bool {
        self.game.is_check()
    }

    /// Returns true if the game is over.
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.game.is_over()
    }

    /// Returns the game result if the game is over.
    ///
    /// Returns one of: "white_wins", "black_wins", "draw", or null if game is ongoing.
    #[wasm_bindgen]
    pub fn result(&self) -> Option<String> {
        self.game.outcome().map(|outcome| match outcome.winner() {
            Some(Color::White) => "white_wins".to_string(),
            Some(Color::Black) => "black_wins".to_string(),
            None => "draw".to_string(),
        })
    }

    /// Why the game ended, e.g. "checkmate" or "threefold repetition".
    #[wasm_bindgen]
    pub fn reason(&self) -> Option<String> {
        self.game.outcome().map(|outcome| outcome.reason().to_string())
    }

    /// Returns a [`GameStatus`] object.
    #[wasm_bindgen]
    pub fn status(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.status_info()).map_err(js_error)
    }

    /// Returns the side to move ("white" or "black").
    #[wasm_bindgen(js_name = sideToMove)]
    pub fn side_to_move(&self) -> String {
        color_name(self.game.side_to_move()).to_string()
    }

    /// Returns the piece at the given square in algebraic notation.
    ///
    /// Returns null if the square is empty.
    /// Returns a string like "P" (white pawn), "k" (black king), etc.
    #[wasm_bindgen(js_name = pieceAt)]
    pub fn piece_at(&self, square: &str) -> Option<String> {
        let sq = Square::from_algebraic(square)?;
        let piece = self.game.position().piece_at(sq)?;
        Some(piece.to_fen_char().to_string())
    }

    /// Pieces taken by `color` as FEN letters, e.g. "pnb".
    #[wasm_bindgen(js_name = capturedBy)]
    pub fn captured_by(&self, color: &str) -> String {
        parse_color(color)
            .map(|c| {
                self.game
                    .captured_by(c)
                    .iter()
                    .map(|p| p.to_fen_char())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// White's captured material minus Black's.
    #[wasm_bindgen(js_name = materialBalance)]
    pub fn material_balance(&self) -> i32 {
        self.game.material_balance()
    }

    /// Numbered move-list rows, e.g. "1. e4 e5".
    #[wasm_bindgen(js_name = moveList)]
    pub fn move_list(&self) -> Vec<String> {
        numbered_move_list(self.game.history())
    }

    /// UCI text of the last move, for highlighting.
    #[wasm_bindgen(js_name = lastMove)]
    pub fn last_move(&self) -> Option<String> {
        self.game.last_move().map(|entry| entry.mv.to_uci())
    }

    /// Resets the game to the starting position.
    pub fn reset(&mut self) {
        self.game = chess_engine::Game::new();
    }

    /// Converts a UCI move to its move-list label.
    ///
    /// Must be called before making the move since it needs the current position.
    #[wasm_bindgen(js_name = moveLabel)]
    pub fn move_label(&self, uci: &str) -> Result<String, JsError> {
        let m = Move::from_uci(uci)
            .ok_or_else(|| JsError::new(&format!("Invalid move format: {}", uci)))?;
        Ok(chess_engine::move_label(self.game.position(), m))
    }
}

impl Game {
    fn play(&mut self, m: Move) -> Result<MoveInfo, IllegalMoveError> {
        self.game.apply_move(m).map(|applied| MoveInfo::from(&applied))
    }

    fn status_info(&self) -> GameStatus {
        let outcome = self.game.outcome();
        let side = self.game.side_to_move();
        let message = match outcome {
            Some(outcome) => outcome.to_string(),
            None if self.game.is_check() => format!("{} to move, in check", side),
            None => format!("{} to move", side),
        };
        GameStatus {
            side_to_move: color_name(side),
            check: self.game.is_check(),
            over: outcome.is_some(),
            winner: outcome.and_then(|o| o.winner()).map(color_name),
            reason: outcome.map(|o| o.reason()),
            message,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialization function called when WASM module loads.
#[wasm_bindgen(start)]
pub fn init() {}

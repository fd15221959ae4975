//! What a session tells its front end.
//!
//! Events are plain values returned from each session call; a front end
//! renders them, plays sounds, or prints them as JSON lines. Nothing in
//! the session waits on a listener.

use chess_core::{Color, Piece, Square};
use chess_engine::rules::GameOutcome;
use serde::{Serialize, Serializer};

use crate::rating::Ratings;

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn serialize_color<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(color_name(*color))
}

fn serialize_winner<S: Serializer>(winner: &Option<Color>, serializer: S) -> Result<S::Ok, S::Error> {
    match winner {
        Some(color) => serializer.serialize_str(color_name(*color)),
        None => serializer.serialize_none(),
    }
}

fn serialize_piece<S: Serializer>(piece: &Piece, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_char(piece.to_fen_char())
}

fn serialize_square<S: Serializer>(square: &Square, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(square)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The position changed: a move was played or taken back.
    BoardChanged {
        fen: String,
        /// UCI text of the move just played; `None` after an undo.
        #[serde(rename = "move")]
        last_move: Option<String>,
        /// Move-list label such as `Nf3`.
        label: Option<String>,
    },
    CaptureOccurred {
        #[serde(serialize_with = "serialize_piece")]
        piece: Piece,
    },
    CheckDeclared {
        #[serde(serialize_with = "serialize_color")]
        color: Color,
    },
    /// A pawn reached the last rank; resubmit the move with a piece.
    PromotionRequested {
        #[serde(serialize_with = "serialize_color")]
        color: Color,
        #[serde(serialize_with = "serialize_square")]
        from: Square,
        #[serde(serialize_with = "serialize_square")]
        to: Square,
    },
    /// The engine's move was replaced to break a repetition loop.
    MoveSubstituted {
        #[serde(serialize_with = "serialize_color")]
        color: Color,
        proposed: String,
        played: String,
    },
    GameEnded {
        #[serde(serialize_with = "serialize_winner")]
        winner: Option<Color>,
        reason: String,
        message: String,
    },
}

impl GameEvent {
    pub fn game_ended(outcome: GameOutcome) -> Self {
        GameEvent::GameEnded {
            winner: outcome.winner(),
            reason: outcome.reason().to_string(),
            message: end_message(outcome),
        }
    }
}

/// Sentence shown when a game ends, e.g. "Checkmate! White wins."
pub fn end_message(outcome: GameOutcome) -> String {
    match outcome {
        GameOutcome::Checkmate { winner } => format!("Checkmate! {} wins.", winner),
        GameOutcome::Stalemate => "Stalemate! The game is a draw.".to_string(),
        GameOutcome::Draw(reason) => format!("Draw by {}.", reason),
        GameOutcome::Resignation { winner } => {
            format!("{} resigns. {} wins.", winner.opposite(), winner)
        }
        GameOutcome::Timeout { winner } => {
            format!("{} ran out of time. {} wins.", winner.opposite(), winner)
        }
    }
}

/// End-of-game record, written as JSON by the command line front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    /// Who played white, e.g. "human" or "engine (hard)".
    pub white: String,
    pub black: String,
    /// "white", "black", "draw", or "unfinished".
    pub result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Moves in UCI notation.
    pub moves: Vec<String>,
    /// Numbered move list, e.g. "1. e4 e5".
    pub move_list: Vec<String>,
    pub final_fen: String,
    /// Present for games between a human and the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Ratings>,
}

impl GameSummary {
    pub(crate) fn result_name(outcome: Option<GameOutcome>) -> &'static str {
        match outcome {
            None => "unfinished",
            Some(outcome) => match outcome.winner() {
                Some(winner) => color_name(winner),
                None => "draw",
            },
        }
    }
}

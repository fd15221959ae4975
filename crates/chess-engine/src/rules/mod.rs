//! End-of-game conditions.
//!
//! [`GameOutcome`] names every way a game can finish; the
//! [`material`] module holds the insufficient-material test used by
//! [`crate::Game`] when it evaluates a new position.

pub mod material;

pub use material::is_insufficient_material;

use chess_core::Color;
use std::fmt;

/// Reason for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    /// 100 half-moves without a pawn move or capture.
    FiftyMoveRule,
    /// The same position occurred three times.
    ThreefoldRepetition,
    /// Neither side has mating material.
    InsufficientMaterial,
    /// The search oracle could not supply a move in an engine-only game.
    OracleFailure,
}

impl DrawReason {
    /// Human-readable reason.
    pub const fn description(self) -> &'static str {
        match self {
            DrawReason::FiftyMoveRule => "fifty-move rule",
            DrawReason::ThreefoldRepetition => "threefold repetition",
            DrawReason::InsufficientMaterial => "insufficient material",
            DrawReason::OracleFailure => "engine failure",
        }
    }
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// How a finished game ended.
///
/// Once a [`crate::Game`] holds an outcome it accepts no further moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// The side to move is in check with no legal move.
    Checkmate { winner: Color },
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Drawn for the given reason.
    Draw(DrawReason),
    /// The loser resigned.
    Resignation { winner: Color },
    /// The loser's clock ran out.
    Timeout { winner: Color },
}

impl GameOutcome {
    /// Returns the winning side, or `None` for drawn games.
    pub const fn winner(self) -> Option<Color> {
        match self {
            GameOutcome::Checkmate { winner }
            | GameOutcome::Resignation { winner }
            | GameOutcome::Timeout { winner } => Some(winner),
            GameOutcome::Stalemate | GameOutcome::Draw(_) => None,
        }
    }

    /// Returns true for stalemate and every other draw.
    pub const fn is_draw(self) -> bool {
        self.winner().is_none()
    }

    /// Human-readable reason the game ended.
    pub const fn reason(self) -> &'static str {
        match self {
            GameOutcome::Checkmate { .. } => "checkmate",
            GameOutcome::Stalemate => "stalemate",
            GameOutcome::Draw(reason) => reason.description(),
            GameOutcome::Resignation { .. } => "resignation",
            GameOutcome::Timeout { .. } => "time forfeit",
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner() {
            Some(winner) => write!(f, "{} wins by {}", winner, self.reason()),
            None => write!(f, "draw by {}", self.reason()),
        }
    }
}

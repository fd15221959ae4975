//! Chess rules engine: move generation, legality and game state.
//!
//! This crate provides:
//! - [`Board`] and [`Position`] for the board and its side state
//! - [`movegen`] for pseudo-legal moves, attack detection and the legality filter
//! - [`Game`] for applying moves, undo and end-of-game detection
//! - [`notation`] for move-list labels
//!
//! # Example
//!
//! ```
//! use chess_core::{Color, Move};
//! use chess_engine::{Game, GameOutcome};
//!
//! let mut game = Game::new();
//! for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
//!     game.apply_move(Move::from_uci(uci).unwrap()).unwrap();
//! }
//! assert_eq!(game.outcome(), Some(GameOutcome::Checkmate { winner: Color::Black }));
//! ```

mod bitboard;
mod board;
mod game;
pub mod movegen;
pub mod notation;
mod position;
pub mod rules;

pub use bitboard::Bitboard;
pub use board::Board;
pub use game::{AppliedMove, Game, GameError, HistoryEntry, IllegalMoveError, UndoError};
pub use movegen::{
    is_king_attacked, is_square_attacked, legal_destinations, legal_moves, legal_moves_from,
    make_move, pseudo_moves, MoveList,
};
pub use notation::move_label;
pub use position::{CastlingRights, Position, RepetitionKey};
pub use rules::{DrawReason, GameOutcome};

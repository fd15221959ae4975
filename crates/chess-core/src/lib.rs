//! Core types for chess.
//!
//! This crate provides the fundamental types used across the workspace:
//! - [`Piece`], [`PieceKind`] and [`Color`] for piece representation
//! - [`Square`] for board coordinates (row 0 is rank 8)
//! - [`Move`] and [`MoveFlag`] for move representation
//! - [`Fen`] for strict FEN decoding and encoding

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{Fen, FenError};
pub use mov::{Move, MoveFlag};
pub use piece::{Piece, PieceKind};
pub use square::Square;

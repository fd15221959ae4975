//! FEN (Forsyth-Edwards Notation) records.
//!
//! [`Fen::parse`] checks every field strictly and decodes it into board
//! coordinates, so a caller never sees half-validated text. Parsing is pure:
//! on error nothing has been built.

use crate::{Color, Piece, Square};
use std::fmt;
use thiserror::Error;

/// Why a FEN string was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, got {0}")]
    FieldCount(usize),

    #[error("expected 8 ranks, got {0}")]
    RankCount(usize),

    #[error("unexpected '{found}' in rank {rank}")]
    UnknownSymbol { rank: u8, found: char },

    #[error("rank {rank} covers {squares} squares, expected 8")]
    RankWidth { rank: u8, squares: u32 },

    #[error("side to move must be 'w' or 'b', got '{0}'")]
    SideToMove(String),

    #[error("castling field must be '-' or distinct letters from KQkq, got '{0}'")]
    Castling(String),

    #[error("'{0}' is not an en passant target")]
    EnPassant(String),

    #[error("{field} must be a non-negative integer, got '{found}'")]
    Counter { field: &'static str, found: String },
}

/// A decoded FEN record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    /// Pieces by square index (row 0 is rank 8).
    pub placement: [Option<Piece>; 64],
    pub side_to_move: Color,
    /// Castling letters held, in [`Fen::CASTLING_LETTERS`] order.
    pub castling: [bool; 4],
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Fen {
    /// The standard starting position.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// White kingside, white queenside, black kingside, black queenside.
    pub const CASTLING_LETTERS: [char; 4] = ['K', 'Q', 'k', 'q'];

    pub fn parse(text: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [placement, side, castling, en_passant, halfmove, fullmove] = fields[..] else {
            return Err(FenError::FieldCount(fields.len()));
        };

        Ok(Fen {
            placement: parse_placement(placement)?,
            side_to_move: parse_side(side)?,
            castling: parse_castling(castling)?,
            en_passant: parse_en_passant(en_passant)?,
            halfmove_clock: parse_counter("halfmove clock", halfmove)?,
            fullmove_number: parse_counter("fullmove number", fullmove)?,
        })
    }

    fn write_placement(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, rank) in self.placement.chunks(8).enumerate() {
            if row > 0 {
                f.write_str("/")?;
            }
            let mut empty = 0;
            for square in rank {
                match square {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{}", empty)?;
                            empty = 0;
                        }
                        write!(f, "{}", piece.to_fen_char())?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{}", empty)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_placement(f)?;
        write!(f, " {} ", self.side_to_move.to_fen_char())?;

        if self.castling.iter().any(|&held| held) {
            for (letter, held) in Self::CASTLING_LETTERS.iter().zip(self.castling) {
                if held {
                    write!(f, "{}", letter)?;
                }
            }
        } else {
            f.write_str("-")?;
        }

        match self.en_passant {
            Some(sq) => write!(f, " {}", sq)?,
            None => f.write_str(" -")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}

impl Default for Fen {
    fn default() -> Self {
        let mut placement = [None; 64];
        let back = "rnbqkbnr";
        for (col, c) in back.chars().enumerate() {
            placement[col] = Piece::from_fen_char(c);
            placement[8 + col] = Piece::from_fen_char('p');
            placement[48 + col] = Piece::from_fen_char('P');
            placement[56 + col] = Piece::from_fen_char(c.to_ascii_uppercase());
        }
        Fen {
            placement,
            side_to_move: Color::White,
            castling: [true; 4],
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

fn parse_placement(field: &str) -> Result<[Option<Piece>; 64], FenError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }

    let mut placement = [None; 64];
    for (row, text) in ranks.into_iter().enumerate() {
        let rank = 8 - row as u8;
        let mut col = 0u32;
        for c in text.chars() {
            if ('1'..='8').contains(&c) {
                col += c as u32 - '0' as u32;
                continue;
            }
            let piece = Piece::from_fen_char(c).ok_or(FenError::UnknownSymbol { rank, found: c })?;
            if col < 8 {
                placement[row * 8 + col as usize] = Some(piece);
            }
            col += 1;
        }
        if col != 8 {
            return Err(FenError::RankWidth { rank, squares: col });
        }
    }
    Ok(placement)
}

fn parse_side(field: &str) -> Result<Color, FenError> {
    let mut chars = field.chars();
    match (chars.next().and_then(Color::from_fen_char), chars.next()) {
        (Some(color), None) => Ok(color),
        _ => Err(FenError::SideToMove(field.to_string())),
    }
}

fn parse_castling(field: &str) -> Result<[bool; 4], FenError> {
    let mut held = [false; 4];
    if field == "-" {
        return Ok(held);
    }
    for c in field.chars() {
        let slot = Fen::CASTLING_LETTERS
            .iter()
            .position(|&letter| letter == c)
            .ok_or_else(|| FenError::Castling(field.to_string()))?;
        if held[slot] {
            return Err(FenError::Castling(field.to_string()));
        }
        held[slot] = true;
    }
    Ok(held)
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    match Square::from_algebraic(field) {
        Some(sq) if matches!(sq.rank_char(), '3' | '6') => Ok(Some(sq)),
        _ => Err(FenError::EnPassant(field.to_string())),
    }
}

/// ASCII digits only: no sign, no blanks.
fn parse_counter(field: &'static str, text: &str) -> Result<u32, FenError> {
    let invalid = || FenError::Counter {
        field,
        found: text.to_string(),
    };
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}

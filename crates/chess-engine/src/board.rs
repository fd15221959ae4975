//! The 8×8 grid of pieces.

use chess_core::{Color, Piece, PieceKind, Square};
use std::fmt;

/// Piece placement on an 8×8 board.
///
/// Indexed by [`Square`]; row 0 is rank 8. The board owns its squares
/// outright and is cheap to copy, which is what the legality filter
/// relies on when it simulates a move.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Board {
    /// Creates a board with no pieces.
    pub const fn empty() -> Self {
        Board {
            squares: [None; 64],
        }
    }

    /// Returns the piece on the given square.
    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index() as usize]
    }

    /// Places a piece on (or clears) the given square.
    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index() as usize] = piece;
    }

    /// Removes and returns the piece on the given square.
    #[inline]
    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.index() as usize].take()
    }

    /// Returns true if no piece stands on the square.
    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// Returns the color of the piece on the square, if any.
    #[inline]
    pub fn color_at(&self, sq: Square) -> Option<Color> {
        self.get(sq).map(|p| p.color)
    }

    /// Returns true if the square holds the given kind of piece of the given color.
    #[inline]
    pub fn has(&self, sq: Square, kind: PieceKind, color: Color) -> bool {
        self.get(sq) == Some(Piece::new(kind, color))
    }

    /// Finds the king of the given color.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Some(Piece::new(PieceKind::King, color));
        Square::all().find(|&sq| self.get(sq) == king)
    }

    /// Iterates over occupied squares and their pieces, a8 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|p| (sq, p)))
    }

    /// Counts pieces of the given kind and color.
    pub fn count(&self, kind: PieceKind, color: Color) -> usize {
        self.pieces()
            .filter(|(_, p)| p.kind == kind && p.color == color)
            .count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        write!(f, "{}", self)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..8u8 {
            write!(f, "{} ", 8 - row)?;
            for col in 0..8u8 {
                let c = Square::new(row, col)
                    .and_then(|sq| self.get(sq))
                    .map_or('.', |p| p.to_fen_char());
                write!(f, "{} ", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

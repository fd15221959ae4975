//! Board square representation.

use std::fmt;

/// A square on the chess board.
///
/// Squares are addressed by `(row, col)` with row 0 holding rank 8 and
/// row 7 holding rank 1; col 0 is the a-file. The packed index is
/// `row * 8 + col`, so a8 = 0, h8 = 7, a1 = 56 and h1 = 63.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Creates a square from row and column, both 0-7.
    #[inline]
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if row < 8 && col < 8 {
            Some(Square(row * 8 + col))
        } else {
            None
        }
    }

    /// Creates a square from index (0-63).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Parses a square from algebraic notation (e.g., "e4").
    pub const fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if file < b'a' || file > b'h' || rank < b'1' || rank > b'8' {
            return None;
        }
        Square::new(b'8' - rank, file - b'a')
    }

    /// Returns the index (0-63).
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Returns the row (0 = rank 8).
    #[inline]
    pub const fn row(self) -> u8 {
        self.0 / 8
    }

    /// Returns the column (0 = file a).
    #[inline]
    pub const fn col(self) -> u8 {
        self.0 % 8
    }

    /// Returns the file letter.
    #[inline]
    pub const fn file_char(self) -> char {
        (b'a' + self.col()) as char
    }

    /// Returns the rank digit.
    #[inline]
    pub const fn rank_char(self) -> char {
        (b'8' - self.row()) as char
    }

    /// Returns the square displaced by the given row and column deltas,
    /// or `None` if it falls off the board.
    #[inline]
    pub const fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row() as i8 + d_row;
        let col = self.col() as i8 + d_col;
        if row < 0 || row > 7 || col < 0 || col > 7 {
            None
        } else {
            Some(Square((row * 8 + col) as u8))
        }
    }

    /// Returns true if this is a light square (a8 and h1 are light).
    #[inline]
    pub const fn is_light(self) -> bool {
        (self.row() + self.col()) % 2 == 0
    }

    /// Returns the algebraic notation for this square.
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    /// Returns a 64-bit mask with only this square set.
    #[inline]
    pub const fn bitboard(self) -> u64 {
        1u64 << self.0
    }

    /// Iterates over all 64 squares, a8 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }

    // Castling squares
    pub const A1: Square = Square(56);
    pub const B1: Square = Square(57);
    pub const C1: Square = Square(58);
    pub const D1: Square = Square(59);
    pub const E1: Square = Square(60);
    pub const F1: Square = Square(61);
    pub const G1: Square = Square(62);
    pub const H1: Square = Square(63);
    pub const A8: Square = Square(0);
    pub const B8: Square = Square(1);
    pub const C8: Square = Square(2);
    pub const D8: Square = Square(3);
    pub const E8: Square = Square(4);
    pub const F8: Square = Square(5);
    pub const G8: Square = Square(6);
    pub const H8: Square = Square(7);
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({})", self.to_algebraic())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_new() {
        let e4 = Square::new(4, 4).unwrap();
        assert_eq!(e4.row(), 4);
        assert_eq!(e4.col(), 4);
        assert_eq!(e4.index(), 36);
        assert_eq!(e4.to_algebraic(), "e4");
        assert_eq!(Square::new(8, 0), None);
        assert_eq!(Square::new(0, 8), None);
    }

    #[test]
    fn square_from_algebraic() {
        assert_eq!(Square::from_algebraic("a1"), Some(Square::A1));
        assert_eq!(Square::from_algebraic("a8"), Some(Square::A8));
        assert_eq!(Square::from_algebraic("e4"), Square::new(4, 4));
        assert_eq!(Square::from_algebraic("h8"), Some(Square::H8));
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic("a0"), None);
        assert_eq!(Square::from_algebraic("E4"), None);
        assert_eq!(Square::from_algebraic(""), None);
    }

    #[test]
    fn square_to_algebraic() {
        assert_eq!(Square::A1.to_algebraic(), "a1");
        assert_eq!(Square::H8.to_algebraic(), "h8");
        assert_eq!(Square::E1.to_algebraic(), "e1");
        assert_eq!(Square::C8.to_algebraic(), "c8");
    }

    #[test]
    fn algebraic_roundtrip_all_squares() {
        for sq in Square::all() {
            assert_eq!(Square::from_algebraic(&sq.to_algebraic()), Some(sq));
        }
    }

    #[test]
    fn offset_stays_on_board() {
        assert_eq!(Square::E1.offset(-1, 0), Square::from_algebraic("e2"));
        assert_eq!(Square::E1.offset(1, 0), None);
        assert_eq!(Square::A8.offset(0, -1), None);
        assert_eq!(Square::A8.offset(1, 1), Square::from_algebraic("b7"));
    }

    #[test]
    fn square_colors() {
        assert!(!Square::A1.is_light());
        assert!(Square::H1.is_light());
        assert!(Square::A8.is_light());
        assert!(!Square::H8.is_light());
    }

    #[test]
    fn square_bitboard() {
        assert_eq!(Square::A8.bitboard(), 1);
        assert_eq!(Square::H1.bitboard(), 1 << 63);
    }
}

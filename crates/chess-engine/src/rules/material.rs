//! Insufficient-material detection.

use crate::Board;
use chess_core::{Color, PieceKind};

/// Returns true if the material left on the board can never deliver mate.
///
/// Covers king against king, a single minor piece against a bare king, and
/// one bishop each when both bishops stand on the same square colour. Any
/// pawn, rook or queen means there is enough material. Other drawn endings
/// such as two knights against a bare king are deliberately not included.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut knights = [0usize; 2];
    let mut bishop_squares: [Vec<bool>; 2] = [Vec::new(), Vec::new()];

    for (sq, piece) in board.pieces() {
        match piece.kind {
            PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            PieceKind::Knight => knights[piece.color.index()] += 1,
            PieceKind::Bishop => bishop_squares[piece.color.index()].push(sq.is_light()),
            PieceKind::King => {}
        }
    }

    let minors = |color: Color| knights[color.index()] + bishop_squares[color.index()].len();
    let (white, black) = (minors(Color::White), minors(Color::Black));

    if white + black <= 1 {
        return true;
    }

    let [white_bishops, black_bishops] = &bishop_squares;
    knights == [0, 0]
        && white_bishops.len() == 1
        && black_bishops.len() == 1
        && white_bishops[0] == black_bishops[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn insufficient(fen: &str) -> bool {
        is_insufficient_material(&Position::from_fen(fen).unwrap().board)
    }

    #[test]
    fn bare_kings() {
        assert!(insufficient("8/8/8/8/8/8/8/4K2k w - - 0 1"));
    }

    #[test]
    fn single_minor_piece() {
        assert!(insufficient("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1"));
        assert!(insufficient("4k3/8/8/2n5/8/8/8/4K3 w - - 0 1"));
    }

    #[test]
    fn bishops_on_same_colour() {
        // c1 and f8 are both dark squares.
        assert!(insufficient("5b2/4k3/8/8/8/8/8/2B1K3 w - - 0 1"));
    }

    #[test]
    fn bishops_on_opposite_colours_can_still_mate() {
        // c1 is dark, c8 is light.
        assert!(!insufficient("2b5/4k3/8/8/8/8/8/2B1K3 w - - 0 1"));
    }

    #[test]
    fn two_knights_are_not_a_draw() {
        assert!(!insufficient("4k3/8/8/8/8/8/8/1N2K1N1 w - - 0 1"));
    }

    #[test]
    fn knight_against_bishop_is_not_a_draw() {
        assert!(!insufficient("4k3/8/8/2n5/8/8/8/2B1K3 w - - 0 1"));
    }

    #[test]
    fn heavy_pieces_and_pawns_are_sufficient() {
        assert!(!insufficient("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"));
        assert!(!insufficient("4k3/8/8/8/8/8/8/R3K3 w - - 0 1"));
        assert!(!insufficient("4k3/8/8/8/8/8/8/3QK3 w - - 0 1"));
    }
}

//! Attack detection by probing outward from the target square.
//!
//! Instead of generating every enemy move, each probe walks from the
//! attacked square along the pattern a given piece kind would use and looks
//! at what it finds.

use crate::Board;
use chess_core::{Color, PieceKind, Square};

/// Orthogonal ray directions as (row, col) deltas.
pub(crate) const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Diagonal ray directions as (row, col) deltas.
pub(crate) const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Knight jumps as (row, col) deltas.
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// King steps as (row, col) deltas.
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Returns the first occupied square along a ray, excluding `from` itself.
fn first_piece_on_ray(board: &Board, from: Square, (d_row, d_col): (i8, i8)) -> Option<Square> {
    let mut current = from.offset(d_row, d_col);
    while let Some(sq) = current {
        if !board.is_empty(sq) {
            return Some(sq);
        }
        current = sq.offset(d_row, d_col);
    }
    None
}

/// Returns true if any piece of `by_color` attacks `sq`.
///
/// The square itself may hold anything; only attack patterns count, so a
/// pawn push never attacks and castling is not considered.
pub fn is_square_attacked(board: &Board, sq: Square, by_color: Color) -> bool {
    // An attacking pawn sits one row behind the target from its own point of view.
    let pawn_row = -by_color.pawn_direction();
    for d_col in [-1, 1] {
        if let Some(from) = sq.offset(pawn_row, d_col) {
            if board.has(from, PieceKind::Pawn, by_color) {
                return true;
            }
        }
    }

    let hits = |offsets: &[(i8, i8)], kind: PieceKind| {
        offsets.iter().any(|&(d_row, d_col)| {
            sq.offset(d_row, d_col)
                .is_some_and(|from| board.has(from, kind, by_color))
        })
    };
    if hits(&KNIGHT_OFFSETS[..], PieceKind::Knight) {
        return true;
    }
    if hits(&KING_OFFSETS[..], PieceKind::King) {
        return true;
    }

    let slides = |directions: &[(i8, i8)], kind: PieceKind| {
        directions.iter().any(|&dir| {
            first_piece_on_ray(board, sq, dir).is_some_and(|from| {
                board.has(from, kind, by_color) || board.has(from, PieceKind::Queen, by_color)
            })
        })
    };
    slides(&ROOK_DIRECTIONS[..], PieceKind::Rook)
        || slides(&BISHOP_DIRECTIONS[..], PieceKind::Bishop)
}

/// Returns true if the king of the given color is attacked.
///
/// # Panics
///
/// Panics if the board has no king of that color. Every position reached
/// through play keeps both kings on the board.
pub fn is_king_attacked(board: &Board, king_color: Color) -> bool {
    let king_sq = board
        .king_square(king_color)
        .unwrap_or_else(|| panic!("no {} king on the board", king_color));
    is_square_attacked(board, king_sq, king_color.opposite())
}

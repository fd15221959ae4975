//! Legal move filtering and castling.

use super::{
    castling_rook_squares, is_king_attacked, is_square_attacked, make_move, pseudo_moves, MoveList,
};
use crate::{Bitboard, Position};
use chess_core::{Color, Move, MoveFlag, PieceKind, Square};

/// Returns the squares the piece on `sq` may legally move to.
///
/// Only pieces of the side to move have legal destinations. A promotion
/// square is reported once, whatever piece the pawn will become. Castling
/// shows up as the king's two-square destination.
pub fn legal_destinations(position: &Position, sq: Square) -> Bitboard {
    let Some(piece) = position.piece_at(sq) else {
        return Bitboard::EMPTY;
    };
    let us = position.side_to_move;
    if piece.color != us {
        return Bitboard::EMPTY;
    }

    let mut targets: Bitboard = pseudo_moves(position, sq)
        .into_iter()
        .filter(|&to| {
            let after = make_move(position, Move::new(sq, to));
            !is_king_attacked(&after.position.board, us)
        })
        .collect();

    if piece.kind == PieceKind::King {
        for flag in [MoveFlag::CastleKingside, MoveFlag::CastleQueenside] {
            if let Some(to) = castling_target(position, sq, flag) {
                targets.set(to);
            }
        }
    }

    targets
}

/// Returns the king destination for castling on the given side, if the
/// king standing on `king_sq` may castle there right now.
fn castling_target(position: &Position, king_sq: Square, flag: MoveFlag) -> Option<Square> {
    let us = position.side_to_move;
    let them = us.opposite();
    let home = Square::new(us.back_row(), 4)?;
    if king_sq != home {
        return None;
    }

    let has_right = match flag {
        MoveFlag::CastleKingside => position.castling.can_castle_kingside(us),
        _ => position.castling.can_castle_queenside(us),
    };
    if !has_right {
        return None;
    }

    let (rook_sq, _) = castling_rook_squares(us, flag)?;
    let board = &position.board;
    if !board.has(rook_sq, PieceKind::Rook, us) {
        return None;
    }

    let (low, high) = if rook_sq.col() < home.col() {
        (rook_sq.col() + 1, home.col())
    } else {
        (home.col() + 1, rook_sq.col())
    };
    let path_clear = (low..high)
        .filter_map(|col| Square::new(home.row(), col))
        .all(|s| board.is_empty(s));
    if !path_clear {
        return None;
    }

    if is_square_attacked(board, home, them) {
        return None;
    }

    // The king crosses one square and lands on the next; the b-file square
    // on the queen side only has to be empty.
    let step: i8 = if rook_sq.col() > home.col() { 1 } else { -1 };
    let passed = home.offset(0, step)?;
    let landing = home.offset(0, 2 * step)?;
    if is_square_attacked(board, passed, them) || is_square_attacked(board, landing, them) {
        return None;
    }

    Some(landing)
}

/// Returns the legal moves of the piece on `sq`.
///
/// A pawn reaching the last rank yields one move per promotion piece.
pub fn legal_moves_from(position: &Position, sq: Square) -> MoveList {
    let mut moves = MoveList::new();
    push_moves_from(position, sq, &mut moves);
    moves
}

/// Returns every legal move for the side to move.
pub fn legal_moves(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    for sq in Square::all() {
        if position.board.color_at(sq) == Some(position.side_to_move) {
            push_moves_from(position, sq, &mut moves);
        }
    }
    moves
}

/// Returns true if the side to move has at least one legal move.
pub fn has_legal_move(position: &Position) -> bool {
    Square::all().any(|sq| legal_destinations(position, sq).is_not_empty())
}

fn push_moves_from(position: &Position, sq: Square, moves: &mut MoveList) {
    let Some(piece) = position.piece_at(sq) else {
        return;
    };
    let promotes = |to: Square| piece.kind == PieceKind::Pawn && is_promotion_row(piece.color, to);

    for to in legal_destinations(position, sq) {
        if promotes(to) {
            for kind in PieceKind::PROMOTIONS {
                moves.push(Move::with_promotion(sq, to, kind));
            }
        } else {
            moves.push(Move::new(sq, to));
        }
    }
}

fn is_promotion_row(color: Color, sq: Square) -> bool {
    sq.row() == color.promotion_row()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn destinations(fen: &str, square: &str) -> Vec<String> {
        let position = Position::from_fen(fen).unwrap();
        let mut found: Vec<String> = legal_destinations(&position, sq(square))
            .into_iter()
            .map(Square::to_algebraic)
            .collect();
        found.sort();
        found
    }

    fn play(position: &Position, uci: &str) -> Position {
        make_move(position, Move::from_uci(uci).unwrap()).position
    }

    #[test]
    fn startpos_has_twenty_legal_moves() {
        let position = Position::startpos();
        assert_eq!(legal_moves(&position).len(), 20);
    }

    #[test]
    fn black_has_twenty_moves_after_e4() {
        let position = play(&Position::startpos(), "e2e4");
        assert_eq!(legal_moves(&position).len(), 20);
    }

    #[test]
    fn opponent_pieces_have_no_destinations() {
        let position = Position::startpos();
        assert!(legal_destinations(&position, sq("e7")).is_empty());
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let fen = "4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1";
        assert_eq!(destinations(fen, "e2"), Vec::<String>::new());
    }

    #[test]
    fn king_cannot_step_into_check() {
        let fen = "4k3/8/8/8/8/8/3r4/4K3 w - - 0 1";
        assert_eq!(destinations(fen, "e1"), vec!["d2", "f1"]);
    }

    #[test]
    fn castling_both_sides_when_clear() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(destinations(fen, "e1"), vec!["c1", "d1", "d2", "e2", "f1", "f2", "g1"]);
    }

    #[test]
    fn no_castling_out_of_check() {
        let fen = "r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1";
        assert!(!destinations(fen, "e1").contains(&"g1".to_string()));
        assert!(!destinations(fen, "e1").contains(&"c1".to_string()));
    }

    #[test]
    fn no_castling_through_attacked_square() {
        let fen = "4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1";
        let found = destinations(fen, "e1");
        assert!(!found.contains(&"g1".to_string()));
        assert!(found.contains(&"c1".to_string()));
    }

    #[test]
    fn queenside_castling_ignores_attack_on_b_file() {
        let fen = "1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1";
        assert!(destinations(fen, "e1").contains(&"c1".to_string()));
    }

    #[test]
    fn queenside_castling_needs_b_file_empty() {
        let fen = "4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1";
        assert!(!destinations(fen, "e1").contains(&"c1".to_string()));
    }

    #[test]
    fn no_castling_without_right() {
        let fen = "4k3/8/8/8/8/8/8/R3K2R w Q - 0 1";
        let found = destinations(fen, "e1");
        assert!(!found.contains(&"g1".to_string()));
        assert!(found.contains(&"c1".to_string()));
    }

    #[test]
    fn en_passant_is_legal_after_double_step() {
        let mut position = Position::startpos();
        for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            position = play(&position, uci);
        }
        assert!(legal_destinations(&position, sq("e5")).contains(sq("d6")));
    }

    #[test]
    fn en_passant_that_exposes_the_king_is_illegal() {
        let fen = "8/8/8/KPp4r/8/8/8/4k3 w - c6 0 1";
        assert_eq!(destinations(fen, "b5"), vec!["b6"]);
    }

    #[test]
    fn promotion_expands_to_four_moves() {
        let position = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let moves = legal_moves_from(&position, sq("b7"));
        assert_eq!(moves.len(), 4);
        assert!(moves.contains(Move::with_promotion(sq("b7"), sq("b8"), PieceKind::Knight)));
        assert_eq!(legal_destinations(&position, sq("b7")).count(), 1);
    }

    #[test]
    fn no_legal_move_in_stalemate() {
        let position = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!has_legal_move(&position));
        assert!(legal_moves(&position).is_empty());
    }
}

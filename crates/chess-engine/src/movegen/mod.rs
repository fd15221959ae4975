//! Move generation.
//!
//! Generation runs in three layers: [`pseudo_moves`] follows piece geometry
//! only, [`attacks`] answers whether a square is attacked, and [`legal`]
//! combines the two to drop moves that leave the mover's king attacked and
//! to add castling.

mod attacks;
pub mod legal;
pub mod perft;

use crate::{Bitboard, Position};
use chess_core::{Color, Move, MoveFlag, Piece, PieceKind, Square};

use attacks::{BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRECTIONS};

pub use attacks::{is_king_attacked, is_square_attacked};
pub use legal::{legal_destinations, legal_moves, legal_moves_from};

/// A list of moves with a fixed maximum capacity.
///
/// Chess positions have at most 218 legal moves, so we use a fixed-size
/// array to avoid heap allocations during move generation.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    /// Maximum number of legal moves in any chess position.
    pub const MAX_MOVES: usize = 256;

    /// Creates an empty move list.
    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::new(Square::A8, Square::A8); Self::MAX_MOVES],
            len: 0,
        }
    }

    /// Adds a move to the list.
    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    /// Returns the number of moves in the list.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a slice of the moves.
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    /// Returns true if the list holds the given move.
    pub fn contains(&self, m: Move) -> bool {
        self.as_slice().contains(&m)
    }

    /// Retains only moves for which the predicate returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        let mut write = 0;
        for read in 0..self.len {
            if f(&self.moves[read]) {
                self.moves[write] = self.moves[read];
                write += 1;
            }
        }
        self.len = write;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        debug_assert!(index < self.len);
        &self.moves[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Returns the destinations reachable by the piece on `sq`, ignoring
/// whether the move would leave its own king attacked.
///
/// Castling is never produced here. An empty square yields an empty set.
pub fn pseudo_moves(position: &Position, sq: Square) -> Bitboard {
    let Some(piece) = position.piece_at(sq) else {
        return Bitboard::EMPTY;
    };

    match piece.kind {
        PieceKind::Pawn => pawn_moves(position, sq, piece.color),
        PieceKind::Knight => step_moves(position, sq, piece.color, &KNIGHT_OFFSETS),
        PieceKind::Bishop => slide_moves(position, sq, piece.color, &BISHOP_DIRECTIONS),
        PieceKind::Rook => slide_moves(position, sq, piece.color, &ROOK_DIRECTIONS),
        PieceKind::Queen => {
            slide_moves(position, sq, piece.color, &ROOK_DIRECTIONS)
                | slide_moves(position, sq, piece.color, &BISHOP_DIRECTIONS)
        }
        PieceKind::King => step_moves(position, sq, piece.color, &KING_OFFSETS),
    }
}

fn pawn_moves(position: &Position, from: Square, us: Color) -> Bitboard {
    let board = &position.board;
    let dir = us.pawn_direction();
    let mut targets = Bitboard::EMPTY;

    if let Some(one) = from.offset(dir, 0).filter(|&s| board.is_empty(s)) {
        targets.set(one);
        if from.row() == us.pawn_row() {
            if let Some(two) = one.offset(dir, 0).filter(|&s| board.is_empty(s)) {
                targets.set(two);
            }
        }
    }

    for d_col in [-1, 1] {
        let Some(to) = from.offset(dir, d_col) else {
            continue;
        };
        if board.color_at(to) == Some(us.opposite()) {
            targets.set(to);
        } else if position.en_passant == Some(to) && board.is_empty(to) {
            // The pawn that just double-stepped must really stand beside us.
            let beside = from.offset(0, d_col);
            if beside.is_some_and(|s| board.has(s, PieceKind::Pawn, us.opposite())) {
                targets.set(to);
            }
        }
    }

    targets
}

fn step_moves(position: &Position, from: Square, us: Color, offsets: &[(i8, i8)]) -> Bitboard {
    offsets
        .iter()
        .filter_map(|&(d_row, d_col)| from.offset(d_row, d_col))
        .filter(|&to| position.board.color_at(to) != Some(us))
        .collect()
}

fn slide_moves(position: &Position, from: Square, us: Color, directions: &[(i8, i8)]) -> Bitboard {
    let mut targets = Bitboard::EMPTY;
    for &(d_row, d_col) in directions {
        let mut current = from.offset(d_row, d_col);
        while let Some(to) = current {
            match position.board.color_at(to) {
                None => targets.set(to),
                Some(color) => {
                    if color != us {
                        targets.set(to);
                    }
                    break;
                }
            }
            current = to.offset(d_row, d_col);
        }
    }
    targets
}

/// Works out which special rule, if any, a move on this position invokes.
///
/// Returns `None` when the origin square is empty. The move is not checked
/// for legality.
pub fn classify(position: &Position, m: Move) -> Option<(Piece, MoveFlag)> {
    let piece = position.piece_at(m.from())?;
    let (from, to) = (m.from(), m.to());

    let flag = match piece.kind {
        PieceKind::Pawn if to.row() == piece.color.promotion_row() => MoveFlag::Promotion,
        PieceKind::Pawn
            if from.col() != to.col()
                && position.en_passant == Some(to)
                && position.board.is_empty(to) =>
        {
            MoveFlag::EnPassant
        }
        PieceKind::Pawn if from.row().abs_diff(to.row()) == 2 => MoveFlag::DoublePush,
        PieceKind::King if from.col().abs_diff(to.col()) == 2 => {
            if to.col() > from.col() {
                MoveFlag::CastleKingside
            } else {
                MoveFlag::CastleQueenside
            }
        }
        _ => MoveFlag::Normal,
    };

    Some((piece, flag))
}

/// The result of playing a move with [`make_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MadeMove {
    /// Position after the move.
    pub position: Position,
    /// The piece that moved, as it stood on the origin square.
    pub piece: Piece,
    /// The piece removed from the board, if any.
    pub captured: Option<Piece>,
    /// Which special rule the move used.
    pub flag: MoveFlag,
}

/// Returns the castling rook's origin and destination for a king move.
pub(crate) fn castling_rook_squares(color: Color, flag: MoveFlag) -> Option<(Square, Square)> {
    let row = color.back_row();
    let (from_col, to_col) = match flag {
        MoveFlag::CastleKingside => (7, 5),
        MoveFlag::CastleQueenside => (0, 3),
        _ => return None,
    };
    Square::new(row, from_col).zip(Square::new(row, to_col))
}

/// Plays a move on a copy of the position.
///
/// The move is assumed to be legal. A promotion without a chosen piece
/// promotes to a queen, which is what king-safety simulation needs.
///
/// # Panics
///
/// Panics if the origin square is empty or the move would capture a king.
/// Neither can happen for a move drawn from [`legal_moves`].
pub fn make_move(position: &Position, m: Move) -> MadeMove {
    let (piece, flag) = classify(position, m)
        .unwrap_or_else(|| panic!("no piece on {} for move {}", m.from(), m));
    let us = piece.color;
    let (from, to) = (m.from(), m.to());
    let mut new_pos = position.clone();
    let board = &mut new_pos.board;

    let captured = match flag {
        MoveFlag::EnPassant => {
            let victim = Square::new(from.row(), to.col())
                .unwrap_or_else(|| panic!("en passant victim off the board for {}", m));
            board.take(victim)
        }
        MoveFlag::CastleKingside | MoveFlag::CastleQueenside => None,
        _ => board.get(to),
    };
    if let Some(victim) = captured {
        assert!(
            victim.kind != PieceKind::King,
            "move {} would capture the {} king",
            m,
            victim.color
        );
    }

    board.set(from, None);
    let placed = match flag {
        MoveFlag::Promotion => Piece::new(m.promotion().unwrap_or(PieceKind::Queen), us),
        _ => piece,
    };
    board.set(to, Some(placed));

    if let Some((rook_from, rook_to)) = castling_rook_squares(us, flag) {
        let rook = board.take(rook_from);
        board.set(rook_to, rook);
    }

    if piece.kind == PieceKind::King {
        new_pos.castling.remove_color(us);
    }
    new_pos.castling.remove_for_rook_square(from);
    new_pos.castling.remove_for_rook_square(to);

    new_pos.en_passant = match flag {
        MoveFlag::DoublePush => from.offset(us.pawn_direction(), 0),
        _ => None,
    };

    if piece.kind == PieceKind::Pawn || captured.is_some() {
        new_pos.halfmove_clock = 0;
    } else {
        new_pos.halfmove_clock += 1;
    }
    if us == Color::Black {
        new_pos.fullmove_number += 1;
    }
    new_pos.side_to_move = us.opposite();

    MadeMove {
        position: new_pos,
        piece,
        captured,
        flag,
    }
}

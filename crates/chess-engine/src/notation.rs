//! Short algebraic labels for the move list.
//!
//! Labels are meant for display: the piece letter, an `x` for captures,
//! the destination and `=Q` style promotion suffixes. Check marks and
//! disambiguation are not produced.

use crate::game::HistoryEntry;
use crate::movegen::classify;
use crate::Position;
use chess_core::{Color, Move, MoveFlag, Piece, PieceKind};

/// Builds the label for `m` played from `position`.
///
/// Returns the UCI text when the origin square is empty.
pub fn move_label(position: &Position, m: Move) -> String {
    let Some((piece, flag)) = classify(position, m) else {
        return m.to_uci();
    };
    let is_capture = match flag {
        MoveFlag::EnPassant => true,
        MoveFlag::CastleKingside | MoveFlag::CastleQueenside => false,
        _ => position.piece_at(m.to()).is_some(),
    };
    label(piece, m, flag, is_capture)
}

pub(crate) fn label(piece: Piece, m: Move, flag: MoveFlag, is_capture: bool) -> String {
    match flag {
        MoveFlag::CastleKingside => return "O-O".to_string(),
        MoveFlag::CastleQueenside => return "O-O-O".to_string(),
        _ => {}
    }

    let mut text = String::with_capacity(8);
    if piece.kind == PieceKind::Pawn {
        if is_capture {
            text.push(m.from().file_char());
        }
    } else {
        text.push(piece.kind.to_char().to_ascii_uppercase());
    }
    if is_capture {
        text.push('x');
    }
    text.push_str(&m.to().to_algebraic());
    if let Some(kind) = m.promotion() {
        text.push('=');
        text.push(kind.to_char().to_ascii_uppercase());
    }
    text
}

/// Lays out a history as numbered move-list rows, one row per move number.
///
/// A history that starts with Black to move opens with `N... label`.
pub fn numbered_move_list(history: &[HistoryEntry]) -> Vec<String> {
    let mut rows: Vec<String> = Vec::new();
    let mut awaiting_black = false;
    for entry in history {
        let number = entry.position_before.fullmove_number;
        match (entry.piece.color, rows.last_mut()) {
            (Color::Black, Some(row)) if awaiting_black => {
                row.push(' ');
                row.push_str(&entry.label);
                awaiting_black = false;
            }
            (Color::Black, _) => rows.push(format!("{}... {}", number, entry.label)),
            (Color::White, _) => {
                rows.push(format!("{}. {}", number, entry.label));
                awaiting_black = true;
            }
        }
    }
    rows
}

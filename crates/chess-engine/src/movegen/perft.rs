//! Perft (performance test) for move generator validation.
//!
//! Perft counts the number of leaf nodes at a given depth, which can be
//! compared against known-correct values to validate the move generator.

use super::{legal_moves, make_move};
use crate::Position;

/// Counts the number of leaf nodes at the given depth.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = legal_moves(position);

    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .as_slice()
        .iter()
        .map(|&m| perft(&make_move(position, m).position, depth - 1))
        .sum()
}

/// Perft with divide: node count below each root move, sorted by UCI text.
///
/// Handy for finding which root move disagrees with a reference engine.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(String, u64)> {
    let moves = legal_moves(position);
    let mut results: Vec<(String, u64)> = moves
        .as_slice()
        .iter()
        .map(|&m| {
            let child = make_move(position, m).position;
            (m.to_uci(), perft(&child, depth.saturating_sub(1)))
        })
        .collect();

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

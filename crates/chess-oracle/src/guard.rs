//! Escape hatch against engines that shuffle the same move forever.

use chess_core::{Color, Move};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;

/// Number of recent moves remembered per side.
pub const WINDOW: usize = 6;
/// Occurrences inside the window that trigger a substitution.
pub const REPEAT_LIMIT: usize = 3;

/// Watches each side's recent oracle moves in AI-vs-AI games and swaps in
/// a different legal move once one keeps coming back.
///
/// This only steers which move gets played. Draw detection is still done by
/// the game itself.
pub struct RepetitionGuard {
    recent: [VecDeque<Move>; 2],
    rng: StdRng,
}

impl RepetitionGuard {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic substitutions, for tests and reproducible matches.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        RepetitionGuard {
            recent: [VecDeque::with_capacity(WINDOW), VecDeque::with_capacity(WINDOW)],
            rng,
        }
    }

    /// Returns the move `color` should play instead of `proposed`.
    ///
    /// Usually that is `proposed` itself. When playing it would make
    /// [`REPEAT_LIMIT`] times within the window, a random legal move with a
    /// different origin or destination is returned and the side's window
    /// starts over. With no alternative available, `proposed` stands.
    ///
    /// Nothing is remembered here; report the move once it has actually
    /// been played with [`record`](Self::record).
    pub fn review(&mut self, color: Color, proposed: Move, legal: &[Move]) -> Move {
        // Count against the window as it would be with `proposed` recorded.
        let window = &self.recent[color.index()];
        let evicted = (window.len() + 1).saturating_sub(WINDOW);
        let earlier = window.iter().skip(evicted).filter(|&&m| m == proposed).count();
        if earlier + 1 < REPEAT_LIMIT {
            return proposed;
        }

        let alternatives: Vec<Move> = legal
            .iter()
            .copied()
            .filter(|m| m.from() != proposed.from() || m.to() != proposed.to())
            .collect();
        let Some(&substitute) = alternatives.choose(&mut self.rng) else {
            tracing::debug!(%color, mv = %proposed, "repeated move has no alternative");
            return proposed;
        };

        self.recent[color.index()].clear();
        tracing::warn!(
            %color,
            repeated = %proposed,
            substitute = %substitute,
            "breaking move repetition"
        );
        substitute
    }

    /// Remembers a move `color` has played.
    pub fn record(&mut self, color: Color, played: Move) {
        let window = &mut self.recent[color.index()];
        if window.len() == WINDOW {
            window.pop_front();
        }
        window.push_back(played);
    }

    /// Forgets both windows, e.g. when a new game starts.
    pub fn reset(&mut self) {
        for window in &mut self.recent {
            window.clear();
        }
    }

    /// How often `mv` appears in `color`'s current window.
    pub fn occurrences(&self, color: Color, mv: Move) -> usize {
        self.recent[color.index()].iter().filter(|&&m| m == mv).count()
    }
}

impl Default for RepetitionGuard {
    fn default() -> Self {
        Self::new()
    }
}

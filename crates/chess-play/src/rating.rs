//! Elo ratings and win/loss statistics.
//!
//! Ratings only move in games between a human and the engine. The engine
//! is treated as a single opponent whose rating moves the opposite way.

use chess_core::Color;
use chess_engine::rules::GameOutcome;
use serde::{Deserialize, Serialize};

pub const K_FACTOR: f64 = 32.0;
pub const STARTING_RATING: i32 = 1200;

/// Calculate expected score for a player against an opponent.
fn expected_score(rating: i32, opponent_rating: i32) -> f64 {
    1.0 / (1.0 + 10_f64.powf((opponent_rating - rating) as f64 / 400.0))
}

/// Points a player gains (or loses, if negative) after a game.
///
/// # Arguments
/// * `rating` - Player's current rating
/// * `opponent_rating` - Opponent's rating
/// * `actual` - Actual score (1.0 = win, 0.5 = draw, 0.0 = loss)
pub fn rating_change(rating: i32, opponent_rating: i32, actual: f64) -> i32 {
    (K_FACTOR * (actual - expected_score(rating, opponent_rating))).round() as i32
}

/// Result of a game from one player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Win,
    Draw,
    Loss,
}

impl Score {
    pub fn for_player(outcome: GameOutcome, player: Color) -> Self {
        match outcome.winner() {
            None => Score::Draw,
            Some(winner) if winner == player => Score::Win,
            Some(_) => Score::Loss,
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Score::Win => 1.0,
            Score::Draw => 0.5,
            Score::Loss => 0.0,
        }
    }
}

/// The human player's rating and the engine's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub player: i32,
    pub ai: i32,
}

impl Default for Ratings {
    fn default() -> Self {
        Ratings {
            player: STARTING_RATING,
            ai: STARTING_RATING,
        }
    }
}

impl Ratings {
    /// Applies a finished game and returns the player's rating change.
    pub fn record(&mut self, score: Score) -> i32 {
        let change = rating_change(self.player, self.ai, score.value());
        self.player += change;
        self.ai -= change;
        change
    }

    /// Engine rating minus player rating.
    pub fn gap(&self) -> i32 {
        self.ai - self.player
    }
}

/// Running totals across games in one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Statistics {
    /// Counts a finished game. Wins and losses are only tracked for the
    /// human in a game against the engine (`human` is `None` otherwise).
    pub fn record(&mut self, outcome: GameOutcome, human: Option<Color>) {
        self.games_played += 1;
        if outcome.is_draw() {
            self.draws += 1;
            return;
        }
        match human.map(|color| Score::for_player(outcome, color)) {
            Some(Score::Win) => self.wins += 1,
            Some(Score::Loss) => self.losses += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::rules::DrawReason;

    #[test]
    fn test_expected_score_equal_ratings() {
        let expected = expected_score(1500, 1500);
        assert!((expected - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_expected_score_higher_rated() {
        let expected = expected_score(1700, 1500);
        assert!(expected > 0.7);
        assert!(expected < 0.8);
    }

    #[test]
    fn test_rating_change_even_match() {
        assert_eq!(rating_change(1500, 1500, 1.0), 16);
        assert_eq!(rating_change(1500, 1500, 0.0), -16);
        assert_eq!(rating_change(1500, 1500, 0.5), 0);
    }

    #[test]
    fn test_upset_win_gains_more() {
        assert!(rating_change(1300, 1500, 1.0) > 20);
    }

    #[test]
    fn test_ratings_move_in_opposite_directions() {
        let mut ratings = Ratings::default();
        let change = ratings.record(Score::Win);
        assert_eq!(change, 16);
        assert_eq!(ratings.player, 1216);
        assert_eq!(ratings.ai, 1184);

        ratings.record(Score::Loss);
        assert!(ratings.player < 1216);
        assert_eq!(ratings.player + ratings.ai, 2400);
    }

    #[test]
    fn test_draw_against_stronger_engine_gains_points() {
        let mut ratings = Ratings {
            player: 1200,
            ai: 1600,
        };
        assert!(ratings.record(Score::Draw) > 0);
        assert_eq!(ratings.gap(), ratings.ai - ratings.player);
    }

    #[test]
    fn test_statistics_for_human_vs_engine() {
        let mut stats = Statistics::default();
        let white_mates = GameOutcome::Checkmate {
            winner: Color::White,
        };
        stats.record(white_mates, Some(Color::White));
        stats.record(white_mates, Some(Color::Black));
        stats.record(GameOutcome::Stalemate, Some(Color::White));
        assert_eq!(
            stats,
            Statistics {
                games_played: 3,
                wins: 1,
                losses: 1,
                draws: 1,
            }
        );
    }

    #[test]
    fn test_statistics_without_human_only_count_games_and_draws() {
        let mut stats = Statistics::default();
        stats.record(
            GameOutcome::Timeout {
                winner: Color::Black,
            },
            None,
        );
        stats.record(GameOutcome::Draw(DrawReason::OracleFailure), None);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.wins + stats.losses, 0);
    }
}

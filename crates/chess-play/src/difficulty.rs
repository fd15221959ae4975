//! Engine strength levels, expressed as search depth.

use crate::rating::Ratings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown difficulty '{0}' (expected one of: {names})", names = Difficulty::names())]
pub struct UnknownDifficulty(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Noob,
    Easy,
    Regular,
    Hard,
    VeryHard,
    SuperHard,
    Magnus,
    Unbeatable,
    /// Depth follows the rating gap between engine and player.
    Adaptive,
}

impl Difficulty {
    pub const ALL: [Difficulty; 9] = [
        Difficulty::Noob,
        Difficulty::Easy,
        Difficulty::Regular,
        Difficulty::Hard,
        Difficulty::VeryHard,
        Difficulty::SuperHard,
        Difficulty::Magnus,
        Difficulty::Unbeatable,
        Difficulty::Adaptive,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Difficulty::Noob => "noob",
            Difficulty::Easy => "easy",
            Difficulty::Regular => "regular",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very-hard",
            Difficulty::SuperHard => "super-hard",
            Difficulty::Magnus => "magnus",
            Difficulty::Unbeatable => "unbeatable",
            Difficulty::Adaptive => "adaptive",
        }
    }

    /// Search depth in plies for this level.
    pub fn depth(self, ratings: &Ratings) -> u32 {
        match self {
            Difficulty::Noob => 1,
            Difficulty::Easy => 2,
            Difficulty::Regular => 3,
            Difficulty::Hard => 4,
            Difficulty::VeryHard => 6,
            Difficulty::SuperHard => 8,
            Difficulty::Magnus => 12,
            Difficulty::Unbeatable => 15,
            Difficulty::Adaptive => adaptive_depth(ratings.gap()),
        }
    }

    fn names() -> String {
        Self::ALL.map(Difficulty::name).join(", ")
    }
}

/// Depth 1 to 5, deeper the more the engine out-rates the player.
pub fn adaptive_depth(gap: i32) -> u32 {
    match gap {
        g if g < -300 => 1,
        g if g < -100 => 2,
        g if g < 100 => 3,
        g if g < 300 => 4,
        _ => 5,
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_levels_have_fixed_depths() {
        let ratings = Ratings::default();
        let depths: Vec<u32> = Difficulty::ALL[..8]
            .iter()
            .map(|d| d.depth(&ratings))
            .collect();
        assert_eq!(depths, vec![1, 2, 3, 4, 6, 8, 12, 15]);
    }

    #[test]
    fn adaptive_depth_thresholds() {
        assert_eq!(adaptive_depth(-301), 1);
        assert_eq!(adaptive_depth(-300), 2);
        assert_eq!(adaptive_depth(-101), 2);
        assert_eq!(adaptive_depth(-100), 3);
        assert_eq!(adaptive_depth(0), 3);
        assert_eq!(adaptive_depth(99), 3);
        assert_eq!(adaptive_depth(100), 4);
        assert_eq!(adaptive_depth(299), 4);
        assert_eq!(adaptive_depth(300), 5);
    }

    #[test]
    fn adaptive_uses_the_rating_gap() {
        let strong_player = Ratings {
            player: 1600,
            ai: 1200,
        };
        assert_eq!(Difficulty::Adaptive.depth(&strong_player), 1);
        assert_eq!(Difficulty::Adaptive.depth(&Ratings::default()), 3);
    }

    #[test]
    fn parses_names_leniently() {
        assert_eq!("very-hard".parse::<Difficulty>(), Ok(Difficulty::VeryHard));
        assert_eq!("Super_Hard".parse::<Difficulty>(), Ok(Difficulty::SuperHard));
        assert_eq!(" magnus ".parse::<Difficulty>(), Ok(Difficulty::Magnus));
        let err = "grandmaster".parse::<Difficulty>().unwrap_err();
        assert_eq!(err, UnknownDifficulty("grandmaster".to_string()));
        assert!(err.to_string().contains("unbeatable"));
    }

    #[test]
    fn serde_uses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: Difficulty,
        }
        let w: Wrapper = toml::from_str("level = \"super-hard\"").unwrap();
        assert_eq!(w.level, Difficulty::SuperHard);
    }
}

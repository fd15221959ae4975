//! Playing chess against a UCI engine.
//!
//! # Modules
//!
//! - [`session`] - Turn flow for human and engine players
//! - [`clock`] - Per-side countdown
//! - [`difficulty`] - Engine levels and their search depths
//! - [`rating`] - Elo ratings and statistics
//! - [`events`] - Events and end-of-game summaries for front ends
//! - [`config`] - `chess.toml` loading

pub mod clock;
pub mod config;
pub mod difficulty;
pub mod events;
pub mod rating;
pub mod session;

pub use clock::GameClock;
pub use config::{ConfigError, PlayConfig};
pub use difficulty::Difficulty;
pub use events::{GameEvent, GameSummary};
pub use rating::{Ratings, Statistics};
pub use session::{GameMode, Player, Session, SessionError};

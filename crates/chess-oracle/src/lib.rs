//! Asks an external UCI engine for moves.
//!
//! [`EngineProcess`] starts the engine and bridges its pipes to an
//! [`OracleChannel`]; [`SearchOracle`] speaks the protocol over that channel;
//! [`RepetitionGuard`] keeps AI-vs-AI games from looping.
//!
//! ```no_run
//! use chess_engine::Position;
//! use chess_oracle::{EngineProcess, SearchOracle};
//!
//! # async fn run() -> Result<(), chess_oracle::OracleError> {
//! let (process, channel) = EngineProcess::spawn("stockfish")?;
//! let mut oracle = SearchOracle::new(channel);
//! oracle.handshake().await?;
//! let best = oracle.request_move(&Position::startpos(), 3).await?;
//! println!("{:?}", best);
//! oracle.quit().await?;
//! process.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod channel;
mod error;
mod guard;
mod oracle;
mod process;

pub use channel::{OracleChannel, CHANNEL_CAPACITY};
pub use error::OracleError;
pub use guard::{RepetitionGuard, REPEAT_LIMIT, WINDOW};
pub use oracle::{SearchOracle, DEFAULT_RESPONSE_TIMEOUT};
pub use process::EngineProcess;

use std::time::Duration;
use thiserror::Error;

/// Errors talking to the search oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Spawning the engine or talking to its pipes failed.
    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The configured engine command was blank.
    #[error("engine command is empty")]
    EmptyCommand,

    /// The engine went away (pipe closed or process exited).
    #[error("engine connection closed")]
    Closed,

    /// A move was requested before `readyok` was received.
    #[error("engine has not completed the uci/isready handshake")]
    NotReady,

    /// The engine did not answer in time.
    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    /// The engine answered with something we cannot use.
    #[error("unexpected engine response: {0}")]
    Protocol(String),
}

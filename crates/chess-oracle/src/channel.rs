//! Line-based request/response channel to an engine.

use crate::OracleError;
use tokio::sync::mpsc;

/// Default buffer size for engine line channels.
pub const CHANNEL_CAPACITY: usize = 100;

/// One end of a line channel: lines written with [`send`](Self::send)
/// arrive at the other end's [`recv`](Self::recv).
///
/// [`EngineProcess`](crate::EngineProcess) wires one to a child process;
/// [`OracleChannel::pair`] connects two in memory, which is how tests
/// script an engine.
#[derive(Debug)]
pub struct OracleChannel {
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
}

impl OracleChannel {
    /// Wraps an existing sender/receiver pair.
    pub fn new(tx: mpsc::Sender<String>, rx: mpsc::Receiver<String>) -> Self {
        OracleChannel { tx, rx }
    }

    /// Creates two connected ends.
    pub fn pair() -> (OracleChannel, OracleChannel) {
        let (a_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (b_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (OracleChannel::new(a_tx, a_rx), OracleChannel::new(b_tx, b_rx))
    }

    /// Sends one line (without trailing newline).
    pub async fn send(&self, line: impl Into<String>) -> Result<(), OracleError> {
        self.tx
            .send(line.into())
            .await
            .map_err(|_| OracleError::Closed)
    }

    /// Receives the next line, or `None` once the other end is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

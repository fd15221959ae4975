//! Engine subprocess management.

use crate::channel::CHANNEL_CAPACITY;
use crate::{OracleChannel, OracleError};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// A running engine process.
///
/// Lines go to the engine's stdin and come back from its stdout through
/// the [`OracleChannel`] returned by [`spawn`](Self::spawn).
pub struct EngineProcess {
    child: Child,
}

impl EngineProcess {
    /// Spawn an engine from a command line such as `stockfish` or
    /// `/opt/engines/sf -threads 1`.
    pub fn spawn(command: &str) -> Result<(Self, OracleChannel), OracleError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let (program, args) = parts.split_first().ok_or(OracleError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().ok_or(OracleError::Closed)?;
        let stdout = child.stdout.take().ok_or(OracleError::Closed)?;

        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(line) = stdin_rx.recv().await {
                tracing::trace!(target: "chess_oracle::wire", "> {}", line);
                if stdin.write_all(line.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    break;
                }
            }
        });

        let (stdout_tx, stdout_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::trace!(target: "chess_oracle::wire", "< {}", line);
                if stdout_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        tracing::info!(program = %program, "spawned engine");
        Ok((EngineProcess { child }, OracleChannel::new(stdin_tx, stdout_rx)))
    }

    /// Waits briefly for the process to exit after `quit`, then kills it.
    pub async fn shutdown(mut self) {
        let exited = tokio::time::timeout(Duration::from_millis(200), self.child.wait()).await;
        if !matches!(exited, Ok(Ok(_))) {
            tracing::debug!("engine did not exit after quit, killing it");
            let _ = self.child.kill().await;
        }
    }
}

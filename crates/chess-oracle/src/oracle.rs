//! The search oracle: position in, best move out.

use crate::{OracleChannel, OracleError};
use chess_core::Move;
use chess_engine::Position;
use std::time::Duration;
use tokio::time::timeout;
use uci::{EngineMessage, GoOptions, GuiCommand};

/// Default time to wait for any single engine answer.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives a UCI engine over an [`OracleChannel`].
///
/// Only one search can be outstanding: [`request_move`](Self::request_move)
/// borrows the oracle mutably for its whole lifetime. Dropping that future
/// abandons the search; the next request then stops the engine and throws
/// away the stale `bestmove` before sending the new position.
pub struct SearchOracle {
    channel: OracleChannel,
    response_timeout: Duration,
    ready: bool,
    in_flight: bool,
    engine_name: Option<String>,
}

impl SearchOracle {
    pub fn new(channel: OracleChannel) -> Self {
        SearchOracle {
            channel,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            ready: false,
            in_flight: false,
            engine_name: None,
        }
    }

    /// Sets how long to wait for each engine answer.
    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    /// The name the engine reported with `id name`, once known.
    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    /// True once `readyok` has been received.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True while a search request has been sent and not answered.
    pub fn is_thinking(&self) -> bool {
        self.in_flight
    }

    /// Runs `uci`/`uciok` then `isready`/`readyok`.
    pub async fn handshake(&mut self) -> Result<(), OracleError> {
        self.send(GuiCommand::Uci).await?;
        loop {
            match self.next_message("uciok").await? {
                EngineMessage::UciOk => break,
                EngineMessage::Id { name: Some(name), .. } => self.engine_name = Some(name),
                _ => {}
            }
        }
        self.sync().await?;
        self.ready = true;
        tracing::info!(
            engine = self.engine_name.as_deref().unwrap_or("unknown"),
            "engine ready"
        );
        Ok(())
    }

    /// Tells the engine a new game starts and waits until it is ready again.
    pub async fn new_game(&mut self) -> Result<(), OracleError> {
        self.ensure_ready()?;
        self.drain_abandoned_search().await?;
        self.send(GuiCommand::UciNewGame).await?;
        self.sync().await
    }

    /// Asks for the best move in `position`, searching `depth` plies.
    ///
    /// Returns `Ok(None)` when the engine says there is no move, which
    /// should only happen in a finished position.
    pub async fn request_move(
        &mut self,
        position: &Position,
        depth: u32,
    ) -> Result<Option<Move>, OracleError> {
        self.ensure_ready()?;
        self.drain_abandoned_search().await?;

        let fen = position.to_fen();
        tracing::debug!(%fen, depth, "requesting move");
        self.send(GuiCommand::position_fen(fen)).await?;
        self.send(GuiCommand::Go(GoOptions::depth(depth))).await?;
        // Set only once `go` is queued: a search is running from here on and
        // will produce exactly one `bestmove`.
        self.in_flight = true;

        let token = loop {
            if let EngineMessage::BestMove { mv, .. } = self.next_message("bestmove").await? {
                break mv;
            }
        };
        self.in_flight = false;

        match token {
            None => {
                tracing::debug!("engine reports no move");
                Ok(None)
            }
            Some(token) => {
                let m = Move::from_uci(&token)
                    .ok_or_else(|| OracleError::Protocol(format!("bestmove {}", token)))?;
                tracing::debug!(bestmove = %m, "engine answered");
                Ok(Some(m))
            }
        }
    }

    /// Sends `quit`. The process itself is reaped by its owner.
    pub async fn quit(mut self) -> Result<(), OracleError> {
        self.send(GuiCommand::Quit).await
    }

    fn ensure_ready(&self) -> Result<(), OracleError> {
        if self.ready {
            Ok(())
        } else {
            Err(OracleError::NotReady)
        }
    }

    /// Stops a search whose caller went away and discards its answer.
    ///
    /// Engines answer `isready` straight away even while searching, so
    /// `readyok` says nothing about the stopped search. Its `bestmove` is
    /// awaited first, within the response timeout, and only then does the
    /// oracle resynchronise.
    async fn drain_abandoned_search(&mut self) -> Result<(), OracleError> {
        if !self.in_flight {
            return Ok(());
        }
        tracing::warn!("discarding the answer to an abandoned search");
        self.send(GuiCommand::Stop).await?;
        loop {
            if let EngineMessage::BestMove { mv, .. } = self.next_message("stale bestmove").await? {
                tracing::debug!(stale = ?mv, "dropped stale bestmove");
                break;
            }
        }
        self.in_flight = false;
        self.sync().await
    }

    /// Sends `isready` and skips everything up to `readyok`.
    async fn sync(&mut self) -> Result<(), OracleError> {
        self.send(GuiCommand::IsReady).await?;
        loop {
            match self.next_message("readyok").await? {
                EngineMessage::ReadyOk => return Ok(()),
                EngineMessage::BestMove { mv, .. } => {
                    tracing::debug!(stale = ?mv, "dropped stale bestmove");
                }
                _ => {}
            }
        }
    }

    async fn send(&mut self, command: GuiCommand) -> Result<(), OracleError> {
        self.channel.send(command.to_uci()).await
    }

    /// Reads the next parseable message, waiting at most the response timeout.
    async fn next_message(&mut self, waiting_for: &'static str) -> Result<EngineMessage, OracleError> {
        let after = self.response_timeout;
        loop {
            let line = timeout(after, self.channel.recv())
                .await
                .map_err(|_| OracleError::Timeout { waiting_for, after })?
                .ok_or(OracleError::Closed)?;
            match EngineMessage::parse(&line) {
                Ok(message) => return Ok(message),
                Err(e) => tracing::debug!(%line, error = %e, "ignoring unparseable engine line"),
            }
        }
    }
}

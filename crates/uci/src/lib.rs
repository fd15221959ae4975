//! UCI (Universal Chess Interface) protocol lines.
//!
//! This crate covers the GUI side of the protocol: formatting the commands
//! sent to an engine and parsing what the engine prints back.
//!
//! # Commands used
//!
//! - `uci` / `uciok` - Initialize engine, get id
//! - `isready` / `readyok` - Synchronization
//! - `position fen <fen>` - Set position
//! - `go depth <d>` - Start search, answered by `bestmove`
//! - `stop` - Stop search
//! - `quit` - Exit engine

mod command;

pub use command::{GoOptions, GuiCommand};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information, kept verbatim.
    Info(String),
    /// Best move found; `None` when the engine reports `(none)` or `0000`.
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Anything else (option declarations, copyright banners).
    Unknown(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    pub fn parse(line: &str) -> Result<Self, UciError> {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next().unwrap_or("") {
            "uciok" => Ok(EngineMessage::UciOk),
            "readyok" => Ok(EngineMessage::ReadyOk),
            "info" => Ok(EngineMessage::Info(line.to_string())),
            "id" => {
                let rest = |prefix: &str| line.strip_prefix(prefix).map(|s| s.trim().to_string());
                match parts.next() {
                    Some("name") => Ok(EngineMessage::Id {
                        name: rest("id name"),
                        author: None,
                    }),
                    Some("author") => Ok(EngineMessage::Id {
                        name: None,
                        author: rest("id author"),
                    }),
                    _ => Err(UciError::InvalidCommand(line.to_string())),
                }
            }
            "bestmove" => {
                let mv = parts
                    .next()
                    .ok_or_else(|| UciError::ParseError("bestmove without a move".to_string()))?;
                let ponder = match (parts.next(), parts.next()) {
                    (Some("ponder"), Some(p)) => Some(p.to_string()),
                    _ => None,
                };
                let mv = match mv {
                    "(none)" | "0000" => None,
                    other => Some(other.to_string()),
                };
                Ok(EngineMessage::BestMove { mv, ponder })
            }
            _ => Ok(EngineMessage::Unknown(line.to_string())),
        }
    }

    /// Format message for output.
    pub fn to_uci(&self) -> String {
        match self {
            EngineMessage::Id { name, author } => {
                let mut parts = Vec::new();
                if let Some(n) = name {
                    parts.push(format!("id name {}", n));
                }
                if let Some(a) = author {
                    parts.push(format!("id author {}", a));
                }
                parts.join("\n")
            }
            EngineMessage::UciOk => "uciok".to_string(),
            EngineMessage::ReadyOk => "readyok".to_string(),
            EngineMessage::Info(line) | EngineMessage::Unknown(line) => line.clone(),
            EngineMessage::BestMove { mv, ponder } => {
                let mv = mv.as_deref().unwrap_or("(none)");
                match ponder {
                    Some(p) => format!("bestmove {} ponder {}", mv, p),
                    None => format!("bestmove {}", mv),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handshake() {
        assert_eq!(EngineMessage::parse("uciok").unwrap(), EngineMessage::UciOk);
        assert_eq!(EngineMessage::parse("readyok\r\n").unwrap(), EngineMessage::ReadyOk);
        assert_eq!(
            EngineMessage::parse("id name Stockfish 16").unwrap(),
            EngineMessage::Id {
                name: Some("Stockfish 16".to_string()),
                author: None
            }
        );
    }

    #[test]
    fn parse_bestmove() {
        assert_eq!(
            EngineMessage::parse("bestmove e2e4 ponder e7e5").unwrap(),
            EngineMessage::BestMove {
                mv: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string())
            }
        );
        assert_eq!(
            EngineMessage::parse("bestmove a7a8q").unwrap(),
            EngineMessage::BestMove {
                mv: Some("a7a8q".to_string()),
                ponder: None
            }
        );
    }

    #[test]
    fn parse_bestmove_none() {
        for line in ["bestmove (none)", "bestmove 0000"] {
            assert_eq!(
                EngineMessage::parse(line).unwrap(),
                EngineMessage::BestMove {
                    mv: None,
                    ponder: None
                }
            );
        }
        assert!(EngineMessage::parse("bestmove").is_err());
    }

    #[test]
    fn info_and_unknown_lines_are_kept() {
        let info = "info depth 3 score cp 20 pv e2e4";
        assert_eq!(
            EngineMessage::parse(info).unwrap(),
            EngineMessage::Info(info.to_string())
        );
        let banner = "Stockfish 16 by the Stockfish developers";
        assert_eq!(EngineMessage::parse(banner).unwrap().to_uci(), banner);
    }

    #[test]
    fn bestmove_formats_back() {
        let msg = EngineMessage::BestMove {
            mv: None,
            ponder: None,
        };
        assert_eq!(msg.to_uci(), "bestmove (none)");
    }
}

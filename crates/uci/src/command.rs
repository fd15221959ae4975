//! Commands sent from the GUI to the engine.

use crate::UciError;

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Forget anything learned from the previous game.
    UciNewGame,
    /// Set up position.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Start calculating.
    Go(GoOptions),
    /// Stop calculating.
    Stop,
    /// Quit the engine.
    Quit,
    /// Unknown command (for forward compatibility).
    Unknown(String),
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Search for exactly this time in milliseconds.
    pub movetime: Option<u64>,
    /// Search indefinitely until `stop`.
    pub infinite: bool,
}

impl GoOptions {
    /// Search to a fixed depth.
    pub fn depth(depth: u32) -> Self {
        GoOptions {
            depth: Some(depth),
            ..Default::default()
        }
    }
}

impl GuiCommand {
    /// Shorthand for `position fen <fen>` without moves.
    pub fn position_fen(fen: impl Into<String>) -> Self {
        GuiCommand::Position {
            fen: Some(fen.into()),
            moves: Vec::new(),
        }
    }

    /// Format the command as a protocol line (without newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::Position { fen, moves } => {
                let mut line = match fen {
                    Some(fen) => format!("position fen {}", fen),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    line.push_str(" moves ");
                    line.push_str(&moves.join(" "));
                }
                line
            }
            GuiCommand::Go(opts) => {
                let mut line = String::from("go");
                if let Some(depth) = opts.depth {
                    line.push_str(&format!(" depth {}", depth));
                }
                if let Some(movetime) = opts.movetime {
                    line.push_str(&format!(" movetime {}", movetime));
                }
                if opts.infinite {
                    line.push_str(" infinite");
                }
                line
            }
            GuiCommand::Stop => "stop".to_string(),
            GuiCommand::Quit => "quit".to_string(),
            GuiCommand::Unknown(raw) => raw.clone(),
        }
    }

    /// Parse a UCI command string.
    pub fn parse(input: &str) -> Result<Self, UciError> {
        let input = input.trim();
        let mut parts = input.split_whitespace();

        match parts.next().unwrap_or("") {
            "uci" => Ok(GuiCommand::Uci),
            "isready" => Ok(GuiCommand::IsReady),
            "ucinewgame" => Ok(GuiCommand::UciNewGame),
            "stop" => Ok(GuiCommand::Stop),
            "quit" => Ok(GuiCommand::Quit),
            "position" => Self::parse_position(parts),
            "go" => Ok(Self::parse_go(parts)),
            _ => Ok(GuiCommand::Unknown(input.to_string())),
        }
    }

    fn parse_position<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let fen = match parts.next() {
            Some("startpos") => None,
            Some("fen") => {
                let fen_parts: Vec<&str> = parts.by_ref().take_while(|&p| p != "moves").collect();
                if fen_parts.is_empty() {
                    return Err(UciError::ParseError("empty FEN after 'fen'".to_string()));
                }
                Some(fen_parts.join(" "))
            }
            Some(other) => {
                return Err(UciError::ParseError(format!(
                    "Expected 'startpos' or 'fen', got '{}'",
                    other
                )));
            }
            None => {
                return Err(UciError::ParseError(
                    "Expected 'startpos' or 'fen'".to_string(),
                ));
            }
        };

        // After a FEN the "moves" keyword was consumed by take_while.
        let rest: Vec<&str> = parts.collect();
        let moves = match (fen.is_some(), rest.first()) {
            (false, Some(&"moves")) => &rest[1..],
            (false, _) => &rest[..0],
            (true, _) => &rest[..],
        };

        Ok(GuiCommand::Position {
            fen,
            moves: moves.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn parse_go<'a>(mut parts: impl Iterator<Item = &'a str>) -> GuiCommand {
        let mut opts = GoOptions::default();

        while let Some(token) = parts.next() {
            match token {
                "depth" => opts.depth = parts.next().and_then(|v| v.parse().ok()),
                "movetime" => opts.movetime = parts.next().and_then(|v| v.parse().ok()),
                "infinite" => opts.infinite = true,
                _ => {}
            }
        }

        GuiCommand::Go(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn format_search_request() {
        assert_eq!(GuiCommand::position_fen(AFTER_E4).to_uci(), format!("position fen {}", AFTER_E4));
        assert_eq!(GuiCommand::Go(GoOptions::depth(12)).to_uci(), "go depth 12");
        assert_eq!(GuiCommand::IsReady.to_uci(), "isready");
    }

    #[test]
    fn format_position_with_moves() {
        let cmd = GuiCommand::Position {
            fen: None,
            moves: vec!["e2e4".to_string(), "e7e5".to_string()],
        };
        assert_eq!(cmd.to_uci(), "position startpos moves e2e4 e7e5");
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(GuiCommand::parse("uci").unwrap(), GuiCommand::Uci);
        assert_eq!(GuiCommand::parse("isready\n").unwrap(), GuiCommand::IsReady);
        assert_eq!(GuiCommand::parse("stop").unwrap(), GuiCommand::Stop);
        assert_eq!(
            GuiCommand::parse("setoption name Hash value 16").unwrap(),
            GuiCommand::Unknown("setoption name Hash value 16".to_string())
        );
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let cmd = GuiCommand::parse("position startpos moves e2e4 e7e5").unwrap();
        assert_eq!(
            cmd,
            GuiCommand::Position {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()]
            }
        );
    }

    #[test]
    fn parse_position_fen() {
        let cmd = GuiCommand::parse(&format!("position fen {} moves e7e5", AFTER_E4)).unwrap();
        assert_eq!(
            cmd,
            GuiCommand::Position {
                fen: Some(AFTER_E4.to_string()),
                moves: vec!["e7e5".to_string()]
            }
        );
    }

    #[test]
    fn parse_position_requires_a_source() {
        assert!(GuiCommand::parse("position").is_err());
        assert!(GuiCommand::parse("position somewhere").is_err());
    }

    #[test]
    fn parse_go_roundtrips_depth() {
        let line = GuiCommand::Go(GoOptions::depth(15)).to_uci();
        match GuiCommand::parse(&line).unwrap() {
            GuiCommand::Go(opts) => assert_eq!(opts.depth, Some(15)),
            other => panic!("expected go, got {:?}", other),
        }
    }
}

use anyhow::{bail, Context};
use chess_core::{Color, Fen};
use chess_engine::movegen::perft::{perft, perft_divide};
use chess_engine::Position;
use chess_oracle::{EngineProcess, SearchOracle};
use chess_play::{Difficulty, GameEvent, GameMode, GameSummary, PlayConfig, Session};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-play")]
#[command(about = "Play chess against a UCI engine, or watch two engines play")]
struct Cli {
    /// Configuration file [default: chess.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print events and the final summary as JSON lines
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play at the terminal against the engine or another human
    Play {
        /// Engine command line (overrides the config file)
        #[arg(long)]
        engine: Option<String>,
        /// Engine level
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
        /// Colour you play
        #[arg(long, value_enum, default_value = "white")]
        color: Side,
        /// Two humans at one terminal, no engine
        #[arg(long)]
        two_player: bool,
        /// Start position
        #[arg(long)]
        fen: Option<String>,
        /// Seconds per side, 0 for no clock
        #[arg(long)]
        clock: Option<u64>,
    },
    /// Watch the engine play itself
    Watch {
        /// Engine command line (overrides the config file)
        #[arg(long)]
        engine: Option<String>,
        /// Level for white
        #[arg(long)]
        white: Option<Difficulty>,
        /// Level for black
        #[arg(long)]
        black: Option<Difficulty>,
        /// Pause before each move in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Seconds per side, 0 for no clock
        #[arg(long)]
        clock: Option<u64>,
    },
    /// Count leaf nodes of the move tree
    Perft {
        /// Search depth in plies
        depth: u32,
        /// Position to count from
        #[arg(long, default_value = Fen::STARTPOS)]
        fen: String,
        /// Show the count below each root move
        #[arg(long)]
        divide: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PlayConfig::load_from(path),
        None => PlayConfig::load(),
    }
    .with_context(|| {
        let path = cli.config.clone().unwrap_or_else(PlayConfig::config_path);
        format!("loading {}", path.display())
    })?;

    match cli.command {
        Commands::Play {
            engine,
            difficulty,
            color,
            two_player,
            fen,
            clock,
        } => {
            if let Some(engine) = engine {
                config.engine = engine;
            }
            if let Some(seconds) = clock {
                config.clock_seconds = seconds;
            }
            let mode = if two_player {
                GameMode::HumanVsHuman
            } else {
                GameMode::HumanVsAi {
                    human: color.into(),
                    difficulty: difficulty.unwrap_or(config.difficulty),
                }
            };
            let session = match fen {
                Some(fen) => Session::from_fen(mode, &fen, &config)?,
                None => Session::new(mode, &config),
            };
            play(session, &config, cli.json).await
        }
        Commands::Watch {
            engine,
            white,
            black,
            delay_ms,
            clock,
        } => {
            if let Some(engine) = engine {
                config.engine = engine;
            }
            if let Some(delay_ms) = delay_ms {
                config.ai_move_delay_ms = delay_ms;
            }
            if let Some(seconds) = clock {
                config.clock_seconds = seconds;
            }
            let mode = GameMode::AiVsAi {
                white: white.unwrap_or(config.difficulty),
                black: black.unwrap_or(config.difficulty),
            };
            watch(Session::new(mode, &config), &config, cli.json).await
        }
        Commands::Perft { depth, fen, divide } => run_perft(&fen, depth, divide),
    }
}

async fn start_engine(config: &PlayConfig) -> anyhow::Result<(EngineProcess, SearchOracle)> {
    let (process, channel) = EngineProcess::spawn(&config.engine)
        .with_context(|| format!("failed to start engine '{}'", config.engine))?;
    let mut oracle = SearchOracle::new(channel).with_response_timeout(config.response_timeout());
    oracle.handshake().await.context("engine handshake failed")?;
    oracle.new_game().await?;
    Ok((process, oracle))
}

async fn stop_engine(engine: Option<(EngineProcess, SearchOracle)>) {
    if let Some((process, oracle)) = engine {
        if let Err(e) = oracle.quit().await {
            tracing::debug!(error = %e, "engine was already gone");
        }
        process.shutdown().await;
    }
}

async fn play(mut session: Session, config: &PlayConfig, json: bool) -> anyhow::Result<()> {
    let mut engine = match session.mode() {
        GameMode::HumanVsHuman => None,
        _ => Some(start_engine(config).await?),
    };
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if !json {
        println!("{}\n", session.game().position().board);
        println!("Enter moves like e2e4 or e7e8q. Type 'help' for commands.");
    }

    while !session.game().is_over() {
        if session.is_engine_turn() {
            let Some((_, oracle)) = engine.as_mut() else {
                bail!("the engine is to move but none is running");
            };
            match session.play_engine_move(oracle).await {
                Ok(events) => emit(&events, json),
                Err(e) => {
                    eprintln!("{}", e);
                    eprintln!("Type 'retry' to ask the engine again, or 'resign'.");
                    if !human_turn(&mut session, &mut input, json, true).await? {
                        break;
                    }
                }
            }
            continue;
        }
        if !human_turn(&mut session, &mut input, json, false).await? {
            break;
        }
    }

    finish(&session, json)?;
    stop_engine(engine).await;
    Ok(())
}

/// Reads and handles one line of input. Returns false when the player quits.
async fn human_turn(
    session: &mut Session,
    input: &mut Lines<BufReader<Stdin>>,
    json: bool,
    engine_stalled: bool,
) -> anyhow::Result<bool> {
    loop {
        if !json {
            let color = session.game().side_to_move();
            if session.clock().is_enabled() {
                println!("{} to move [{}]:", color, session.clock().display(color));
            } else {
                println!("{} to move:", color);
            }
        }
        let line = tokio::select! {
            line = input.next_line() => line?,
            events = session.run_clock() => {
                emit(&events, json);
                return Ok(true);
            }
        };
        let Some(line) = line else {
            return Ok(false);
        };

        match line.trim() {
            "" => continue,
            "quit" | "exit" => return Ok(false),
            "help" => {
                println!("commands: <move> undo resign board fen moves retry quit");
                continue;
            }
            "board" => {
                println!("{}", session.game().position().board);
                continue;
            }
            "fen" => {
                println!("{}", session.game().to_fen());
                continue;
            }
            "moves" => {
                let legal = session.game().legal_moves();
                let moves: Vec<String> = legal.as_slice().iter().map(|m| m.to_uci()).collect();
                println!("{}", moves.join(" "));
                continue;
            }
            "retry" if engine_stalled => return Ok(true),
            "undo" => match session.undo() {
                Ok(events) => {
                    emit(&events, json);
                    continue;
                }
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            },
            "resign" => {
                let events = session.resign()?;
                emit(&events, json);
                return Ok(true);
            }
            token if engine_stalled => {
                eprintln!("'{}': the engine is to move; type 'retry' or 'resign'", token);
                continue;
            }
            token => match submit(session, input, token, json).await {
                Ok(()) => return Ok(true),
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            },
        }
    }
}

/// Plays a move typed by the player, asking for a piece if it promotes.
async fn submit(
    session: &mut Session,
    input: &mut Lines<BufReader<Stdin>>,
    token: &str,
    json: bool,
) -> anyhow::Result<()> {
    let events = session.submit_uci(token)?;
    if let Some(GameEvent::PromotionRequested { from, to, .. }) = events.first() {
        let (from, to) = (*from, *to);
        println!("Promote to (q, r, b, n):");
        let piece = input.next_line().await?.unwrap_or_default();
        let events = session.submit_uci(&format!("{}{}{}", from, to, piece.trim()))?;
        emit(&events, json);
    } else {
        emit(&events, json);
    }
    Ok(())
}

async fn watch(mut session: Session, config: &PlayConfig, json: bool) -> anyhow::Result<()> {
    let (process, mut oracle) = start_engine(config).await?;
    if !json {
        if let GameMode::AiVsAi { white, black } = session.mode() {
            println!("{} (white) vs {} (black)", white, black);
        }
    }
    let result = session
        .play_engines(&mut oracle, |event| emit(std::slice::from_ref(event), json))
        .await;
    stop_engine(Some((process, oracle))).await;
    result?;
    finish(&session, json)
}

fn emit(events: &[GameEvent], json: bool) {
    for event in events {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "failed to serialize event"),
            }
            continue;
        }
        match event {
            GameEvent::BoardChanged { fen, label, .. } => {
                if let Some(label) = label {
                    println!("\n{}", label);
                }
                match Position::from_fen(fen) {
                    Ok(position) => println!("{}\n", position.board),
                    Err(e) => tracing::error!(error = %e, "bad position in event"),
                }
            }
            GameEvent::CaptureOccurred { piece } => println!("{} captured", piece),
            GameEvent::CheckDeclared { color } => println!("{} is in check", color),
            GameEvent::PromotionRequested { .. } => {}
            GameEvent::MoveSubstituted {
                color,
                proposed,
                played,
            } => println!("{} repeats {}, playing {} instead", color, proposed, played),
            GameEvent::GameEnded { message, .. } => println!("{}", message),
        }
    }
}

fn finish(session: &Session, json: bool) -> anyhow::Result<()> {
    let summary = session.summary();
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary);
        if let Some(ratings) = summary.ratings {
            let stats = session.statistics();
            println!(
                "Ratings: you {} / engine {}  (games {}, W {} L {} D {})",
                ratings.player, ratings.ai, stats.games_played, stats.wins, stats.losses, stats.draws
            );
        }
    }
    Ok(())
}

fn print_summary(summary: &GameSummary) {
    println!("\n{} vs {}: {}", summary.white, summary.black, summary.result);
    if let Some(reason) = &summary.reason {
        println!("Reason: {}", reason);
    }
    for row in &summary.move_list {
        println!("  {}", row);
    }
    println!("Final position: {}", summary.final_fen);
}

fn run_perft(fen: &str, depth: u32, divide: bool) -> anyhow::Result<()> {
    let position = Position::from_fen(fen).context("invalid FEN")?;
    let start = Instant::now();
    let nodes = if divide {
        let counts = perft_divide(&position, depth);
        for (mv, count) in &counts {
            println!("{}: {}", mv, count);
        }
        counts.iter().map(|(_, count)| count).sum()
    } else {
        perft(&position, depth)
    };
    let elapsed = start.elapsed();
    println!("\nNodes: {}", nodes);
    println!("Time: {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

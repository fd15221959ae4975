//! Sessions against a scripted in-memory engine.

use chess_core::Color;
use chess_engine::rules::{DrawReason, GameOutcome};
use chess_oracle::{OracleChannel, RepetitionGuard, SearchOracle};
use chess_play::{
    Difficulty, GameClock, GameEvent, GameMode, PlayConfig, Session, SessionError,
};
use std::time::Duration;
use uci::GuiCommand;

/// Answers each `go` with the next scripted move, `(none)` once the script
/// runs out. A `None` entry means never answer that search.
fn scripted_engine(script: Vec<Option<&'static str>>) -> OracleChannel {
    let (gui, mut engine) = OracleChannel::pair();
    tokio::spawn(async move {
        let mut script = script.into_iter();
        while let Some(line) = engine.recv().await {
            let reply = match GuiCommand::parse(&line) {
                Ok(GuiCommand::Uci) => Some("id name Scripted\nuciok".to_string()),
                Ok(GuiCommand::IsReady) => Some("readyok".to_string()),
                Ok(GuiCommand::Go(_)) => match script.next() {
                    Some(Some(mv)) => Some(format!("bestmove {}", mv)),
                    Some(None) => None,
                    None => Some("bestmove (none)".to_string()),
                },
                Ok(GuiCommand::Quit) => break,
                _ => None,
            };
            for reply_line in reply.iter().flat_map(|r| r.lines()) {
                if engine.send(reply_line).await.is_err() {
                    return;
                }
            }
        }
    });
    gui
}

async fn oracle(script: Vec<Option<&'static str>>) -> SearchOracle {
    let mut oracle = SearchOracle::new(scripted_engine(script))
        .with_response_timeout(Duration::from_secs(5));
    oracle.handshake().await.unwrap();
    oracle
}

fn config() -> PlayConfig {
    PlayConfig {
        clock_seconds: 0,
        ai_move_delay_ms: 0,
        ..PlayConfig::default()
    }
}

fn human_white() -> GameMode {
    GameMode::HumanVsAi {
        human: Color::White,
        difficulty: Difficulty::Hard,
    }
}

fn engines() -> GameMode {
    GameMode::AiVsAi {
        white: Difficulty::Noob,
        black: Difficulty::Noob,
    }
}

#[tokio::test]
async fn engine_replies_and_undo_takes_back_both_plies() {
    let mut oracle = oracle(vec![Some("e7e5")]).await;
    let mut session = Session::new(human_white(), &config());

    session.submit_uci("e2e4").unwrap();
    assert!(session.is_engine_turn());
    assert!(matches!(
        session.submit_uci("d2d4"),
        Err(SessionError::EngineToMove)
    ));

    let events = session.play_engine_move(&mut oracle).await.unwrap();
    assert!(matches!(
        &events[0],
        GameEvent::BoardChanged { label: Some(l), .. } if l == "e5"
    ));
    assert_eq!(session.game().ply_count(), 2);

    session.undo().unwrap();
    assert_eq!(session.game().ply_count(), 0);
    assert_eq!(session.game().side_to_move(), Color::White);
}

#[tokio::test]
async fn engine_may_not_move_for_the_human() {
    let mut oracle = oracle(vec![Some("e2e4")]).await;
    let mut session = Session::new(human_white(), &config());
    assert!(matches!(
        session.play_engine_move(&mut oracle).await,
        Err(SessionError::HumanToMove)
    ));
}

#[tokio::test]
async fn engine_promotes_to_a_queen_when_it_names_no_piece() {
    let mut oracle = oracle(vec![Some("a2a1")]).await;
    let mut session =
        Session::from_fen(human_white(), "4k3/8/8/8/8/8/p7/7K b - - 0 1", &config()).unwrap();
    let events = session.play_engine_move(&mut oracle).await.unwrap();
    assert!(matches!(
        &events[0],
        GameEvent::BoardChanged { label: Some(l), .. } if l == "a1=Q"
    ));
}

#[tokio::test]
async fn illegal_engine_move_is_reported_in_a_human_game() {
    let mut oracle = oracle(vec![Some("e7e4")]).await;
    let mut session = Session::new(human_white(), &config());
    session.submit_uci("e2e4").unwrap();

    let result = session.play_engine_move(&mut oracle).await;
    assert!(matches!(result, Err(SessionError::IllegalMove(_))));
    assert!(!session.game().is_over());
    assert!(session.status().unwrap().starts_with("Engine error"));
    assert!(session.is_engine_turn());
}

#[tokio::test]
async fn silent_engine_ends_an_engine_game_as_a_draw() {
    let mut oracle = oracle(vec![]).await;
    let mut session = Session::new(engines(), &config());
    let events = session.play_engine_move(&mut oracle).await.unwrap();
    assert_eq!(
        events,
        vec![GameEvent::game_ended(GameOutcome::Draw(
            DrawReason::OracleFailure
        ))]
    );
    assert_eq!(session.summary().reason.as_deref(), Some("engine failure"));
}

#[tokio::test]
async fn engines_play_into_threefold_repetition() {
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
    let script = shuffle.iter().cycle().take(8).map(|m| Some(*m)).collect();
    let mut oracle = oracle(script).await;
    let mut session = Session::new(engines(), &config());

    let mut seen = Vec::new();
    let summary = session
        .play_engines(&mut oracle, |event| seen.push(event.clone()))
        .await
        .unwrap();

    assert_eq!(summary.result, "draw");
    assert_eq!(summary.reason.as_deref(), Some("threefold repetition"));
    assert_eq!(summary.moves.len(), 8);
    assert!(!seen
        .iter()
        .any(|e| matches!(e, GameEvent::MoveSubstituted { .. })));
    assert_eq!(session.statistics().draws, 1);
}

#[tokio::test]
async fn repeated_engine_move_is_substituted() {
    let script = [
        "g1f3", "a7a6", "f3g1", "a6a5", "g1f3", "h7h6", "f3g1", "h6h5", "g1f3",
    ]
    .into_iter()
    .map(Some)
    .collect();
    let mut oracle = oracle(script).await;
    let mut session =
        Session::new(engines(), &config()).with_guard(RepetitionGuard::with_seed(11));

    let mut substitutions = Vec::new();
    let summary = session
        .play_engines(&mut oracle, |event| {
            if let GameEvent::MoveSubstituted { proposed, played, .. } = event {
                substitutions.push((proposed.clone(), played.clone()));
            }
        })
        .await
        .unwrap();

    assert_eq!(substitutions.len(), 1);
    let (proposed, played) = &substitutions[0];
    assert_eq!(proposed, "g1f3");
    assert_ne!(played, "g1f3");
    assert_eq!(summary.moves[8], *played);
    // The script then runs dry, which ends the game.
    assert_eq!(summary.reason.as_deref(), Some("engine failure"));
}

#[tokio::test]
async fn flag_falls_while_the_engine_thinks() {
    let mut oracle = oracle(vec![None]).await;
    let mut session = Session::new(
        GameMode::HumanVsAi {
            human: Color::Black,
            difficulty: Difficulty::Adaptive,
        },
        &config(),
    )
    .with_clock(GameClock::with_tick(3, Duration::from_millis(5)));

    let events = session.play_engine_move(&mut oracle).await.unwrap();
    assert_eq!(
        events,
        vec![GameEvent::game_ended(GameOutcome::Timeout {
            winner: Color::Black
        })]
    );
    assert_eq!(session.statistics().wins, 1);
    assert!(session.ratings().player > 1200);
    assert!(oracle.is_thinking());
}

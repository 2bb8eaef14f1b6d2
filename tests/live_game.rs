//! End-to-end tests against a real file that grows while it is tailed

mod common;

use anyhow::{Context, Result, ensure};
use futures::StreamExt;
use slippi_live::{
    GameEndMethod, LiveConfig, LiveError, LiveGame, SessionStatus, SlippiDecoder, StartOutcome,
    StopReason,
};
use std::time::Duration;

fn fast_config() -> LiveConfig {
    LiveConfig {
        poll_interval_ms: 2,
        max_poll_interval_ms: 10,
        bootstrap_timeout_ms: Some(5_000),
        max_io_retries: 3,
    }
}

async fn wait_terminal(game: &LiveGame) -> Result<SessionStatus> {
    let mut updates = Box::pin(game.status_updates());
    let status = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(status) = updates.next().await {
            if status.is_terminal() {
                return status;
            }
        }
        game.status()
    })
    .await
    .context("session did not terminate")?;
    Ok(status)
}

#[tokio::test]
async fn tails_a_file_written_in_pieces() -> Result<()> {
    common::init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Game_20261016T120000.slp");

    let mut game = LiveGame::with_config(fast_config())?;
    ensure!(game.start(&path) == StartOutcome::Spawned);
    ensure!(game.is_streaming());

    // The game creates the file after the session was started
    tokio::time::sleep(Duration::from_millis(20)).await;
    common::append(&path, &common::header())?;
    common::append(&path, &common::game_start())?;

    let mut collected = Vec::new();
    for index in -123..-63 {
        let bytes = common::frame(index, &[0, 1]);
        // Split writes so some re-reads land mid-record
        let (head, tail) = bytes.split_at(bytes.len() / 3);
        common::append(&path, head)?;
        tokio::time::sleep(Duration::from_millis(1)).await;
        common::append(&path, tail)?;
        collected.extend(game.collect());
    }
    common::append(&path, &common::game_end(2))?;

    let status = wait_terminal(&game).await?;
    collected.extend(game.collect());

    ensure!(matches!(status, SessionStatus::Stopped(StopReason::GameEnd)), "status: {status:?}");
    ensure!(!game.is_streaming());

    let indices: Vec<i32> = collected.iter().map(|f| f.index).collect();
    ensure!(indices == (-123..-63).collect::<Vec<_>>(), "indices: {indices:?}");
    for frame in &collected {
        let port = frame.port(1).context("port 1 missing")?;
        ensure!(port.leader.is_complete());
        let pre = port.leader.pre.as_ref().context("pre missing")?;
        ensure!(pre.position.x == frame.index as f32);
    }

    let start = game.game_start().context("no game start")?;
    ensure!(start.slippi_version == (3, 16, 0));
    let end = game.game_end().context("no game end")?;
    ensure!(end.method == GameEndMethod::Game);
    ensure!(end.lras_initiator.is_none());
    Ok(())
}

#[tokio::test]
async fn completed_file_is_read_in_one_pass() -> Result<()> {
    common::init_tracing();
    let file = tempfile::NamedTempFile::new()?;
    common::append(file.path(), &common::full_game(300, &[0, 2, 3]))?;

    let mut game = LiveGame::with_config(fast_config())?;
    let _ = game.start(file.path());
    let batches: Vec<_> = game.drain_every(Duration::from_millis(5)).collect().await;

    let frames: Vec<_> = batches.into_iter().flatten().collect();
    ensure!(frames.len() == 300);
    ensure!(frames.iter().all(|f| f.occupied_ports().count() == 3));
    ensure!(game.last_error().is_none());
    Ok(())
}

#[tokio::test]
async fn start_twice_spawns_once() -> Result<()> {
    common::init_tracing();
    let file = tempfile::NamedTempFile::new()?;
    common::append(file.path(), &common::full_game(5, &[0]))?;

    let mut game = LiveGame::with_config(fast_config())?;
    ensure!(game.start(file.path()) == StartOutcome::Spawned);
    ensure!(game.start(file.path()) == StartOutcome::AlreadyStarted);
    ensure!(game.sessions_spawned() == 1);

    wait_terminal(&game).await?;
    // Frames are not duplicated by the ignored second start
    ensure!(game.collect().len() == 5);
    Ok(())
}

#[tokio::test]
async fn stop_while_waiting_for_data() -> Result<()> {
    common::init_tracing();
    let file = tempfile::NamedTempFile::new()?;
    let mut bytes = common::header();
    bytes.extend(common::game_start());
    bytes.extend(common::frame(-123, &[0]));
    common::append(file.path(), &bytes)?;

    let mut game = LiveGame::with_config(fast_config())?;
    let _ = game.start(file.path());
    tokio::time::sleep(Duration::from_millis(50)).await;
    ensure!(game.is_streaming());

    game.stop();
    ensure!(!game.is_streaming());

    let status = wait_terminal(&game).await?;
    ensure!(matches!(status, SessionStatus::Stopped(StopReason::Requested)));
    // The in-progress frame is flushed on a stop request
    ensure!(game.collect().len() == 1);
    Ok(())
}

#[tokio::test]
async fn garbage_file_fails_the_session() -> Result<()> {
    common::init_tracing();
    let file = tempfile::NamedTempFile::new()?;
    common::append(file.path(), b"this is a text file, not a replay")?;

    let mut game = LiveGame::with_decoder(SlippiDecoder, fast_config());
    let _ = game.start(file.path());

    let status = wait_terminal(&game).await?;
    ensure!(matches!(status, SessionStatus::Failed(_)));
    let err = game.last_error().context("error should be recorded")?;
    ensure!(matches!(*err, LiveError::MalformedHeader { .. }));
    ensure!(!err.recovery_suggestions().is_empty());
    ensure!(game.collect().is_empty());
    Ok(())
}

use anyhow::{Context, Result, anyhow};
use duet_client::{
    CallState, MediaConstraints, MediaSource, NegotiationEngine, RoomCoordinator,
    SessionHandle, SessionOptions, SessionSnapshot, SignalingChannel, SyntheticSource,
};
use duet_core::RoomId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::loopback_hub::LoopbackHub;

/// Timeout for a session to reach a state (ms).
pub const STATE_TIMEOUT_MS: u64 = 5000;

/// Poll interval for condition checks (ms).
pub const POLL_INTERVAL_MS: u64 = 10;

pub struct TestPeer {
    pub handle: SessionHandle,
    pub task: JoinHandle<()>,
}

pub fn with_media() -> SessionOptions {
    SessionOptions::default()
}

pub fn without_media() -> SessionOptions {
    SessionOptions {
        media: MediaConstraints {
            audio: false,
            video: false,
        },
        ..Default::default()
    }
}

/// Joins `room` through `channel` with an in-memory engine and synthetic media.
pub async fn join_peer(
    channel: &dyn SignalingChannel,
    room: &str,
    options: SessionOptions,
) -> Result<TestPeer> {
    let media: Arc<dyn MediaSource> = Arc::new(SyntheticSource::without_samples());
    let (engine, events) = NegotiationEngine::in_memory();
    let (handle, task) =
        RoomCoordinator::join(RoomId::from(room), channel, engine, events, media, options)
            .await
            .context("Failed to join room")?;
    Ok(TestPeer { handle, task })
}

pub async fn wait_until(
    handle: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> Result<SessionSnapshot> {
    tokio::time::timeout(
        Duration::from_millis(STATE_TIMEOUT_MS),
        handle.wait_until(predicate),
    )
    .await
    .map_err(|_| anyhow!("Timed out; last snapshot: {:?}", handle.snapshot()))?
    .map_err(Into::into)
}

pub async fn wait_for_state(handle: &SessionHandle, state: CallState) -> Result<SessionSnapshot> {
    wait_until(handle, |s| s.state == state)
        .await
        .with_context(|| format!("Session never reached {state}"))
}

pub async fn wait_for_media(handle: &SessionHandle) -> Result<SessionSnapshot> {
    wait_until(handle, |s| s.local_stream_id.is_some())
        .await
        .context("Local media never arrived")
}

pub async fn wait_for_condition(mut condition: impl FnMut() -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(STATE_TIMEOUT_MS);
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow!("Condition not met in time"));
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
    Ok(())
}

/// Two peers in `room`, both waiting for each other, both with local media.
pub async fn paired_peers(hub: &LoopbackHub, room: &str) -> Result<(TestPeer, TestPeer)> {
    let p1 = join_peer(hub, room, with_media()).await?;
    wait_for_condition(|| hub.occupants(room) == 1).await?;
    let p2 = join_peer(hub, room, with_media()).await?;

    wait_for_state(&p1.handle, CallState::WaitingForRemote).await?;
    wait_for_state(&p2.handle, CallState::WaitingForRemote).await?;
    wait_for_media(&p1.handle).await?;
    wait_for_media(&p2.handle).await?;
    Ok((p1, p2))
}

use crate::engine::NegotiationEngine;
use crate::error::CallError;
use crate::media::LocalTrack;
use crate::session::{CallState, SessionSnapshot};
use duet_core::PeerId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

type Reply = oneshot::Sender<Result<(), CallError>>;

/// User requests forwarded to the task that owns the session.
#[derive(Debug)]
pub enum UserIntent {
    Call { reply: Reply },
    Accept { reply: Reply },
    Cancel { reply: Reply },
    AttachTrack { track: LocalTrack, reply: Reply },
    RetryMedia,
    End,
}

/// Cloneable front for a running session: user intents in, snapshots out.
#[derive(Clone)]
pub struct SessionHandle {
    local_id: PeerId,
    intents: mpsc::UnboundedSender<UserIntent>,
    engine: Arc<NegotiationEngine>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn new(
        local_id: PeerId,
        intents: mpsc::UnboundedSender<UserIntent>,
        engine: Arc<NegotiationEngine>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            local_id,
            intents,
            engine,
            snapshot_rx,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub async fn call(&self) -> Result<(), CallError> {
        self.request(|reply| UserIntent::Call { reply }).await
    }

    pub async fn accept(&self) -> Result<(), CallError> {
        self.request(|reply| UserIntent::Accept { reply }).await
    }

    pub async fn cancel(&self) -> Result<(), CallError> {
        self.request(|reply| UserIntent::Cancel { reply }).await
    }

    pub async fn attach_track(&self, track: LocalTrack) -> Result<(), CallError> {
        self.request(|reply| UserIntent::AttachTrack { track, reply })
            .await
    }

    /// Asks for local media again after it was denied or never requested.
    pub fn retry_media(&self) {
        let _ = self.intents.send(UserIntent::RetryMedia);
    }

    /// Ends the call. The connection is sealed before this returns; the rest of the
    /// teardown happens on the session task.
    pub fn end(&self) {
        self.engine.close_detached();
        let _ = self.intents.send(UserIntent::End);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Resolves with the first snapshot satisfying `predicate`, the current one included.
    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, CallError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| CallError::SessionEnded)?;
        Ok(snapshot.clone())
    }

    pub async fn wait_for_state(&self, state: CallState) -> Result<SessionSnapshot, CallError> {
        self.wait_until(|s| s.state == state).await
    }

    async fn request(
        &self,
        intent: impl FnOnce(Reply) -> UserIntent,
    ) -> Result<(), CallError> {
        let (reply, response) = oneshot::channel();
        self.intents
            .send(intent(reply))
            .map_err(|_| CallError::SessionEnded)?;
        response.await.map_err(|_| CallError::SessionEnded)?
    }
}

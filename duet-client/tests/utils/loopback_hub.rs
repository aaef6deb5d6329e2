use async_trait::async_trait;
use axum::extract::ws::Message;
use duet_client::{SignalingChannel, SignalingError, SignalingLink};
use duet_core::{ClientSignal, PeerId, RoomId, ServerSignal};
use duet_server::SignalingService;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// In-process signaling channel backed by the relay's own routing.
///
/// Every client event is logged by name. Events of a held kind are parked until
/// [`release`](Self::release), which lets tests reorder delivery.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    service: SignalingService,
    log: Arc<Mutex<Vec<(PeerId, String)>>>,
    held_kinds: Arc<Mutex<HashSet<String>>>,
    parked: Arc<Mutex<Vec<(PeerId, ClientSignal)>>>,
    keep_departed: Arc<AtomicBool>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupants(&self, room: &str) -> usize {
        self.service.directory().occupants(&RoomId::from(room)).len()
    }

    /// How many `event`s `peer` has sent.
    pub fn sent_by(&self, peer: &PeerId, event: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(from, name)| from == peer && name == event)
            .count()
    }

    /// Peers whose link drops stay registered, as if their socket were still open.
    /// No `user-left` is sent for them.
    pub fn keep_departed_peers(&self) {
        self.keep_departed.store(true, Ordering::SeqCst);
    }

    pub fn hold(&self, event: &str) {
        self.held_kinds.lock().unwrap().insert(event.to_string());
    }

    pub fn parked_count(&self) -> usize {
        self.parked.lock().unwrap().len()
    }

    /// Stops holding and delivers everything parked so far.
    pub fn release(&self) {
        self.held_kinds.lock().unwrap().clear();
        let parked = std::mem::take(&mut *self.parked.lock().unwrap());
        for (from, signal) in parked {
            self.service.handle_client_signal(&from, signal);
        }
    }

    fn route(&self, from: &PeerId, signal: ClientSignal) {
        let name = event_name(&signal);
        self.log.lock().unwrap().push((from.clone(), name.clone()));

        if self.held_kinds.lock().unwrap().contains(&name) {
            self.parked.lock().unwrap().push((from.clone(), signal));
            return;
        }
        self.service.handle_client_signal(from, signal);
    }
}

fn event_name(signal: &ClientSignal) -> String {
    serde_json::to_value(signal)
        .ok()
        .and_then(|v| v.get("event")?.as_str().map(str::to_owned))
        .unwrap_or_default()
}

#[async_trait]
impl SignalingChannel for LoopbackHub {
    async fn connect(&self, local_id: &PeerId) -> Result<SignalingLink, SignalingError> {
        let (socket_tx, mut socket_rx) = mpsc::unbounded_channel::<Message>();
        self.service.add_peer(local_id.clone(), socket_tx);

        let (in_tx, in_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(msg) = socket_rx.recv().await {
                let Message::Text(text) = msg else { continue };
                let Ok(signal) = serde_json::from_str::<ServerSignal>(&text) else {
                    continue;
                };
                if in_tx.send(signal).is_err() {
                    break;
                }
            }
        });

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientSignal>();
        let hub = self.clone();
        let peer = local_id.clone();
        tokio::spawn(async move {
            while let Some(signal) = out_rx.recv().await {
                hub.route(&peer, signal);
            }
            if !hub.keep_departed.load(Ordering::SeqCst) {
                hub.service.remove_peer(&peer);
            }
        });

        Ok(SignalingLink {
            sender: out_tx,
            receiver: in_rx,
        })
    }
}

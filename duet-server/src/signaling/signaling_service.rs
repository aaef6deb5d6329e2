use crate::room::{JoinOutcome, RoomDirectory};
use axum::extract::ws::Message;
use dashmap::DashMap;
use duet_core::{ClientSignal, PeerId, RoomId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
    directory: RoomDirectory,
}

/// Connected sockets plus the room directory. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                directory: RoomDirectory::new(),
            }),
        }
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.inner.directory
    }

    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    /// Drops the socket and tells whoever shared its room.
    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);

        let Some((_, remaining)) = self.inner.directory.leave(peer_id) else {
            return;
        };
        for other in remaining {
            self.send_signal(
                &other,
                ServerSignal::UserLeft {
                    remote_peer_id: peer_id.clone(),
                },
            );
        }
    }

    pub fn send_signal(&self, peer_id: &PeerId, msg: ServerSignal) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", peer_id, e);
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {}", e),
            }
        } else {
            warn!("Attempted to send signal to disconnected peer {}", peer_id);
        }
    }

    /// Applies one event received from `from`'s socket.
    pub fn handle_client_signal(&self, from: &PeerId, signal: ClientSignal) {
        if let ClientSignal::JoinRoom { local_id, room_id } = signal {
            if local_id != *from {
                warn!(
                    "Peer {} announced id {}; using the connection id",
                    from, local_id
                );
            }
            self.join_room(from, room_id);
            return;
        }

        let Some(to) = signal.recipient().cloned() else {
            return;
        };
        if !self.inner.directory.same_room(from, &to) {
            warn!("Dropping signal from {} to {}: not in the same room", from, to);
            return;
        }
        if let Some(forwarded) = signal.forwarded_from(from.clone()) {
            self.send_signal(&to, forwarded);
        }
    }

    fn join_room(&self, peer_id: &PeerId, room_id: RoomId) {
        match self.inner.directory.join(peer_id, &room_id) {
            JoinOutcome::Joined { others } => {
                self.send_signal(
                    peer_id,
                    ServerSignal::RoomJoined {
                        local_id: peer_id.clone(),
                        room_id,
                    },
                );
                for other in others {
                    self.send_signal(
                        &other,
                        ServerSignal::UserJoined {
                            remote_peer_id: peer_id.clone(),
                        },
                    );
                    self.send_signal(
                        peer_id,
                        ServerSignal::UserJoined {
                            remote_peer_id: other,
                        },
                    );
                }
            }
            JoinOutcome::Full => {
                info!("Room {} is full; refusing {}", room_id, peer_id);
                self.send_signal(peer_id, ServerSignal::RoomFull { room_id });
            }
        }
    }
}

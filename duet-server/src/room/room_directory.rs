use dashmap::DashMap;
use duet_core::{PeerId, RoomId};
use tracing::{debug, info};

/// Two callers per room.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Joined; `others` are the occupants already present.
    Joined { others: Vec<PeerId> },
    Full,
}

/// Who is in which room.
#[derive(Default)]
pub struct RoomDirectory {
    rooms: DashMap<RoomId, Vec<PeerId>>,
    membership: DashMap<PeerId, RoomId>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `peer` in `room`, leaving any room it was in before.
    pub fn join(&self, peer: &PeerId, room: &RoomId) -> JoinOutcome {
        if self.room_of(peer).is_some_and(|current| current != *room) {
            self.leave(peer);
        }

        let others = {
            let mut occupants = self.rooms.entry(room.clone()).or_default();
            if occupants.contains(peer) {
                debug!("Peer {} already in room {}", peer, room);
            } else if occupants.len() >= ROOM_CAPACITY {
                return JoinOutcome::Full;
            } else {
                occupants.push(peer.clone());
            }
            occupants
                .iter()
                .filter(|p| *p != peer)
                .cloned()
                .collect::<Vec<_>>()
        };

        self.membership.insert(peer.clone(), room.clone());
        info!("Peer {} joined room {} ({} others)", peer, room, others.len());
        JoinOutcome::Joined { others }
    }

    /// Removes `peer` from its room. Returns the room and who is still in it.
    pub fn leave(&self, peer: &PeerId) -> Option<(RoomId, Vec<PeerId>)> {
        let (_, room) = self.membership.remove(peer)?;

        let remaining = {
            let mut occupants = self.rooms.get_mut(&room)?;
            occupants.retain(|p| p != peer);
            occupants.clone()
        };
        if remaining.is_empty() {
            self.rooms.remove_if(&room, |_, occupants| occupants.is_empty());
        }

        info!("Peer {} left room {}", peer, room);
        Some((room, remaining))
    }

    pub fn room_of(&self, peer: &PeerId) -> Option<RoomId> {
        self.membership.get(peer).map(|r| r.value().clone())
    }

    pub fn occupants(&self, room: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room)
            .map(|o| o.value().clone())
            .unwrap_or_default()
    }

    pub fn same_room(&self, a: &PeerId, b: &PeerId) -> bool {
        match (self.room_of(a), self.room_of(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }
}

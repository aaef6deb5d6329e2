use crate::model::description::SessionDescription;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Named events a client sends to the directory.
///
/// Directed events carry the recipient in `to`; the directory rewrites it to
/// `from` when forwarding (see [`ServerSignal`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientSignal {
    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom { local_id: PeerId, room_id: RoomId },

    #[serde(rename = "call-user")]
    CallUser {
        to: PeerId,
        offer: SessionDescription,
    },

    #[serde(rename = "call-accepted")]
    CallAccepted {
        to: PeerId,
        answer: SessionDescription,
    },

    #[serde(rename = "peer:nego:needed")]
    NegotiationNeeded {
        to: PeerId,
        offer: SessionDescription,
    },

    #[serde(rename = "peer:nego:final", alias = "peer:nego:done")]
    NegotiationFinal {
        to: PeerId,
        #[serde(rename = "ans")]
        answer: SessionDescription,
    },

    #[serde(rename = "end-call")]
    EndCall { to: PeerId },
}

/// Named events the directory delivers to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerSignal {
    /// Acknowledges a `join-room` request.
    #[serde(rename = "join-room", rename_all = "camelCase")]
    RoomJoined { local_id: PeerId, room_id: RoomId },

    #[serde(rename = "room-full", rename_all = "camelCase")]
    RoomFull { room_id: RoomId },

    #[serde(rename = "user-joined", rename_all = "camelCase")]
    UserJoined { remote_peer_id: PeerId },

    #[serde(rename = "user-left", rename_all = "camelCase")]
    UserLeft { remote_peer_id: PeerId },

    #[serde(rename = "incomming-call")]
    IncomingCall {
        from: PeerId,
        offer: SessionDescription,
    },

    #[serde(rename = "call-accepted")]
    CallAccepted {
        from: PeerId,
        answer: SessionDescription,
    },

    #[serde(rename = "peer:nego:needed")]
    NegotiationNeeded {
        from: PeerId,
        offer: SessionDescription,
    },

    #[serde(rename = "peer:nego:final")]
    NegotiationFinal {
        from: PeerId,
        #[serde(rename = "ans")]
        answer: SessionDescription,
    },

    #[serde(rename = "call-ended")]
    CallEnded {},
}

impl ClientSignal {
    /// Recipient of a directed event. `join-room` has none.
    pub fn recipient(&self) -> Option<&PeerId> {
        match self {
            ClientSignal::JoinRoom { .. } => None,
            ClientSignal::CallUser { to, .. }
            | ClientSignal::CallAccepted { to, .. }
            | ClientSignal::NegotiationNeeded { to, .. }
            | ClientSignal::NegotiationFinal { to, .. }
            | ClientSignal::EndCall { to } => Some(to),
        }
    }

    /// Rewrites a directed event into what its recipient receives.
    pub fn forwarded_from(self, from: PeerId) -> Option<ServerSignal> {
        match self {
            ClientSignal::JoinRoom { .. } => None,
            ClientSignal::CallUser { offer, .. } => Some(ServerSignal::IncomingCall { from, offer }),
            ClientSignal::CallAccepted { answer, .. } => {
                Some(ServerSignal::CallAccepted { from, answer })
            }
            ClientSignal::NegotiationNeeded { offer, .. } => {
                Some(ServerSignal::NegotiationNeeded { from, offer })
            }
            ClientSignal::NegotiationFinal { answer, .. } => {
                Some(ServerSignal::NegotiationFinal { from, answer })
            }
            ClientSignal::EndCall { .. } => Some(ServerSignal::CallEnded {}),
        }
    }
}

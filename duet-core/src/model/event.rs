use crate::model::description::SessionDescription;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use crate::model::signaling::ServerSignal;

/// Signaling events as the call state machine sees them, independent of wire names.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    JoinRequest {
        room_id: RoomId,
    },
    Joined {
        remote_peer_id: PeerId,
    },
    Left {
        remote_peer_id: PeerId,
    },
    Rejected {
        room_id: RoomId,
    },
    CallOffer {
        from: PeerId,
        offer: SessionDescription,
    },
    CallAnswer {
        answer: SessionDescription,
    },
    RenegotiationOffer {
        from: PeerId,
        offer: SessionDescription,
    },
    RenegotiationAnswer {
        answer: SessionDescription,
    },
    CallEnded,
}

impl ServerSignal {
    /// Maps an inbound wire event to its domain event.
    ///
    /// The `join-room` acknowledgement carries nothing the session needs and maps to `None`.
    pub fn into_event(self) -> Option<SignalingEvent> {
        match self {
            ServerSignal::RoomJoined { .. } => None,
            ServerSignal::RoomFull { room_id } => Some(SignalingEvent::Rejected { room_id }),
            ServerSignal::UserJoined { remote_peer_id } => {
                Some(SignalingEvent::Joined { remote_peer_id })
            }
            ServerSignal::UserLeft { remote_peer_id } => {
                Some(SignalingEvent::Left { remote_peer_id })
            }
            ServerSignal::IncomingCall { from, offer } => {
                Some(SignalingEvent::CallOffer { from, offer })
            }
            ServerSignal::CallAccepted { answer, .. } => Some(SignalingEvent::CallAnswer { answer }),
            ServerSignal::NegotiationNeeded { from, offer } => {
                Some(SignalingEvent::RenegotiationOffer { from, offer })
            }
            ServerSignal::NegotiationFinal { answer, .. } => {
                Some(SignalingEvent::RenegotiationAnswer { answer })
            }
            ServerSignal::CallEnded {} => Some(SignalingEvent::CallEnded),
        }
    }
}

use crate::error::SignalingError;
use duet_core::{ClientSignal, PeerId, SessionDescription};

/// What the session asks to send to the remote peer.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundSignal {
    CallOffer {
        to: PeerId,
        offer: SessionDescription,
    },
    CallAnswer {
        to: PeerId,
        answer: SessionDescription,
    },
    RenegotiationOffer {
        to: PeerId,
        offer: SessionDescription,
    },
    RenegotiationAnswer {
        to: PeerId,
        answer: SessionDescription,
    },
    EndCall {
        to: PeerId,
    },
}

impl OutboundSignal {
    pub fn into_client_signal(self) -> ClientSignal {
        match self {
            OutboundSignal::CallOffer { to, offer } => ClientSignal::CallUser { to, offer },
            OutboundSignal::CallAnswer { to, answer } => ClientSignal::CallAccepted { to, answer },
            OutboundSignal::RenegotiationOffer { to, offer } => {
                ClientSignal::NegotiationNeeded { to, offer }
            }
            OutboundSignal::RenegotiationAnswer { to, answer } => {
                ClientSignal::NegotiationFinal { to, answer }
            }
            OutboundSignal::EndCall { to } => ClientSignal::EndCall { to },
        }
    }
}

/// Seam between the session and whatever carries its signals.
///
/// Delivery is fire-and-forget: an error means the signal never left this process.
pub trait SignalingOutput: Send + Sync {
    fn deliver(&self, signal: OutboundSignal) -> Result<(), SignalingError>;
}

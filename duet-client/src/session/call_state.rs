use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    /// Joined the room, nobody else there yet.
    Idle,
    WaitingForRemote,
    /// Our offer is out, no answer yet.
    Calling,
    /// Holding the remote's offer until it is answered.
    IncomingPending,
    /// Renegotiating an established call.
    Negotiating,
    Connected,
    Ending,
    Ended,
}

impl CallState {
    pub fn is_ended(&self) -> bool {
        *self == CallState::Ended
    }

    /// Teardown has started or finished.
    pub fn is_closing(&self) -> bool {
        matches!(self, CallState::Ending | CallState::Ended)
    }

    /// A call is established, so another one cannot be started.
    pub fn is_busy(&self) -> bool {
        matches!(self, CallState::Connected | CallState::Negotiating)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Idle => "idle",
            CallState::WaitingForRemote => "waiting for remote",
            CallState::Calling => "calling",
            CallState::IncomingPending => "incoming call pending",
            CallState::Negotiating => "negotiating",
            CallState::Connected => "connected",
            CallState::Ending => "ending",
            CallState::Ended => "ended",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    LocalEnd,
    RemoteEnd,
    TransportLost,
    /// The directory refused the join.
    Rejected,
}

use std::str::FromStr;

/// A line typed at the `duet join` prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Call,
    Accept,
    Cancel,
    End,
    /// Attach an extra video track.
    Track,
    /// Ask for local media again.
    Media,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "accept" | "a" => Ok(Self::Accept),
            "cancel" => Ok(Self::Cancel),
            "end" | "hangup" => Ok(Self::End),
            "track" => Ok(Self::Track),
            "media" => Ok(Self::Media),
            "status" | "s" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

pub const HELP: &str = "\
  call     start a call with the other peer
  accept   answer a pending incoming call
  cancel   withdraw an outgoing call or decline an incoming one
  end      hang up
  track    attach an extra video track (renegotiates)
  media    retry local media
  status   show the current session
  quit     end the call and exit";

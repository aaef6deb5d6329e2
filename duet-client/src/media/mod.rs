mod source;
mod synthetic;
mod track;

pub use source::{DeniedSource, MediaConstraints, MediaSource};
pub use synthetic::SyntheticSource;
pub use track::{LocalStream, LocalTrack, RemoteStream, RemoteTrack, TrackKind};

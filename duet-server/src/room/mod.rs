mod room_directory;

pub use room_directory::{JoinOutcome, ROOM_CAPACITY, RoomDirectory};

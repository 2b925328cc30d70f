pub use huddle_core::model::{ParticipantId, RoomCode};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod client {
    pub use huddle_client::*;
}

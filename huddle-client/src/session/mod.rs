mod command;
mod error;
mod event;
mod handle;
mod roster;
mod session;
mod status;

pub use error::{RoomError, SessionError};
pub use event::SessionEvent;
pub use handle::SessionHandle;
pub use roster::ParticipantInfo;
pub use session::Session;
pub use status::{aggregate, SessionStatus};

pub mod constants;
pub mod error;
pub mod session;

pub use constants::*;
pub use error::{RealtimeError, Result};
pub use session::SessionId;

//! Shared helpers: the error taxonomy and the session clock.

pub mod error;
pub mod time;

pub use error::{SessionError, SessionResult};
pub use time::now_utc_ms;

//! Session lifecycle
//!
//! The controller is the single owner of a recording attempt: it gates
//! transitions, fans commands out to samplers/monitor/camera and reduces the
//! frozen buffers into a [`SessionOutcome`] at stop.

pub mod controller;
pub mod state;

pub use controller::{SessionController, SessionEvent};
pub use state::{SessionConfig, SessionOutcome, SessionState, SessionStats};

//! Recording session orchestration core for field inspection capture.
//!
//! Owns the lifecycle of one recording attempt: camera/encoder commands,
//! GPS and gyroscope telemetry sampling, resource monitoring, heuristic
//! discovery of the in-progress output file, and finalization of the video
//! plus its JSON sidecars.

pub mod artifact;
pub mod camera;
pub mod locator;
pub mod monitor;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod utils;

pub use session::{SessionController, SessionEvent, SessionOutcome, SessionState};
pub use settings::RecordingSettings;
pub use utils::{SessionError, SessionResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for embedding binaries. `RUST_LOG` overrides
/// the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inspecttrack_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

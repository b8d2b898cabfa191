//! Error types and handling
//!
//! Failure taxonomy for the session core. Failures local to one sampler or
//! probe never surface here; they are logged and skipped at the source. Only
//! lifecycle-level failures (permissions, encoder start/finalize, invalid
//! transitions) abort an operation.

use crate::session::SessionState;
use thiserror::Error;

/// Session-level error type
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("hardware unavailable: {0}")]
    HardwareUnavailable(String),

    #[error("recording failed to start: {0}")]
    RecordingStartFailure(String),

    #[error("recording runtime error: {0}")]
    RecordingRuntimeError(String),

    #[error("{operation}() not allowed from {from:?}")]
    InvalidTransition {
        operation: &'static str,
        from: SessionState,
    },

    #[error("artifact finalization failed: {0}")]
    Artifact(#[from] crate::artifact::ArtifactError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;

//! External collaborator contracts
//!
//! The session core never talks to camera SDKs or sensor hardware directly.
//! It drives these narrow traits and consumes their async results, which is
//! also what makes the whole lifecycle testable without a device.

pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Camera-level errors
#[derive(Error, Debug, Clone)]
pub enum CameraError {
    #[error("encoder start failed: {0}")]
    StartFailed(String),

    #[error("encoder finalize failed: {0}")]
    FinalizeFailed(String),

    #[error("focus failed: {0}")]
    FocusFailed(String),
}

/// Camera and microphone permission snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    pub camera: bool,
    pub microphone: bool,
}

impl PermissionStatus {
    pub fn granted(&self) -> bool {
        self.camera && self.microphone
    }
}

/// Normalized focus point, both axes in `0.0..=1.0`.
#[derive(Debug, Clone, Copy)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

/// Narrow contract over the platform camera/encoder.
///
/// `start_recording` returns once the encoder accepted the command; the
/// encoder then runs on its own platform thread outside this core's control.
/// `stop_recording` resolves when the encoder finalized its container and
/// hands back the temp output path. Failures that happen mid-recording are
/// pushed on the runtime error stream.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Whether a usable device handle exists right now.
    fn is_available(&self) -> bool;

    fn permissions(&self) -> PermissionStatus;

    async fn start_recording(&self) -> Result<(), CameraError>;

    /// Finalize the encoder and return the path of the temp output file.
    async fn stop_recording(&self) -> Result<PathBuf, CameraError>;

    async fn focus(&self, point: FocusPoint) -> Result<(), CameraError>;

    /// Suspend or restore camera activity (app background handling). Must be
    /// a no-op while a recording is in flight.
    fn set_active(&self, active: bool);

    /// Errors the encoder raises while a recording is in flight.
    fn runtime_errors(&self) -> broadcast::Receiver<String>;
}

/// One successful GPS fix
#[derive(Debug, Clone, Copy)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

/// GPS provider errors
#[derive(Error, Debug, Clone)]
pub enum GpsError {
    #[error("GPS fix timed out")]
    Timeout,

    #[error("GPS unavailable: {0}")]
    Unavailable(String),
}

/// Active single-fix positioning.
#[async_trait]
pub trait GpsProvider: Send + Sync {
    /// Request one fresh fix (maximum age zero) within `timeout`.
    async fn current_position(&self, timeout: Duration) -> Result<GpsFix, GpsError>;
}

/// Raw gyroscope reading in rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GyroReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Push stream of raw gyroscope events.
pub trait GyroscopeStream: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<GyroReading>;
}

//! In-memory collaborator doubles
//!
//! Deterministic stand-ins for the camera, GPS and gyroscope used by the
//! test suite and by downstream integration harnesses.

use super::{
    CameraDevice, CameraError, FocusPoint, GpsError, GpsFix, GpsProvider, GyroReading,
    GyroscopeStream, PermissionStatus,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

/// Scripted camera: records to a temp directory, optionally failing on
/// start or finalize.
pub struct MockCamera {
    temp_dir: PathBuf,
    fail_start: bool,
    fail_finalize: bool,
    permissions: PermissionStatus,
    active: AtomicBool,
    recording: AtomicBool,
    error_tx: broadcast::Sender<String>,
}

impl MockCamera {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        let (error_tx, _) = broadcast::channel(16);
        Self {
            temp_dir: temp_dir.into(),
            fail_start: false,
            fail_finalize: false,
            permissions: PermissionStatus {
                camera: true,
                microphone: true,
            },
            active: AtomicBool::new(true),
            recording: AtomicBool::new(false),
            error_tx,
        }
    }

    pub fn failing_on_start(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            fail_start: true,
            ..Self::new(temp_dir)
        }
    }

    pub fn failing_on_finalize(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            fail_finalize: true,
            ..Self::new(temp_dir)
        }
    }

    pub fn without_permissions(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            permissions: PermissionStatus {
                camera: false,
                microphone: false,
            },
            ..Self::new(temp_dir)
        }
    }

    /// Inject a runtime encoder error, as the platform SDK would.
    pub fn push_runtime_error(&self, message: &str) {
        let _ = self.error_tx.send(message.to_string());
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevice for MockCamera {
    fn is_available(&self) -> bool {
        true
    }

    fn permissions(&self) -> PermissionStatus {
        self.permissions
    }

    async fn start_recording(&self) -> Result<(), CameraError> {
        if self.fail_start {
            return Err(CameraError::StartFailed("scripted start failure".into()));
        }
        self.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_recording(&self) -> Result<PathBuf, CameraError> {
        self.recording.store(false, Ordering::SeqCst);
        if self.fail_finalize {
            return Err(CameraError::FinalizeFailed(
                "scripted finalize failure".into(),
            ));
        }
        let path = self
            .temp_dir
            .join(format!("rec_{}.mp4", uuid::Uuid::new_v4()));
        // Minimal mp4 ftyp box so the artifact is a non-empty video-like file.
        std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42")
            .map_err(|e| CameraError::FinalizeFailed(e.to_string()))?;
        Ok(path)
    }

    async fn focus(&self, _point: FocusPoint) -> Result<(), CameraError> {
        Ok(())
    }

    fn set_active(&self, active: bool) {
        if !self.recording.load(Ordering::SeqCst) {
            self.active.store(active, Ordering::SeqCst);
        }
    }

    fn runtime_errors(&self) -> broadcast::Receiver<String> {
        self.error_tx.subscribe()
    }
}

/// GPS provider that pops fixes off a script; an exhausted script times out,
/// which the sampler treats as a skipped sample.
pub struct ScriptedGps {
    fixes: Mutex<VecDeque<GpsFix>>,
}

impl ScriptedGps {
    pub fn new(fixes: Vec<GpsFix>) -> Self {
        Self {
            fixes: Mutex::new(fixes.into()),
        }
    }

    /// A provider whose every request times out.
    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl GpsProvider for ScriptedGps {
    async fn current_position(&self, _timeout: Duration) -> Result<GpsFix, GpsError> {
        self.fixes.lock().pop_front().ok_or(GpsError::Timeout)
    }
}

/// Gyroscope stream driven by explicit `emit` calls.
pub struct MockGyro {
    tx: broadcast::Sender<GyroReading>,
}

impl MockGyro {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn emit(&self, reading: GyroReading) {
        let _ = self.tx.send(reading);
    }
}

impl Default for MockGyro {
    fn default() -> Self {
        Self::new()
    }
}

impl GyroscopeStream for MockGyro {
    fn subscribe(&self) -> broadcast::Receiver<GyroReading> {
        self.tx.subscribe()
    }
}

//! Session lifecycle orchestration
//!
//! One controller owns the whole pipeline: samplers, resource monitor, file
//! locator and the camera collaborator. `start`/`stop`/`cancel` take
//! `&mut self`, so a caller that needs concurrent access serializes behind a
//! mutex; out-of-state calls are rejected, never queued.

use crate::artifact::{ArtifactWriter, FinalizeRequest};
use crate::camera::{CameraDevice, FocusPoint, GpsProvider, GyroscopeStream};
use crate::locator::RecordingFileLocator;
use crate::monitor::{ResourceMonitor, ResourceProbe};
use crate::telemetry::{GpsSampler, GyroSampler};
use crate::utils::{now_utc_ms, SessionError, SessionResult};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::state::{SessionConfig, SessionOutcome, SessionState, SessionStats};

/// Cadence of the live file-size estimate while recording.
const LOCATOR_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle notifications for UI layers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started { session_id: Uuid },
    Stopped { session_id: Uuid },
    Cancelled { session_id: Uuid },
    /// Genuine encoder runtime error; the session was torn down.
    Error(String),
    /// Best-guess size of the in-progress recording, bytes.
    RecordingFileSize(u64),
}

/// Encoder errors raised around app backgrounding self-heal on foreground;
/// everything else is genuine.
fn is_background_related(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["session", "interrupted", "background"]
        .iter()
        .any(|needle| message.contains(needle))
}

pub struct SessionController {
    config: SessionConfig,
    camera: Arc<dyn CameraDevice>,
    gps: Arc<GpsSampler>,
    gyro: Arc<GyroSampler>,
    monitor: Arc<ResourceMonitor>,
    locator: Arc<Mutex<RecordingFileLocator>>,
    state: Arc<RwLock<SessionState>>,
    backgrounded: Arc<AtomicBool>,
    session_id: Option<Uuid>,
    start_utc_ms: Option<i64>,
    events: broadcast::Sender<SessionEvent>,
    locator_poll: Arc<Mutex<Option<JoinHandle<()>>>>,
    runtime_listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Wires up samplers, monitor and the runtime-error listener. Must be
    /// called inside a tokio runtime; background tasks start immediately.
    pub fn new(
        config: SessionConfig,
        camera: Arc<dyn CameraDevice>,
        gps_provider: Arc<dyn GpsProvider>,
        gyro_stream: &dyn GyroscopeStream,
        probe: Box<dyn ResourceProbe>,
    ) -> Self {
        let interval = config.settings.gps.interval();
        let gps = Arc::new(GpsSampler::new(gps_provider, interval));
        // The gyro sampling timer reuses the GPS interval.
        let gyro = Arc::new(GyroSampler::new(gyro_stream, interval));
        let locator = Arc::new(Mutex::new(RecordingFileLocator::new(
            config.locator.clone(),
        )));
        let monitor = Arc::new(ResourceMonitor::new(
            probe,
            Arc::clone(&locator),
            config.monitor_interval,
        ));
        let state = Arc::new(RwLock::new(SessionState::Idle));
        let backgrounded = Arc::new(AtomicBool::new(false));
        let (events, _) = broadcast::channel(64);
        let locator_poll = Arc::new(Mutex::new(None));

        let listener = Self::spawn_runtime_listener(
            Arc::clone(&camera),
            Arc::clone(&gps),
            Arc::clone(&gyro),
            Arc::clone(&monitor),
            Arc::clone(&state),
            Arc::clone(&backgrounded),
            Arc::clone(&locator_poll),
            events.clone(),
        );

        Self {
            config,
            camera,
            gps,
            gyro,
            monitor,
            locator,
            state,
            backgrounded,
            session_id: None,
            start_utc_ms: None,
            events,
            locator_poll,
            runtime_listener: Mutex::new(Some(listener)),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Begin a session. Valid only from `Idle`.
    pub async fn start(&mut self) -> SessionResult<Uuid> {
        let current = self.state();
        if current != SessionState::Idle {
            return Err(SessionError::InvalidTransition {
                operation: "start",
                from: current,
            });
        }
        let permissions = self.camera.permissions();
        if !permissions.granted() {
            return Err(SessionError::PermissionDenied(format!(
                "camera: {}, microphone: {}",
                permissions.camera, permissions.microphone
            )));
        }
        if !self.camera.is_available() {
            return Err(SessionError::HardwareUnavailable(
                "no usable camera device".into(),
            ));
        }

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.start_utc_ms = Some(now_utc_ms());
        self.backgrounded.store(false, Ordering::SeqCst);

        self.gyro.start();
        if self.config.settings.metadata.gps_sync {
            self.gps.start();
        } else {
            tracing::info!("gpsSync disabled, skipping GPS collection");
            self.gps.clear();
        }
        self.monitor.begin_session();
        self.locator.lock().invalidate();
        self.spawn_locator_poll();

        if let Err(err) = self.camera.start_recording().await {
            tracing::warn!("encoder refused to start: {err}");
            self.teardown_session_tasks();
            self.monitor.cancel_session();
            self.session_id = None;
            self.start_utc_ms = None;
            return Err(SessionError::RecordingStartFailure(err.to_string()));
        }

        *self.state.write() = SessionState::Recording;
        // Give freshly spawned samplers their first tick before the caller
        // observes Recording.
        tokio::task::yield_now().await;
        tracing::info!("session {session_id} recording");
        let _ = self.events.send(SessionEvent::Started { session_id });
        Ok(session_id)
    }

    /// Stop and finalize. Valid only from `Recording`.
    pub async fn stop(&mut self) -> SessionResult<SessionOutcome> {
        let current = self.state();
        if current != SessionState::Recording {
            return Err(SessionError::InvalidTransition {
                operation: "stop",
                from: current,
            });
        }
        
        *self.state.write() = SessionState::Stopping;
        self.teardown_session_tasks();
        let end_utc_ms = now_utc_ms();
        let resources = self.monitor.end_session();

        let temp_video = match self.camera.stop_recording().await {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!("encoder finalize failed: {err}");
                *self.state.write() = SessionState::Idle;
                self.session_id = None;
                return Err(SessionError::RecordingRuntimeError(err.to_string()));
            }
        };

        *self.state.write() = SessionState::Finalizing;
        self.locator.lock().invalidate();

        let session_id = self.session_id.take().unwrap_or_else(Uuid::new_v4);
        let start_utc_ms = self.start_utc_ms.take().unwrap_or(end_utc_ms);
        let request = FinalizeRequest {
            temp_video,
            dest_dir: self.config.dest_dir.clone(),
            start_utc_ms,
            end_utc_ms,
            settings: self.config.settings.clone(),
            zoom: self.config.zoom,
            gps_points: self.gps.points().lock().clone(),
            gyro_points: self.gyro.points().lock().clone(),
        };
        let (paths, verification) = match ArtifactWriter::finalize(&request) {
            Ok(result) => result,
            Err(err) => {
                *self.state.write() = SessionState::Idle;
                return Err(err.into());
            }
        };

        let all_verified = verification.all_verified();
        let terminal = if all_verified {
            SessionState::Completed
        } else {
            SessionState::Failed
        };
        *self.state.write() = terminal;

        let outcome = SessionOutcome {
            session_id,
            state: terminal,
            start_utc_ms,
            end_utc_ms,
            duration_secs: (end_utc_ms - start_utc_ms).max(0) as f64 / 1000.0,
            stats: SessionStats::from_resources(resources, self.gps.total_distance_km()),
            paths,
            verification,
            all_verified,
        };
        tracing::info!(
            "session {session_id} {:?} after {:.1}s",
            terminal,
            outcome.duration_secs
        );
        let _ = self.events.send(SessionEvent::Stopped { session_id });
        *self.state.write() = SessionState::Idle;
        Ok(outcome)
    }

    /// Abort without artifacts. Valid only from `Recording`. The encoder is
    /// still stopped so its resources are released; the temp video and all
    /// buffers are discarded.
    pub async fn cancel(&mut self) -> SessionResult<()> {
        let current = self.state();
        if current != SessionState::Recording {
            return Err(SessionError::InvalidTransition {
                operation: "cancel",
                from: current,
            });
        }
        self.teardown_session_tasks();
        self.monitor.cancel_session();
        self.gps.clear();
        self.gyro.clear();
        self.locator.lock().invalidate();

        match self.camera.stop_recording().await {
            Ok(temp_video) => {
                let _ = fs::remove_file(&temp_video);
            }
            Err(err) => tracing::debug!("encoder stop during cancel: {err}"),
        }

        *self.state.write() = SessionState::Idle;
        let session_id = self.session_id.take().unwrap_or_default();
        self.start_utc_ms = None;
        tracing::info!("session {session_id} cancelled");
        let _ = self.events.send(SessionEvent::Cancelled { session_id });
        Ok(())
    }

    /// Tap-to-focus passthrough, gated by the settings snapshot.
    pub async fn focus(&self, point: FocusPoint) -> SessionResult<()> {
        if !self.config.settings.camera.tap_to_focus_enabled {
            tracing::debug!("tap to focus disabled, ignoring");
            return Ok(());
        }
        self.camera
            .focus(point)
            .await
            .map_err(|err| SessionError::RecordingRuntimeError(err.to_string()))
    }

    /// A Recording session keeps sampling in the background; camera activity
    /// is suspended only when idle.
    pub fn handle_app_background(&self) {
        self.backgrounded.store(true, Ordering::SeqCst);
        if self.state() == SessionState::Recording {
            tracing::info!("app backgrounded mid-recording, session continues");
        } else {
            self.camera.set_active(false);
        }
    }

    /// Camera activity is restored unconditionally on foreground.
    pub fn handle_app_foreground(&self) {
        self.camera.set_active(true);
        self.backgrounded.store(false, Ordering::SeqCst);
    }

    fn spawn_locator_poll(&self) {
        let locator = Arc::clone(&self.locator);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(LOCATOR_POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let size = locator.lock().current_file_size_bytes();
                let _ = events.send(SessionEvent::RecordingFileSize(size));
            }
        });
        *self.locator_poll.lock() = Some(task);
    }

    /// Abort samplers and locator polling; buffered telemetry stays frozen.
    fn teardown_session_tasks(&self) {
        self.gps.stop();
        self.gyro.stop();
        if let Some(task) = self.locator_poll.lock().take() {
            task.abort();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_runtime_listener(
        camera: Arc<dyn CameraDevice>,
        gps: Arc<GpsSampler>,
        gyro: Arc<GyroSampler>,
        monitor: Arc<ResourceMonitor>,
        state: Arc<RwLock<SessionState>>,
        backgrounded: Arc<AtomicBool>,
        locator_poll: Arc<Mutex<Option<JoinHandle<()>>>>,
        events: broadcast::Sender<SessionEvent>,
    ) -> JoinHandle<()> {
        let mut rx = camera.runtime_errors();
        tokio::spawn(async move {
            loop {
                let message = match rx.recv().await {
                    Ok(message) => message,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("encoder error stream lagged by {n}");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if *state.read() != SessionState::Recording {
                    continue;
                }
                if backgrounded.load(Ordering::SeqCst) && is_background_related(&message) {
                    tracing::info!("ignoring backgrounding-related encoder error: {message}");
                    continue;
                }

                tracing::warn!("encoder runtime error, tearing session down: {message}");
                gps.stop();
                gyro.stop();
                monitor.cancel_session();
                if let Some(task) = locator_poll.lock().take() {
                    task.abort();
                }
                *state.write() = SessionState::Idle;
                if let Ok(temp_video) = camera.stop_recording().await {
                    let _ = fs::remove_file(&temp_video);
                }
                let _ = events.send(SessionEvent::Error(message));
            }
        })
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown_session_tasks();
        if let Some(task) = self.runtime_listener.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::mock::{MockCamera, MockGyro, ScriptedGps};
    use crate::camera::GpsFix;
    use crate::locator::LocatorConfig;
    use crate::monitor::StorageInfo;
    use tempfile::{tempdir, TempDir};

    struct StubProbe;

    impl ResourceProbe for StubProbe {
        fn app_cpu_usage(&mut self) -> Option<f64> {
            Some(20.0)
        }

        fn memory_usage_mb(&mut self) -> Option<f64> {
            Some(1500.0)
        }

        fn storage_info(&mut self) -> Option<StorageInfo> {
            Some(StorageInfo {
                used_gb: 10.0,
                total_gb: 64.0,
            })
        }
    }

    fn walk_fixes() -> Vec<GpsFix> {
        (0..10)
            .map(|i| GpsFix {
                latitude: 0.0,
                longitude: 0.001 * i as f64,
                accuracy: Some(5.0),
            })
            .collect()
    }

    fn test_config(dest: &TempDir) -> SessionConfig {
        let mut config = SessionConfig::new(dest.path().to_path_buf());
        config.locator = LocatorConfig::new(vec![]);
        config.monitor_interval = Duration::from_millis(20);
        // 100 ms is the floor the settings layer enforces.
        config.settings.gps.update_interval = 0.1;
        config
    }

    fn controller_with(camera: Arc<MockCamera>, config: SessionConfig) -> SessionController {
        SessionController::new(
            config,
            camera,
            Arc::new(ScriptedGps::new(walk_fixes())),
            &MockGyro::new(),
            Box::new(StubProbe),
        )
    }

    #[tokio::test]
    async fn test_full_lifecycle_produces_verified_outcome() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller =
            controller_with(Arc::new(MockCamera::new(camera_dir.path())), test_config(&dest));
        let mut events = controller.subscribe();

        let session_id = controller.start().await.unwrap();
        assert_eq!(controller.state(), SessionState::Recording);
        tokio::time::sleep(Duration::from_millis(250)).await;

        let outcome = controller.stop().await.unwrap();
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(outcome.session_id, session_id);
        assert_eq!(outcome.state, SessionState::Completed);
        assert!(outcome.all_verified);
        assert!(outcome.end_utc_ms > outcome.start_utc_ms);
        assert!(outcome.paths.video.is_file());
        assert!(outcome.paths.gps.is_file());
        assert!(outcome.stats.total_distance_km > 0.0);
        assert!(outcome.stats.avg_cpu > 0.0);

        let mut started = false;
        let mut stopped = false;
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::Started { .. } => started = true,
                SessionEvent::Stopped { .. } => stopped = true,
                _ => {}
            }
        }
        assert!(started && stopped);
    }

    #[tokio::test]
    async fn test_focus_respects_settings_gate() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let point = FocusPoint { x: 0.5, y: 0.5 };

        let controller =
            controller_with(Arc::new(MockCamera::new(camera_dir.path())), test_config(&dest));
        controller.focus(point).await.unwrap();

        let mut config = test_config(&dest);
        config.settings.camera.tap_to_focus_enabled = false;
        let controller = controller_with(Arc::new(MockCamera::new(camera_dir.path())), config);
        // Disabled tap-to-focus is a silent no-op, not an error.
        controller.focus(point).await.unwrap();
    }

    #[tokio::test]
    async fn test_immediate_stop_yields_one_gps_and_gyro_point() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller =
            controller_with(Arc::new(MockCamera::new(camera_dir.path())), test_config(&dest));

        controller.start().await.unwrap();
        let outcome = controller.stop().await.unwrap();

        assert!(outcome.duration_secs >= 0.0);
        let gps: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outcome.paths.gps).unwrap()).unwrap();
        assert_eq!(gps["gpsPoints"].as_array().unwrap().len(), 1);
        let gyro: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outcome.paths.gyroscope).unwrap()).unwrap();
        assert_eq!(gyro["gyroscopePoints"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_state_calls_are_rejected() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller =
            controller_with(Arc::new(MockCamera::new(camera_dir.path())), test_config(&dest));

        assert!(matches!(
            controller.stop().await.unwrap_err(),
            SessionError::InvalidTransition {
                operation: "stop",
                from: SessionState::Idle,
            }
        ));
        assert!(matches!(
            controller.cancel().await.unwrap_err(),
            SessionError::InvalidTransition { .. }
        ));

        controller.start().await.unwrap();
        assert!(matches!(
            controller.start().await.unwrap_err(),
            SessionError::InvalidTransition {
                operation: "start",
                from: SessionState::Recording,
            }
        ));
        controller.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_failure_rolls_back_to_idle() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller = controller_with(
            Arc::new(MockCamera::failing_on_start(camera_dir.path())),
            test_config(&dest),
        );

        assert!(matches!(
            controller.start().await.unwrap_err(),
            SessionError::RecordingStartFailure(_)
        ));
        assert_eq!(controller.state(), SessionState::Idle);
        // Rolled back cleanly: the controller accepts another attempt.
        assert!(matches!(
            controller.start().await.unwrap_err(),
            SessionError::RecordingStartFailure(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_permissions_reject_start() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller = controller_with(
            Arc::new(MockCamera::without_permissions(camera_dir.path())),
            test_config(&dest),
        );
        assert!(matches!(
            controller.start().await.unwrap_err(),
            SessionError::PermissionDenied(_)
        ));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_finalize_failure_returns_to_idle() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller = controller_with(
            Arc::new(MockCamera::failing_on_finalize(camera_dir.path())),
            test_config(&dest),
        );
        controller.start().await.unwrap();
        assert!(matches!(
            controller.stop().await.unwrap_err(),
            SessionError::RecordingRuntimeError(_)
        ));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_discards_everything() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut controller =
            controller_with(Arc::new(MockCamera::new(camera_dir.path())), test_config(&dest));
        let mut events = controller.subscribe();

        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        controller.cancel().await.unwrap();

        assert_eq!(controller.state(), SessionState::Idle);
        // No artifacts written, temp video removed.
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(camera_dir.path()).unwrap().count(), 0);

        let mut cancelled = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::Cancelled { .. }) {
                cancelled = true;
            }
        }
        assert!(cancelled);
    }

    #[tokio::test]
    async fn test_runtime_error_tears_down_session() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let camera = Arc::new(MockCamera::new(camera_dir.path()));
        let mut controller = controller_with(Arc::clone(&camera), test_config(&dest));
        let mut events = controller.subscribe();

        controller.start().await.unwrap();
        camera.push_runtime_error("encoder pipeline died");
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(controller.state(), SessionState::Idle);
        let mut errored = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::Error(_)) {
                errored = true;
            }
        }
        assert!(errored);
        // No artifacts from a torn-down session.
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_backgrounding_error_is_ignored_while_backgrounded() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let camera = Arc::new(MockCamera::new(camera_dir.path()));
        let mut controller = controller_with(Arc::clone(&camera), test_config(&dest));

        controller.start().await.unwrap();
        controller.handle_app_background();
        camera.push_runtime_error("Recording session was interrupted");
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Self-heals on foreground; the session is still live.
        assert_eq!(controller.state(), SessionState::Recording);
        controller.handle_app_foreground();
        let outcome = controller.stop().await.unwrap();
        assert_eq!(outcome.state, SessionState::Completed);
    }

    #[tokio::test]
    async fn test_background_suspends_camera_only_when_idle() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let camera = Arc::new(MockCamera::new(camera_dir.path()));
        let mut controller = controller_with(Arc::clone(&camera), test_config(&dest));

        controller.handle_app_background();
        assert!(!camera.is_active());
        controller.handle_app_foreground();
        assert!(camera.is_active());

        controller.start().await.unwrap();
        controller.handle_app_background();
        assert!(camera.is_active(), "recording must keep the camera active");
        controller.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_gps_sync_disabled_skips_collection() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut config = test_config(&dest);
        config.settings.metadata.gps_sync = false;
        let mut controller = controller_with(Arc::new(MockCamera::new(camera_dir.path())), config);

        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        let outcome = controller.stop().await.unwrap();

        assert_eq!(outcome.stats.total_distance_km, 0.0);
        let gps: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outcome.paths.gps).unwrap()).unwrap();
        assert_eq!(gps["gpsPoints"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_file_size_events_while_recording() {
        let dest = tempdir().unwrap();
        let camera_dir = tempdir().unwrap();
        let mut config = test_config(&dest);
        config.locator = LocatorConfig::new(vec![camera_dir.path().to_path_buf()]);
        let mut controller = controller_with(Arc::new(MockCamera::new(camera_dir.path())), config);
        let mut events = controller.subscribe();

        controller.start().await.unwrap();
        fs::write(camera_dir.path().join("scratch.mp4"), vec![0u8; 4096]).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        controller.stop().await.unwrap();

        let mut sizes = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::RecordingFileSize(size) = event {
                sizes.push(size);
            }
        }
        assert!(sizes.iter().any(|s| *s == 4096));
    }

    #[test]
    fn test_background_error_classification() {
        assert!(is_background_related("AVCaptureSession was interrupted"));
        assert!(is_background_related("app moved to BACKGROUND"));
        assert!(!is_background_related("disk full"));
    }
}

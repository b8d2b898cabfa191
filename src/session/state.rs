//! Session state and outcome types

use crate::artifact::{ArtifactPaths, VerificationReport};
use crate::locator::LocatorConfig;
use crate::monitor::{ResourceStats, DEFAULT_POLL_INTERVAL};
use crate::settings::RecordingSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle states of one recording session.
///
/// `Completed` and `Failed` are terminal and only ever observed in a
/// [`SessionOutcome`]; the controller itself settles back on `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
    Finalizing,
    Completed,
    Failed,
}

/// Aggregates derived at stop from the frozen buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub avg_cpu: f64,
    pub highest_cpu: f64,
    pub avg_memory_gb: f64,
    pub highest_memory_gb: f64,
    pub total_distance_km: f64,
}

impl SessionStats {
    pub(crate) fn from_resources(resources: ResourceStats, total_distance_km: f64) -> Self {
        Self {
            avg_cpu: resources.avg_cpu,
            highest_cpu: resources.highest_cpu,
            avg_memory_gb: resources.avg_memory_gb,
            highest_memory_gb: resources.highest_memory_gb,
            total_distance_km,
        }
    }
}

/// Everything a finished session hands to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: Uuid,
    /// Terminal state: `Completed`, or `Failed` on a partial save.
    pub state: SessionState,
    pub start_utc_ms: i64,
    pub end_utc_ms: i64,
    pub duration_secs: f64,
    pub stats: SessionStats,
    pub paths: ArtifactPaths,
    pub verification: VerificationReport,
    pub all_verified: bool,
}

/// Static configuration for a controller instance
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub settings: RecordingSettings,
    /// Final destination for videos and sidecars.
    pub dest_dir: PathBuf,
    /// Zoom factor recorded into the settings sidecar.
    pub zoom: f64,
    pub locator: LocatorConfig,
    pub monitor_interval: Duration,
}

impl SessionConfig {
    pub fn new(dest_dir: PathBuf) -> Self {
        Self {
            settings: RecordingSettings::default(),
            dest_dir,
            zoom: 1.0,
            locator: LocatorConfig::default(),
            monitor_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

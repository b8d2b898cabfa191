//! Artifact finalization
//!
//! Moves the encoder's temp video to its destination and writes the three
//! JSON sidecars next to it. The video move is the only fatal step; sidecar
//! writes are fail-soft and reported per file in the verification map.
//! Nothing is retried, rolled back, or deleted on failure.

use crate::settings::RecordingSettings;
use crate::telemetry::{GpsPoint, GyroPoint};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sidecar serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("temp video missing at {0:?}")]
    MissingVideo(PathBuf),
}

/// The four files a completed session produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    Video,
    Gps,
    Gyroscope,
    CameraSettings,
}

/// Final destination paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPaths {
    pub video: PathBuf,
    pub gps: PathBuf,
    pub gyroscope: PathBuf,
    pub camera_settings: PathBuf,
}

impl ArtifactPaths {
    fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Video => &self.video,
            ArtifactKind::Gps => &self.gps,
            ArtifactKind::Gyroscope => &self.gyroscope,
            ArtifactKind::CameraSettings => &self.camera_settings,
        }
    }
}

/// Per-file existence check after finalization
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub files: BTreeMap<ArtifactKind, bool>,
}

impl VerificationReport {
    pub fn all_verified(&self) -> bool {
        !self.files.is_empty() && self.files.values().all(|ok| *ok)
    }

    /// Kinds whose file was not found on disk.
    pub fn failed(&self) -> Vec<ArtifactKind> {
        self.files
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GpsSidecar<'a> {
    recording_start_time: i64,
    recording_end_time: i64,
    total_frames: u64,
    frame_rate: u32,
    video_resolution: crate::settings::Resolution,
    timestamp_format: &'a str,
    gps_points: &'a [GpsPoint],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GyroSidecar<'a> {
    recording_start_time: i64,
    recording_end_time: i64,
    total_frames: u64,
    frame_rate: u32,
    video_resolution: crate::settings::Resolution,
    timestamp_format: &'a str,
    gyroscope_points: &'a [GyroPoint],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CameraSettingsSidecar {
    recording_start_time: i64,
    recording_end_time: i64,
    fps: u32,
    resolution: crate::settings::Resolution,
    exposure: f64,
    exposure_min: f64,
    exposure_max: f64,
    iso: u32,
    hdr: bool,
    tap_to_focus_enabled: bool,
    zoom: f64,
    lens: String,
}

/// Everything finalization needs, captured when the encoder hands back its
/// output path.
pub struct FinalizeRequest {
    pub temp_video: PathBuf,
    pub dest_dir: PathBuf,
    pub start_utc_ms: i64,
    pub end_utc_ms: i64,
    pub settings: RecordingSettings,
    pub zoom: f64,
    pub gps_points: Vec<GpsPoint>,
    pub gyro_points: Vec<GyroPoint>,
}

/// Writes the final video + sidecar set for one session.
pub struct ArtifactWriter;

impl ArtifactWriter {
    /// Move the video into place, write the sidecars, verify all four paths.
    ///
    /// Only a failed video move (or serialization of a sidecar payload)
    /// errors out; a failed sidecar write shows up as `false` in the report.
    pub fn finalize(
        request: &FinalizeRequest,
    ) -> Result<(ArtifactPaths, VerificationReport), ArtifactError> {
        if !request.temp_video.exists() {
            return Err(ArtifactError::MissingVideo(request.temp_video.clone()));
        }
        fs::create_dir_all(&request.dest_dir)?;

        let base = format!("video_{}", request.start_utc_ms);
        let paths = ArtifactPaths {
            video: request.dest_dir.join(format!("{base}.mp4")),
            gps: request.dest_dir.join(format!("{base}_gps.json")),
            gyroscope: request.dest_dir.join(format!("{base}_gyroscope.json")),
            camera_settings: request
                .dest_dir
                .join(format!("{base}_camera_settings.json")),
        };

        move_file(&request.temp_video, &paths.video)?;
        tracing::info!("video moved to {:?}", paths.video);

        let fps = request.settings.frame_rate.fps;
        let resolution = request.settings.video.resolution;
        let timestamp_format = request.settings.metadata.timestamp_format.as_str();
        let camera = &request.settings.camera;

        // `totalFrames` counts the points of that sidecar, not video frames.
        write_sidecar(
            &paths.gps,
            &GpsSidecar {
                recording_start_time: request.start_utc_ms,
                recording_end_time: request.end_utc_ms,
                total_frames: request.gps_points.len() as u64,
                frame_rate: fps,
                video_resolution: resolution,
                timestamp_format,
                gps_points: &request.gps_points,
            },
        )?;
        write_sidecar(
            &paths.gyroscope,
            &GyroSidecar {
                recording_start_time: request.start_utc_ms,
                recording_end_time: request.end_utc_ms,
                total_frames: request.gyro_points.len() as u64,
                frame_rate: fps,
                video_resolution: resolution,
                timestamp_format,
                gyroscope_points: &request.gyro_points,
            },
        )?;
        write_sidecar(
            &paths.camera_settings,
            &CameraSettingsSidecar {
                recording_start_time: request.start_utc_ms,
                recording_end_time: request.end_utc_ms,
                fps,
                resolution,
                exposure: camera.exposure,
                exposure_min: camera.exposure_min,
                exposure_max: camera.exposure_max,
                iso: camera.iso,
                hdr: camera.hdr,
                tap_to_focus_enabled: camera.tap_to_focus_enabled,
                zoom: request.zoom,
                lens: format!("{}x", request.zoom),
            },
        )?;

        let mut report = VerificationReport::default();
        for kind in [
            ArtifactKind::Video,
            ArtifactKind::Gps,
            ArtifactKind::Gyroscope,
            ArtifactKind::CameraSettings,
        ] {
            report.files.insert(kind, paths.get(kind).is_file());
        }
        if !report.all_verified() {
            tracing::warn!("partial save, missing artifacts: {:?}", report.failed());
        }

        Ok((paths, report))
    }
}

/// Rename when possible, copy + remove across devices.
fn move_file(from: &Path, to: &Path) -> Result<(), ArtifactError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    Ok(())
}

/// Serialization errors propagate; write errors only log, the verification
/// pass reports the missing file.
fn write_sidecar<T: Serialize>(path: &Path, payload: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(payload)?;
    if let Err(err) = fs::write(path, json) {
        tracing::warn!("sidecar write failed for {path:?}: {err}");
    }
    Ok(())
}

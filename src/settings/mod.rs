//! Recording settings snapshot
//!
//! The settings document a session is started with. The core treats this as
//! an immutable snapshot: it reads the sampling intervals from it and embeds
//! the camera section into the settings sidecar. Persistence of the document
//! itself is a caller concern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Video resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
    #[serde(rename = "4K")]
    R4k,
}

impl Resolution {
    /// Pixel dimensions as (width, height).
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::R720p => (1280, 720),
            Resolution::R1080p => (1920, 1080),
            Resolution::R4k => (3840, 2160),
        }
    }
}

/// Frame rate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRateSettings {
    pub fps: u32,
    pub capture_interval: u32,
    pub buffer_size: u32,
}

/// Video output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
    pub resolution: Resolution,
    pub codec: String,
    pub bitrate: u32,
}

/// Exposure / ISO control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    Auto,
    Manual,
}

/// Camera configuration captured into the settings sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSettings {
    pub exposure_mode: ControlMode,
    pub exposure: f64,
    pub exposure_min: f64,
    pub exposure_max: f64,
    pub iso_mode: ControlMode,
    pub iso: u32,
    pub iso_min: u32,
    pub iso_max: u32,
    pub hdr: bool,
    pub tap_to_focus_enabled: bool,
}

/// GPS accuracy preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpsAccuracy {
    Low,
    High,
}

/// GPS sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsSettings {
    pub accuracy: GpsAccuracy,
    /// Sampling interval in seconds. The gyroscope sampling timer reuses it.
    pub update_interval: f64,
    pub distance_filter: f64,
}

impl GpsSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.update_interval.max(0.1))
    }
}

/// Storage management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    /// Minimum free space in MB the caller wants preserved.
    pub min_space: u64,
    pub auto_cleanup: bool,
    pub cache_management: bool,
}

/// Sidecar metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSettings {
    pub format: String,
    pub timestamp_format: String,
    /// When false, GPS collection is disabled for the session.
    pub gps_sync: bool,
}

/// Complete recording settings document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSettings {
    pub frame_rate: FrameRateSettings,
    pub video: VideoSettings,
    pub camera: CameraSettings,
    pub gps: GpsSettings,
    pub storage: StorageSettings,
    pub metadata: MetadataSettings,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            frame_rate: FrameRateSettings {
                fps: 30,
                capture_interval: 1,
                buffer_size: 50,
            },
            video: VideoSettings {
                resolution: Resolution::R1080p,
                codec: "H.264".to_string(),
                bitrate: 8,
            },
            camera: CameraSettings {
                exposure_mode: ControlMode::Manual,
                exposure: 0.0,
                exposure_min: 0.0,
                exposure_max: 0.0,
                iso_mode: ControlMode::Manual,
                iso: 100,
                iso_min: 100,
                iso_max: 3200,
                hdr: false,
                tap_to_focus_enabled: true,
            },
            gps: GpsSettings {
                accuracy: GpsAccuracy::High,
                update_interval: 1.0,
                distance_filter: 0.0,
            },
            storage: StorageSettings {
                min_space: 500,
                auto_cleanup: true,
                cache_management: true,
            },
            metadata: MetadataSettings {
                format: "JSON".to_string(),
                timestamp_format: "ISO8601".to_string(),
                gps_sync: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RecordingSettings::default();
        assert_eq!(settings.frame_rate.fps, 30);
        assert_eq!(settings.video.resolution, Resolution::R1080p);
        assert!(settings.metadata.gps_sync);
        assert_eq!(settings.gps.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_resolution_serializes_as_label() {
        let json = serde_json::to_string(&Resolution::R4k).unwrap();
        assert_eq!(json, "\"4K\"");
        let back: Resolution = serde_json::from_str("\"1080p\"").unwrap();
        assert_eq!(back, Resolution::R1080p);
    }

    #[test]
    fn test_resolution_dimensions() {
        assert_eq!(Resolution::R720p.dimensions(), (1280, 720));
        assert_eq!(Resolution::R4k.dimensions(), (3840, 2160));
    }
}

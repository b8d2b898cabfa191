//! Telemetry sampling
//!
//! Independently-clocked producers of timestamped points:
//! - GPS: active single-fix polling at the configured interval
//! - Gyroscope: push stream filtered into a shared cell, sampled on a timer
//!
//! Buffers are shared `Arc<Mutex<Vec<_>>>` cells; stopping a sampler only
//! cancels its timer, the buffered points stay untouched for the artifact
//! writer.

pub mod gps;
pub mod gyro;

pub use gps::{haversine_km, GpsSampler};
pub use gyro::{GyroFilter, GyroSampler};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared, freezable point buffer.
pub type TelemetryBuffer<T> = Arc<Mutex<Vec<T>>>;

/// One recorded GPS position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsPoint {
    /// Capture time, UTC Unix milliseconds.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// One recorded gyroscope sample (filtered angular rate, not raw)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GyroPoint {
    /// Capture time, UTC Unix milliseconds.
    pub timestamp: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

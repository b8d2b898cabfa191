//! GPS single-fix sampler
//!
//! Polls the provider for a fresh fix at the configured interval rather than
//! holding a passive watch; the first poll fires immediately at start so a
//! zero-length session still yields a point when a fix is available. A
//! failed or timed-out fix is a skipped sample, never fatal.

use crate::camera::GpsProvider;
use crate::utils::now_utc_ms;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{GpsPoint, TelemetryBuffer};

/// Per-attempt fix timeout; a timeout skips the sample and keeps polling.
pub const FIX_TIMEOUT: Duration = Duration::from_secs(20);

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Periodic single-fix GPS collector.
pub struct GpsSampler {
    provider: Arc<dyn GpsProvider>,
    points: TelemetryBuffer<GpsPoint>,
    total_distance_km: Arc<Mutex<f64>>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl GpsSampler {
    pub fn new(provider: Arc<dyn GpsProvider>, interval: Duration) -> Self {
        Self {
            provider,
            points: Arc::new(Mutex::new(Vec::new())),
            total_distance_km: Arc::new(Mutex::new(0.0)),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Handle to the shared point buffer.
    pub fn points(&self) -> TelemetryBuffer<GpsPoint> {
        Arc::clone(&self.points)
    }

    /// Accumulated great-circle distance over this session.
    pub fn total_distance_km(&self) -> f64 {
        *self.total_distance_km.lock()
    }

    /// Clear the buffer and begin polling. The first fix is requested
    /// immediately, subsequent ones on the interval.
    pub fn start(&self) {
        self.clear();

        let provider = Arc::clone(&self.provider);
        let points = Arc::clone(&self.points);
        let total = Arc::clone(&self.total_distance_km);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match tokio::time::timeout(FIX_TIMEOUT, provider.current_position(FIX_TIMEOUT))
                    .await
                {
                    Ok(Ok(fix)) => {
                        let timestamp = now_utc_ms();
                        let mut points = points.lock();
                        if let Some(prev) = points.last() {
                            let leg = haversine_km(
                                prev.latitude,
                                prev.longitude,
                                fix.latitude,
                                fix.longitude,
                            );
                            *total.lock() += leg;
                        }
                        points.push(GpsPoint {
                            timestamp,
                            latitude: fix.latitude,
                            longitude: fix.longitude,
                            accuracy: fix.accuracy,
                        });
                    }
                    Ok(Err(err)) => {
                        tracing::debug!("GPS fix skipped: {err}");
                    }
                    Err(_) => {
                        tracing::debug!("GPS fix timed out after {FIX_TIMEOUT:?}");
                    }
                }
            }
        });

        *self.task.lock() = Some(task);
    }

    /// Cancel the polling timer. Buffered points stay untouched.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Drop buffered points and the accumulated distance.
    pub fn clear(&self) {
        self.points.lock().clear();
        *self.total_distance_km.lock() = 0.0;
    }
}

impl Drop for GpsSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Gyroscope filtering and sampling
//!
//! The raw push stream updates a shared filtered cell; an independent timer
//! samples that cell into the session buffer. Writer and reader race on the
//! cell by design: last write wins, the sampled value is simply the most
//! recent filtered state.

use crate::camera::{GyroReading, GyroscopeStream};
use crate::utils::now_utc_ms;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{GyroPoint, TelemetryBuffer};

/// Low-pass coefficient: `filtered = α·raw + (1-α)·previous`.
pub const LOW_PASS_ALPHA: f64 = 0.1;

/// Changes below this magnitude snap back to the previous value.
pub const DEAD_ZONE: f64 = 0.05;

/// Single-pole low-pass filter with a per-axis dead-zone snap.
///
/// Filter state persists across sessions; it tracks the device, not the
/// recording.
#[derive(Debug, Default)]
pub struct GyroFilter {
    current: GyroReading,
}

impl GyroFilter {
    /// Feed one raw reading, returning the new filtered value.
    pub fn apply(&mut self, raw: GyroReading) -> GyroReading {
        let prev = self.current;
        self.current = GyroReading {
            x: Self::axis(raw.x, prev.x),
            y: Self::axis(raw.y, prev.y),
            z: Self::axis(raw.z, prev.z),
        };
        self.current
    }

    fn axis(raw: f64, prev: f64) -> f64 {
        let filtered = LOW_PASS_ALPHA * raw + (1.0 - LOW_PASS_ALPHA) * prev;
        if (filtered - prev).abs() < DEAD_ZONE {
            prev
        } else {
            filtered
        }
    }

    pub fn current(&self) -> GyroReading {
        self.current
    }
}

/// Periodic sampler over the shared filtered gyroscope state.
pub struct GyroSampler {
    filter: Arc<Mutex<GyroFilter>>,
    points: TelemetryBuffer<GyroPoint>,
    interval: Duration,
    subscription: Mutex<Option<JoinHandle<()>>>,
    sampling: Mutex<Option<JoinHandle<()>>>,
}

impl GyroSampler {
    /// Subscribes to the raw stream immediately; the subscription outlives
    /// individual sessions.
    pub fn new(stream: &dyn GyroscopeStream, interval: Duration) -> Self {
        let filter = Arc::new(Mutex::new(GyroFilter::default()));
        let mut rx = stream.subscribe();
        let task_filter = Arc::clone(&filter);
        let subscription = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(raw) => {
                        task_filter.lock().apply(raw);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("gyroscope stream lagged by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self {
            filter,
            points: Arc::new(Mutex::new(Vec::new())),
            interval,
            subscription: Mutex::new(Some(subscription)),
            sampling: Mutex::new(None),
        }
    }

    /// Handle to the shared point buffer.
    pub fn points(&self) -> TelemetryBuffer<GyroPoint> {
        Arc::clone(&self.points)
    }

    /// Clear the buffer, capture the first sample synchronously, then sample
    /// the current filtered value on the timer. Even a zero-length session
    /// yields at least one point.
    pub fn start(&self) {
        {
            let mut points = self.points.lock();
            points.clear();
            let current = self.filter.lock().current();
            points.push(GyroPoint {
                timestamp: now_utc_ms(),
                x: current.x,
                y: current.y,
                z: current.z,
            });
        }

        let filter = Arc::clone(&self.filter);
        let points = Arc::clone(&self.points);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The immediate tick duplicates the synchronous start sample.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let current = filter.lock().current();
                points.lock().push(GyroPoint {
                    timestamp: now_utc_ms(),
                    x: current.x,
                    y: current.y,
                    z: current.z,
                });
            }
        });

        *self.sampling.lock() = Some(task);
    }

    /// Cancel the sampling timer only; the raw subscription and the buffered
    /// points are left alone.
    pub fn stop(&self) {
        if let Some(task) = self.sampling.lock().take() {
            task.abort();
        }
    }

    /// Drop buffered points.
    pub fn clear(&self) {
        self.points.lock().clear();
    }
}

impl Drop for GyroSampler {
    fn drop(&mut self) {
        self.stop();
        if let Some(task) = self.subscription.lock().take() {
            task.abort();
        }
    }
}

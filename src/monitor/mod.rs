//! Resource monitoring
//!
//! The monitor polls the platform probe on its own timer regardless of
//! session state; the session gate only controls whether a cycle's sample is
//! appended to the per-session accumulator. Everything here is fail-soft: a
//! bad probe read degrades the numbers, never the session.

pub mod probe;

#[cfg(target_os = "macos")]
mod mach_probe;
#[cfg(target_os = "linux")]
mod proc;

pub use probe::{blend_cpu, ResourceProbe, StorageInfo, SystemProbe};

use crate::locator::RecordingFileLocator;
use crate::utils::now_utc_ms;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default poll cadence; useful range is roughly 2-5 s.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const MB_PER_GB: f64 = 1000.0;

/// One monitoring cycle
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSample {
    /// Capture time, UTC Unix milliseconds.
    pub timestamp: i64,
    /// Smoothed app CPU usage, 0-100.
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub storage_used_gb: f64,
    pub storage_total_gb: f64,
    /// Best-guess size of the in-progress recording; 0 outside sessions.
    pub recording_file_size_gb: f64,
}

/// Aggregate over one session's accumulated samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    /// Rounded to a whole percent.
    pub avg_cpu: f64,
    pub highest_cpu: f64,
    pub avg_memory_gb: f64,
    pub highest_memory_gb: f64,
}

/// Display smoothing across poll cycles. The first value passes through.
pub fn smooth_cpu(last: Option<f64>, current: f64) -> f64 {
    match last {
        Some(last) => (0.3 * last + 0.7 * current).round(),
        None => current,
    }
}

struct Shared {
    latest: Mutex<Option<ResourceSample>>,
    samples: Mutex<Vec<ResourceSample>>,
    recording: AtomicBool,
    smoothed_cpu: Mutex<Option<f64>>,
}

/// Periodic resource poller with per-session accumulators.
pub struct ResourceMonitor {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceMonitor {
    /// Starts polling immediately. The locator is shared with the session
    /// controller, which invalidates it when the real output path arrives.
    pub fn new(
        mut probe: Box<dyn ResourceProbe>,
        locator: Arc<Mutex<RecordingFileLocator>>,
        interval: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            latest: Mutex::new(None),
            samples: Mutex::new(Vec::new()),
            recording: AtomicBool::new(false),
            smoothed_cpu: Mutex::new(None),
        });

        let task_shared = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                Self::cycle(&task_shared, probe.as_mut(), &locator);
            }
        });

        Self {
            shared,
            task: Mutex::new(Some(task)),
        }
    }

    fn cycle(
        shared: &Shared,
        probe: &mut dyn ResourceProbe,
        locator: &Arc<Mutex<RecordingFileLocator>>,
    ) {
        let recording = shared.recording.load(Ordering::SeqCst);

        let cpu_percent = {
            let mut smoothed = shared.smoothed_cpu.lock();
            match probe.app_cpu_usage() {
                Some(raw) => {
                    let value = smooth_cpu(*smoothed, raw);
                    *smoothed = Some(value);
                    value
                }
                None => smoothed.unwrap_or(0.0),
            }
        };
        let memory_mb = probe.memory_usage_mb().unwrap_or(0.0);
        let storage = probe.storage_info();
        // Scanning for the recording file only makes sense mid-session.
        let recording_file_size_gb = if recording {
            locator.lock().current_file_size_bytes() as f64 / 1e9
        } else {
            0.0
        };

        let sample = ResourceSample {
            timestamp: now_utc_ms(),
            cpu_percent,
            memory_mb,
            storage_used_gb: storage.map(|s| s.used_gb).unwrap_or(0.0),
            storage_total_gb: storage.map(|s| s.total_gb).unwrap_or(0.0),
            recording_file_size_gb,
        };
        tracing::debug!(
            "resource cycle: cpu {:.0}% mem {:.0}MB rec {:.3}GB",
            sample.cpu_percent,
            sample.memory_mb,
            sample.recording_file_size_gb
        );

        *shared.latest.lock() = Some(sample);
        if recording {
            shared.samples.lock().push(sample);
        }
    }

    /// Clear the accumulator and open the session gate.
    pub fn begin_session(&self) {
        self.shared.samples.lock().clear();
        self.shared.recording.store(true, Ordering::SeqCst);
    }

    /// Close the gate and reduce the accumulated samples.
    pub fn end_session(&self) -> ResourceStats {
        self.shared.recording.store(false, Ordering::SeqCst);
        let samples = std::mem::take(&mut *self.shared.samples.lock());
        reduce(&samples)
    }

    /// Close the gate and discard accumulated samples.
    pub fn cancel_session(&self) {
        self.shared.recording.store(false, Ordering::SeqCst);
        self.shared.samples.lock().clear();
    }

    /// Most recent cycle, session or not.
    pub fn latest_sample(&self) -> Option<ResourceSample> {
        *self.shared.latest.lock()
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reduce(samples: &[ResourceSample]) -> ResourceStats {
    if samples.is_empty() {
        return ResourceStats::default();
    }
    let count = samples.len() as f64;
    let avg_cpu = samples.iter().map(|s| s.cpu_percent).sum::<f64>() / count;
    let highest_cpu = samples.iter().map(|s| s.cpu_percent).fold(0.0, f64::max);
    let avg_memory_gb = samples.iter().map(|s| s.memory_mb).sum::<f64>() / count / MB_PER_GB;
    let highest_memory_gb = samples.iter().map(|s| s.memory_mb).fold(0.0, f64::max) / MB_PER_GB;
    ResourceStats {
        avg_cpu: avg_cpu.round(),
        highest_cpu: highest_cpu.round(),
        avg_memory_gb,
        highest_memory_gb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LocatorConfig;
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedProbe {
        cpu: Arc<Mutex<VecDeque<Option<f64>>>>,
        memory_mb: f64,
    }

    impl ScriptedProbe {
        fn new(cpu: Vec<Option<f64>>, memory_mb: f64) -> Self {
            Self {
                cpu: Arc::new(Mutex::new(cpu.into())),
                memory_mb,
            }
        }
    }

    impl ResourceProbe for ScriptedProbe {
        fn app_cpu_usage(&mut self) -> Option<f64> {
            self.cpu.lock().pop_front().flatten()
        }

        fn memory_usage_mb(&mut self) -> Option<f64> {
            Some(self.memory_mb)
        }

        fn storage_info(&mut self) -> Option<StorageInfo> {
            Some(StorageInfo {
                used_gb: 10.0,
                total_gb: 64.0,
            })
        }
    }

    fn test_locator() -> Arc<Mutex<RecordingFileLocator>> {
        Arc::new(Mutex::new(RecordingFileLocator::new(LocatorConfig::new(
            vec![],
        ))))
    }

    #[test]
    fn test_smoothing_weights() {
        assert_eq!(smooth_cpu(None, 40.0), 40.0);
        // 0.3·40 + 0.7·80 = 68
        assert_eq!(smooth_cpu(Some(40.0), 80.0), 68.0);
    }

    #[test]
    fn test_reduce_rounds_cpu_keeps_memory_fractional() {
        let sample = |cpu: f64, mem: f64| ResourceSample {
            timestamp: 0,
            cpu_percent: cpu,
            memory_mb: mem,
            storage_used_gb: 0.0,
            storage_total_gb: 0.0,
            recording_file_size_gb: 0.0,
        };
        let stats = reduce(&[sample(30.0, 1500.0), sample(41.0, 2500.0)]);
        assert_eq!(stats.avg_cpu, 36.0);
        assert_eq!(stats.highest_cpu, 41.0);
        assert!((stats.avg_memory_gb - 2.0).abs() < 1e-9);
        assert!((stats.highest_memory_gb - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_reduce_empty_is_zeroed() {
        assert_eq!(reduce(&[]), ResourceStats::default());
    }

    #[tokio::test]
    async fn test_accumulates_only_while_session_open() {
        let probe = ScriptedProbe::new(vec![Some(10.0); 64], 1000.0);
        let monitor = ResourceMonitor::new(
            Box::new(probe),
            test_locator(),
            Duration::from_millis(15),
        );

        // Polling runs before any session, but nothing accumulates.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(monitor.latest_sample().is_some());

        monitor.begin_session();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let stats = monitor.end_session();
        assert_eq!(stats.avg_cpu, 10.0);
        assert!((stats.avg_memory_gb - 1.0).abs() < 1e-9);

        // Gate closed again: accumulator stays empty.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(monitor.end_session(), ResourceStats::default());
    }

    #[tokio::test]
    async fn test_probe_failure_keeps_last_smoothed_value() {
        let probe = ScriptedProbe::new(vec![Some(50.0), None, None, None], 1000.0);
        let monitor = ResourceMonitor::new(
            Box::new(probe),
            test_locator(),
            Duration::from_millis(15),
        );
        tokio::time::sleep(Duration::from_millis(80)).await;
        let latest = monitor.latest_sample().unwrap();
        assert_eq!(latest.cpu_percent, 50.0);
        monitor.stop();
    }

    #[tokio::test]
    async fn test_cancel_discards_samples() {
        let probe = ScriptedProbe::new(vec![Some(25.0); 64], 1000.0);
        let monitor = ResourceMonitor::new(
            Box::new(probe),
            test_locator(),
            Duration::from_millis(15),
        );
        monitor.begin_session();
        tokio::time::sleep(Duration::from_millis(50)).await;
        monitor.cancel_session();
        assert_eq!(monitor.end_session(), ResourceStats::default());
    }
}

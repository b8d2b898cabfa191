//! Native resource probes
//!
//! Fail-soft by contract: a probe never errors outward. A failed native read
//! yields `None` (or the last successfully computed CPU value), and the
//! monitor keeps going with whatever it has.

use serde::Serialize;
use std::path::PathBuf;
use sysinfo::{Disks, Pid, ProcessesToUpdate, System};

#[cfg(target_os = "linux")]
use super::proc::CpuUsageProbe;

#[cfg(target_os = "macos")]
use super::mach_probe::CpuUsageProbe;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback::CpuUsageProbe;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Storage usage on the app data volume
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub used_gb: f64,
    pub total_gb: f64,
}

/// Per-process resource introspection.
pub trait ResourceProbe: Send {
    /// App CPU usage percent. `None` only when no value was ever computed.
    fn app_cpu_usage(&mut self) -> Option<f64>;

    /// App memory usage in MB.
    fn memory_usage_mb(&mut self) -> Option<f64>;

    /// Used/total storage on the data volume.
    fn storage_info(&mut self) -> Option<StorageInfo>;
}

pub(crate) const THREAD_WEIGHT: f64 = 0.7;
pub(crate) const DELTA_WEIGHT: f64 = 0.3;

/// Blend the two CPU estimation methods.
///
/// The per-thread sum can exceed 100 on multi-core hardware while the delta
/// ratio is a single number; the result is clamped, not renormalized by core
/// count, for behavioral parity with the native modules this replaces. Treat
/// it as an indicator, not a calibrated measurement.
pub fn blend_cpu(thread_based: f64, delta_based: Option<f64>) -> f64 {
    let blended = match delta_based {
        Some(delta) => THREAD_WEIGHT * thread_based + DELTA_WEIGHT * delta,
        None => thread_based,
    };
    blended.clamp(0.0, 100.0)
}

/// Per-core usage from two cumulative counter snapshots:
/// `Δused = Δuser + Δsystem + Δnice`, `Δtotal = Δused + Δidle`.
pub fn core_usage_percent(prev: &CoreTicks, current: &CoreTicks) -> Option<f64> {
    let used = (current.user.saturating_sub(prev.user)
        + current.system.saturating_sub(prev.system)
        + current.nice.saturating_sub(prev.nice)) as f64;
    let idle = current.idle.saturating_sub(prev.idle) as f64;
    let total = used + idle;
    if total <= 0.0 {
        return None;
    }
    Some((used / total) * 100.0)
}

/// Cumulative per-core CPU counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreTicks {
    pub user: u64,
    pub system: u64,
    pub nice: u64,
    pub idle: u64,
}

/// All-core usage: per-core deltas averaged across cores. Requires the
/// retained snapshot from the previous cycle.
pub fn system_usage_percent(prev: &[CoreTicks], current: &[CoreTicks]) -> Option<f64> {
    if prev.len() != current.len() || current.is_empty() {
        return None;
    }
    let per_core: Vec<f64> = prev
        .iter()
        .zip(current)
        .filter_map(|(p, c)| core_usage_percent(p, c))
        .collect();
    if per_core.is_empty() {
        return None;
    }
    let avg = per_core.iter().sum::<f64>() / per_core.len() as f64;
    Some(avg.clamp(0.0, 100.0))
}

/// Platform-selected probe: native CPU introspection plus `sysinfo` for
/// memory and storage.
pub struct SystemProbe {
    cpu: CpuUsageProbe,
    system: System,
    disks: Disks,
    pid: Pid,
    data_root: PathBuf,
}

impl SystemProbe {
    /// `data_root` selects the volume storage usage is reported for.
    pub fn new(data_root: PathBuf) -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());
        // Baseline refresh so the first delta has something to diff against.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
        Self {
            cpu: CpuUsageProbe::new(),
            system,
            disks: Disks::new_with_refreshed_list(),
            pid,
            data_root,
        }
    }

    /// All-core system usage from per-core counter deltas. `None` until two
    /// snapshots exist, or on platforms without a native counter source.
    pub fn system_cpu_usage(&mut self) -> Option<f64> {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            self.cpu.system_usage()
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            None
        }
    }
}

impl ResourceProbe for SystemProbe {
    fn app_cpu_usage(&mut self) -> Option<f64> {
        self.cpu.poll()
    }

    fn memory_usage_mb(&mut self) -> Option<f64> {
        // Physical footprint where the platform reports it; resident set
        // size otherwise.
        #[cfg(target_os = "macos")]
        if let Some(mb) = super::mach_probe::physical_footprint_mb() {
            return Some(mb);
        }
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]));
        self.system
            .process(self.pid)
            .map(|p| p.memory() as f64 / BYTES_PER_MB)
    }

    fn storage_info(&mut self) -> Option<StorageInfo> {
        self.disks.refresh();
        let disk = self
            .disks
            .iter()
            .filter(|d| self.data_root.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())?;
        let total_gb = disk.total_space() as f64 / BYTES_PER_GB;
        let free_gb = disk.available_space() as f64 / BYTES_PER_GB;
        Some(StorageInfo {
            used_gb: total_gb - free_gb,
            total_gb,
        })
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    /// Minimal probe for platforms without native thread introspection:
    /// the process usage reported by `sysinfo` stands in for the per-thread
    /// sum and there is no delta signal to blend.
    pub struct CpuUsageProbe {
        system: System,
        pid: Pid,
        last_usage: Option<f64>,
    }

    impl CpuUsageProbe {
        pub fn new() -> Self {
            let mut system = System::new();
            let pid = Pid::from_u32(std::process::id());
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
            Self {
                system,
                pid,
                last_usage: None,
            }
        }

        pub fn poll(&mut self) -> Option<f64> {
            self.system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]));
            match self.system.process(self.pid) {
                Some(process) => {
                    let usage = super::blend_cpu(process.cpu_usage() as f64, None);
                    self.last_usage = Some(usage);
                    Some(usage)
                }
                None => self.last_usage,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights() {
        // thread-based 80, delta-based 50 with a previous sample present.
        let blended = blend_cpu(80.0, Some(50.0));
        assert_eq!(blended.round() as i64, 71);
    }

    #[test]
    fn test_blend_without_previous_sample() {
        assert_eq!(blend_cpu(42.0, None), 42.0);
    }

    #[test]
    fn test_blend_clamps_multicore_sum() {
        assert_eq!(blend_cpu(340.0, Some(95.0)), 100.0);
        assert_eq!(blend_cpu(-3.0, None), 0.0);
    }

    #[test]
    fn test_core_usage_from_deltas() {
        let prev = CoreTicks {
            user: 100,
            system: 50,
            nice: 0,
            idle: 850,
        };
        let current = CoreTicks {
            user: 160,
            system: 70,
            nice: 10,
            idle: 940,
        };
        // used Δ = 90, idle Δ = 90 -> 50%
        let usage = core_usage_percent(&prev, &current).unwrap();
        assert!((usage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_system_usage_averages_cores() {
        let prev = vec![CoreTicks::default(), CoreTicks::default()];
        let current = vec![
            CoreTicks {
                user: 100,
                system: 0,
                nice: 0,
                idle: 0,
            },
            CoreTicks {
                user: 0,
                system: 0,
                nice: 0,
                idle: 100,
            },
        ];
        let usage = system_usage_percent(&prev, &current).unwrap();
        assert!((usage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_system_usage_rejects_core_count_change() {
        let prev = vec![CoreTicks::default()];
        let current = vec![CoreTicks::default(), CoreTicks::default()];
        assert!(system_usage_percent(&prev, &current).is_none());
    }

    #[test]
    fn test_system_probe_reports_something() {
        let mut probe = SystemProbe::new(std::env::temp_dir());
        // First poll may be 0 but must not be absent on a live process.
        assert!(probe.app_cpu_usage().is_some());
        let memory = probe.memory_usage_mb().unwrap();
        assert!(memory > 0.0);
        if let Some(storage) = probe.storage_info() {
            assert!(storage.total_gb >= storage.used_gb);
            assert!(storage.used_gb >= 0.0);
        }
    }
}

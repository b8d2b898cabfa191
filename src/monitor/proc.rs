//! Linux CPU introspection over `/proc`
//!
//! Two estimates per poll, blended by [`super::probe::blend_cpu`]:
//! per-thread tick deltas from `/proc/self/task/<tid>/stat` and the delta of
//! cumulative thread CPU time against wallclock. A read failure keeps the
//! last computed value.

use std::collections::HashMap;
use std::fs;
use std::time::Instant;

use super::probe::{blend_cpu, CoreTicks};

/// Kernel tick rate exposed to userspace (`USER_HZ`).
const TICKS_PER_SEC: f64 = 100.0;

pub struct CpuUsageProbe {
    prev_thread_ticks: HashMap<u64, u64>,
    prev_total_ticks: u64,
    prev_instant: Option<Instant>,
    prev_cores: Vec<CoreTicks>,
    last_usage: f64,
}

impl CpuUsageProbe {
    pub fn new() -> Self {
        Self {
            prev_thread_ticks: HashMap::new(),
            prev_total_ticks: 0,
            prev_instant: None,
            prev_cores: Vec::new(),
            last_usage: 0.0,
        }
    }

    /// App CPU usage percent. Fail-soft: a failed `/proc` read repeats the
    /// last good value rather than dropping to zero.
    pub fn poll(&mut self) -> Option<f64> {
        match self.sample() {
            Some(usage) => {
                self.last_usage = usage;
                Some(usage)
            }
            None => {
                tracing::warn!("CPU probe read failed, keeping {:.1}%", self.last_usage);
                Some(self.last_usage)
            }
        }
    }

    /// All-core system usage from `/proc/stat` deltas; `None` until a
    /// previous snapshot exists.
    pub fn system_usage(&mut self) -> Option<f64> {
        let current = read_core_ticks()?;
        let usage = super::probe::system_usage_percent(&self.prev_cores, &current);
        self.prev_cores = current;
        usage
    }

    fn sample(&mut self) -> Option<f64> {
        let now = Instant::now();
        let threads = read_thread_ticks()?;
        let total_ticks: u64 = threads.values().sum();
        let elapsed = self
            .prev_instant
            .map(|t| now.duration_since(t).as_secs_f64())
            .filter(|dt| *dt > 0.0);

        // (a) per-thread usage summed over the process. A thread first seen
        // this cycle contributes nothing until the next one.
        let thread_based = match elapsed {
            Some(dt) => threads
                .iter()
                .map(|(tid, ticks)| {
                    let prev = self.prev_thread_ticks.get(tid).copied().unwrap_or(*ticks);
                    (ticks.saturating_sub(prev) as f64 / TICKS_PER_SEC) / dt * 100.0
                })
                .sum(),
            None => 0.0,
        };

        // (b) cumulative thread CPU time against wallclock.
        let delta_based = elapsed.map(|dt| {
            let delta = total_ticks.saturating_sub(self.prev_total_ticks) as f64;
            (delta / TICKS_PER_SEC) / dt * 100.0
        });

        self.prev_thread_ticks = threads;
        self.prev_total_ticks = total_ticks;
        self.prev_instant = Some(now);

        Some(blend_cpu(thread_based, delta_based))
    }
}

/// `utime + stime` ticks per live thread.
fn read_thread_ticks() -> Option<HashMap<u64, u64>> {
    let mut ticks = HashMap::new();
    for entry in fs::read_dir("/proc/self/task").ok()? {
        let entry = entry.ok()?;
        let tid: u64 = match entry.file_name().to_str().and_then(|n| n.parse().ok()) {
            Some(tid) => tid,
            None => continue,
        };
        // Threads exit between readdir and read; skip, don't fail.
        let stat = match fs::read_to_string(entry.path().join("stat")) {
            Ok(stat) => stat,
            Err(_) => continue,
        };
        if let Some(t) = parse_stat_ticks(&stat) {
            ticks.insert(tid, t);
        }
    }
    if ticks.is_empty() {
        return None;
    }
    Some(ticks)
}

/// Extract `utime + stime` (fields 14 and 15) from a `stat` line. The comm
/// field may contain spaces, so parse from the closing paren.
fn parse_stat_ticks(stat: &str) -> Option<u64> {
    let rest = &stat[stat.rfind(')')? + 2..];
    let mut fields = rest.split_whitespace();
    let utime: u64 = fields.nth(11)?.parse().ok()?;
    let stime: u64 = fields.next()?.parse().ok()?;
    Some(utime + stime)
}

fn read_core_ticks() -> Option<Vec<CoreTicks>> {
    let stat = fs::read_to_string("/proc/stat").ok()?;
    let cores: Vec<CoreTicks> = stat
        .lines()
        .filter(|line| line.starts_with("cpu") && !line.starts_with("cpu "))
        .filter_map(parse_core_line)
        .collect();
    if cores.is_empty() {
        return None;
    }
    Some(cores)
}

fn parse_core_line(line: &str) -> Option<CoreTicks> {
    let mut fields = line.split_whitespace().skip(1);
    let user = fields.next()?.parse().ok()?;
    let nice = fields.next()?.parse().ok()?;
    let system = fields.next()?.parse().ok()?;
    let idle = fields.next()?.parse().ok()?;
    Some(CoreTicks {
        user,
        system,
        nice,
        idle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stat_with_spaces_in_comm() {
        let stat = "12345 (tokio runtime w) R 1 1 1 0 -1 4194304 0 0 0 0 \
                    150 75 0 0 20 0 8 0 100 0 0 18446744073709551615";
        assert_eq!(parse_stat_ticks(stat), Some(225));
    }

    #[test]
    fn test_parse_core_line() {
        let core = parse_core_line("cpu0 4705 150 1120 16250856 25 0 17 0 0 0").unwrap();
        assert_eq!(
            core,
            CoreTicks {
                user: 4705,
                nice: 150,
                system: 1120,
                idle: 16250856,
            }
        );
    }

    #[test]
    fn test_poll_is_fail_soft() {
        let mut probe = CpuUsageProbe::new();
        // First poll has no baseline; it must still report a number.
        let first = probe.poll().unwrap();
        assert!((0.0..=100.0).contains(&first));
        // Burn some CPU so the second poll has a real delta.
        let mut x = 0u64;
        for i in 0..5_000_000u64 {
            x = x.wrapping_add(i);
        }
        std::hint::black_box(x);
        let second = probe.poll().unwrap();
        assert!((0.0..=100.0).contains(&second));
    }

    #[test]
    fn test_system_usage_needs_two_snapshots() {
        let mut probe = CpuUsageProbe::new();
        assert!(probe.system_usage().is_none());
        std::thread::sleep(std::time::Duration::from_millis(20));
        if let Some(usage) = probe.system_usage() {
            assert!((0.0..=100.0).contains(&usage));
        }
    }
}

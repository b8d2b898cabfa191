//! Heuristic recording-file discovery
//!
//! The camera SDK exposes no handle to its in-progress output file until
//! recording fully stops, yet the UI wants live size/progress. This module
//! guesses the active file by scanning a fixed list of candidate directories
//! for recent, growing video files. The result is a progress estimate only,
//! never authoritative; callers must discard it the moment the encoder's
//! stop callback supplies the real path.

use crate::utils::time::system_time_ms;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v"];

/// Platform profile for the scan.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Candidate directories in priority order (cache/temp/document roots
    /// plus known SDK scratch paths).
    pub candidate_dirs: Vec<PathBuf>,
    /// Files smaller than this are ignored; some platforms report 0 bytes
    /// immediately after creation.
    pub min_size_bytes: u64,
    /// `max(mtime, ctime)` must fall inside this window.
    pub recency_window: Duration,
}

impl LocatorConfig {
    pub fn new(candidate_dirs: Vec<PathBuf>) -> Self {
        Self {
            candidate_dirs,
            min_size_bytes: 1000,
            recency_window: Duration::from_secs(120),
        }
    }

    /// Apple profile: tiny files show up instantly, wider recency window.
    pub fn apple(candidate_dirs: Vec<PathBuf>) -> Self {
        Self {
            candidate_dirs,
            min_size_bytes: 100,
            recency_window: Duration::from_secs(300),
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self::new(vec![std::env::temp_dir()])
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    mtime_ms: i64,
    ctime_ms: i64,
    size: u64,
}

impl Candidate {
    /// Recency dominates; size breaks ties between files touched in the same
    /// instant (1 MB is worth one millisecond of recency).
    fn score(&self) -> f64 {
        score(self.mtime_ms, self.ctime_ms, self.size)
    }
}

/// Candidate ranking: `max(mtime, ctime) + size_bytes / 1e6`.
pub fn score(mtime_ms: i64, ctime_ms: i64, size_bytes: u64) -> f64 {
    mtime_ms.max(ctime_ms) as f64 + size_bytes as f64 / 1e6
}

/// Best-effort locator for the encoder's active output file.
pub struct RecordingFileLocator {
    config: LocatorConfig,
    cached: Option<PathBuf>,
}

impl RecordingFileLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self {
            config,
            cached: None,
        }
    }

    /// Current best guess. The cached path from the previous cycle is
    /// re-stat'd first; a full rescan happens only when it vanished or went
    /// stale.
    pub fn locate(&mut self) -> Option<PathBuf> {
        if let Some(cached) = self.cached.clone() {
            if self.evaluate(&cached).is_some() {
                return Some(cached);
            }
            tracing::debug!("cached recording path {cached:?} went stale, rescanning");
            self.cached = None;
        }

        let best = self.scan();
        self.cached = best.as_ref().map(|c| c.path.clone());
        if let Some(candidate) = &best {
            tracing::debug!(
                "located in-progress recording {:?} ({} bytes)",
                candidate.path,
                candidate.size
            );
        }
        best.map(|c| c.path)
    }

    /// Size in bytes of the located file for this cycle. A stat failure on
    /// the cached path triggers one re-resolve before giving up with 0; a
    /// miss is not an error.
    pub fn current_file_size_bytes(&mut self) -> u64 {
        if let Some(cached) = &self.cached {
            if let Ok(meta) = fs::metadata(cached) {
                return meta.len();
            }
            self.cached = None;
        }
        match self.locate() {
            Some(path) => fs::metadata(&path).map(|m| m.len()).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop the cached guess; called when the encoder's real output path
    /// becomes known.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    fn scan(&self) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for dir in &self.config.candidate_dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !is_video_like(&path) {
                    continue;
                }
                if let Some(candidate) = self.evaluate(&path) {
                    let better = best
                        .as_ref()
                        .map_or(true, |b| candidate.score() > b.score());
                    if better {
                        best = Some(candidate);
                    }
                }
            }
        }
        best
    }

    fn evaluate(&self, path: &Path) -> Option<Candidate> {
        let meta = fs::metadata(path).ok()?;
        if meta.is_dir() {
            return None;
        }
        let size = meta.len();
        if size < self.config.min_size_bytes {
            return None;
        }
        let mtime_ms = system_time_ms(meta.modified().ok());
        let ctime_ms = match system_time_ms(meta.created().ok()) {
            0 => mtime_ms,
            t => t,
        };
        let newest = mtime_ms.max(ctime_ms);
        if newest <= 0 {
            return None;
        }
        let age = crate::utils::now_utc_ms() - newest;
        if age > self.config.recency_window.as_millis() as i64 {
            return None;
        }
        Some(Candidate {
            path: path.to_path_buf(),
            mtime_ms,
            ctime_ms,
            size,
        })
    }
}

/// Video-like entries: known container extensions, plus the SDK's
/// extensionless `video_*` scratch names.
fn is_video_like(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_ascii_lowercase(),
        None => return false,
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => name.starts_with("video_"),
    }
}

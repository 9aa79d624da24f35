//! Qualification predicates and the parallel filter-and-collect stage.
//!
//! Each file streamed out of the walker is stat'd once and tested against
//! three independent predicates (size, age, extension). Qualifying files are
//! snapshotted into [`CandidateFile`]s — size and mtime captured now, never
//! re-derived later — reported to the observer, and appended to a
//! mutex-guarded accumulator. Files that vanish between enumeration and stat
//! are logged and skipped.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::core::config::ScanConfig;
use crate::logger::activity::{ScanEvent, ScanLoggerHandle};

const SECONDS_PER_DAY: f64 = 86_400.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A file that passed all qualification predicates, snapshotted at
/// evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes at evaluation time.
    pub size_bytes: u64,
    /// Modification time at evaluation time.
    pub modified: SystemTime,
}

/// Outcome of the scan/filter phase.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Qualifying files, sorted by path for deterministic downstream order.
    pub candidates: Vec<CandidateFile>,
    /// Sum of candidate sizes in bytes.
    pub total_bytes: u64,
    /// Number of files evaluated (qualifying or not).
    pub files_seen: usize,
}

/// Observer notified of each qualifying file as it is found.
///
/// Console printing, logging, and tests supply independent implementations.
pub trait CandidateObserver: Send + Sync {
    /// Called once per qualifying file, from a filter worker thread.
    fn report(&self, candidate: &CandidateFile);
}

/// Observer that ignores every report.
pub struct NullObserver;

impl CandidateObserver for NullObserver {
    fn report(&self, _candidate: &CandidateFile) {}
}

/// Shared progress counter, incremented once per evaluated file.
#[derive(Debug, Default)]
pub struct ScanProgress {
    files_seen: AtomicUsize,
}

impl ScanProgress {
    /// Record one evaluated file.
    pub fn increment(&self) {
        self.files_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Files evaluated so far.
    pub fn files_seen(&self) -> usize {
        self.files_seen.load(Ordering::Relaxed)
    }
}

enum Evaluation {
    Qualified(CandidateFile),
    Rejected,
    Vanished,
}

/// Parallel filter-and-collector over a stream of file paths.
pub struct CandidateFilter {
    config: ScanConfig,
    logger: Option<ScanLoggerHandle>,
}

impl CandidateFilter {
    /// Create a filter with the given config and optional logger handle.
    pub fn new(config: ScanConfig, logger: Option<ScanLoggerHandle>) -> Self {
        Self { config, logger }
    }

    /// Consume the path stream with a bounded worker pool and collect all
    /// qualifying files.
    ///
    /// `now` is captured once so every file in the run is judged against the
    /// same clock; candidates are sorted by path at the end so the move
    /// phase and its failure summary are reproducible on an unchanged tree.
    pub fn collect(&self, files: &Receiver<PathBuf>, observer: &dyn CandidateObserver) -> ScanResult {
        let now = SystemTime::now();
        let started = Instant::now();
        let results: Mutex<Vec<CandidateFile>> = Mutex::new(Vec::new());
        let progress = ScanProgress::default();

        std::thread::scope(|scope| {
            for _ in 0..self.config.parallelism.max(1) {
                let files = files.clone();
                let results = &results;
                let progress = &progress;
                scope.spawn(move || {
                    for path in &files {
                        progress.increment();
                        match self.evaluate(&path, now) {
                            Evaluation::Qualified(candidate) => {
                                self.log(ScanEvent::CandidateFound {
                                    path: candidate.path.clone(),
                                    size_bytes: candidate.size_bytes,
                                });
                                observer.report(&candidate);
                                results.lock().push(candidate);
                            }
                            Evaluation::Rejected => {}
                            Evaluation::Vanished => {
                                self.log(ScanEvent::FileVanished { path });
                            }
                        }
                    }
                });
            }
        });

        let mut candidates = results.into_inner();
        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        let total_bytes = candidates.iter().map(|c| c.size_bytes).sum();
        let files_seen = progress.files_seen();

        self.log(ScanEvent::ScanCompleted {
            files_seen,
            candidates: candidates.len(),
            total_bytes,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        });

        ScanResult {
            candidates,
            total_bytes,
            files_seen,
        }
    }

    fn evaluate(&self, path: &Path, now: SystemTime) -> Evaluation {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Evaluation::Vanished,
            Err(_) => return Evaluation::Rejected,
        };
        if !meta.is_file() {
            return Evaluation::Rejected;
        }

        let size_bytes = meta.len();
        let modified = meta.modified().unwrap_or(UNIX_EPOCH);

        if qualifies(path, size_bytes, modified, now, &self.config) {
            Evaluation::Qualified(CandidateFile {
                path: path.to_path_buf(),
                size_bytes,
                modified,
            })
        } else {
            Evaluation::Rejected
        }
    }

    fn log(&self, event: ScanEvent) {
        if let Some(logger) = &self.logger {
            logger.send(event);
        }
    }
}

/// All three predicates must hold: strictly larger, strictly older, and not
/// carrying an excluded extension.
fn qualifies(
    path: &Path,
    size_bytes: u64,
    modified: SystemTime,
    now: SystemTime,
    config: &ScanConfig,
) -> bool {
    exceeds_size(size_bytes, config.size_limit_bytes)
        && exceeds_age(modified, now, config.days_limit)
        && !has_excluded_extension(path, &config.excluded_extensions)
}

/// `size > limit`, strict.
pub fn exceeds_size(size_bytes: u64, limit_bytes: u64) -> bool {
    size_bytes > limit_bytes
}

/// Age in fractional days; a future mtime counts as age zero.
pub fn age_in_days(modified: SystemTime, now: SystemTime) -> f64 {
    now.duration_since(modified)
        .map_or(0.0, |d| d.as_secs_f64() / SECONDS_PER_DAY)
}

/// `age > days_limit`, strict.
pub fn exceeds_age(modified: SystemTime, now: SystemTime, days_limit: u64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    {
        age_in_days(modified, now) > days_limit as f64
    }
}

/// Extension with the leading dot (`".docx"`), or `None` when the file has
/// no extension. Comparison is case-sensitive.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Whether the path carries one of the excluded extensions.
pub fn has_excluded_extension(path: &Path, excluded: &HashSet<String>) -> bool {
    extension_of(path).is_some_and(|ext| excluded.contains(&ext))
}

/// Human size: MB below 1024 MB, GB above, two decimals, binary units.
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mib = bytes as f64 / BYTES_PER_MIB;
    if mib < 1024.0 {
        format!("{mib:.2} MB")
    } else {
        format!("{:.2} GB", mib / 1024.0)
    }
}

/// Total size in GB, two decimals, binary units.
pub fn format_total_gb(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let gib = bytes as f64 / BYTES_PER_GIB;
    format!("{gib:.2} GB")
}

//! Logger thread and handle: workers send [`ScanEvent`]s over a bounded
//! crossbeam channel; a dedicated thread owns the [`LineWriter`].
//!
//! `try_send()` keeps filter workers from ever blocking on logging
//! back-pressure; dropped events are counted and reported in the log.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::errors::{Result, SfsError};
use crate::logger::line::{Level, LineWriter};

/// Bounded channel capacity for log events.
const CHANNEL_CAPACITY: usize = 1024;

/// Events recorded in the run log.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Run started with the given config summary.
    Initialized { config_summary: String },
    /// A file passed all qualification predicates.
    CandidateFound { path: PathBuf, size_bytes: u64 },
    /// A file disappeared between enumeration and stat.
    FileVanished { path: PathBuf },
    /// A candidate was relocated into the trash directory.
    FileMoved { from: PathBuf, to: PathBuf },
    /// A candidate could not be moved.
    MoveFailed {
        path: PathBuf,
        error_code: String,
        message: String,
    },
    /// Scan/filter phase finished.
    ScanCompleted {
        files_seen: usize,
        candidates: usize,
        total_bytes: u64,
        duration_ms: u64,
    },
    /// Move phase finished.
    MoveCompleted {
        moved: usize,
        failed: usize,
        bytes_moved: u64,
        duration_ms: u64,
    },
    /// Sentinel requesting graceful shutdown of the logger thread.
    Shutdown,
}

impl ScanEvent {
    fn level(&self) -> Level {
        match self {
            Self::FileVanished { .. } | Self::MoveFailed { .. } => Level::Error,
            _ => Level::Info,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Initialized { config_summary } => {
                format!("initialized scanner: {config_summary}")
            }
            Self::CandidateFound { path, size_bytes } => {
                format!("added file to move: {} ({size_bytes} bytes)", path.display())
            }
            Self::FileVanished { path } => format!("file not found: {}", path.display()),
            Self::FileMoved { from, to } => {
                format!("moved file to trash: {} -> {}", from.display(), to.display())
            }
            Self::MoveFailed {
                path,
                error_code,
                message,
            } => format!("[{error_code}] error moving file {}: {message}", path.display()),
            Self::ScanCompleted {
                files_seen,
                candidates,
                total_bytes,
                duration_ms,
            } => format!(
                "scan complete: {files_seen} files seen, {candidates} candidates, \
                 {total_bytes} bytes, {duration_ms}ms"
            ),
            Self::MoveCompleted {
                moved,
                failed,
                bytes_moved,
                duration_ms,
            } => format!(
                "completed moving files to trash: {moved} moved, {failed} failed, \
                 {bytes_moved} bytes, {duration_ms}ms"
            ),
            Self::Shutdown => String::new(),
        }
    }
}

/// Thread-safe, cheaply-cloneable handle for sending log events.
#[derive(Clone)]
pub struct ScanLoggerHandle {
    tx: Sender<ScanEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ScanLoggerHandle {
    /// Send an event to the logger thread. Non-blocking; a full channel
    /// drops the event and bumps the dropped-events counter.
    pub fn send(&self, event: ScanEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
        // Disconnected is fine during shutdown.
    }

    /// Number of events dropped due to channel back-pressure.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Request graceful shutdown. Blocking send so the sentinel is not lost
    /// behind a full channel.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ScanEvent::Shutdown);
    }
}

/// Spawn the logger thread writing to `log_path`.
///
/// The handle is `Clone + Send`; the thread runs until `shutdown()` or all
/// senders are dropped, then flushes.
pub fn spawn_logger(log_path: &Path) -> Result<(ScanLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ScanEvent>(CHANNEL_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));
    let handle = ScanLoggerHandle {
        tx,
        dropped_events: Arc::clone(&dropped),
    };

    let path = log_path.to_path_buf();
    let join = thread::Builder::new()
        .name("sfs-logger".to_string())
        .spawn(move || logger_thread_main(&rx, &path, &dropped))
        .map_err(|e| SfsError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(rx: &Receiver<ScanEvent>, path: &Path, dropped: &AtomicU64) {
    let mut writer = LineWriter::open(path);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            writer.write(
                Level::Error,
                &format!("{d} log events dropped due to back-pressure"),
            );
        }

        if matches!(event, ScanEvent::Shutdown) {
            break;
        }
        writer.write(event.level(), &event.message());
    }

    writer.flush();
}

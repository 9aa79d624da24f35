//! Parallel directory walker.
//!
//! The walker is the first pipeline stage: it enumerates every regular file
//! under the root and streams the paths to the filter workers. Directories
//! are distributed over a work channel so multiple workers descend the tree
//! concurrently; entries that vanish or deny permission mid-walk are skipped,
//! never fatal. Symlinks are never followed.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;

use crate::core::errors::{Result, SfsError};

/// Walker configuration derived from `ScanConfig`.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Root directory to descend from.
    pub root: PathBuf,
    /// Number of traversal worker threads.
    pub parallelism: usize,
    /// Subtrees to prune (the trash directory, so trashed files never
    /// re-qualify on a later run).
    pub excluded_paths: HashSet<PathBuf>,
}

/// Work item: one directory awaiting enumeration.
type WorkItem = PathBuf;

/// Parallel regular-file enumerator.
pub struct FileWalker {
    config: WalkerConfig,
}

impl FileWalker {
    /// Create a walker over the configured root.
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Enumerate all regular files eagerly. Test/convenience wrapper.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        Ok(self.stream()?.into_iter().collect())
    }

    /// Stream regular-file paths as they are discovered.
    ///
    /// The walk runs in background threads; the channel closes when the
    /// traversal is complete.
    pub fn stream(&self) -> Result<channel::Receiver<PathBuf>> {
        let parallelism = self.config.parallelism.max(1);

        // The work queue is unbounded: a bounded queue would force either
        // blocking (deadlock risk, workers both produce and consume) or
        // dropping subtrees, and this tool scans exactly once.
        let (work_tx, work_rx) = channel::unbounded::<WorkItem>();
        let (result_tx, result_rx) = channel::unbounded::<PathBuf>();

        // Track in-flight directories so workers know when to stop.
        let in_flight = Arc::new(AtomicUsize::new(0));

        match fs::symlink_metadata(&self.config.root) {
            Ok(meta) if meta.is_dir() => {
                in_flight.fetch_add(1, Ordering::Release);
                let _ = work_tx.send(self.config.root.clone());
            }
            Ok(_) => {} // Not a directory: nothing to enumerate.
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {}
            Err(err) => {
                return Err(SfsError::Io {
                    path: self.config.root.clone(),
                    source: err,
                });
            }
        }

        for _ in 0..parallelism {
            let work_rx = work_rx.clone();
            let work_tx = work_tx.clone();
            let result_tx = result_tx.clone();
            let in_flight = Arc::clone(&in_flight);
            let excluded = self.config.excluded_paths.clone();

            thread::spawn(move || {
                walker_thread(&work_rx, &work_tx, &result_tx, &in_flight, &excluded);
            });
        }

        // Drop the seed senders so the channels close once workers finish.
        Ok(result_rx)
    }
}

/// Worker loop: pull directories, emit files, enqueue subdirectories.
fn walker_thread(
    work_rx: &channel::Receiver<WorkItem>,
    work_tx: &channel::Sender<WorkItem>,
    result_tx: &channel::Sender<PathBuf>,
    in_flight: &AtomicUsize,
    excluded: &HashSet<PathBuf>,
) {
    loop {
        match work_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(dir_path) => {
                process_directory(&dir_path, work_tx, result_tx, in_flight, excluded);
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                if in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
            }
            Err(channel::RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Enumerate one directory: send regular files, queue subdirectories.
fn process_directory(
    dir_path: &Path,
    work_tx: &channel::Sender<WorkItem>,
    result_tx: &channel::Sender<PathBuf>,
    in_flight: &AtomicUsize,
    excluded: &HashSet<PathBuf>,
) {
    if excluded.contains(dir_path) {
        return;
    }

    // Gracefully skip directories that vanished or deny access; this is
    // expected under concurrent filesystem mutation.
    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };

        // file_type() is usually free (cached in the directory entry).
        let Ok(ft) = entry.file_type() else {
            continue;
        };

        let child_path = entry.path();

        if ft.is_symlink() {
            continue;
        }
        if ft.is_dir() {
            if excluded.contains(&child_path) {
                continue;
            }
            in_flight.fetch_add(1, Ordering::Release);
            if work_tx.send(child_path).is_err() {
                in_flight.fetch_sub(1, Ordering::Release);
            }
        } else if ft.is_file() {
            let _ = result_tx.send(child_path);
        }
        // Anything else (fifo, socket, device) is not a regular file: skip.
    }
}

//! Sequential move phase: relocate confirmed candidates into the trash
//! directory.
//!
//! The mover never deletes data. Each candidate is re-stat'd immediately
//! before the rename; a file that vanished or changed since the scan is
//! skipped and recorded rather than moved, so a newly rewritten file can
//! never be swept on the strength of a stale snapshot. Failures are
//! collected per file and the phase always runs to the end of the list.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::errors::{Result, SfsError};
use crate::logger::activity::{ScanEvent, ScanLoggerHandle};
use crate::scanner::filter::CandidateFile;

/// A single failed move, kept for the end-of-run summary.
#[derive(Debug)]
pub struct MoveError {
    /// The candidate that could not be moved.
    pub path: PathBuf,
    /// What went wrong.
    pub error: SfsError,
    /// Stable error code, for machine-readable output.
    pub error_code: &'static str,
    /// Whether retrying the run could succeed for this file.
    pub recoverable: bool,
}

/// Outcome of the move phase.
#[derive(Debug)]
pub struct MoveReport {
    /// Files successfully renamed into the trash directory.
    pub items_moved: usize,
    /// Files skipped or failed.
    pub items_failed: usize,
    /// Bytes moved, summed from the scan-time snapshots.
    pub bytes_moved: u64,
    /// Wall-clock duration of the phase.
    pub duration: Duration,
    /// One entry per failed file, in candidate order.
    pub errors: Vec<MoveError>,
}

impl MoveReport {
    /// Whether every candidate was moved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.items_failed == 0
    }
}

/// Moves candidates into a flat trash directory.
pub struct TrashMover {
    trash_dir: PathBuf,
    logger: Option<ScanLoggerHandle>,
}

impl TrashMover {
    /// Create a mover targeting `trash_dir`.
    pub fn new(trash_dir: impl Into<PathBuf>, logger: Option<ScanLoggerHandle>) -> Self {
        Self {
            trash_dir: trash_dir.into(),
            logger,
        }
    }

    /// Move every candidate, in order, collecting per-file failures.
    ///
    /// Returns an error only when the trash directory itself cannot be
    /// created; individual move failures land in the report instead.
    pub fn execute(&self, candidates: &[CandidateFile]) -> Result<MoveReport> {
        fs::create_dir_all(&self.trash_dir).map_err(|e| SfsError::io(&self.trash_dir, e))?;

        let started = Instant::now();
        let mut report = MoveReport {
            items_moved: 0,
            items_failed: 0,
            bytes_moved: 0,
            duration: Duration::ZERO,
            errors: Vec::new(),
        };

        for candidate in candidates {
            match self.move_one(candidate) {
                Ok(destination) => {
                    report.items_moved += 1;
                    report.bytes_moved += candidate.size_bytes;
                    self.log(ScanEvent::FileMoved {
                        from: candidate.path.clone(),
                        to: destination,
                    });
                }
                Err(error) => {
                    report.items_failed += 1;
                    // The display form already carries the code prefix.
                    let rendered = error.to_string();
                    let message = rendered
                        .strip_prefix(&format!("[{}] ", error.code()))
                        .unwrap_or(&rendered)
                        .to_string();
                    self.log(ScanEvent::MoveFailed {
                        path: candidate.path.clone(),
                        error_code: error.code().to_string(),
                        message,
                    });
                    report.errors.push(MoveError {
                        path: candidate.path.clone(),
                        error_code: error.code(),
                        recoverable: error.is_retryable(),
                        error,
                    });
                }
            }
        }

        report.duration = started.elapsed();
        self.log(ScanEvent::MoveCompleted {
            moved: report.items_moved,
            failed: report.items_failed,
            bytes_moved: report.bytes_moved,
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        });
        Ok(report)
    }

    fn move_one(&self, candidate: &CandidateFile) -> Result<PathBuf> {
        self.guard_unchanged(candidate)?;
        let destination = self.destination_for(&candidate.path);
        fs::rename(&candidate.path, &destination)
            .map_err(|e| SfsError::io(&candidate.path, e))?;
        Ok(destination)
    }

    /// Re-stat the source and refuse to move a file that no longer matches
    /// its scan-time snapshot.
    fn guard_unchanged(&self, candidate: &CandidateFile) -> Result<()> {
        let meta = match fs::symlink_metadata(&candidate.path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SfsError::SourceVanished {
                    path: candidate.path.clone(),
                });
            }
            Err(err) => return Err(SfsError::io(&candidate.path, err)),
        };

        let modified_matches = meta.modified().is_ok_and(|m| m == candidate.modified);
        if meta.len() != candidate.size_bytes || !modified_matches {
            return Err(SfsError::SourceChanged {
                path: candidate.path.clone(),
            });
        }
        Ok(())
    }

    /// Destination under the trash directory, suffixed `name.1`, `name.2`,
    /// and so on when the plain name is taken.
    fn destination_for(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map_or_else(|| "unnamed".into(), |n| n.to_string_lossy().into_owned());
        let plain = self.trash_dir.join(&name);
        if !plain.exists() {
            return plain;
        }
        for suffix in 1u32.. {
            let numbered = self.trash_dir.join(format!("{name}.{suffix}"));
            if !numbered.exists() {
                return numbered;
            }
        }
        unreachable!("suffix space exhausted");
    }

    fn log(&self, event: ScanEvent) {
        if let Some(logger) = &self.logger {
            logger.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    use tempfile::TempDir;

    fn snapshot(path: &Path) -> CandidateFile {
        let meta = fs::metadata(path).unwrap();
        CandidateFile {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            modified: meta.modified().unwrap(),
        }
    }

    fn write_file(path: &Path, contents: &[u8]) {
        File::create(path).unwrap().write_all(contents).unwrap();
    }

    #[test]
    fn moves_file_and_preserves_content() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.log");
        write_file(&source, b"payload");
        let trash = dir.path().join("trash");

        let report = TrashMover::new(&trash, None)
            .execute(&[snapshot(&source)])
            .unwrap();

        assert_eq!(report.items_moved, 1);
        assert_eq!(report.items_failed, 0);
        assert_eq!(report.bytes_moved, 7);
        assert!(report.is_complete());
        assert!(!source.exists());
        assert_eq!(fs::read(trash.join("a.log")).unwrap(), b"payload");
    }

    #[test]
    fn creates_trash_directory_with_parents() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.log");
        write_file(&source, b"x");
        let trash = dir.path().join("nested/deep/trash");

        let report = TrashMover::new(&trash, None)
            .execute(&[snapshot(&source)])
            .unwrap();
        assert_eq!(report.items_moved, 1);
        assert!(trash.join("a.log").exists());
    }

    #[test]
    fn collision_gets_numeric_suffix() {
        let dir = TempDir::new().unwrap();
        let trash = dir.path().join("trash");
        fs::create_dir_all(&trash).unwrap();
        write_file(&trash.join("a.log"), b"earlier");
        write_file(&trash.join("a.log.1"), b"earlier still");

        let source = dir.path().join("a.log");
        write_file(&source, b"new");

        let report = TrashMover::new(&trash, None)
            .execute(&[snapshot(&source)])
            .unwrap();
        assert_eq!(report.items_moved, 1);
        assert_eq!(fs::read(trash.join("a.log.2")).unwrap(), b"new");
        assert_eq!(fs::read(trash.join("a.log")).unwrap(), b"earlier");
    }

    #[test]
    fn vanished_source_is_recorded_not_fatal() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.log");
        write_file(&source, b"x");
        let candidate = snapshot(&source);
        fs::remove_file(&source).unwrap();

        let report = TrashMover::new(dir.path().join("trash"), None)
            .execute(&[candidate])
            .unwrap();
        assert_eq!(report.items_moved, 0);
        assert_eq!(report.items_failed, 1);
        assert_eq!(report.errors[0].error_code, "SFS-3001");
        assert!(!report.errors[0].recoverable);
    }

    #[test]
    fn changed_source_is_left_in_place() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.log");
        write_file(&source, b"original");
        let candidate = snapshot(&source);
        write_file(&source, b"rewritten since the scan");

        let report = TrashMover::new(dir.path().join("trash"), None)
            .execute(&[candidate])
            .unwrap();
        assert_eq!(report.items_moved, 0);
        assert_eq!(report.items_failed, 1);
        assert_eq!(report.errors[0].error_code, "SFS-3002");
        assert!(source.exists());
        assert_eq!(fs::read(&source).unwrap(), b"rewritten since the scan");
    }

    #[test]
    fn phase_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("gone.log");
        write_file(&gone, b"x");
        let gone_candidate = snapshot(&gone);
        fs::remove_file(&gone).unwrap();

        let ok = dir.path().join("ok.log");
        write_file(&ok, b"kept");

        let report = TrashMover::new(dir.path().join("trash"), None)
            .execute(&[gone_candidate, snapshot(&ok)])
            .unwrap();
        assert_eq!(report.items_moved, 1);
        assert_eq!(report.items_failed, 1);
        assert!(!ok.exists());
    }
}

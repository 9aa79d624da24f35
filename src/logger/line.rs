//! Plain-text line logger: `<timestamp> - <LEVEL> - <message>` per line.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees a partial line. Degradation chain:
//!
//! 1. The log file (parents created as needed)
//! 2. stderr with an `[SFS-LOG]` prefix
//! 3. Silent discard (logging must never abort a run)

use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Routine progress.
    Info,
    /// Recoverable per-file failure.
    Error,
}

impl Level {
    const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Append-only line writer with stderr fallback.
pub struct LineWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    state: WriterState,
}

impl LineWriter {
    /// Open the log file for appending, degrading to stderr on failure.
    pub fn open(path: &Path) -> Self {
        match open_append(path) {
            Ok(file) => Self {
                path: path.to_path_buf(),
                writer: Some(BufWriter::new(file)),
                state: WriterState::Normal,
            },
            Err(e) => {
                let _ = writeln!(
                    io::stderr(),
                    "[SFS-LOG] cannot open {}: {e}, logging to stderr",
                    path.display()
                );
                Self {
                    path: path.to_path_buf(),
                    writer: None,
                    state: WriterState::Stderr,
                }
            }
        }
    }

    /// Write one timestamped line.
    pub fn write(&mut self, level: Level, message: &str) {
        let line = format!("{} - {} - {message}\n", utc_now(), level.label());
        self.write_line(&line);
    }

    /// Flush buffered lines to the file.
    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current sink, for diagnostics.
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "file",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.degrade();
                        self.write_line(line);
                    }
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[SFS-LOG] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = WriterState::Stderr;
        let _ = writeln!(
            io::stderr(),
            "[SFS-LOG] write to {} failed, logging to stderr",
            self.path.display()
        );
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

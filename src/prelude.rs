//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use stale_file_sweeper::prelude::*;
//! ```

// Core
pub use crate::core::config::{FileConfig, Overrides, ScanConfig};
pub use crate::core::errors::{Result, SfsError};

// Logger
pub use crate::logger::activity::{ScanEvent, ScanLoggerHandle, spawn_logger};

// Scanner
pub use crate::scanner::filter::{CandidateFile, CandidateFilter, CandidateObserver, ScanResult};
pub use crate::scanner::mover::{MoveReport, TrashMover};
pub use crate::scanner::walker::{FileWalker, WalkerConfig};

#![forbid(unsafe_code)]

//! Stale File Sweeper (sfs) — finds old, large files under a directory tree
//! and moves them into a flat trash directory for later review.
//!
//! The pipeline has three stages:
//! 1. **Walker** — parallel directory traversal streaming file paths
//! 2. **Filter** — size/age/extension qualification with snapshotting
//! 3. **Mover** — guarded sequential renames into the trash directory
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use stale_file_sweeper::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use stale_file_sweeper::core::config::ScanConfig;
//! use stale_file_sweeper::scanner::walker::{FileWalker, WalkerConfig};
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod scanner;

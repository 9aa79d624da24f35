//! Configuration system: defaults + TOML file + env overrides + CLI flags.
//!
//! Precedence, lowest to highest: built-in defaults, config file (default
//! `~/.config/sfs/config.toml`), `SFS_*` environment variables, CLI flags.
//! The merged result is validated into an immutable [`ScanConfig`] before
//! any scanning starts.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SfsError};
use crate::core::paths;

/// Default size threshold in megabytes.
pub const DEFAULT_SIZE_LIMIT_MB: u64 = 100;
/// Default age threshold in days.
pub const DEFAULT_DAYS_LIMIT: u64 = 365;
/// Default excluded extensions (case-sensitive, leading dot).
pub const DEFAULT_EXCLUDED_EXTENSIONS: [&str; 2] = [".docx", ".xlsx"];

/// On-disk configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub scan: ScanSection,
    pub trash: TrashSection,
}

/// `[scan]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanSection {
    /// Directory to scan. Defaults to the home directory.
    pub dir: Option<PathBuf>,
    /// Size threshold in megabytes.
    pub size_mb: u64,
    /// Age threshold in days.
    pub days: u64,
    /// Extensions to exclude, with the leading dot.
    pub exclude: Vec<String>,
    /// Filter worker count. 0 means auto (4x available cores).
    pub parallelism: usize,
}

/// `[trash]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrashSection {
    /// Trash directory. Defaults to `<home>/trash`.
    pub dir: Option<PathBuf>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            dir: None,
            size_mb: DEFAULT_SIZE_LIMIT_MB,
            days: DEFAULT_DAYS_LIMIT,
            exclude: DEFAULT_EXCLUDED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            parallelism: 0,
        }
    }
}

impl FileConfig {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        paths::home_dir().join(".config").join("sfs").join("config.toml")
    }

    /// Load from an explicit or default path.
    ///
    /// A missing file is only an error when the path was given explicitly;
    /// otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SfsError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Ok(toml::from_str(&raw)?)
        } else if path.is_some() {
            Err(SfsError::MissingConfig { path: path_buf })
        } else {
            Ok(Self::default())
        }
    }
}

/// CLI-level overrides applied on top of the file config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dir: Option<PathBuf>,
    pub size_mb: Option<u64>,
    pub days: Option<u64>,
    pub exclude: Option<Vec<String>>,
    pub trash: Option<PathBuf>,
    pub parallelism: Option<usize>,
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,
    /// Size threshold in bytes; files must be strictly larger to qualify.
    pub size_limit_bytes: u64,
    /// Age threshold in days; files must be strictly older to qualify.
    pub days_limit: u64,
    /// Excluded extensions, case-sensitive, with leading dot.
    pub excluded_extensions: HashSet<String>,
    /// Destination directory for relocated files.
    pub trash_dir: PathBuf,
    /// Filter worker count.
    pub parallelism: usize,
}

impl ScanConfig {
    /// Merge file config, env overrides, and CLI overrides, then validate.
    ///
    /// Validation is fatal by design: a nonexistent root or an unwritable
    /// trash directory must be caught before the scan begins. The trash
    /// directory is created here (idempotently) because the log file lives
    /// inside it.
    pub fn resolve(mut file: FileConfig, overrides: &Overrides) -> Result<Self> {
        apply_env_overrides(&mut file)?;

        let home = paths::home_dir();
        let root = overrides
            .dir
            .clone()
            .or_else(|| file.scan.dir.clone())
            .unwrap_or_else(|| home.clone());
        let trash_dir = overrides
            .trash
            .clone()
            .or_else(|| file.trash.dir.clone())
            .unwrap_or_else(|| home.join("trash"));
        let size_mb = overrides.size_mb.unwrap_or(file.scan.size_mb);
        let days_limit = overrides.days.unwrap_or(file.scan.days);
        let exclude = overrides
            .exclude
            .clone()
            .unwrap_or_else(|| file.scan.exclude.clone());
        let parallelism = overrides
            .parallelism
            .unwrap_or(file.scan.parallelism);

        let config = Self {
            root: paths::absolute(&root),
            size_limit_bytes: size_mb.saturating_mul(1024 * 1024),
            days_limit,
            excluded_extensions: exclude.iter().map(|e| normalize_extension(e)).collect(),
            trash_dir: paths::absolute(&trash_dir),
            parallelism: effective_parallelism(parallelism),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let meta = fs::metadata(&self.root).map_err(|_| SfsError::InvalidConfig {
            details: format!("scan directory does not exist: {}", self.root.display()),
        })?;
        if !meta.is_dir() {
            return Err(SfsError::InvalidConfig {
                details: format!("scan path is not a directory: {}", self.root.display()),
            });
        }

        fs::create_dir_all(&self.trash_dir).map_err(|e| SfsError::InvalidConfig {
            details: format!(
                "trash directory is not writable: {}: {e}",
                self.trash_dir.display()
            ),
        })?;

        Ok(())
    }

    /// Path of the run log file, inside the trash directory.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.trash_dir.join("file_scanner.log")
    }

    /// One-line summary used for the initialization log entry.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut exts: Vec<&str> = self
            .excluded_extensions
            .iter()
            .map(String::as_str)
            .collect();
        exts.sort_unstable();
        format!(
            "root={} size_limit_bytes={} days_limit={} exclude=[{}] trash={} parallelism={}",
            self.root.display(),
            self.size_limit_bytes,
            self.days_limit,
            exts.join(","),
            self.trash_dir.display(),
            self.parallelism,
        )
    }
}

/// Comparison against `Path::extension` needs the leading dot present.
fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

fn effective_parallelism(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    // Stat-bound work, so oversubscribe the cores.
    std::thread::available_parallelism().map_or(4, |n| (n.get() * 4).min(64))
}

fn apply_env_overrides(file: &mut FileConfig) -> Result<()> {
    set_env_u64("SFS_SIZE_LIMIT_MB", &mut file.scan.size_mb)?;
    set_env_u64("SFS_DAYS_LIMIT", &mut file.scan.days)?;
    set_env_usize("SFS_PARALLELISM", &mut file.scan.parallelism)?;
    Ok(())
}

fn set_env_u64(name: &str, target: &mut u64) -> Result<()> {
    if let Ok(raw) = env::var(name) {
        *target = raw.trim().parse().map_err(|_| SfsError::InvalidConfig {
            details: format!("{name} must be an integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, target: &mut usize) -> Result<()> {
    if let Ok(raw) = env::var(name) {
        *target = raw.trim().parse().map_err(|_| SfsError::InvalidConfig {
            details: format!("{name} must be an integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

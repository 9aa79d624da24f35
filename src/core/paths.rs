//! Shared path helpers.

use std::env;
use std::path::{Component, Path, PathBuf};

/// The user's home directory, falling back to `/tmp` when `HOME` is unset.
pub fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[SFS-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

/// Resolve a path to an absolute, normalized path.
///
/// `fs::canonicalize` is used when the path exists (resolving symlinks).
/// Otherwise the path is made absolute against the CWD and `.`/`..`
/// components are folded syntactically.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    std::fs::canonicalize(&joined).unwrap_or_else(|_| fold_dots(&joined))
}

fn fold_dots(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_canonicalizes_existing_paths() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(
            absolute(Path::new(".")),
            std::fs::canonicalize(&cwd).unwrap()
        );
    }

    #[test]
    fn absolute_folds_dots_in_nonexistent_paths() {
        let input = Path::new("/nonexistent_sfs_test/foo/../bar/./baz");
        assert!(std::fs::canonicalize(input).is_err());
        assert_eq!(absolute(input), Path::new("/nonexistent_sfs_test/bar/baz"));
    }

    #[test]
    fn parent_of_root_stays_at_root() {
        assert_eq!(fold_dots(Path::new("/../foo")), Path::new("/foo"));
    }

    #[test]
    fn home_dir_is_absolute() {
        assert!(home_dir().is_absolute());
    }
}

//! Data-directory path plumbing.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use exhume_common::{Error, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Resolve the user-supplied data directory path: `.` means the current
/// working directory, relative paths are joined to it, absolute paths pass
/// through. The result must be an existing directory.
pub fn resolve_data_dir(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Config("no data directory given".to_string()));
    }
    let path = if raw == "." {
        std::env::current_dir()?
    } else if raw.starts_with('/') {
        PathBuf::from(raw)
    } else {
        std::env::current_dir()?.join(raw)
    };
    if !path.is_dir() {
        return Err(Error::Config(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(path)
}

/// Recursively open up the data directory so the engine inside the
/// container can read and write it. Per-entry failures are logged and
/// skipped.
pub fn relax_permissions(root: &Path) {
    let mut changed = 0usize;
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walk error under {}: {e}", root.display());
                continue;
            }
        };
        match fs::set_permissions(entry.path(), fs::Permissions::from_mode(0o777)) {
            Ok(()) => {
                debug!("permissions of {} set to 0777", entry.path().display());
                changed += 1;
            }
            Err(e) => warn!("cannot change permissions of {}: {e}", entry.path().display()),
        }
    }
    info!(
        "permissions relaxed on {changed} entries under {}",
        root.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_resolves_to_current_dir() {
        let resolved = resolve_data_dir(".").unwrap();
        assert_eq!(resolved, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_absolute_path_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().to_str().unwrap();
        assert_eq!(resolve_data_dir(raw).unwrap(), dir.path());
    }

    #[test]
    fn test_missing_directory_is_a_config_error() {
        let err = resolve_data_dir("/no/such/exhume/dir").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(resolve_data_dir("  ").is_err());
    }

    #[test]
    fn test_relax_permissions_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("shop");
        fs::create_dir(&sub).unwrap();
        let file = sub.join("orders.frm");
        fs::write(&file, b"x").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o600)).unwrap();

        relax_permissions(dir.path());

        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }
}

use super::DeleteMode;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: u64,
    pub failures: u64,
}

#[cfg(unix)]
fn make_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    let mode = metadata.permissions().mode();
    let wanted = if metadata.is_dir() { mode | 0o700 } else { mode | 0o200 };
    fs::set_permissions(path, fs::Permissions::from_mode(wanted))
}

#[cfg(not(unix))]
fn make_writable(path: &Path) -> io::Result<()> {
    let mut permissions = fs::symlink_metadata(path)?.permissions();
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

/// One removal with a single retry after clearing read-only bits on the entry and its parent.
fn remove_with_retry(path: &Path, is_dir: bool) -> io::Result<()> {
    match remove_entry(path, is_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(first) => {
            log::debug!("Retrying {} after clearing read-only bits: {}", path.display(), first);
            if let Some(parent) = path.parent() {
                let _ = make_writable(parent);
            }
            let _ = make_writable(path);
            remove_entry(path, is_dir)
        }
    }
}

/// Deletes everything below `root`, deepest entries first, continuing past failures.
/// `root` itself is removed too when `mode` is [`DeleteMode::Item`].
pub(crate) fn force_remove(root: &Path, mode: DeleteMode) -> RemovalReport {
    let mut report = RemovalReport::default();

    let metadata = match fs::symlink_metadata(root) {
        Ok(m) => m,
        Err(_) => return report,
    };

    if !metadata.is_dir() {
        if mode == DeleteMode::Contents {
            log::warn!("{} is not a directory, nothing to empty", root.display());
            return report;
        }
        match remove_with_retry(root, false) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                log::debug!("Cannot remove {}: {}", root.display(), e);
                report.failures += 1;
            }
        }
        return report;
    }

    // dirs must be writable before their children can go
    let _ = make_writable(root);

    let min_depth = match mode {
        DeleteMode::Item => 0,
        DeleteMode::Contents => 1,
    };

    let walker = WalkDir::new(root)
        .follow_links(false)
        .contents_first(true)
        .min_depth(min_depth);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("Cannot read below {}: {}", root.display(), e);
                report.failures += 1;
                continue;
            }
        };
        let is_dir = entry.file_type().is_dir();
        match remove_with_retry(entry.path(), is_dir) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                log::debug!("Cannot remove {}: {}", entry.path().display(), e);
                report.failures += 1;
            }
        }
    }

    report
}

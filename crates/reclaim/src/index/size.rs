use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Totals gathered by a single walk of a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeStats {
    pub bytes: u64,
    pub files: u64,
    pub dirs: u64,
    pub errors: u64,
}

/// Exact recursive size of `path` in bytes.
///
/// Unreadable entries contribute zero; the walk never fails as a whole. A file returns its
/// own length and a missing path returns 0. Symlinks are not followed.
pub fn measure<P: AsRef<Path>>(path: P) -> u64 {
    tally(path).bytes
}

/// Like [`measure`], but also reports how many entries were seen and skipped.
pub fn tally<P: AsRef<Path>>(path: P) -> SizeStats {
    let path = path.as_ref();
    let mut stats = SizeStats::default();

    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(_) => return stats,
    };

    if metadata.is_file() {
        stats.files = 1;
        stats.bytes = metadata.len();
        return stats;
    }

    if !metadata.is_dir() {
        return stats;
    }

    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry under {}: {}", path.display(), e);
                stats.errors += 1;
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            stats.dirs += 1;
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(m) => {
                    stats.files += 1;
                    stats.bytes += m.len();
                }
                Err(_) => stats.errors += 1,
            }
        }
    }

    stats
}

use crate::error::{ReclaimError, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use walkdir::WalkDir;

pub(crate) fn hash_file(path: &Path) -> Result<blake3::Hash> {
    let file = File::open(path).map_err(|e| {
        log::error!("Failed to open file for hashing: {}: {}", path.display(), e);
        ReclaimError::from_io(path, e)
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

fn copy_file_verified(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest).map_err(|e| ReclaimError::from_io(src, e))?;

    let expected = hash_file(src)?;
    let actual = hash_file(dest)?;
    if expected != actual {
        return Err(ReclaimError::Relocation {
            path: src.to_path_buf(),
            message: format!("copy at {} does not match the source", dest.display()),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_link(src: &Path, _dest: &Path) -> Result<()> {
    log::warn!("Skipping symlink {} during copy", src.display());
    Ok(())
}

/// Copies `src` (file or tree) to `dest`, checking every copied file against its source hash.
pub(crate) fn copy_verified(src: &Path, dest: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(src).map_err(|e| ReclaimError::from_io(src, e))?;
    if metadata.is_file() {
        return copy_file_verified(src, dest);
    }
    if metadata.file_type().is_symlink() {
        return copy_link(src, dest);
    }

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| ReclaimError::Relocation {
            path: src.to_path_buf(),
            message: e.to_string(),
        })?;
        let relative = entry.path().strip_prefix(src).map_err(|e| ReclaimError::Relocation {
            path: entry.path().to_path_buf(),
            message: e.to_string(),
        })?;
        let target = dest.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ReclaimError::from_io(&target, e))?;
        } else if file_type.is_symlink() {
            copy_link(entry.path(), &target)?;
        } else if file_type.is_file() {
            copy_file_verified(entry.path(), &target)?;
        }
    }
    Ok(())
}

pub(crate) fn remove_any(path: &Path) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copies back into `src` whatever a failed removal already deleted, using the verified copy at `dest`.
fn refill_source(dest: &Path, src: &Path) -> Result<()> {
    for entry in WalkDir::new(dest).follow_links(false) {
        let entry = entry.map_err(|e| ReclaimError::Relocation {
            path: dest.to_path_buf(),
            message: e.to_string(),
        })?;
        let relative = entry.path().strip_prefix(dest).map_err(|e| ReclaimError::Relocation {
            path: entry.path().to_path_buf(),
            message: e.to_string(),
        })?;
        let target = src.join(relative);
        if fs::symlink_metadata(&target).is_ok() {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ReclaimError::from_io(&target, e))?;
        } else if file_type.is_symlink() {
            copy_link(entry.path(), &target)?;
        } else if file_type.is_file() {
            copy_file_verified(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy leg of a move: verified copy to `dest`, then `remove_source` on `src`.
///
/// Either the whole move happens or `src` is left complete and `dest` is gone. When the
/// source cannot be removed, anything already deleted from it is refilled from the copy
/// before the copy is dropped.
fn copy_then_remove<R>(src: &Path, dest: &Path, remove_source: R) -> Result<()>
where
    R: FnOnce(&Path) -> std::io::Result<()>,
{
    if let Err(e) = copy_verified(src, dest) {
        if fs::symlink_metadata(dest).is_ok() {
            if let Err(cleanup) = remove_any(dest) {
                log::error!("Failed to remove partial copy {}: {}", dest.display(), cleanup);
            }
        }
        return Err(e);
    }

    let removal = match remove_source(src) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    log::warn!(
        "Copied {} to {} but could not remove the source: {}",
        src.display(),
        dest.display(),
        removal
    );

    if let Err(refill) = refill_source(dest, src) {
        log::error!(
            "Source {} is incomplete and could not be refilled ({}); the full copy stays at {}",
            src.display(),
            refill,
            dest.display()
        );
        return Err(ReclaimError::Relocation {
            path: src.to_path_buf(),
            message: format!(
                "could not remove the source ({}); the full copy stays at {}",
                removal,
                dest.display()
            ),
        });
    }
    if let Err(cleanup) = remove_any(dest) {
        log::error!("Failed to remove copy {}: {}", dest.display(), cleanup);
    }

    Err(ReclaimError::Relocation {
        path: src.to_path_buf(),
        message: format!("could not remove the source: {}", removal),
    })
}

/// Moves `src` to `dest`. A plain rename is tried first; when that fails (typically because
/// the two paths are on different volumes) the payload is copied, verified and the source
/// removed. An error leaves `src` in place and nothing at `dest`.
pub(crate) fn move_path(src: &Path, dest: &Path) -> Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReclaimError::NotFound(src.to_path_buf()));
        }
        Err(e) => {
            log::debug!(
                "Rename {} -> {} failed ({}), falling back to copy",
                src.display(),
                dest.display(),
                e
            );
        }
    }

    copy_then_remove(src, dest, remove_any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"test content").unwrap();

        let hash = hash_file(&file_path).unwrap();
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(hash, hash_file(&file_path).unwrap());

        fs::write(&file_path, b"modified content").unwrap();
        assert_ne!(hash, hash_file(&file_path).unwrap());
    }

    #[test]
    fn test_copy_verified_tree() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("a.txt"), b"alpha").unwrap();
        fs::write(src.join("nested/deeper/b.txt"), b"beta").unwrap();

        let dest = temp_dir.path().join("dest");
        copy_verified(&src, &dest).unwrap();

        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(dest.join("nested/deeper/b.txt")).unwrap(), b"beta");
        assert!(src.join("a.txt").exists());
    }

    #[test]
    fn test_move_path_file_and_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.bin");
        fs::write(&file, b"payload").unwrap();
        let moved = temp_dir.path().join("g.bin");
        move_path(&file, &moved).unwrap();
        assert!(!file.exists());
        assert_eq!(fs::read(&moved).unwrap(), b"payload");

        let dir = temp_dir.path().join("d");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("x"), b"x").unwrap();
        let moved_dir = temp_dir.path().join("e");
        move_path(&dir, &moved_dir).unwrap();
        assert!(!dir.exists());
        assert!(moved_dir.join("x").is_file());
    }

    #[test]
    fn test_move_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = move_path(&temp_dir.path().join("nope"), &temp_dir.path().join("dest"));
        assert!(matches!(result, Err(ReclaimError::NotFound(_))));
    }

    #[test]
    fn test_copy_leg_moves_file() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("big.iso");
        fs::write(&src, b"disk image").unwrap();
        let dest = temp_dir.path().join("area/big.iso");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();

        copy_then_remove(&src, &dest, remove_any).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"disk image");
    }

    #[test]
    fn test_undeletable_source_fails_and_drops_copy() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("locked.bin");
        fs::write(&src, b"keep me").unwrap();
        let dest = temp_dir.path().join("copy.bin");

        let result = copy_then_remove(&src, &dest, |_| {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "immutable"))
        });

        match result {
            Err(ReclaimError::Relocation { path, message }) => {
                assert_eq!(path, src);
                assert!(message.contains("immutable"));
            }
            other => panic!("expected relocation error, got {:?}", other),
        }
        assert_eq!(fs::read(&src).unwrap(), b"keep me");
        assert!(fs::symlink_metadata(&dest).is_err());
    }

    #[test]
    fn test_partially_removed_tree_is_refilled() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("proj");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"alpha").unwrap();
        fs::write(src.join("sub/b.txt"), b"beta").unwrap();
        let dest = temp_dir.path().join("moved");

        let result = copy_then_remove(&src, &dest, |path| {
            fs::remove_dir_all(path.join("sub"))?;
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "busy"))
        });

        assert!(matches!(result, Err(ReclaimError::Relocation { .. })));
        assert_eq!(fs::read(src.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(src.join("sub/b.txt")).unwrap(), b"beta");
        assert!(!dest.exists());
    }
}

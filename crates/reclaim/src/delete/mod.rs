mod remove;

use crate::classify::Tier;
use crate::error::{ReclaimError, Result};
use crate::index::{measure, ScanHit};
use crate::quarantine::{QuarantineEntry, QuarantineStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub use remove::RemovalReport;

pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_PURGE_TIMEOUT_SECS: u64 = 60;

/// Timeouts for destructive operations, read from the `[delete]` settings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeleteOptions {
    pub timeout_secs: u64,
    pub purge_timeout_secs: u64,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_DELETE_TIMEOUT_SECS,
            purge_timeout_secs: DEFAULT_PURGE_TIMEOUT_SECS,
        }
    }
}

impl DeleteOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn purge_timeout(&self) -> Duration {
        Duration::from_secs(self.purge_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove the path itself.
    Item,
    /// Empty a directory but keep it in place.
    Contents,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub size_before: u64,
    pub size_after: u64,
    pub freed: u64,
    /// The item is gone (or, for [`DeleteMode::Contents`], the directory is empty).
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Disposal {
    Deleted(DeleteOutcome),
    Quarantined(QuarantineEntry),
}

impl Disposal {
    pub fn freed(&self) -> u64 {
        match self {
            Disposal::Deleted(outcome) => outcome.freed,
            Disposal::Quarantined(entry) => entry.size,
        }
    }
}

fn is_gone(path: &Path, mode: DeleteMode) -> bool {
    match mode {
        DeleteMode::Item => fs::symlink_metadata(path).is_err(),
        DeleteMode::Contents => fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true),
    }
}

/// Removes `path` (or its contents) on the blocking pool and reports the space actually freed.
///
/// Removal is best effort: entries that cannot be removed are skipped and the rest still go.
/// If the timeout expires the partial result is measured and returned rather than an error.
pub async fn delete_direct(path: &Path, mode: DeleteMode, options: &DeleteOptions) -> Result<DeleteOutcome> {
    if fs::symlink_metadata(path).is_err() {
        log::info!("{} is already gone", path.display());
        return Ok(DeleteOutcome {
            removed: true,
            ..DeleteOutcome::default()
        });
    }

    let size_before = measure(path);
    log::info!("Deleting {} ({} bytes, {:?})", path.display(), size_before, mode);

    let target = path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || remove::force_remove(&target, mode));

    match tokio::time::timeout(options.timeout(), task).await {
        Ok(Ok(report)) if report.failures > 0 => {
            log::warn!("{} entries under {} could not be removed", report.failures, path.display());
        }
        Ok(Ok(_)) => {}
        Ok(Err(join)) => {
            return Err(ReclaimError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                join.to_string(),
            )));
        }
        Err(_) => {
            log::warn!(
                "Deletion of {} still running after {}s, reporting partial result",
                path.display(),
                options.timeout_secs
            );
        }
    }

    let size_after = measure(path);
    let outcome = DeleteOutcome {
        size_before,
        size_after,
        freed: size_before.saturating_sub(size_after),
        removed: is_gone(path, mode),
    };
    log::info!("Freed {} bytes from {}", outcome.freed, path.display());
    Ok(outcome)
}

/// Applies the tier policy to a scan hit: safe items are deleted, caution items quarantined,
/// anything riskier is quarantined only after explicit confirmation.
pub async fn dispose(
    hit: &ScanHit,
    confirmed: bool,
    store: &QuarantineStore,
    options: &DeleteOptions,
) -> Result<Disposal> {
    match hit.classification.tier {
        Tier::Safe => delete_direct(&hit.path, DeleteMode::Item, options)
            .await
            .map(Disposal::Deleted),
        Tier::Caution => store
            .relocate(&hit.path, hit.is_directory)
            .map(Disposal::Quarantined),
        tier @ (Tier::Danger | Tier::Unknown) => {
            if !confirmed {
                return Err(ReclaimError::ConfirmationRequired {
                    path: hit.path.clone(),
                    tier: tier.to_string(),
                });
            }
            store
                .relocate(&hit.path, hit.is_directory)
                .map(Disposal::Quarantined)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use tempfile::TempDir;

    fn hit(path: &Path, tier: Tier) -> ScanHit {
        ScanHit {
            path: path.to_path_buf(),
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            size: measure(path),
            is_directory: path.is_dir(),
            modified_time: None,
            classification: Classification::new(tier, tier.default_label(), ""),
        }
    }

    #[tokio::test]
    async fn test_delete_item_measures_freed_space() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("build");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("a.o"), vec![0u8; 700]).unwrap();
        fs::write(dir.join("nested/b.o"), vec![0u8; 300]).unwrap();

        let outcome = delete_direct(&dir, DeleteMode::Item, &DeleteOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.size_before, 1000);
        assert_eq!(outcome.size_after, 0);
        assert_eq!(outcome.freed, 1000);
        assert!(outcome.removed);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_delete_contents_keeps_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        fs::create_dir_all(cache.join("shards")).unwrap();
        fs::write(cache.join("index"), vec![0u8; 50]).unwrap();
        fs::write(cache.join("shards/0"), vec![0u8; 150]).unwrap();

        let outcome = delete_direct(&cache, DeleteMode::Contents, &DeleteOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.freed, 200);
        assert!(outcome.removed);
        assert!(cache.is_dir());
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_path_frees_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = delete_direct(
            &temp_dir.path().join("missing"),
            DeleteMode::Item,
            &DeleteOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.freed, 0);
        assert!(outcome.removed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_clears_read_only_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("locked");
        fs::create_dir(&dir).unwrap();
        let file = dir.join("ro.bin");
        fs::write(&file, vec![0u8; 10]).unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        let outcome = delete_direct(&dir, DeleteMode::Item, &DeleteOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.freed, 10);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_dispose_follows_tier_policy() {
        let temp_dir = TempDir::new().unwrap();
        let store = QuarantineStore::new(temp_dir.path().join("q"));
        let options = DeleteOptions::default();

        let safe = temp_dir.path().join("old.log");
        fs::write(&safe, vec![0u8; 40]).unwrap();
        let disposal = dispose(&hit(&safe, Tier::Safe), false, &store, &options).await.unwrap();
        assert!(matches!(disposal, Disposal::Deleted(_)));
        assert_eq!(disposal.freed(), 40);
        assert!(!safe.exists());

        let caution = temp_dir.path().join("movie.mkv");
        fs::write(&caution, vec![0u8; 60]).unwrap();
        let disposal = dispose(&hit(&caution, Tier::Caution), false, &store, &options).await.unwrap();
        assert!(matches!(disposal, Disposal::Quarantined(_)));
        assert_eq!(disposal.freed(), 60);
        assert!(!caution.exists());
    }

    #[tokio::test]
    async fn test_dispose_requires_confirmation_for_risky_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let store = QuarantineStore::new(temp_dir.path().join("q"));
        let options = DeleteOptions::default();

        for tier in [Tier::Danger, Tier::Unknown] {
            let path = temp_dir.path().join(format!("{}.dat", tier));
            fs::write(&path, b"keep").unwrap();
            let item = hit(&path, tier);

            let result = dispose(&item, false, &store, &options).await;
            assert!(matches!(result, Err(ReclaimError::ConfirmationRequired { .. })));
            assert!(path.exists());

            let disposal = dispose(&item, true, &store, &options).await.unwrap();
            assert!(matches!(disposal, Disposal::Quarantined(_)));
            assert!(!path.exists());
        }
        assert_eq!(store.list().unwrap().len(), 2);
    }
}

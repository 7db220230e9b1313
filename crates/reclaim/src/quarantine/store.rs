use crate::error::{ReclaimError, Result};
use crate::index::measure;
use crate::quarantine::metadata::{
    self, is_sidecar_name, legacy_record_path, sidecar_path, MetadataLayout, Record,
    SidecarRecord, LEGACY_RECORD,
};
use crate::quarantine::transfer::{move_path, remove_any};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PURGE_TIMEOUT: Duration = Duration::from_secs(60);

const ENTRY_TIMESTAMP: &str = "%Y-%m-%dT%H-%M-%S";

/// An item held in the quarantine area, resolved from its on-disk record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineEntry {
    pub id: String,
    pub original_path: PathBuf,
    pub moved_at: DateTime<Utc>,
    pub size: u64,
    pub quarantine_path: PathBuf,
    pub is_directory: bool,
    pub layout: MetadataLayout,
}

/// The quarantine area: a directory of relocated payloads plus their restoration records.
#[derive(Debug, Clone)]
pub struct QuarantineStore {
    root: PathBuf,
    purge_timeout: Duration,
}

impl QuarantineStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            purge_timeout: DEFAULT_PURGE_TIMEOUT,
        }
    }

    pub fn with_purge_timeout(mut self, timeout: Duration) -> Self {
        self.purge_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the quarantine root if needed. Failure is logged, not raised.
    pub fn ensure_area(&self) -> bool {
        if self.root.is_dir() {
            return true;
        }
        match fs::create_dir_all(&self.root) {
            Ok(()) => {
                log::info!("Created quarantine area at {}", self.root.display());
                true
            }
            Err(e) => {
                log::error!("Cannot create quarantine area {}: {}", self.root.display(), e);
                false
            }
        }
    }

    fn unique_destination(&self, name: &str) -> PathBuf {
        let stamp = Utc::now().format(ENTRY_TIMESTAMP).to_string();
        let mut candidate = self.root.join(format!("{}_{}", stamp, name));
        let mut n = 1;
        while candidate.exists() || sidecar_path(&candidate).exists() {
            candidate = self.root.join(format!("{}-{}_{}", stamp, n, name));
            n += 1;
        }
        candidate
    }

    /// Moves `path` into the quarantine area and records where it came from.
    ///
    /// The size is measured before the move. If the record cannot be written the payload is
    /// moved back, so a relocation either completes with a record or leaves nothing behind.
    pub fn relocate(&self, path: &Path, is_directory: bool) -> Result<QuarantineEntry> {
        let source_meta = fs::symlink_metadata(path).map_err(|e| ReclaimError::from_io(path, e))?;
        if source_meta.is_dir() != is_directory {
            log::warn!(
                "{} was reported as {} but is {}",
                path.display(),
                if is_directory { "a directory" } else { "a file" },
                if source_meta.is_dir() { "a directory" } else { "a file" }
            );
        }

        if !self.ensure_area() {
            return Err(ReclaimError::Relocation {
                path: path.to_path_buf(),
                message: format!("quarantine area {} is unavailable", self.root.display()),
            });
        }

        if path.starts_with(&self.root) || self.root.starts_with(path) {
            return Err(ReclaimError::Relocation {
                path: path.to_path_buf(),
                message: "path overlaps the quarantine area".to_string(),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ReclaimError::Relocation {
                path: path.to_path_buf(),
                message: "path has no file name".to_string(),
            })?;

        let size = measure(path);
        let dest = self.unique_destination(&name);
        log::info!("Quarantining {} ({} bytes) to {}", path.display(), size, dest.display());

        move_path(path, &dest).map_err(|e| ReclaimError::Relocation {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let record = SidecarRecord {
            original_path: path.to_path_buf(),
            moved_at: Utc::now(),
            size,
            is_directory: source_meta.is_dir(),
        };

        if let Err(e) = metadata::write_sidecar(&dest, &record) {
            log::error!("Failed to write record for {}: {}", dest.display(), e);
            if let Err(back) = move_path(&dest, path) {
                log::error!(
                    "Could not move {} back to {}: {}",
                    dest.display(),
                    path.display(),
                    back
                );
            }
            return Err(ReclaimError::Relocation {
                path: path.to_path_buf(),
                message: format!("could not write restoration record: {}", e),
            });
        }

        Ok(QuarantineEntry {
            id: file_name(&dest),
            original_path: record.original_path,
            moved_at: record.moved_at,
            size,
            quarantine_path: dest,
            is_directory: record.is_directory,
            layout: MetadataLayout::Sidecar,
        })
    }

    /// All resolvable entries, newest first. Entries without a readable record are skipped.
    pub fn list(&self) -> Result<Vec<QuarantineEntry>> {
        if !self.ensure_area() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.root).map_err(|e| ReclaimError::from_io(&self.root, e))? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("Unreadable quarantine entry: {}", e);
                    continue;
                }
            };
            if is_sidecar_name(&dir_entry.file_name().to_string_lossy()) {
                continue;
            }
            match self.load(&dir_entry.path()) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::debug!("Skipping {}: {}", dir_entry.path().display(), e),
            }
        }

        entries.sort_by(|a, b| b.moved_at.cmp(&a.moved_at));
        Ok(entries)
    }

    /// Resolves one entry from its payload path inside the quarantine area.
    pub fn load(&self, quarantine_path: &Path) -> Result<QuarantineEntry> {
        if quarantine_path.parent() != Some(self.root.as_path()) {
            return Err(ReclaimError::NotFound(quarantine_path.to_path_buf()));
        }
        let payload_meta = fs::symlink_metadata(quarantine_path)
            .map_err(|e| ReclaimError::from_io(quarantine_path, e))?;

        let record = metadata::read_record(quarantine_path)?.ok_or_else(|| ReclaimError::Restore {
            path: quarantine_path.to_path_buf(),
            message: "no restoration record found".to_string(),
        })?;

        let (is_directory, size) = match &record {
            Record::Sidecar(r) => (r.is_directory || payload_meta.is_dir(), measure(quarantine_path)),
            Record::Legacy(_) => {
                let record_len = fs::metadata(legacy_record_path(quarantine_path))
                    .map(|m| m.len())
                    .unwrap_or(0);
                (true, measure(quarantine_path).saturating_sub(record_len))
            }
        };

        Ok(QuarantineEntry {
            id: file_name(quarantine_path),
            original_path: record.original_path().to_path_buf(),
            moved_at: record.moved_at(),
            size,
            quarantine_path: quarantine_path.to_path_buf(),
            is_directory,
            layout: record.layout(),
        })
    }

    /// Moves an entry back to where it came from and drops its record. Returns the bytes restored.
    ///
    /// Nothing is overwritten: if the original location is occupied the entry stays in
    /// quarantine with its record intact.
    pub fn restore(&self, entry: &QuarantineEntry) -> Result<u64> {
        let payload = &entry.quarantine_path;
        let restore_err = |message: String| ReclaimError::Restore {
            path: payload.clone(),
            message,
        };

        let record = metadata::read_record(payload)?
            .ok_or_else(|| restore_err("no restoration record found".to_string()))?;

        let restored = match record {
            Record::Sidecar(record) => self.restore_sidecar(payload, &record.original_path)?,
            Record::Legacy(record) => self.restore_legacy(payload, &record.original_path)?,
        };

        log::info!("Restored {} bytes to {}", restored, entry.original_path.display());
        Ok(restored)
    }

    fn restore_sidecar(&self, payload: &Path, original: &Path) -> Result<u64> {
        let restore_err = |message: String| ReclaimError::Restore {
            path: payload.to_path_buf(),
            message,
        };

        if fs::symlink_metadata(original).is_ok() {
            return Err(restore_err(format!("{} already exists", original.display())));
        }
        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| restore_err(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let size = measure(payload);
        move_path(payload, original).map_err(|e| restore_err(e.to_string()))?;

        let sidecar = sidecar_path(payload);
        if let Err(e) = fs::remove_file(&sidecar) {
            log::warn!("Restored payload but could not remove {}: {}", sidecar.display(), e);
        }
        Ok(size)
    }

    fn restore_legacy(&self, payload: &Path, original: &Path) -> Result<u64> {
        let restore_err = |message: String| ReclaimError::Restore {
            path: payload.to_path_buf(),
            message,
        };

        let members: Vec<PathBuf> = fs::read_dir(payload)
            .map_err(|e| restore_err(e.to_string()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != LEGACY_RECORD)
            .map(|e| e.path())
            .collect();

        for member in &members {
            let target = original.join(member.file_name().unwrap_or_default());
            if fs::symlink_metadata(&target).is_ok() {
                return Err(restore_err(format!("{} already exists", target.display())));
            }
        }

        fs::create_dir_all(original)
            .map_err(|e| restore_err(format!("cannot create {}: {}", original.display(), e)))?;

        let mut restored = 0u64;
        for member in &members {
            let target = original.join(member.file_name().unwrap_or_default());
            let size = measure(member);
            move_path(member, &target).map_err(|e| restore_err(e.to_string()))?;
            restored += size;
        }

        fs::remove_file(legacy_record_path(payload))
            .map_err(|e| restore_err(format!("cannot remove record: {}", e)))?;
        fs::remove_dir(payload).map_err(|e| restore_err(format!("cannot remove shell: {}", e)))?;
        Ok(restored)
    }

    /// Deletes an entry for good, payload first and record second. Returns the bytes deleted.
    pub async fn purge(&self, entry: &QuarantineEntry) -> Result<u64> {
        let payload = entry.quarantine_path.clone();
        if fs::symlink_metadata(&payload).is_err() {
            return Err(ReclaimError::NotFound(payload));
        }

        let size = measure(&payload);
        let target = payload.clone();
        let removal = tokio::task::spawn_blocking(move || remove_any(&target));

        match tokio::time::timeout(self.purge_timeout, removal).await {
            Err(_) => {
                log::warn!("Purge of {} timed out", payload.display());
                return Err(ReclaimError::Timeout {
                    operation: format!("purge of {}", payload.display()),
                    seconds: self.purge_timeout.as_secs(),
                });
            }
            Ok(Err(join)) => {
                return Err(ReclaimError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    join.to_string(),
                )));
            }
            Ok(Ok(Err(e))) => return Err(ReclaimError::from_io(&payload, e)),
            Ok(Ok(Ok(()))) => {}
        }

        let sidecar = sidecar_path(&payload);
        if sidecar.exists() {
            fs::remove_file(&sidecar).map_err(|e| ReclaimError::from_io(&sidecar, e))?;
        }

        log::info!("Purged {} ({} bytes)", payload.display(), size);
        Ok(size)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

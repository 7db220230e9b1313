//! The operation surface consumed by the CLI. Every call returns a serialisable response;
//! failures are reported inside it rather than raised.

use crate::classify::{Classification, RuleEngine};
use crate::config::{Config, Settings};
use crate::delete::{delete_direct, DeleteMode, DeleteOptions};
use crate::error::Result;
use crate::index::{
    self, FolderNode, OverviewOptions, ScanGate, ScanHit, ScanKind, ScanOptions, ScanProgress,
};
use crate::quarantine::{QuarantineEntry, QuarantineStore};
use crate::util::expand_path;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeScanResponse {
    pub success: bool,
    pub cancelled: bool,
    pub results: Vec<ScanHit>,
    pub scanned_count: u64,
    pub error_count: u64,
    pub total_size: u64,
    pub duration_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub cancelled: bool,
    pub nodes: Vec<FolderNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateResponse {
    pub success: bool,
    pub freed_space: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub success: bool,
    pub restored_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub success: bool,
    pub deleted_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub freed_space: u64,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a command needs: settings, the compiled rules, the quarantine area and the
/// scan gate shared with whoever may cancel a running scan.
pub struct Operations {
    settings: Settings,
    engine: RuleEngine,
    store: QuarantineStore,
    gate: ScanGate,
}

impl Operations {
    pub fn new(config: &Config, settings: Settings) -> Result<Self> {
        let engine = RuleEngine::new(&settings.rules)?;
        let store = QuarantineStore::new(&config.quarantine_root)
            .with_purge_timeout(settings.delete.purge_timeout());
        Ok(Self {
            settings,
            engine,
            store,
            gate: ScanGate::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &QuarantineStore {
        &self.store
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn delete_options(&self) -> &DeleteOptions {
        &self.settings.delete
    }

    /// A handle for cancelling scans from another task.
    pub fn gate(&self) -> ScanGate {
        self.gate.clone()
    }

    pub fn cancel_scan(&self, kind: ScanKind) -> bool {
        self.gate.cancel(kind)
    }

    /// Zero when the path cannot be expanded, like any other unreadable location.
    pub fn measure_directory(&self, path: &str) -> u64 {
        match expand_path(path) {
            Ok(path) => index::measure(path),
            Err(e) => {
                log::warn!("{}", e);
                0
            }
        }
    }

    pub fn classify(&self, path: &str) -> Classification {
        self.engine.classify_str(path)
    }

    pub async fn scan_volume_overview(&self, options: &OverviewOptions) -> OverviewResponse {
        let session = match self.gate.begin(ScanKind::Overview) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("{}", e);
                return OverviewResponse {
                    error: Some(e.to_string()),
                    ..OverviewResponse::default()
                };
            }
        };

        let outcome = index::scan_overview(options, &session).await;
        OverviewResponse {
            cancelled: outcome.cancelled,
            nodes: outcome.nodes,
            error: None,
        }
    }

    pub async fn scan_large_items<F>(&self, request: &ScanOptions, on_progress: F) -> LargeScanResponse
    where
        F: FnMut(&ScanProgress),
    {
        let session = match self.gate.begin(ScanKind::LargeItems) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("{}", e);
                return LargeScanResponse {
                    error: Some(e.to_string()),
                    ..LargeScanResponse::default()
                };
            }
        };

        let outcome = index::scan_large_items(request, &self.engine, &session, on_progress).await;
        LargeScanResponse {
            success: !outcome.cancelled,
            cancelled: outcome.cancelled,
            results: outcome.hits,
            scanned_count: outcome.scanned_count,
            error_count: outcome.error_count,
            total_size: outcome.total_size,
            duration_secs: outcome.duration.as_secs(),
            error: None,
        }
    }

    pub fn relocate_to_quarantine(&self, path: &Path, is_directory: bool) -> RelocateResponse {
        match self.store.relocate(path, is_directory) {
            Ok(entry) => RelocateResponse {
                success: true,
                freed_space: entry.size,
                quarantine_path: Some(entry.quarantine_path),
                error: None,
            },
            Err(e) => {
                log::error!("Quarantine of {} failed: {}", path.display(), e);
                RelocateResponse {
                    error: Some(e.to_string()),
                    ..RelocateResponse::default()
                }
            }
        }
    }

    pub fn list_quarantine(&self) -> Vec<QuarantineEntry> {
        self.store.list().unwrap_or_else(|e| {
            log::error!("Cannot list quarantine area: {}", e);
            Vec::new()
        })
    }

    /// Accepts either an entry id or a full payload path.
    pub fn resolve_entry(&self, entry: &str) -> PathBuf {
        let candidate = PathBuf::from(entry);
        if candidate.components().count() == 1 {
            self.store.root().join(candidate)
        } else {
            candidate
        }
    }

    pub fn restore_from_quarantine(&self, entry: &str) -> RestoreResponse {
        let path = self.resolve_entry(entry);
        let result = self
            .store
            .load(&path)
            .and_then(|entry| self.store.restore(&entry));

        match result {
            Ok(restored_size) => RestoreResponse {
                success: true,
                restored_size,
                error: None,
            },
            Err(e) => {
                log::error!("Restore of {} failed: {}", path.display(), e);
                RestoreResponse {
                    error: Some(e.to_string()),
                    ..RestoreResponse::default()
                }
            }
        }
    }

    pub async fn purge_from_quarantine(&self, entry: &str) -> PurgeResponse {
        let path = self.resolve_entry(entry);
        let result = match self.store.load(&path) {
            Ok(entry) => self.store.purge(&entry).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(deleted_size) => PurgeResponse {
                success: true,
                deleted_size,
                error: None,
            },
            Err(e) => {
                log::error!("Purge of {} failed: {}", path.display(), e);
                PurgeResponse {
                    error: Some(e.to_string()),
                    ..PurgeResponse::default()
                }
            }
        }
    }

    pub async fn delete_path(&self, path: &str) -> DeleteResponse {
        let path = match expand_path(path) {
            Ok(path) => path,
            Err(e) => {
                log::error!("Delete refused: {}", e);
                return DeleteResponse {
                    error: Some(e.to_string()),
                    ..DeleteResponse::default()
                };
            }
        };
        match delete_direct(&path, DeleteMode::Item, &self.settings.delete).await {
            Ok(outcome) => DeleteResponse {
                success: outcome.removed || outcome.freed > 0,
                freed_space: outcome.freed,
                removed: outcome.removed,
                error: (!outcome.removed && outcome.freed == 0)
                    .then(|| "nothing could be removed (in use or access denied)".to_string()),
            },
            Err(e) => {
                log::error!("Delete of {} failed: {}", path.display(), e);
                DeleteResponse {
                    error: Some(e.to_string()),
                    ..DeleteResponse::default()
                }
            }
        }
    }
}

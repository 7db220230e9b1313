pub mod classify;
pub mod commands;
pub mod config;
pub mod delete;
pub mod error;
pub mod index;
pub mod quarantine;
pub mod suggest;
pub mod targets;
pub mod util;

pub use classify::{classify, Classification, ClassificationRule, RuleEngine, RuleOverride, Tier};
pub use commands::{
    DeleteResponse, LargeScanResponse, Operations, OverviewResponse, PurgeResponse,
    RelocateResponse, RestoreResponse,
};
pub use config::{Config, Settings};
pub use delete::{delete_direct, dispose, DeleteMode, DeleteOptions, DeleteOutcome, Disposal};
pub use error::{ReclaimError, Result};
pub use index::{
    measure, scan_large_items, scan_overview, FolderNode, OverviewOptions, ScanGate, ScanHit,
    ScanKind, ScanOptions, ScanOutcome, ScanProgress, ScanSession,
};
pub use quarantine::{MetadataLayout, QuarantineEntry, QuarantineStore};
pub use suggest::{smart_suggestions, Suggestion};
pub use targets::{CleanupTarget, TargetReport};

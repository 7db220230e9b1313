pub mod metadata;
pub mod store;
mod transfer;

pub use metadata::{MetadataLayout, LEGACY_RECORD, SIDECAR_SUFFIX};
pub use store::{QuarantineEntry, QuarantineStore, DEFAULT_PURGE_TIMEOUT};

pub mod overview;
pub mod scanner;
pub mod session;
pub mod size;

pub use overview::{scan_overview, FolderNode, OverviewOptions, OverviewOutcome};
pub use scanner::{scan_large_items, ScanHit, ScanOptions, ScanOutcome};
pub use session::{ScanGate, ScanKind, ScanProgress, ScanSession};
pub use size::{measure, tally, SizeStats};

use crate::index::session::ScanSession;
use crate::index::size::measure;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

pub const DEFAULT_CHILD_LIMIT: usize = 15;
pub const DEFAULT_MIN_ENTRY: u64 = 10 * MIB;
pub const DEFAULT_EXPLODE_ABOVE: u64 = 1024 * MIB;
pub const DEFAULT_PROMOTE_ABOVE: u64 = 100 * MIB;

#[cfg(windows)]
const DEFAULT_ROOTS: &[&str] = &[
    "C:\\Users",
    "C:\\Windows",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\ProgramData",
];

#[cfg(not(windows))]
const DEFAULT_ROOTS: &[&str] = &["/home", "/usr", "/opt", "/var", "/srv"];

/// Thresholds for the top-level volume overview, read from the `[overview]` settings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverviewOptions {
    pub roots: Vec<PathBuf>,
    /// Only the first `child_limit` subdirectories (name order) of each root are measured.
    pub child_limit: usize,
    /// Children at or below this size are dropped.
    pub min_entry: u64,
    /// Children above this size are broken up into their large grandchildren.
    pub explode_above: u64,
    /// Grandchildren above this size become entries of their own.
    pub promote_above: u64,
    pub explode_skip: Vec<String>,
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            roots: DEFAULT_ROOTS.iter().map(PathBuf::from).collect(),
            child_limit: DEFAULT_CHILD_LIMIT,
            min_entry: DEFAULT_MIN_ENTRY,
            explode_above: DEFAULT_EXPLODE_ABOVE,
            promote_above: DEFAULT_PROMOTE_ABOVE,
            explode_skip: vec!["AppData".to_string()],
        }
    }
}

impl OverviewOptions {
    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub name: String,
    pub path: PathBuf,
    pub total_size: u64,
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    fn leaf(name: String, path: PathBuf, total_size: u64) -> Self {
        Self {
            name,
            path,
            total_size,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverviewOutcome {
    pub nodes: Vec<FolderNode>,
    pub cancelled: bool,
    pub duration: Duration,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Immediate subdirectories of `dir` in name order. Symlinks are not included.
fn subdirectories(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| (entry.file_name().to_string_lossy().to_string(), entry.path()))
        .collect();
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    dirs
}

fn is_system_child(name: &str) -> bool {
    name.starts_with('$') || name == "System Volume Information"
}

async fn summarize_root(
    root: &Path,
    options: &OverviewOptions,
    session: &ScanSession,
) -> FolderNode {
    let root_name = file_name(root);
    let mut children = Vec::new();
    let mut total = 0u64;

    let candidates = subdirectories(root)
        .into_iter()
        .filter(|(name, _)| !is_system_child(name))
        .take(options.child_limit);

    for (name, path) in candidates {
        if session.is_cancelled() {
            break;
        }
        tokio::task::yield_now().await;

        let size = measure(&path);
        if size <= options.min_entry {
            continue;
        }
        total += size;

        if size <= options.explode_above {
            children.push(FolderNode::leaf(name, path, size));
            continue;
        }

        log::debug!("Breaking up {} ({} bytes)", path.display(), size);
        let mut promoted = 0u64;
        for (grand_name, grand_path) in subdirectories(&path) {
            if session.is_cancelled() {
                break;
            }
            if grand_name.starts_with('.') || options.explode_skip.iter().any(|s| *s == grand_name) {
                continue;
            }
            tokio::task::yield_now().await;

            let grand_size = measure(&grand_path);
            if grand_size > options.promote_above {
                children.push(FolderNode::leaf(
                    format!("{}/{}", name, grand_name),
                    grand_path,
                    grand_size,
                ));
                promoted += grand_size;
            }
        }

        let remainder = size.saturating_sub(promoted);
        if remainder > options.min_entry {
            children.push(FolderNode::leaf(format!("{} (other)", name), path, remainder));
        }
    }

    children.sort_by(|a, b| b.total_size.cmp(&a.total_size));
    FolderNode {
        name: root_name,
        path: root.to_path_buf(),
        total_size: total,
        children,
    }
}

/// Measures the top-level directories of the volume, breaking very large children into
/// their significant subdirectories so the result is useful at a glance.
///
/// A root that does not exist is left out. A root with nothing above the thresholds is
/// reported with a total of 0.
pub async fn scan_overview(options: &OverviewOptions, session: &ScanSession) -> OverviewOutcome {
    log::info!("Starting volume overview of {} root(s)", options.roots.len());
    let mut nodes = Vec::new();

    for root in &options.roots {
        if session.is_cancelled() {
            break;
        }
        if !root.is_dir() {
            log::debug!("Skipping missing root {}", root.display());
            continue;
        }
        log::info!("Measuring {}", root.display());
        nodes.push(summarize_root(root, options, session).await);
    }

    let cancelled = session.is_cancelled();
    if cancelled {
        log::warn!("Overview cancelled after {} root(s)", nodes.len());
    }
    nodes.sort_by(|a, b| b.total_size.cmp(&a.total_size));

    OverviewOutcome {
        nodes,
        cancelled,
        duration: session.elapsed(),
    }
}

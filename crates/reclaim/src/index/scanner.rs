use crate::classify::{Classification, RuleEngine};
use crate::index::session::{ProgressThrottle, ScanProgress, ScanSession};
use crate::index::size::measure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_MIN_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_RESULTS: usize = 200;
pub const DEFAULT_MAX_DEPTH: usize = 20;
pub const DEFAULT_YIELD_EVERY: u64 = 100;
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 200;

/// Directory names that are measured as a whole and never descended into.
pub const TERMINAL_FOLDERS: &[&str] = &[
    "node_modules",
    "cache",
    ".cache",
    "__pycache__",
    ".git",
    "Temp",
    "Logs",
    "CrashDumps",
    "npm-cache",
    "huggingface",
    "torch",
    ".nuget",
    "Installer",
    "uv",
];

/// Directory names the scanner never enters, wherever they appear.
pub const PROTECTED_DIRS: &[&str] = &[
    "$Recycle.Bin",
    "System Volume Information",
    "$WinREAgent",
    "Recovery",
    "Config.Msi",
    "Windows Defender",
    "lost+found",
];

#[cfg(windows)]
const DEFAULT_ROOTS: &[&str] = &[
    "C:\\Users",
    "C:\\ProgramData",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\Windows\\Temp",
    "C:\\Windows\\SoftwareDistribution",
];

#[cfg(not(windows))]
const DEFAULT_ROOTS: &[&str] = &["/home", "/root", "/opt", "/var/cache", "/var/log", "/var/tmp", "/tmp"];

/// Drivers, runtimes and boot files: removing anything below these breaks the machine.
#[cfg(windows)]
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "C:\\Program Files\\Steam",
    "C:\\Games",
    "C:\\Program Files\\NVIDIA Corporation",
    "C:\\Program Files (x86)\\NVIDIA Corporation",
    "C:\\Windows\\System32\\DriverStore\\FileRepository\\nv",
    "C:\\Program Files\\AMD",
    "C:\\Program Files (x86)\\AMD",
    "C:\\AMD",
    "C:\\Program Files\\Intel",
    "C:\\Program Files (x86)\\Intel",
    "C:\\Program Files\\Realtek",
    "C:\\Program Files (x86)\\Realtek",
    "C:\\Program Files\\Microsoft Visual Studio",
    "C:\\Program Files (x86)\\Microsoft Visual Studio",
    "C:\\Windows\\Microsoft.NET",
    "C:\\Program Files\\dotnet",
    "C:\\Windows\\System32",
    "C:\\Windows\\SysWOW64",
    "C:\\Windows\\WinSxS",
    "C:\\Windows\\Boot",
    "C:\\Recovery",
];

/// Drivers, runtimes and boot files: removing anything below these breaks the machine.
#[cfg(not(windows))]
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "/proc",
    "/sys",
    "/dev",
    "/run",
    "/boot",
    "/usr/lib/modules",
    "/usr/lib/firmware",
    "/opt/nvidia",
    "/opt/amdgpu",
    "/var/lib/dkms",
    "/.steam",
    "/.local/share/steam",
    "/snap/core",
];

/// Options for the large-item scan. Every field can be set from the `[scan]` settings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub roots: Vec<PathBuf>,
    pub min_size: u64,
    pub max_results: usize,
    pub exclude_dirs: Vec<String>,
    pub max_depth: usize,
    pub yield_every: u64,
    pub progress_interval_ms: u64,
    pub terminal_folders: Vec<String>,
    pub protected_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            roots: DEFAULT_ROOTS.iter().map(PathBuf::from).collect(),
            min_size: DEFAULT_MIN_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            yield_every: DEFAULT_YIELD_EVERY,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            terminal_folders: TERMINAL_FOLDERS.iter().map(|s| s.to_string()).collect(),
            protected_dirs: PROTECTED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }

    fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// A large file or terminal folder found by the scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHit {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
    pub modified_time: Option<DateTime<Utc>>,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub hits: Vec<ScanHit>,
    pub cancelled: bool,
    pub scanned_count: u64,
    pub error_count: u64,
    pub total_size: u64,
    pub duration: Duration,
}

/// Per-scan lookup state, lowercased once up front.
#[derive(Clone)]
struct Filters {
    exclude: Vec<String>,
    terminal: Vec<String>,
    protected: Vec<String>,
}

impl Filters {
    fn new(options: &ScanOptions) -> Self {
        Self {
            exclude: options
                .exclude_dirs
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase())
                .collect(),
            terminal: options.terminal_folders.iter().map(|s| s.to_lowercase()).collect(),
            protected: options.protected_dirs.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let lower = path.to_string_lossy().to_lowercase();
        self.exclude.iter().any(|e| lower.contains(e.as_str()))
    }

    fn is_terminal(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.terminal.iter().any(|t| *t == lower)
    }

    fn is_protected(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => {
                let lower = name.to_string_lossy().to_lowercase();
                self.protected.iter().any(|p| *p == lower)
            }
            None => false,
        }
    }

    /// Entries hidden from the walk together with everything below them.
    fn prunes(&self, entry: &DirEntry) -> bool {
        self.is_excluded(entry.path())
            || (entry.file_type().is_dir() && self.is_protected(entry.path()))
    }
}

struct Walk<'a, F> {
    options: &'a ScanOptions,
    engine: &'a RuleEngine,
    session: &'a ScanSession,
    filters: Filters,
    throttle: ProgressThrottle,
    on_progress: F,
    outcome: ScanOutcome,
    found_bytes: u64,
}

impl<'a, F> Walk<'a, F>
where
    F: FnMut(&ScanProgress),
{
    fn is_full(&self) -> bool {
        self.outcome.hits.len() >= self.options.max_results
    }

    fn report(&mut self, current: &Path, force: bool) {
        if !self.throttle.ready() && !force {
            return;
        }
        let progress = ScanProgress {
            scanned_count: self.outcome.scanned_count,
            found_count: self.outcome.hits.len(),
            found_bytes: self.found_bytes,
            current_path: current.to_path_buf(),
            elapsed: self.session.elapsed(),
        };
        (self.on_progress)(&progress);
    }

    fn emit(&mut self, path: PathBuf, size: u64, is_directory: bool, modified: Option<DateTime<Utc>>) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let classification = self.engine.classify(&path);
        log::debug!("Hit {} ({} bytes, {})", path.display(), size, classification.tier);
        self.found_bytes += size;
        self.outcome.hits.push(ScanHit {
            path,
            name,
            size,
            is_directory,
            modified_time: modified,
            classification,
        });
    }

    async fn walk_root(&mut self, root: &Path) {
        let filters = self.filters.clone();
        let mut entries = WalkDir::new(root)
            .follow_links(false)
            .max_depth(self.options.max_depth)
            .into_iter()
            .filter_entry(move |entry| !filters.prunes(entry));

        while let Some(next) = entries.next() {
            if self.session.is_cancelled() || self.is_full() {
                return;
            }

            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Unreadable entry at depth {}: {}", e.depth(), e);
                    self.outcome.error_count += 1;
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            self.outcome.scanned_count += 1;

            if self.options.yield_every > 0 && self.outcome.scanned_count % self.options.yield_every == 0 {
                tokio::task::yield_now().await;
                if let Some(parent) = entry.path().parent() {
                    self.report(parent, false);
                }
                if self.session.is_cancelled() {
                    return;
                }
            }

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                continue;
            }

            if file_type.is_file() {
                match entry.metadata() {
                    Ok(metadata) => {
                        if metadata.len() >= self.options.min_size {
                            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
                            self.emit(entry.into_path(), metadata.len(), false, modified);
                        }
                    }
                    Err(e) => {
                        log::debug!("Cannot stat {}: {}", entry.path().display(), e);
                        self.outcome.error_count += 1;
                    }
                }
            } else if file_type.is_dir() {
                if self.session.is_cancelled() {
                    return;
                }
                if !self.filters.is_terminal(&entry.file_name().to_string_lossy()) {
                    continue;
                }

                // measured whole, never descended
                entries.skip_current_dir();
                let size = measure(entry.path());
                if size >= self.options.min_size {
                    let modified = entry
                        .metadata()
                        .ok()
                        .and_then(|m| m.modified().ok())
                        .map(DateTime::<Utc>::from);
                    self.emit(entry.into_path(), size, true, modified);
                }
            }
        }
    }
}

/// Walks every configured root looking for files and terminal folders of at least
/// `options.min_size` bytes.
///
/// The walk yields to the runtime every `yield_every` entries and stops early when the
/// session is cancelled or `max_results` hits have been collected. Hits found before a
/// cancellation are kept in the outcome, classified and sorted like a complete run.
pub async fn scan_large_items<F>(
    options: &ScanOptions,
    engine: &RuleEngine,
    session: &ScanSession,
    on_progress: F,
) -> ScanOutcome
where
    F: FnMut(&ScanProgress),
{
    log::info!(
        "Starting large item scan of {} root(s) (min size {} bytes)",
        options.roots.len(),
        options.min_size
    );

    let mut walk = Walk {
        options,
        engine,
        session,
        filters: Filters::new(options),
        throttle: ProgressThrottle::new(options.progress_interval()),
        on_progress,
        outcome: ScanOutcome::default(),
        found_bytes: 0,
    };

    for root in &options.roots {
        if session.is_cancelled() || walk.is_full() {
            break;
        }
        if !root.is_dir() {
            log::debug!("Skipping missing root {}", root.display());
            continue;
        }
        log::info!("Scanning {}", root.display());
        walk.report(root, true);
        walk.walk_root(root).await;
    }

    let mut outcome = walk.outcome;
    outcome.cancelled = session.is_cancelled();
    outcome.hits.sort_by(|a, b| b.size.cmp(&a.size));
    outcome.hits.truncate(options.max_results);
    outcome.total_size = outcome.hits.iter().map(|h| h.size).sum();
    outcome.duration = session.elapsed();

    if outcome.cancelled {
        log::warn!(
            "Scan cancelled after {} entries, keeping {} partial result(s)",
            outcome.scanned_count,
            outcome.hits.len()
        );
    } else {
        log::info!(
            "Scan complete: {} large item(s), {} bytes, {} entries scanned, {} error(s)",
            outcome.hits.len(),
            outcome.total_size,
            outcome.scanned_count,
            outcome.error_count
        );
    }

    outcome
}

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const STALE_AFTER: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const DOWNLOADS_MIN_TOTAL: u64 = 10_000_000;
pub const DESKTOP_LARGE_FILE: u64 = 500 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub path: PathBuf,
    pub count: usize,
    /// Reclaimable bytes. Zero when the suggestion is only a hint.
    pub size: u64,
}

/// Files directly inside `dir` (not recursive) with their size and modification time.
fn top_level_files(dir: &Path) -> Vec<(u64, SystemTime)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.metadata().ok())
        .filter_map(|m| m.modified().ok().map(|t| (m.len(), t)))
        .collect()
}

fn is_stale(modified: SystemTime, now: SystemTime) -> bool {
    now.duration_since(modified)
        .map(|age| age > STALE_AFTER)
        .unwrap_or(false)
}

fn downloads(home: &Path, now: SystemTime) -> Option<Suggestion> {
    let dir = home.join("Downloads");
    let stale: Vec<u64> = top_level_files(&dir)
        .into_iter()
        .filter(|(_, modified)| is_stale(*modified, now))
        .map(|(len, _)| len)
        .collect();
    let total: u64 = stale.iter().sum();

    (total > DOWNLOADS_MIN_TOTAL).then(|| Suggestion {
        id: "downloads".to_string(),
        title: "Old files in Downloads".to_string(),
        description: format!("{} file(s) older than 30 days", stale.len()),
        path: dir,
        count: stale.len(),
        size: total,
    })
}

fn desktop(home: &Path, now: SystemTime) -> Option<Suggestion> {
    let dir = home.join("Desktop");
    let count = top_level_files(&dir)
        .into_iter()
        .filter(|(len, modified)| *len > DESKTOP_LARGE_FILE && is_stale(*modified, now))
        .count();

    (count > 0).then(|| Suggestion {
        id: "desktop_large".to_string(),
        title: "Large files on the Desktop".to_string(),
        description: format!("{} large file(s) untouched for 30 days", count),
        path: dir,
        count,
        size: 0,
    })
}

/// Cheap, non-recursive checks of the user's Downloads and Desktop folders.
pub fn smart_suggestions(home: &Path) -> Vec<Suggestion> {
    suggestions_at(home, SystemTime::now())
}

pub fn suggestions_at(home: &Path, now: SystemTime) -> Vec<Suggestion> {
    let suggestions: Vec<Suggestion> = [downloads(home, now), desktop(home, now)]
        .into_iter()
        .flatten()
        .collect();
    log::info!("Found {} suggestion(s)", suggestions.len());
    suggestions
}

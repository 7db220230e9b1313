//! Well-known cache and temp locations that can be emptied in one step.

use crate::delete::{delete_direct, DeleteMode, DeleteOptions, DeleteOutcome};
use crate::error::{ReclaimError, Result};
use crate::index::measure;
use crate::util::expand_path;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupTarget {
    pub id: &'static str,
    pub name: &'static str,
    /// Unexpanded path; may contain `~` and environment references.
    pub path: &'static str,
    pub description: &'static str,
    /// Emptying a non-safe target loses user data and needs confirmation.
    pub safe: bool,
}

const fn target(
    id: &'static str,
    name: &'static str,
    path: &'static str,
    description: &'static str,
    safe: bool,
) -> CleanupTarget {
    CleanupTarget {
        id,
        name,
        path,
        description,
        safe,
    }
}

#[cfg(not(windows))]
const CATALOG: &[CleanupTarget] = &[
    target("tmp", "System temp files", "/tmp", "Files left in the shared temp directory", true),
    target("var_tmp", "Persistent temp files", "/var/tmp", "Temp files kept across reboots", true),
    target("thumbnails", "Thumbnail cache", "~/.cache/thumbnails", "File preview thumbnails", true),
    target("trash", "Desktop trash", "~/.local/share/Trash", "Files already moved to the trash", true),
    target("chrome_cache", "Chrome cache", "~/.cache/google-chrome", "Chrome browser cache", true),
    target("chromium_cache", "Chromium cache", "~/.cache/chromium", "Chromium browser cache", true),
    target("firefox_cache", "Firefox cache", "~/.cache/mozilla/firefox", "Firefox browser cache", true),
    target("npm", "npm cache", "~/.npm/_cacache", "Node.js package cache", true),
    target("yarn", "Yarn cache", "~/.cache/yarn", "Yarn package cache", true),
    target("pip", "pip cache", "~/.cache/pip", "Python package cache", true),
    target("uv", "uv cache", "~/.cache/uv", "uv package cache", true),
    target("nuget", "NuGet cache", "~/.nuget/packages", ".NET package cache", true),
    target("gradle", "Gradle cache", "~/.gradle/caches", "Java build cache", true),
    target("maven", "Maven repository", "~/.m2/repository", "Maven artifact cache", true),
    target("cargo_registry", "Cargo registry cache", "~/.cargo/registry/cache", "Downloaded crate archives", true),
    target("vscode_cache", "VS Code cache", "~/.config/Code/Cache", "VS Code cache", true),
    target("vscode_data", "VS Code cached data", "~/.config/Code/CachedData", "VS Code compiled cache", true),
    target("discord", "Discord cache", "~/.config/discord/Cache", "Discord cache", true),
    target("spotify", "Spotify cache", "~/.cache/spotify", "Music cache", true),
    target("crash_reports", "Crash reports", "/var/crash", "Application crash dumps", true),
    target("downloads", "Downloads folder", "~/Downloads", "Downloaded files", false),
];

#[cfg(windows)]
const CATALOG: &[CleanupTarget] = &[
    target("temp", "User temp files", "%TEMP%", "Application temp files", true),
    target("win_temp", "System temp files", "C:\\Windows\\Temp", "Windows system temp", true),
    target("windows_update", "Windows Update cache", "C:\\Windows\\SoftwareDistribution\\Download", "Installed update packages", true),
    target("prefetch", "Prefetch files", "C:\\Windows\\Prefetch", "Program launch cache", true),
    target("cbs_logs", "CBS logs", "C:\\Windows\\Logs\\CBS", "Windows component logs", true),
    target("memory_dumps", "Memory dumps", "C:\\Windows\\Minidump", "Crash dump files", true),
    target("thumbnail", "Thumbnail cache", "%LOCALAPPDATA%\\Microsoft\\Windows\\Explorer", "File preview thumbnails", true),
    target("crash_dumps", "Crash reports", "%LOCALAPPDATA%\\CrashDumps", "Crash dump files", true),
    target("wer", "Windows Error Reports", "%LOCALAPPDATA%\\Microsoft\\Windows\\WER", "Error report cache", true),
    target("chrome_cache", "Chrome cache", "%LOCALAPPDATA%\\Google\\Chrome\\User Data\\Default\\Cache", "Chrome browser cache", true),
    target("edge_cache", "Edge cache", "%LOCALAPPDATA%\\Microsoft\\Edge\\User Data\\Default\\Cache", "Edge browser cache", true),
    target("npm", "npm cache", "%APPDATA%\\npm-cache", "Node.js package cache", true),
    target("pip", "pip cache", "%LOCALAPPDATA%\\pip\\cache", "Python package cache", true),
    target("gradle", "Gradle cache", "%USERPROFILE%\\.gradle\\caches", "Java build cache", true),
    target("vscode_cache", "VS Code cache", "%APPDATA%\\Code\\Cache", "VS Code cache", true),
    target("downloads", "Downloads folder", "%USERPROFILE%\\Downloads", "Downloaded files", false),
];

pub fn catalog() -> &'static [CleanupTarget] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static CleanupTarget> {
    CATALOG.iter().find(|t| t.id == id)
}

impl CleanupTarget {
    pub fn resolved_path(&self) -> Result<PathBuf> {
        expand_path(self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub description: String,
    pub safe: bool,
    pub exists: bool,
    pub size: u64,
}

/// A target whose path cannot be expanded on this machine is reported as absent.
pub fn measure_target(target: &CleanupTarget) -> TargetReport {
    let (path, exists) = match target.resolved_path() {
        Ok(path) => {
            let exists = path.exists();
            (path, exists)
        }
        Err(e) => {
            log::debug!("Skipping target {}: {}", target.id, e);
            (PathBuf::from(target.path), false)
        }
    };
    let size = if exists { measure(&path) } else { 0 };
    TargetReport {
        id: target.id.to_string(),
        name: target.name.to_string(),
        path,
        description: target.description.to_string(),
        safe: target.safe,
        exists,
        size,
    }
}

/// Bytes that can be freed without confirmation: the sum over safe targets.
pub fn reclaimable_total(reports: &[TargetReport]) -> u64 {
    reports.iter().filter(|r| r.safe).map(|r| r.size).sum()
}

/// Empties a target directory, keeping the directory itself.
pub async fn clean_target(
    target: &CleanupTarget,
    confirmed: bool,
    options: &DeleteOptions,
) -> Result<DeleteOutcome> {
    let path = target.resolved_path()?;
    if !target.safe && !confirmed {
        return Err(ReclaimError::ConfirmationRequired {
            path,
            tier: "user data".to_string(),
        });
    }
    log::info!("Cleaning {} at {}", target.id, path.display());
    delete_direct(&path, DeleteMode::Contents, options).await
}

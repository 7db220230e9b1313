//! Safety-tier classification for filesystem paths.
//!
//! A path is classified by walking, in order:
//! - the special cases in [`super::special`]
//! - user override rules from `reclaim.toml`
//! - the dangerous-extension check (with its temp/cache exemption for installers)
//! - the built-in safe, caution and danger tables
//!
//! The first match wins; a path nothing matches is [`Tier::Unknown`]. Matching is a pure
//! function of the path string: separators are normalised to `/` and globs are
//! case-insensitive, so Windows and Unix spellings of the same location agree.

use super::special::SPECIAL_CASES;
use crate::error::{ReclaimError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Deletion risk of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Safe,
    Caution,
    Danger,
    Unknown,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Safe => "safe",
            Tier::Caution => "caution",
            Tier::Danger => "danger",
            Tier::Unknown => "unknown",
        }
    }

    pub(crate) fn default_label(&self) -> &'static str {
        match self {
            Tier::Safe => "Safe to delete",
            Tier::Caution => "Caution",
            Tier::Danger => "Not recommended",
            Tier::Unknown => "Verify",
        }
    }

    /// Danger and unknown items need an explicit operator decision before removal.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Tier::Danger | Tier::Unknown)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = ReclaimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Ok(Tier::Safe),
            "caution" => Ok(Tier::Caution),
            "danger" => Ok(Tier::Danger),
            "unknown" => Ok(Tier::Unknown),
            other => Err(ReclaimError::Config(format!("Unknown tier: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: Tier,
    pub label: String,
    pub description: String,
}

impl Classification {
    pub fn new(tier: Tier, label: &str, description: &str) -> Self {
        Self {
            tier,
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    fn unknown() -> Self {
        Self::new(
            Tier::Unknown,
            Tier::Unknown.default_label(),
            "Check the content before deciding",
        )
    }
}

/// A user-supplied rule, read from the `[[rules]]` array of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOverride {
    #[serde(default)]
    pub name: String,
    pub patterns: Vec<String>,
    pub tier: Tier,
    pub label: Option<String>,
    pub description: Option<String>,
}

/// A compiled rule: a set of globs that all map to one tier.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub name: String,
    pub tier: Tier,
    pub label: String,
    pub description: String,
    matcher: GlobSet,
}

impl ClassificationRule {
    pub fn new<S: AsRef<str>>(
        name: &str,
        tier: Tier,
        patterns: &[S],
        label: Option<&str>,
        description: &str,
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            tier,
            label: label.unwrap_or(tier.default_label()).to_string(),
            description: description.to_string(),
            matcher: build_globset(patterns)?,
        })
    }

    fn from_override(rule: &RuleOverride) -> Result<Self> {
        let description = rule
            .description
            .clone()
            .unwrap_or_else(|| format!("Matched rule '{}'", rule.name));
        Self::new(
            &rule.name,
            rule.tier,
            rule.patterns.as_slice(),
            rule.label.as_deref(),
            &description,
        )
    }

    pub fn matches(&self, path: &PathView) -> bool {
        self.matcher.is_match(&path.normalized)
    }

    fn classification(&self) -> Classification {
        Classification::new(self.tier, &self.label, &self.description)
    }
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ReclaimError::Config(format!("Invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ReclaimError::Config(format!("Failed to build globset: {}", e)))
}

/// A path prepared for matching.
#[derive(Debug, Clone)]
pub struct PathView {
    pub normalized: String,
    pub lower: String,
    pub extension: Option<String>,
}

impl PathView {
    pub fn new(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        let lower = normalized.to_lowercase();
        let extension = lower
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(stem, ext)| (stem, ext.to_string()))
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext);

        Self {
            normalized,
            lower,
            extension,
        }
    }
}

type RuleTable = &'static [(&'static str, &'static [&'static str], &'static str)];

const SAFE_RULES: RuleTable = &[
    (
        "temp-dirs",
        &["**/temp", "**/temp/**", "**/tmp", "**/tmp/**"],
        "Temporary files",
    ),
    (
        "cache-dirs",
        &[
            "**/cache", "**/cache/**", "**/caches", "**/caches/**", "**/.cache", "**/.cache/**",
        ],
        "Application cache",
    ),
    (
        "logs-and-dumps",
        &["**/crashdumps", "**/crashdumps/**", "**/logs", "**/logs/**"],
        "Logs and crash dumps",
    ),
    (
        "transient-files",
        &["*.tmp", "*.log", "*.bak", "*.old", "**/thumbs.db", "**/desktop.ini"],
        "Temporary or leftover file",
    ),
    (
        "node-packages",
        &["**/npm-cache", "**/npm-cache/**", "**/node_modules", "**/node_modules/**"],
        "Node.js packages or cache, reinstalled on demand",
    ),
    (
        "python-caches",
        &["**/__pycache__", "**/__pycache__/**", "**/uv", "**/uv/**", "**/pip/cache*"],
        "Python package cache",
    ),
    (
        "dev-tool-caches",
        &[
            "**/.nuget",
            "**/.gradle/caches*",
            "**/huggingface",
            "**/huggingface/**",
            "**/torch/hub",
            "**/installer",
        ],
        "Developer tool cache",
    ),
    (
        "os-temp",
        &[
            "**/appdata/local/temp",
            "**/appdata/local/temp/**",
            "**/windows/temp",
            "**/windows/temp/**",
            "**/softwaredistribution/download*",
            "/var/tmp/**",
        ],
        "System temporary files or update staging",
    ),
    (
        "browser-editor-caches",
        &[
            "**/chrome/user data/**/cache*",
            "**/edge/user data/**/cache*",
            "**/microsoft/edge/**/cache*",
            "**/crx_cache/**",
            "**/component_crx_cache/**",
            "**/cachedextensionvsixs",
            "**/cachedextensionvsixs/**",
            "**/electron/cache",
        ],
        "Browser or editor cache",
    ),
    (
        "driver-packages",
        &["**/nvidia/**/ota-artifacts/**", "**/updateframework/ota-artifacts/**"],
        "Old driver package",
    ),
];

const CAUTION_RULES: RuleTable = &[
    (
        "user-folders",
        &[
            "**/downloads",
            "**/downloads/**",
            "**/documents/**",
            "**/desktop/**",
            "**/videos/**",
            "**/pictures/**",
            "**/music/**",
        ],
        "User file, confirm before deleting",
    ),
    ("archives", &["*.zip", "*.rar", "*.7z", "*.iso"], "Archive or disk image"),
    ("videos", &["*.mp4", "*.mkv", "*.avi", "*.mov"], "Video file"),
    (
        "office-documents",
        &["*.pdf", "*.doc", "*.docx", "*.ppt", "*.pptx", "*.xls", "*.xlsx"],
        "Document",
    ),
    (
        "model-weights",
        &["*.safetensors", "*.ckpt", "*.bin", "*.pth"],
        "Model weights, expensive to download again",
    ),
];

const DANGER_RULES: RuleTable = &[
    (
        "os-binaries",
        &[
            "**/windows/system32*",
            "**/windows/syswow64*",
            "**/windows/winsxs*",
            "/usr/bin/**",
            "/usr/sbin/**",
            "/usr/lib/**",
            "/boot/**",
        ],
        "System or program file",
    ),
    (
        "protected-folders",
        &["**/$recycle.bin/**", "**/system volume information/**"],
        "Protected system folder",
    ),
];

const DANGEROUS_EXTENSIONS: &[&str] = &["dll", "sys", "exe", "msi"];

/// Locations where a stray `.exe` is a leftover installer rather than a program.
const INSTALLER_STAGING: &[&str] = &[
    "**/temp/**",
    "**/cache/**",
    "**/npm-cache/**",
    "**/*-updater/**",
];

/// Ordered classification engine.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    overrides: Vec<ClassificationRule>,
    safe: Vec<ClassificationRule>,
    caution: Vec<ClassificationRule>,
    danger: Vec<ClassificationRule>,
    installer_staging: GlobSet,
}

impl RuleEngine {
    /// Builds the engine with user overrides placed ahead of the built-in tables.
    pub fn new(overrides: &[RuleOverride]) -> Result<Self> {
        Ok(Self {
            overrides: overrides
                .iter()
                .map(ClassificationRule::from_override)
                .collect::<Result<_>>()?,
            safe: compile_table(Tier::Safe, SAFE_RULES)?,
            caution: compile_table(Tier::Caution, CAUTION_RULES)?,
            danger: compile_table(Tier::Danger, DANGER_RULES)?,
            installer_staging: build_globset(INSTALLER_STAGING)?,
        })
    }

    /// The engine over the built-in tables only.
    pub fn builtin() -> &'static RuleEngine {
        static ENGINE: OnceLock<RuleEngine> = OnceLock::new();
        ENGINE.get_or_init(|| RuleEngine::new(&[]).expect("built-in classification tables are valid"))
    }

    pub fn classify<P: AsRef<Path>>(&self, path: P) -> Classification {
        self.classify_str(&path.as_ref().to_string_lossy())
    }

    pub fn classify_str(&self, path: &str) -> Classification {
        let view = PathView::new(path);

        for case in SPECIAL_CASES {
            if let Some(result) = (case.check)(&view) {
                log::trace!("{} matched special case {}", path, case.name);
                return result;
            }
        }

        if let Some(rule) = self.overrides.iter().find(|r| r.matches(&view)) {
            return rule.classification();
        }

        if let Some(ext) = view.extension.as_deref() {
            if DANGEROUS_EXTENSIONS.contains(&ext) {
                if ext == "exe" && self.installer_staging.is_match(&view.normalized) {
                    return Classification::new(Tier::Safe, "Safe to delete", "Temporary installer");
                }
                return Classification::new(Tier::Danger, "Not recommended", "System or program file");
            }
        }

        self.safe
            .iter()
            .chain(&self.caution)
            .chain(&self.danger)
            .find(|rule| rule.matches(&view))
            .map(ClassificationRule::classification)
            .unwrap_or_else(Classification::unknown)
    }

    /// Classifies a batch of paths, preserving order.
    pub fn classify_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<Classification> {
        paths.iter().map(|p| self.classify(p)).collect()
    }
}

fn compile_table(tier: Tier, table: RuleTable) -> Result<Vec<ClassificationRule>> {
    table
        .iter()
        .map(|(name, patterns, description)| {
            ClassificationRule::new(name, tier, *patterns, None, description)
        })
        .collect()
}

/// Classifies `path` with the built-in engine.
pub fn classify<P: AsRef<Path>>(path: P) -> Classification {
    RuleEngine::builtin().classify(path)
}

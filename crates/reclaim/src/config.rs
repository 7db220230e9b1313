use crate::classify::RuleOverride;
use crate::delete::DeleteOptions;
use crate::error::{ReclaimError, Result};
use crate::index::{OverviewOptions, ScanOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

const APP_PREFIX: &str = "reclaim";
const CONFIG_FILE: &str = "reclaim.toml";

pub struct Config {
    pub quarantine_root: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl Config {
    pub fn new(quarantine_override: Option<PathBuf>, config_override: Option<PathBuf>) -> Result<Self> {
        let quarantine_root = if let Some(path) = quarantine_override {
            path
        } else if let Ok(env_path) = std::env::var("RECLAIM_QUARANTINE") {
            PathBuf::from(env_path)
        } else {
            let xdg = BaseDirectories::with_prefix(APP_PREFIX)
                .map_err(|e| ReclaimError::Config(format!("Failed to initialize XDG directories: {}", e)))?;
            xdg.get_data_home().join("quarantine")
        };

        let config_path = config_override.or_else(|| {
            BaseDirectories::with_prefix(APP_PREFIX)
                .ok()
                .and_then(|xdg| xdg.find_config_file(CONFIG_FILE))
        });

        Ok(Self {
            quarantine_root,
            config_path,
        })
    }

    /// Loads the settings file if one was found, otherwise the built-in defaults.
    pub fn load_settings(&self) -> Result<Settings> {
        match &self.config_path {
            Some(path) => {
                log::info!("Loading settings from {}", path.display());
                Settings::from_file(path)
            }
            None => Ok(Settings::default()),
        }
    }
}

/// Tunables read from `reclaim.toml`. Every table and field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanOptions,
    pub overview: OverviewOptions,
    pub delete: DeleteOptions,
    pub rules: Vec<RuleOverride>,
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ReclaimError::from_io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ReclaimError::Config(format!("Failed to parse settings: {}", e)))
    }
}

//! On-disk restoration records.
//!
//! Two layouts exist. New entries are always written as a sidecar `<payload>.meta.json`
//! beside the payload. Older quarantine areas hold directories with an embedded
//! `_cleanc_metadata.json`; those are still listed and restored but never written.

use crate::error::{ReclaimError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const SIDECAR_SUFFIX: &str = ".meta.json";
pub const LEGACY_RECORD: &str = "_cleanc_metadata.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLayout {
    Sidecar,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarRecord {
    pub original_path: PathBuf,
    pub moved_at: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub original_path: PathBuf,
    pub moved_at: DateTime<Utc>,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Sidecar(SidecarRecord),
    Legacy(LegacyRecord),
}

impl Record {
    pub fn layout(&self) -> MetadataLayout {
        match self {
            Record::Sidecar(_) => MetadataLayout::Sidecar,
            Record::Legacy(_) => MetadataLayout::Legacy,
        }
    }

    pub fn original_path(&self) -> &Path {
        match self {
            Record::Sidecar(r) => &r.original_path,
            Record::Legacy(r) => &r.original_path,
        }
    }

    pub fn moved_at(&self) -> DateTime<Utc> {
        match self {
            Record::Sidecar(r) => r.moved_at,
            Record::Legacy(r) => r.moved_at,
        }
    }
}

pub fn sidecar_path(payload: &Path) -> PathBuf {
    let mut name = payload
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(SIDECAR_SUFFIX);
    payload.with_file_name(name)
}

pub fn legacy_record_path(payload: &Path) -> PathBuf {
    payload.join(LEGACY_RECORD)
}

pub fn is_sidecar_name(name: &str) -> bool {
    name.ends_with(SIDECAR_SUFFIX)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| ReclaimError::from_io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Finds the record for `payload`, probing the sidecar layout before the legacy one.
///
/// Returns `Ok(None)` when neither layout has a record. A record that exists but cannot be
/// parsed is an error.
pub fn read_record(payload: &Path) -> Result<Option<Record>> {
    let sidecar = sidecar_path(payload);
    if sidecar.is_file() {
        return read_json(&sidecar).map(|r| Some(Record::Sidecar(r)));
    }

    let legacy = legacy_record_path(payload);
    if payload.is_dir() && legacy.is_file() {
        return read_json(&legacy).map(|r| Some(Record::Legacy(r)));
    }

    Ok(None)
}

pub fn write_sidecar(payload: &Path, record: &SidecarRecord) -> Result<()> {
    let path = sidecar_path(payload);
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json).map_err(|e| ReclaimError::from_io(&path, e))
}

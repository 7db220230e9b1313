//! Location-specific overrides evaluated before the generic rule tables.
//!
//! Each case here contradicts a generic rule it would otherwise fall under: driver
//! payloads sit next to deletable installers, virtual environments look like caches,
//! and browser model caches carry extensions and sizes the generic tables treat as risky.

use super::rules::{Classification, PathView, Tier};

pub(crate) struct SpecialCase {
    pub name: &'static str,
    pub check: fn(&PathView) -> Option<Classification>,
}

pub(crate) const SPECIAL_CASES: &[SpecialCase] = &[
    SpecialCase {
        name: "driver-ota-artifacts",
        check: driver_ota_artifacts,
    },
    SpecialCase {
        name: "virtualenv-site-packages",
        check: virtualenv_site_packages,
    },
    SpecialCase {
        name: "browser-model-cache",
        check: browser_model_cache,
    },
];

/// Old GPU driver installers may go; the driver components unpacked beside them may not.
fn driver_ota_artifacts(path: &PathView) -> Option<Classification> {
    if !path.lower.contains("ota-artifacts") {
        return None;
    }

    match path.extension.as_deref() {
        Some("exe" | "zip") => Some(Classification::new(
            Tier::Safe,
            "Safe to delete",
            "Old driver package",
        )),
        Some("dll" | "sys" | "so") => Some(Classification::new(
            Tier::Danger,
            "Not recommended",
            "GPU driver component",
        )),
        _ => None,
    }
}

fn virtualenv_site_packages(path: &PathView) -> Option<Classification> {
    let segments: Vec<&str> = path.lower.split('/').collect();
    let venv = segments
        .iter()
        .position(|s| *s == "venv" || *s == ".venv")?;

    // something must live below site-packages, not the directory itself
    let inside = segments[venv + 1..]
        .iter()
        .enumerate()
        .any(|(i, s)| s.ends_with("site-packages") && venv + 1 + i + 1 < segments.len());

    inside.then(|| {
        Classification::new(
            Tier::Caution,
            "Environment dependency",
            "The virtual environment stops working if this is deleted",
        )
    })
}

fn browser_model_cache(path: &PathView) -> Option<Classification> {
    (path.lower.contains("optguideondevicemodel") || path.lower.contains("provenancedata")).then(
        || {
            Classification::new(
                Tier::Safe,
                "Can delete",
                "Browser on-device model cache, downloaded again when needed",
            )
        },
    )
}

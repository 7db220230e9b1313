use reclaim_lib::{Classification, Config, Operations, ScanHit, Settings, Tier};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestFixture {
    pub temp_dir: TempDir,
    pub data: PathBuf,
    pub quarantine: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let data = temp_dir.path().join("data");
        let quarantine = temp_dir.path().join("quarantine");
        fs::create_dir_all(&data).unwrap();
        Self {
            temp_dir,
            data,
            quarantine,
        }
    }

    pub fn operations(&self) -> Operations {
        self.operations_with(Settings::default())
    }

    pub fn operations_with(&self, settings: Settings) -> Operations {
        let config = Config::new(Some(self.quarantine.clone()), None).unwrap();
        Operations::new(&config, settings).unwrap()
    }

    pub fn write(&self, relative: &str, len: usize) -> PathBuf {
        let path = self.data.join(relative);
        write_file(&path, len);
        path
    }
}

pub fn write_file(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(path).unwrap();
    file.write_all(&vec![b'r'; len]).unwrap();
}

/// A scan hit for `path` with a fixed tier, independent of where the test files live.
pub fn hit_with_tier(path: &Path, size: u64, tier: Tier) -> ScanHit {
    ScanHit {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        size,
        is_directory: path.is_dir(),
        modified_time: None,
        classification: Classification::new(tier, tier.as_str(), "test"),
    }
}

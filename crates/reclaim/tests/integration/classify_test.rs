use crate::common::TestFixture;
use proptest::prelude::*;
use reclaim_lib::classify::{classify, RuleEngine, RuleOverride, Tier};
use reclaim_lib::Settings;

#[test]
fn test_windows_style_paths() {
    let cases = [
        ("C:\\Users\\ann\\AppData\\Local\\Temp\\setup.log", Tier::Safe),
        ("C:\\Users\\ann\\AppData\\Local\\npm-cache\\_cacache", Tier::Safe),
        ("C:\\Windows\\System32\\drivers\\etc", Tier::Danger),
        ("C:\\Users\\ann\\Videos\\holiday.mkv", Tier::Caution),
        ("C:\\Program Files\\App\\app.exe", Tier::Danger),
        ("C:\\Users\\ann\\AppData\\Local\\Temp\\installer.exe", Tier::Safe),
    ];

    for (path, tier) in cases {
        assert_eq!(classify(path).tier, tier, "{}", path);
    }
}

#[test]
fn test_unix_paths() {
    assert_eq!(classify("/home/ann/.cache/pip/wheels").tier, Tier::Safe);
    assert_eq!(classify("/home/ann/project/node_modules").tier, Tier::Safe);
    assert_eq!(classify("/home/ann/Downloads/archive.zip").tier, Tier::Caution);
    assert_eq!(classify("/usr/lib/libc.so.6").tier, Tier::Danger);
    assert_eq!(classify("/srv/data/blob").tier, Tier::Unknown);
}

#[test]
fn test_special_cases_win_over_tables() {
    // site-packages content inside a venv is not a cache even under a cache directory
    let venv = "/home/ann/.cache/proj/.venv/lib/python3.12/site-packages/torch";
    assert_eq!(classify(venv).tier, Tier::Caution);

    let driver = "C:\\ProgramData\\NVIDIA\\UpdateFramework\\ota-artifacts\\grd\\nvlddmkm.sys";
    assert_eq!(classify(driver).tier, Tier::Danger);
    let installer = "C:\\ProgramData\\NVIDIA\\UpdateFramework\\ota-artifacts\\grd\\setup.exe";
    assert_eq!(classify(installer).tier, Tier::Safe);
}

#[test]
fn test_overrides_from_settings() {
    let settings = Settings::from_toml(
        r#"
        [[rules]]
        name = "scratch"
        patterns = ["/srv/scratch/**"]
        tier = "safe"
        description = "Shared scratch space"
        "#,
    )
    .unwrap();

    let engine = RuleEngine::new(&settings.rules).unwrap();
    let result = engine.classify("/srv/scratch/job-42/output.bin");
    assert_eq!(result.tier, Tier::Safe);
    assert_eq!(result.description, "Shared scratch space");

    let ops = TestFixture::new().operations_with(settings);
    assert_eq!(ops.classify("/srv/scratch/job-42/output.bin").tier, Tier::Safe);

    // the built-in engine is unaffected
    assert_eq!(classify("/srv/scratch/job-42/output.bin").tier, Tier::Caution);
}

#[test]
fn test_override_cannot_shadow_special_cases() {
    let rule = RuleOverride {
        name: "everything".to_string(),
        patterns: vec!["**".to_string()],
        tier: Tier::Safe,
        label: None,
        description: None,
    };
    let engine = RuleEngine::new(&[rule]).unwrap();
    let venv = "/work/.venv/lib/python3.11/site-packages/numpy";
    assert_eq!(engine.classify(venv).tier, Tier::Caution);
    assert_eq!(engine.classify("/work/anything").tier, Tier::Safe);
}

proptest! {
    #[test]
    fn prop_classification_is_pure(segments in prop::collection::vec("[a-zA-Z0-9_.]{1,12}", 1..6)) {
        let path = format!("/{}", segments.join("/"));
        let engine = RuleEngine::builtin();
        prop_assert_eq!(engine.classify_str(&path), engine.classify_str(&path));
    }

    #[test]
    fn prop_separator_style_does_not_matter(segments in prop::collection::vec("[a-zA-Z0-9_.]{1,12}", 1..6)) {
        let unix = segments.join("/");
        let windows = segments.join("\\");
        let engine = RuleEngine::builtin();
        prop_assert_eq!(engine.classify_str(&unix), engine.classify_str(&windows));
    }
}

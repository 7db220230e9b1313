use crate::common::{hit_with_tier, write_file, TestFixture};
use proptest::prelude::*;
use reclaim_lib::delete::{dispose, Disposal};
use reclaim_lib::targets::{catalog, find, reclaimable_total, TargetReport};
use reclaim_lib::{measure, ReclaimError, Tier};
use std::fs;
use std::path::PathBuf;

#[tokio::test]
async fn test_delete_path_reports_freed_space() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let dir = fixture.data.join("cache");
    fixture.write("cache/a", 400);
    fixture.write("cache/b/c", 100);

    let response = ops.delete_path(&dir.to_string_lossy()).await;
    assert!(response.success);
    assert!(response.removed);
    assert_eq!(response.freed_space, 500);
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_delete_missing_path_is_not_an_error() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let response = ops
        .delete_path(&fixture.data.join("ghost").to_string_lossy())
        .await;
    assert!(response.success);
    assert!(response.removed);
    assert_eq!(response.freed_space, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_only_files_are_removed() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let file = fixture.write("locked/readonly.txt", 30);
    fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();

    let response = ops
        .delete_path(&fixture.data.join("locked").to_string_lossy())
        .await;
    assert!(response.removed);
    assert_eq!(response.freed_space, 30);
}

#[tokio::test]
async fn test_dispose_routes_by_tier() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let safe = fixture.write("logs/app.log", 100);
    let caution = fixture.write("Downloads/setup.iso", 200);
    let danger = fixture.write("bin/tool.exe", 300);

    let deleted = dispose(&hit_with_tier(&safe, 100, Tier::Safe), false, ops.store(), ops.delete_options())
        .await
        .unwrap();
    assert!(matches!(deleted, Disposal::Deleted(ref o) if o.freed == 100));
    assert!(!safe.exists());

    let quarantined = dispose(&hit_with_tier(&caution, 200, Tier::Caution), false, ops.store(), ops.delete_options())
        .await
        .unwrap();
    match quarantined {
        Disposal::Quarantined(entry) => {
            assert_eq!(entry.original_path, caution);
            assert!(entry.quarantine_path.exists());
        }
        other => panic!("expected quarantine, got {:?}", other),
    }

    let refused = dispose(&hit_with_tier(&danger, 300, Tier::Danger), false, ops.store(), ops.delete_options()).await;
    assert!(matches!(refused, Err(ReclaimError::ConfirmationRequired { .. })));
    assert!(danger.exists());

    let confirmed = dispose(&hit_with_tier(&danger, 300, Tier::Danger), true, ops.store(), ops.delete_options())
        .await
        .unwrap();
    assert!(matches!(confirmed, Disposal::Quarantined(_)));
    assert_eq!(confirmed.freed(), 300);
    assert_eq!(ops.list_quarantine().len(), 2);
}

#[test]
fn test_catalog_lookup() {
    assert!(!catalog().is_empty());
    let downloads = find("downloads").unwrap();
    assert!(!downloads.safe);

    let reports: Vec<TargetReport> = catalog()
        .iter()
        .map(|t| TargetReport {
            id: t.id.to_string(),
            name: t.name.to_string(),
            path: t.resolved_path().unwrap_or_else(|_| PathBuf::from(t.path)),
            description: t.description.to_string(),
            safe: t.safe,
            exists: true,
            size: 10,
        })
        .collect();
    let safe_count = catalog().iter().filter(|t| t.safe).count() as u64;
    assert_eq!(reclaimable_total(&reports), safe_count * 10);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_measure_is_sum_of_file_sizes(sizes in prop::collection::vec(0usize..2048, 1..12)) {
        let fixture = TestFixture::new();
        for (i, len) in sizes.iter().enumerate() {
            write_file(&fixture.data.join(format!("d{}/f{}", i % 3, i)), *len);
        }
        let expected: u64 = sizes.iter().map(|s| *s as u64).sum();
        prop_assert_eq!(measure(&fixture.data), expected);
    }
}

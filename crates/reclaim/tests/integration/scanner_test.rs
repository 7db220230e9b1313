use crate::common::{write_file, TestFixture};
use reclaim_lib::{LargeScanResponse, OverviewOptions, ScanKind, ScanOptions};
use std::path::Path;

fn small_scan(root: &Path) -> ScanOptions {
    ScanOptions {
        min_size: 100,
        exclude_dirs: Vec::new(),
        progress_interval_ms: 0,
        ..ScanOptions::default()
    }
    .with_roots([root])
}

#[tokio::test]
async fn test_scan_reports_sorted_classified_hits() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    fixture.write("videos/movie.mkv", 900);
    fixture.write("models/weights.safetensors", 400);
    fixture.write("src/small.rs", 10);
    fixture.write("app/node_modules/pkg/index.js", 150);

    let mut reports = 0;
    let response = ops
        .scan_large_items(&small_scan(&fixture.data), |_| reports += 1)
        .await;

    assert!(response.success);
    assert!(!response.cancelled);
    assert!(response.error.is_none());
    let sizes: Vec<u64> = response.results.iter().map(|h| h.size).collect();
    assert_eq!(sizes, vec![900, 400, 150]);
    assert_eq!(response.total_size, 1450);
    assert!(response.results[2].is_directory);
    assert_eq!(response.results[2].name, "node_modules");
    for hit in &response.results {
        assert_eq!(hit.classification, ops.engine().classify(&hit.path));
    }
    assert!(reports > 0);
}

#[tokio::test]
async fn test_scan_response_serializes_camel_case() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    fixture.write("big.iso", 200);

    let response: LargeScanResponse = ops.scan_large_items(&small_scan(&fixture.data), |_| {}).await;
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["scannedCount"].as_u64(), Some(response.scanned_count));
    assert_eq!(json["results"][0]["isDirectory"], false);
    assert!(json["results"][0]["modifiedTime"].is_string());
    assert!(json["results"][0]["classification"]["tier"].is_string());
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_second_scan_of_same_kind_is_refused() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let gate = ops.gate();

    let session = gate.begin(ScanKind::LargeItems).unwrap();
    let response = ops.scan_large_items(&small_scan(&fixture.data), |_| {}).await;
    assert!(!response.success);
    assert!(response.error.is_some());

    // the overview has its own slot
    let overview = ops
        .scan_volume_overview(&OverviewOptions::default().with_roots([fixture.data.clone()]))
        .await;
    assert!(overview.error.is_none());

    drop(session);
    let response = ops.scan_large_items(&small_scan(&fixture.data), |_| {}).await;
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_cancel_from_progress_callback() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    for i in 0..300 {
        write_file(&fixture.data.join(format!("d{:03}/blob.dat", i)), 120);
    }

    let gate = ops.gate();
    let mut options = small_scan(&fixture.data);
    options.yield_every = 5;

    let response = ops
        .scan_large_items(&options, |progress| {
            if progress.found_count >= 20 {
                gate.cancel(ScanKind::LargeItems);
            }
        })
        .await;

    assert!(response.cancelled);
    assert!(!response.success);
    assert!(response.results.len() >= 20);
    assert!(response.results.len() < 300);
    assert!(!gate.is_active(ScanKind::LargeItems));
}

#[tokio::test]
async fn test_default_excludes_skip_matching_paths() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    fixture.write("keep/archive.zip", 500);
    fixture.write("skipme/archive.zip", 500);

    let mut options = small_scan(&fixture.data);
    options.exclude_dirs = vec!["SKIPME".to_string()];
    let response = ops.scan_large_items(&options, |_| {}).await;

    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].path.ends_with("keep/archive.zip"));
}

#[tokio::test]
async fn test_overview_through_operations() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    fixture.write("alpha/blob", 300);
    fixture.write("beta/blob", 50);

    let options = OverviewOptions {
        min_entry: 100,
        ..OverviewOptions::default()
    }
    .with_roots([fixture.data.clone()]);
    let response = ops.scan_volume_overview(&options).await;

    assert!(!response.cancelled);
    assert_eq!(response.nodes.len(), 1);
    assert_eq!(response.nodes[0].total_size, 300);
    assert_eq!(response.nodes[0].children[0].name, "alpha");
}

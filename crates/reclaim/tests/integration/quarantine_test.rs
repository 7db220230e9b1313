use crate::common::{write_file, TestFixture};
use reclaim_lib::quarantine::{MetadataLayout, LEGACY_RECORD, SIDECAR_SUFFIX};
use reclaim_lib::{Config, Operations, Settings};
use std::fs;
use std::path::Path;

#[test]
fn test_quarantine_then_restore_by_id() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let project = fixture.data.join("project");
    fixture.write("project/build/out.o", 300);
    fixture.write("project/README", 20);

    let response = ops.relocate_to_quarantine(&project, true);
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.freed_space, 320);
    assert!(!project.exists());

    let payload = response.quarantine_path.unwrap();
    assert!(payload.starts_with(&fixture.quarantine));
    let mut sidecar = payload.clone().into_os_string();
    sidecar.push(SIDECAR_SUFFIX);
    assert!(std::path::Path::new(&sidecar).is_file());

    let entries = ops.list_quarantine();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].original_path, project);
    assert_eq!(entries[0].size, 320);
    assert_eq!(entries[0].layout, MetadataLayout::Sidecar);

    let restored = ops.restore_from_quarantine(&entries[0].id);
    assert!(restored.success, "{:?}", restored.error);
    assert_eq!(restored.restored_size, 320);
    assert_eq!(fs::read(project.join("README")).unwrap().len(), 20);
    assert!(ops.list_quarantine().is_empty());
    assert!(!std::path::Path::new(&sidecar).exists());
}

#[test]
fn test_restore_refuses_occupied_location() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let file = fixture.write("report.pdf", 64);

    let response = ops.relocate_to_quarantine(&file, false);
    assert!(response.success);
    write_file(&file, 8);

    let entries = ops.list_quarantine();
    let restored = ops.restore_from_quarantine(&entries[0].id);
    assert!(!restored.success);
    assert!(restored.error.unwrap().contains("already exists"));

    // the newer file is untouched and the entry is still listed
    assert_eq!(fs::metadata(&file).unwrap().len(), 8);
    assert_eq!(ops.list_quarantine().len(), 1);
}

#[tokio::test]
async fn test_purge_removes_payload_and_record() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let dir = fixture.data.join("old-builds");
    fixture.write("old-builds/a.tar", 1000);
    fixture.write("old-builds/nested/b.tar", 500);

    let response = ops.relocate_to_quarantine(&dir, true);
    let payload = response.quarantine_path.unwrap();

    let purged = ops.purge_from_quarantine(&payload.to_string_lossy()).await;
    assert!(purged.success, "{:?}", purged.error);
    assert_eq!(purged.deleted_size, 1500);
    assert!(!payload.exists());
    assert_eq!(fs::read_dir(&fixture.quarantine).unwrap().count(), 0);

    let again = ops.purge_from_quarantine(&payload.to_string_lossy()).await;
    assert!(!again.success);
}

#[test]
fn test_paths_outside_the_area_are_rejected() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let outsider = fixture.write("not-quarantined.bin", 10);

    let response = ops.restore_from_quarantine(&outsider.to_string_lossy());
    assert!(!response.success);
    assert!(outsider.exists());
}

#[test]
fn test_relocating_the_area_itself_fails() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    fs::create_dir_all(&fixture.quarantine).unwrap();

    let response = ops.relocate_to_quarantine(&fixture.quarantine, true);
    assert!(!response.success);
    assert!(fixture.quarantine.is_dir());
}

#[test]
fn test_legacy_entries_restore_into_original_folder() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let original = fixture.data.join("Videos");
    let shell = fixture.quarantine.join("2023-11-02_Videos");
    write_file(&shell.join("clip-1.mp4"), 700);
    write_file(&shell.join("clips/clip-2.mp4"), 300);
    fs::write(
        shell.join(LEGACY_RECORD),
        format!(
            r#"{{"originalPath": {:?}, "movedAt": "2023-11-02T08:30:00Z", "itemId": "a1"}}"#,
            original.to_string_lossy()
        ),
    )
    .unwrap();

    let entries = ops.list_quarantine();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].layout, MetadataLayout::Legacy);
    assert_eq!(entries[0].size, 1000);
    assert!(entries[0].is_directory);

    let restored = ops.restore_from_quarantine("2023-11-02_Videos");
    assert!(restored.success, "{:?}", restored.error);
    assert_eq!(restored.restored_size, 1000);
    assert!(original.join("clip-1.mp4").is_file());
    assert!(original.join("clips/clip-2.mp4").is_file());
    assert!(!original.join(LEGACY_RECORD).exists());
    assert!(!shell.exists());
}

#[test]
fn test_entries_are_listed_newest_first() {
    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let old = fixture.quarantine.join("2022-01-01_old");
    write_file(&old.join("f"), 1);
    fs::write(
        old.join(LEGACY_RECORD),
        r#"{"originalPath": "/nowhere/old", "movedAt": "2022-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let file = fixture.write("fresh.log", 5);
    assert!(ops.relocate_to_quarantine(&file, false).success);

    // a payload without any record is ignored
    write_file(&fixture.quarantine.join("stray.bin"), 3);

    let entries = ops.list_quarantine();
    let originals: Vec<_> = entries.iter().map(|e| e.original_path.clone()).collect();
    assert_eq!(originals, vec![file, "/nowhere/old".into()]);
}

#[cfg(unix)]
fn same_device(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(a).unwrap().dev() == fs::metadata(b).unwrap().dev()
}

#[cfg(unix)]
#[test]
fn test_round_trip_across_volumes_copies_and_verifies() {
    let shm = Path::new("/dev/shm");
    if !shm.is_dir() {
        return;
    }
    let fixture = TestFixture::new();
    let area_dir = match tempfile::tempdir_in(shm) {
        Ok(dir) => dir,
        Err(_) => return,
    };
    if same_device(area_dir.path(), &fixture.data) {
        return;
    }
    let config = Config::new(Some(area_dir.path().join("quarantine")), None).unwrap();
    let ops = Operations::new(&config, Settings::default()).unwrap();

    let project = fixture.data.join("renders");
    let frames: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    fs::create_dir_all(project.join("frames")).unwrap();
    fs::write(project.join("frames/0001.raw"), &frames).unwrap();
    fs::write(project.join("notes.txt"), b"final cut").unwrap();

    let response = ops.relocate_to_quarantine(&project, true);
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.freed_space, 70_009);
    assert!(!project.exists());
    let payload = response.quarantine_path.unwrap();
    assert!(payload.starts_with(area_dir.path()));
    assert_eq!(fs::read(payload.join("frames/0001.raw")).unwrap(), frames);

    let entries = ops.list_quarantine();
    assert_eq!(entries.len(), 1);
    let restored = ops.restore_from_quarantine(&entries[0].id);
    assert!(restored.success, "{:?}", restored.error);
    assert_eq!(restored.restored_size, 70_009);

    assert_eq!(fs::read(project.join("frames/0001.raw")).unwrap(), frames);
    assert_eq!(fs::read(project.join("notes.txt")).unwrap(), b"final cut");
    assert!(!payload.exists());
    assert!(ops.list_quarantine().is_empty());
    assert_eq!(fs::read_dir(area_dir.path().join("quarantine")).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_undeletable_source_is_not_reported_as_quarantined() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    let ops = fixture.operations();
    let file = fixture.write("locked/archive.tar", 512);
    let locked = fixture.data.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // privileged users ignore directory permissions
    let marker = locked.join(".writable");
    if fs::write(&marker, b"").is_ok() {
        fs::remove_file(&marker).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let response = ops.relocate_to_quarantine(&file, false);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(!response.success);
    assert!(response.error.is_some());
    assert_eq!(fs::read(&file).unwrap().len(), 512);
    assert!(ops.list_quarantine().is_empty());
    assert_eq!(fs::read_dir(&fixture.quarantine).unwrap().count(), 0);
}

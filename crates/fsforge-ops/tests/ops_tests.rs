use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fsforge_ops::{copy_files, move_files, CancelToken, CopyError, CopyOptions, CopyProgress};
use tempfile::TempDir;

#[test]
fn copy_single_file_preserves_content() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.bin");
    fs::write(&src, b"some file content").unwrap();
    let dst = tmp.path().join("out");

    let copied = copy_files(
        std::slice::from_ref(&src),
        &dst,
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap();

    assert_eq!(copied, vec![dst.join("a.bin")]);
    assert_eq!(fs::read(&copied[0]).unwrap(), b"some file content");
}

#[test]
fn copy_directory_preserves_relative_structure() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("tree");
    fs::create_dir_all(src.join("x/y")).unwrap();
    fs::write(src.join("top.txt"), "t").unwrap();
    fs::write(src.join("x/mid.txt"), "m").unwrap();
    fs::write(src.join("x/y/leaf.txt"), "l").unwrap();

    let dst = tmp.path().join("out");
    let copied = copy_files(
        std::slice::from_ref(&src),
        &dst,
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap();

    assert_eq!(copied.len(), 3);
    assert_eq!(fs::read(dst.join("tree/top.txt")).unwrap(), b"t");
    assert_eq!(fs::read(dst.join("tree/x/mid.txt")).unwrap(), b"m");
    assert_eq!(fs::read(dst.join("tree/x/y/leaf.txt")).unwrap(), b"l");
}

#[test]
fn empty_source_list_succeeds() {
    let tmp = TempDir::new().unwrap();
    let copied = copy_files(
        &[],
        tmp.path().join("dst"),
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap();
    assert!(copied.is_empty());
}

#[test]
fn existing_destination_aborts_without_overwrite() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.txt");
    let b = tmp.path().join("b.txt");
    fs::write(&a, "aaa").unwrap();
    fs::write(&b, "bbb").unwrap();

    let dst = tmp.path().join("dst");
    fs::create_dir(&dst).unwrap();
    fs::write(dst.join("b.txt"), "old").unwrap();

    let err = copy_files(
        &[a, b],
        &dst,
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap_err();

    match &err {
        CopyError::DestinationExists { path, .. } => assert!(path.ends_with("b.txt")),
        other => panic!("unexpected error: {other}"),
    }
    // a.txt completed before the abort and is not rolled back
    assert_eq!(err.completed(), &[dst.join("a.txt")]);
    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"aaa");
    assert_eq!(fs::read(dst.join("b.txt")).unwrap(), b"old");
}

#[test]
fn overwrite_truncates_existing_destination() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "new").unwrap();

    let dst = tmp.path().join("dst");
    fs::create_dir(&dst).unwrap();
    fs::write(dst.join("a.txt"), "a much longer old content").unwrap();

    let opts = CopyOptions::builder().overwrite(true).build().unwrap();
    copy_files(std::slice::from_ref(&src), &dst, &opts, None, None).unwrap();

    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"new");
}

#[test]
fn destination_occupied_by_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "x").unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "not a dir").unwrap();

    let err = copy_files(
        std::slice::from_ref(&src),
        &blocker,
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CopyError::DestinationNotADirectory { .. }));
}

#[test]
fn final_callback_reports_all_bytes() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("payload.bin");
    fs::write(&src, vec![7u8; 1_000_000]).unwrap();

    let snapshots: Arc<Mutex<Vec<CopyProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let snapshots_clone = snapshots.clone();
    let callback = move |p: &CopyProgress| snapshots_clone.lock().unwrap().push(p.clone());

    let opts = CopyOptions::builder()
        .callback_interval_ms(0u64)
        .build()
        .unwrap();
    copy_files(
        std::slice::from_ref(&src),
        tmp.path().join("dst"),
        &opts,
        Some(&callback),
        None,
    )
    .unwrap();

    drop(callback);
    let snapshots = Arc::try_unwrap(snapshots).unwrap().into_inner().unwrap();
    assert!(!snapshots.is_empty());

    // Monotone bytes, bounded by total
    let mut last = 0;
    for snap in &snapshots {
        assert!(snap.bytes_copied >= last);
        assert!(snap.bytes_copied <= snap.total_bytes);
        assert!(snap.files_completed <= snap.total_files);
        last = snap.bytes_copied;
    }

    let final_snap = snapshots.last().unwrap();
    assert_eq!(final_snap.bytes_copied, 1_000_000);
    assert_eq!(final_snap.total_bytes, 1_000_000);
    assert_eq!(final_snap.files_completed, 1);
}

#[test]
fn preserved_timestamps_match_source() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "content").unwrap();

    let stamp = filetime_stamp(1_600_000_000);
    filetime::set_file_mtime(&src, stamp).unwrap();

    let dst = tmp.path().join("dst");
    copy_files(
        std::slice::from_ref(&src),
        &dst,
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap();

    let copied_mtime =
        filetime::FileTime::from_last_modification_time(&fs::metadata(dst.join("a.txt")).unwrap());
    assert_eq!(copied_mtime.unix_seconds(), 1_600_000_000);
}

fn filetime_stamp(secs: i64) -> filetime::FileTime {
    filetime::FileTime::from_unix_time(secs, 0)
}

#[test]
fn move_on_same_volume_renames_without_progress() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "move me").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let callback = move |_: &CopyProgress| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    };

    let dst = tmp.path().join("dst");
    let moved = move_files(
        std::slice::from_ref(&src),
        &dst,
        &CopyOptions::default(),
        Some(&callback),
        None,
    )
    .unwrap();

    assert_eq!(moved, vec![dst.join("a.txt")]);
    assert!(!src.exists());
    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"move me");
    // Same-volume rename reports no intermediate progress
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn move_missing_source_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("ghost");
    let err = move_files(
        std::slice::from_ref(&missing),
        tmp.path().join("dst"),
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CopyError::SourceMissing { .. }));
}

#[test]
fn move_refuses_existing_destination() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "new").unwrap();
    let dst = tmp.path().join("dst");
    fs::create_dir(&dst).unwrap();
    fs::write(dst.join("a.txt"), "old").unwrap();

    let err = move_files(
        std::slice::from_ref(&src),
        &dst,
        &CopyOptions::default(),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CopyError::DestinationExists { .. }));
    assert!(src.exists());
}

#[test]
fn cancelled_copy_returns_completed_so_far() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "x").unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();

    let err = copy_files(
        std::slice::from_ref(&src),
        tmp.path().join("dst"),
        &CopyOptions::default(),
        None,
        Some(&cancel),
    )
    .unwrap_err();

    assert!(matches!(err, CopyError::Interrupted { .. }));
    assert!(err.completed().is_empty());
}

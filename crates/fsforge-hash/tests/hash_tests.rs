use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fsforge_hash::{hash_file, hash_files, Algorithm, CancelToken, HashError, HashOptions};
use tempfile::TempDir;

fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.path().join(format!("file_{i}.bin"));
            fs::write(&path, format!("content number {i}")).unwrap();
            path
        })
        .collect()
}

#[test]
fn batch_hashing_matches_single_file_hashing() {
    let tmp = TempDir::new().unwrap();
    let paths = write_files(&tmp, 8);

    let results = hash_files(&paths, &HashOptions::default(), None, None).unwrap();
    assert_eq!(results.len(), 8);

    for result in &results {
        let single = hash_file(&result.path, Algorithm::Blake3, 4096).unwrap();
        assert_eq!(single.hash_hex, result.hash_hex);
    }
}

#[test]
fn empty_batch_succeeds() {
    let results = hash_files(&[], &HashOptions::default(), None, None).unwrap();
    assert!(results.is_empty());
}

#[test]
fn callback_fires_once_per_file() {
    let tmp = TempDir::new().unwrap();
    let paths = write_files(&tmp, 5);

    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let count_clone = count.clone();
    let seen_clone = seen.clone();
    let callback = move |r: &fsforge_hash::HashResult| {
        count_clone.fetch_add(1, Ordering::SeqCst);
        seen_clone.lock().unwrap().push(r.path.clone());
    };

    let results = hash_files(&paths, &HashOptions::default(), Some(&callback), None).unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(count.load(Ordering::SeqCst), 5);

    drop(callback);
    let mut seen = Arc::try_unwrap(seen).unwrap().into_inner().unwrap();
    seen.sort();
    let mut expected = paths.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn one_bad_path_aborts_the_batch() {
    let tmp = TempDir::new().unwrap();
    let mut paths = write_files(&tmp, 3);
    paths.push(tmp.path().join("does_not_exist.bin"));

    let err = hash_files(&paths, &HashOptions::default(), None, None).unwrap_err();
    match err {
        HashError::Io { path, .. } => {
            assert!(path.ends_with("does_not_exist.bin"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dedicated_pool_respects_max_workers() {
    let tmp = TempDir::new().unwrap();
    let paths = write_files(&tmp, 16);

    let opts = HashOptions::builder()
        .max_workers(Some(2))
        .build()
        .unwrap();

    let results = hash_files(&paths, &opts, None, None).unwrap();
    assert_eq!(results.len(), 16);
}

#[test]
fn sha256_batches_agree_with_blake3_grouping() {
    // Identical content must compare equal per algorithm, and differ
    // across algorithms.
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    fs::write(&a, "same bytes").unwrap();
    fs::write(&b, "same bytes").unwrap();

    let blake_a = hash_file(&a, Algorithm::Blake3, 4096).unwrap();
    let blake_b = hash_file(&b, Algorithm::Blake3, 4096).unwrap();
    let sha_a = hash_file(&a, Algorithm::Sha256, 4096).unwrap();

    assert_eq!(blake_a, blake_b);
    assert_ne!(blake_a, sha_a);
}

#[test]
fn cancelled_batch_reports_interrupted() {
    let tmp = TempDir::new().unwrap();
    let paths = write_files(&tmp, 4);

    let cancel = CancelToken::new();
    cancel.cancel();

    let err = hash_files(&paths, &HashOptions::default(), None, Some(&cancel)).unwrap_err();
    assert!(matches!(err, HashError::Interrupted));
}

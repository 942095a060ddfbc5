use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use dupsweep_analyze::{
    DuplicateResolver, Hasher, ReadError, ScanConfig, ScanCoordinator, ScanError, ScanEvent, ScanPhase,
    start_scan,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// a and b share content, c has the same size but differs, d is unique.
fn create_scenario() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::write(root.join("a.txt"), "X").unwrap();
    fs::write(root.join("b.txt"), "X").unwrap();
    fs::write(root.join("c.txt"), "Y").unwrap();
    fs::write(root.join("d.txt"), "XY").unwrap();

    temp
}

fn sorted_groups(coordinator: &mut ScanCoordinator, root: &Path) -> Vec<Vec<PathBuf>> {
    let duplicates = coordinator.scan(root).unwrap();
    let mut groups: Vec<Vec<PathBuf>> = duplicates
        .groups()
        .map(|g| {
            let mut paths = g.paths.clone();
            paths.sort();
            paths
        })
        .collect();
    groups.sort();
    groups
}

#[test]
fn test_end_to_end_scenario() {
    let temp = create_scenario();
    let root = temp.path().canonicalize().unwrap();
    let mut coordinator = ScanCoordinator::default();

    let duplicates = coordinator.scan(&root).unwrap();

    assert_eq!(duplicates.len(), 1);
    let group = duplicates.groups().next().unwrap();
    assert_eq!(group.size, 1);
    assert_eq!(group.paths, vec![root.join("a.txt"), root.join("b.txt")]);
    assert_eq!(group.original(), Some(root.join("a.txt").as_path()));
    assert_eq!(group.digest, Hasher::new().digest(&root.join("a.txt")).unwrap());

    let stats = coordinator.stats();
    assert_eq!(stats.total_files, 4);
    assert_eq!(stats.scanned_files, 3);
    assert_eq!(stats.size_buckets, 1);
    assert_eq!(stats.bytes_hashed, 3);
    assert_eq!(coordinator.phase(), ScanPhase::Done);
    assert!(coordinator.warnings().is_empty());
}

#[test]
fn test_unique_sizes_are_never_hashed() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("one"), "1").unwrap();
    fs::write(temp.path().join("two"), "22").unwrap();
    fs::write(temp.path().join("three"), "333").unwrap();

    let mut coordinator = ScanCoordinator::default();
    let duplicates = coordinator.scan(temp.path()).unwrap();

    assert!(duplicates.is_empty());
    assert_eq!(coordinator.stats().total_files, 3);
    assert_eq!(coordinator.stats().scanned_files, 0);
    assert_eq!(coordinator.stats().bytes_hashed, 0);
}

#[test]
fn test_empty_files_form_a_group() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("empty1"), "").unwrap();
    fs::write(temp.path().join("empty2"), "").unwrap();

    let mut coordinator = ScanCoordinator::default();
    let duplicates = coordinator.scan(temp.path()).unwrap();

    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates.groups().next().unwrap().size, 0);
    assert_eq!(duplicates.wasted_bytes(), 0);
}

#[test]
fn test_rescan_is_idempotent() {
    let temp = create_scenario();
    let mut coordinator = ScanCoordinator::default();

    let first = sorted_groups(&mut coordinator, temp.path());
    let first_stats = coordinator.stats().clone();
    let second = sorted_groups(&mut coordinator, temp.path());

    assert_eq!(first, second);
    assert_eq!(coordinator.stats().total_files, first_stats.total_files);
    assert_eq!(coordinator.stats().scanned_files, first_stats.scanned_files);
}

#[test]
fn test_parallel_matches_sequential() {
    let temp = TempDir::new().unwrap();
    for i in 0..20 {
        let dir = temp.path().join(format!("dir{}", i % 4));
        fs::create_dir_all(&dir).unwrap();
        // Five distinct contents, four copies each, spread over sizes
        let content = "x".repeat(10 + (i % 5));
        fs::write(dir.join(format!("file{i}")), content).unwrap();
    }

    let parallel_config = ScanConfig::builder().threads(4usize).build().unwrap();
    let sequential_config = ScanConfig::builder().parallel(false).build().unwrap();

    let mut parallel = ScanCoordinator::new(parallel_config);
    let mut sequential = ScanCoordinator::new(sequential_config);

    let parallel_result = parallel.scan(temp.path()).unwrap();
    let sequential_result = sequential.scan(temp.path()).unwrap();

    assert_eq!(parallel_result, sequential_result);
    assert_eq!(parallel_result.len(), 5);
    assert_eq!(parallel_result.file_count(), 20);
    assert_eq!(parallel.stats().scanned_files, sequential.stats().scanned_files);
}

#[test]
fn test_same_digest_in_one_group() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("x.bin"), vec![7u8; 20_000]).unwrap();
    fs::write(temp.path().join("sub/y.bin"), vec![7u8; 20_000]).unwrap();
    fs::write(temp.path().join("sub/z.bin"), vec![8u8; 20_000]).unwrap();

    let mut coordinator = ScanCoordinator::default();
    let duplicates = coordinator.scan(temp.path()).unwrap();

    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates.file_count(), 2);
    assert_eq!(duplicates.removal_candidates().len(), 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_scenario();
    let locked = temp.path().join("locked.txt");
    fs::write(&locked, "X").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything, so the file would not fail.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let mut coordinator = ScanCoordinator::default();
    let duplicates = coordinator.scan(temp.path()).unwrap();

    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates.file_count(), 2);
    assert_eq!(coordinator.stats().total_files, 5);
    assert_eq!(coordinator.stats().scanned_files, 3);
    assert_eq!(coordinator.stats().failed_files, 1);
    assert_eq!(coordinator.warnings().len(), 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_scenario();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("e.txt"), "X").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let mut coordinator = ScanCoordinator::default();
    let result = coordinator.scan(temp.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let duplicates = result.unwrap();
    assert_eq!(duplicates.file_count(), 2);
    assert_eq!(coordinator.stats().total_files, 4);
    assert_eq!(coordinator.stats().walk_errors, 1);
    assert_eq!(coordinator.stats().error_count(), 1);
    assert_eq!(coordinator.warnings().len(), 1);
}

#[test]
fn test_resolver_on_single_bucket() {
    let temp = create_scenario();
    let paths = vec![
        temp.path().join("a.txt"),
        temp.path().join("b.txt"),
        temp.path().join("c.txt"),
    ];

    let resolver = DuplicateResolver::new(Hasher::with_chunk_size(2));
    let bucket = resolver
        .resolve(1, &paths, &CancellationToken::new())
        .unwrap();

    assert_eq!(bucket.hashed, 3);
    assert_eq!(bucket.groups.len(), 1);
    assert_eq!(bucket.groups[0].paths, paths[..2].to_vec());
}

#[test]
fn test_cancelled_scan_discards_results() {
    let temp = create_scenario();
    let mut coordinator = ScanCoordinator::default();
    coordinator.cancel_token().cancel();

    let result = coordinator.scan(temp.path());

    assert!(matches!(result, Err(ScanError::Interrupted)));
    assert_eq!(coordinator.phase(), ScanPhase::Idle);
    assert!(coordinator.root().is_none());
}

#[test]
fn test_cancel_while_hashing_large_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("large.bin");
    fs::write(&path, vec![0x5au8; 8 * 1024 * 1024]).unwrap();

    // One-byte chunks keep the hasher busy long after the cancel lands.
    let hasher = Hasher::with_chunk_size(1);
    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        })
    };

    let result = hasher.hash_file(&path, &cancel);
    canceller.join().unwrap();

    assert!(matches!(result, Err(ReadError::Cancelled { .. })));
}

#[test]
fn test_cancel_during_scan_discards_results() {
    let temp = TempDir::new().unwrap();
    let content = vec![0x11u8; 4 * 1024 * 1024];
    fs::write(temp.path().join("first.bin"), &content).unwrap();
    fs::write(temp.path().join("second.bin"), &content).unwrap();

    let config = ScanConfig::builder().chunk_size(1usize).build().unwrap();
    let mut coordinator = ScanCoordinator::new(config);
    let cancel = coordinator.cancel_token();

    let scanner = thread::spawn(move || {
        let result = coordinator.scan(temp.path());
        (result, coordinator, temp)
    });
    thread::sleep(Duration::from_millis(50));
    cancel.cancel();

    let (result, coordinator, _temp) = scanner.join().unwrap();
    assert!(matches!(result, Err(ScanError::Interrupted)));
    assert_eq!(coordinator.phase(), ScanPhase::Idle);
    assert!(!coordinator.cancel_token().is_cancelled());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_background_scan_reports_progress_then_result() {
    let temp = create_scenario();
    let mut rx = start_scan(temp.path().to_path_buf(), ScanCoordinator::default());

    let mut completes = 0;
    let mut outcome = None;
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Progress(_) => {}
            ScanEvent::Complete(result) => {
                completes += 1;
                outcome = Some(result.unwrap());
            }
        }
    }

    assert_eq!(completes, 1);
    let outcome = outcome.unwrap();
    assert_eq!(outcome.duplicates.len(), 1);
    assert_eq!(outcome.stats.total_files, 4);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["stats"]["scanned_files"], 3);
}

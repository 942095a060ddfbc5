use std::path::PathBuf;

use dupsweep_core::{
    Digest, DuplicateGroup, DuplicateSet, FileRecord, ScanConfig, ScanError, ScanPhase, ScanStats,
    SizeIndex, file_info, format_size,
};
use tempfile::TempDir;

#[test]
fn test_scan_config_builder() {
    let config = ScanConfig::builder()
        .follow_symlinks(true)
        .include_hidden(false)
        .max_depth(Some(4))
        .ignore_patterns(vec!["node_modules".to_string(), "*.tmp".to_string()])
        .min_size(1024u64)
        .threads(2usize)
        .build()
        .unwrap();

    assert!(config.follow_symlinks);
    assert!(!config.include_hidden);
    assert_eq!(config.max_depth, Some(4));
    assert_eq!(config.ignore_patterns.len(), 2);
    assert_eq!(config.min_size, 1024);
    assert_eq!(config.threads, 2);
    assert!(config.parallel);

    // Test default config
    let default_config = ScanConfig::default();
    assert!(!default_config.follow_symlinks);
    assert!(default_config.include_hidden);
    assert_eq!(default_config.min_size, 0);
    assert_eq!(default_config.chunk_size, 8192);
}

#[test]
fn test_scan_config_rejects_invalid_values() {
    assert!(ScanConfig::builder().chunk_size(0usize).build().is_err());
    assert!(
        ScanConfig::builder()
            .ignore_patterns(vec!["[".to_string()])
            .build()
            .is_err()
    );

    let config = ScanConfig {
        chunk_size: 0,
        ..ScanConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ScanError::InvalidConfig { .. })
    ));
}

#[test]
fn test_scan_config_from_partial_json() {
    let config: ScanConfig = serde_json::from_str(r#"{"follow_symlinks": true}"#).unwrap();
    assert!(config.follow_symlinks);
    assert!(config.include_hidden);
    assert!(config.parallel);
    assert_eq!(config.chunk_size, 8192);
}

#[test]
fn test_size_index_keeps_only_shared_sizes() {
    let mut index = SizeIndex::new();
    index.insert(FileRecord::new("/a", 10));
    index.insert(FileRecord::new("/b", 10));
    index.insert(FileRecord::new("/c", 20));
    index.insert(FileRecord::new("/d", 0));
    index.insert(FileRecord::new("/e", 0));

    index.retain_candidates();

    assert_eq!(index.len(), 2);
    assert_eq!(index.file_count(), 4);
    assert!(index.get(20).is_none());
    assert!(!index.contains_path(&PathBuf::from("/c")));
    assert_eq!(
        index.get(10).unwrap(),
        &[PathBuf::from("/a"), PathBuf::from("/b")]
    );
}

#[test]
fn test_duplicate_set_summary() {
    let set: DuplicateSet = vec![
        DuplicateGroup::new(
            Digest::new([1; 32]),
            100,
            vec![PathBuf::from("/x/1"), PathBuf::from("/x/2"), PathBuf::from("/x/3")],
        ),
        DuplicateGroup::new(
            Digest::new([2; 32]),
            50,
            vec![PathBuf::from("/y/1"), PathBuf::from("/y/2")],
        ),
    ]
    .into_iter()
    .collect();

    assert_eq!(set.len(), 2);
    assert_eq!(set.file_count(), 5);
    assert_eq!(set.wasted_bytes(), 250);
    assert_eq!(
        set.removal_candidates(),
        vec![
            PathBuf::from("/x/2"),
            PathBuf::from("/x/3"),
            PathBuf::from("/y/2")
        ]
    );
    assert_eq!(
        set.group_of(&PathBuf::from("/y/2")).unwrap().digest,
        Digest::new([2; 32])
    );
}

#[test]
fn test_digest_serializes_as_hex() {
    let digest = Digest::new([0xab; 32]);
    let json = serde_json::to_string(&digest).unwrap();
    assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));

    let parsed: Digest = "ab".repeat(32).parse().unwrap();
    assert_eq!(parsed, digest);
    assert!("abc".parse::<Digest>().is_err());
}

#[test]
fn test_scan_stats_reset() {
    let mut stats = ScanStats::new();
    stats.total_files = 10;
    stats.scanned_files = 4;
    stats.failed_files = 1;
    stats.skipped_files = 2;
    stats.walk_errors = 1;

    assert_eq!(stats.error_count(), 4);
    stats.reset();
    assert_eq!(stats, ScanStats::default());
    assert_eq!(ScanPhase::default(), ScanPhase::Idle);
}

#[test]
fn test_file_info_and_format_size() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.bin");
    std::fs::write(&path, vec![0u8; 1536]).unwrap();

    let info = file_info(&path).unwrap();
    assert_eq!(info.size, 1536);
    assert_eq!(info.size_readable, "1.50 KB");
    assert!(file_info(&temp.path().join("missing")).is_none());

    assert_eq!(format_size(0), "0B");
    assert_eq!(format_size(1023), "1023.00 B");
    assert_eq!(format_size(1024 * 1024), "1.00 MB");
}

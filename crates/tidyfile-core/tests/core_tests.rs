use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tidyfile_core::{
    ContentHash, FileRecord, ScanConfig, ScanIndex, ScanWarning, TypeCategory, WarningKind,
};

#[test]
fn test_classification_ignores_location() {
    let a = FileRecord::new("/one/report.PDF", 1, SystemTime::UNIX_EPOCH);
    let b = FileRecord::new("/two/deeper/report.pdf", 99, SystemTime::now());

    assert_eq!(a.type_category, TypeCategory::Document);
    assert_eq!(a.type_category, b.type_category);
}

#[test]
fn test_renamed_extension_wins_over_content() {
    // Classification is by name only; content is never read.
    let record = FileRecord::new("/notes/actually_text.jpg", 12, SystemTime::UNIX_EPOCH);
    assert_eq!(record.type_category, TypeCategory::Image);
}

#[test]
fn test_modified_at_is_utc() {
    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
    let record = FileRecord::new("/x.bin", 0, mtime);
    assert_eq!(record.modified_at.timestamp(), 86_400);
    assert_eq!(record.type_category, TypeCategory::Other);
}

#[test]
fn test_content_hash_equality() {
    let bytes = [0xab; 32];
    let hash = ContentHash::new(bytes);

    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

    assert_eq!(hash, ContentHash::new(bytes));
    assert_ne!(hash, ContentHash::new([0xcd; 32]));
}

#[test]
fn test_index_skipped_paths_roundtrip() {
    let warnings = vec![ScanWarning::permission_denied("/data/locked")];
    let index = ScanIndex::new(
        PathBuf::from("/data"),
        Utc::now(),
        Duration::from_millis(5),
        ScanConfig::new("/data"),
        vec![FileRecord::new("/data/a.mp3", 3, SystemTime::UNIX_EPOCH)],
        warnings,
        false,
    );

    assert!(!index.is_complete());
    assert!(index.has_warnings());
    assert_eq!(index.skipped_paths()[0].kind, WarningKind::PermissionDenied);

    let json = serde_json::to_string(&index).unwrap();
    let back: ScanIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(back.root_path(), Path::new("/data"));
    assert_eq!(back.skipped_paths().len(), 1);
    assert_eq!(
        back.get(Path::new("/data/a.mp3")).unwrap().type_category,
        TypeCategory::Audio
    );
}

//! Per-file metadata extraction.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tidyfile_core::{FileRecord, ScanError};

/// Build a [`FileRecord`] for a single regular file.
///
/// Only filesystem attributes are read; extension and category come from
/// the path. Symlinks to regular files are followed.
///
/// # Errors
///
/// - [`ScanError::InvalidPath`] when the path is a directory, a special
///   file, or a dangling or cyclic symlink.
/// - [`ScanError::PermissionDenied`] / [`ScanError::Io`] when the file
///   cannot be stat'd, including files deleted after enumeration.
pub fn extract(path: &Path) -> Result<FileRecord, ScanError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            // A symlink that exists but cannot be resolved is a bad path,
            // not an access failure.
            if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
                return Err(ScanError::invalid_path(
                    path,
                    format!("unresolvable symlink: {err}"),
                ));
            }
            return Err(ScanError::access(path, err));
        }
    };

    if !metadata.is_file() {
        let reason = if metadata.is_dir() {
            "is a directory"
        } else {
            "not a regular file"
        };
        return Err(ScanError::invalid_path(path, reason));
    }

    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    Ok(FileRecord::new(path, metadata.len(), modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tidyfile_core::TypeCategory;

    #[test]
    fn test_extract_regular_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Song.MP3");
        fs::write(&path, vec![0u8; 42]).unwrap();

        let record = extract(&path).unwrap();
        assert_eq!(record.path, path);
        assert_eq!(record.size_bytes, 42);
        assert_eq!(record.extension, "mp3");
        assert_eq!(record.type_category, TypeCategory::Audio);
        assert!(record.content_hash.is_none());
    }

    #[test]
    fn test_extract_directory_is_invalid() {
        let temp = TempDir::new().unwrap();
        let err = extract(temp.path()).unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_extract_missing_file_is_access_error() {
        let temp = TempDir::new().unwrap();
        let err = extract(&temp.path().join("vanished.txt")).unwrap_err();
        assert!(err.is_access());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_dangling_symlink_is_invalid() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("dangling.pdf");
        std::os::unix::fs::symlink(temp.path().join("nowhere"), &link).unwrap();

        let err = extract(&link).unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_classification_independent_of_content() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.png");
        let b = temp.path().join("b.png");
        fs::write(&a, "plain text").unwrap();
        fs::write(&b, [0x89, b'P', b'N', b'G']).unwrap();

        assert_eq!(extract(&a).unwrap().type_category, TypeCategory::Image);
        assert_eq!(extract(&b).unwrap().type_category, TypeCategory::Image);
    }
}

//! File record types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::category::TypeCategory;

/// 32-byte content digest used for duplicate detection.
///
/// Serialized as a lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64 character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ContentHash::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid content hash: {hex}")))
    }
}

/// One discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path, unique within a scan.
    pub path: PathBuf,

    /// Size in bytes.
    pub size_bytes: u64,

    /// Last modification time, normalized to UTC.
    pub modified_at: DateTime<Utc>,

    /// Lowercase extension without the dot, empty when there is none.
    pub extension: CompactString,

    /// Category derived from the extension.
    pub type_category: TypeCategory,

    /// Content digest, filled in only by duplicate detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
}

impl FileRecord {
    /// Create a record, deriving extension and category from the path.
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, modified: SystemTime) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        let type_category = TypeCategory::from_extension(&extension);
        Self {
            path,
            size_bytes,
            modified_at: DateTime::<Utc>::from(modified),
            extension,
            type_category,
            content_hash: None,
        }
    }

    /// Return a copy of this record carrying the given hash.
    pub fn with_hash(mut self, hash: ContentHash) -> Self {
        self.content_hash = Some(hash);
        self
    }

    /// File name component of the path.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Lowercase extension of a path (characters after the last dot of the
/// file name). Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(path: &Path) -> CompactString {
    path.extension()
        .map(|ext| CompactString::new(ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
        assert_eq!(ContentHash::from_hex(&hash.to_hex()), Some(hash));
    }

    #[test]
    fn test_content_hash_rejects_bad_hex() {
        assert!(ContentHash::from_hex("abc").is_none());
        assert!(ContentHash::from_hex(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn test_record_derives_category() {
        let record = FileRecord::new("/data/Holiday.JPG", 10, SystemTime::UNIX_EPOCH);
        assert_eq!(record.extension, "jpg");
        assert_eq!(record.type_category, TypeCategory::Image);
        assert_eq!(record.file_name(), "Holiday.JPG");
        assert!(record.content_hash.is_none());
    }

    #[test]
    fn test_extension_edge_cases() {
        assert_eq!(extension_of(Path::new("/a/.bashrc")), "");
        assert_eq!(extension_of(Path::new("/a/Makefile")), "");
        assert_eq!(extension_of(Path::new("/a/backup.tar.GZ")), "gz");
    }

    #[test]
    fn test_record_json_shape() {
        let record = FileRecord::new("/data/report.pdf", 500, SystemTime::UNIX_EPOCH)
            .with_hash(ContentHash::new([1; 32]));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["path"], "/data/report.pdf");
        assert_eq!(json["size_bytes"], 500);
        assert_eq!(json["type_category"], "document");
        assert_eq!(json["content_hash"], "01".repeat(32));
    }
}

//! Extension-based file type classification.
//!
//! Classification is a pure lookup on the lowercase extension. File content
//! is never inspected, so a text file renamed to `.jpg` is reported as an
//! image.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Coarse type bucket assigned to every scanned file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TypeCategory {
    Document,
    Image,
    Video,
    Audio,
    Archive,
    Other,
}

/// Static extension table. Extensions are lowercase and carry no dot.
const EXTENSION_TABLE: &[(&str, TypeCategory)] = &[
    // Documents
    ("pdf", TypeCategory::Document),
    ("doc", TypeCategory::Document),
    ("docx", TypeCategory::Document),
    ("odt", TypeCategory::Document),
    ("rtf", TypeCategory::Document),
    ("txt", TypeCategory::Document),
    ("md", TypeCategory::Document),
    ("xls", TypeCategory::Document),
    ("xlsx", TypeCategory::Document),
    ("ods", TypeCategory::Document),
    ("csv", TypeCategory::Document),
    ("ppt", TypeCategory::Document),
    ("pptx", TypeCategory::Document),
    ("odp", TypeCategory::Document),
    ("epub", TypeCategory::Document),
    // Images
    ("jpg", TypeCategory::Image),
    ("jpeg", TypeCategory::Image),
    ("png", TypeCategory::Image),
    ("gif", TypeCategory::Image),
    ("bmp", TypeCategory::Image),
    ("tif", TypeCategory::Image),
    ("tiff", TypeCategory::Image),
    ("webp", TypeCategory::Image),
    ("heic", TypeCategory::Image),
    ("heif", TypeCategory::Image),
    ("svg", TypeCategory::Image),
    ("raw", TypeCategory::Image),
    // Video
    ("mp4", TypeCategory::Video),
    ("mov", TypeCategory::Video),
    ("avi", TypeCategory::Video),
    ("mkv", TypeCategory::Video),
    ("wmv", TypeCategory::Video),
    ("flv", TypeCategory::Video),
    ("webm", TypeCategory::Video),
    ("m4v", TypeCategory::Video),
    ("mpg", TypeCategory::Video),
    ("mpeg", TypeCategory::Video),
    // Audio
    ("mp3", TypeCategory::Audio),
    ("wav", TypeCategory::Audio),
    ("m4a", TypeCategory::Audio),
    ("flac", TypeCategory::Audio),
    ("aac", TypeCategory::Audio),
    ("ogg", TypeCategory::Audio),
    ("wma", TypeCategory::Audio),
    ("opus", TypeCategory::Audio),
    // Archives
    ("zip", TypeCategory::Archive),
    ("rar", TypeCategory::Archive),
    ("7z", TypeCategory::Archive),
    ("tar", TypeCategory::Archive),
    ("gz", TypeCategory::Archive),
    ("tgz", TypeCategory::Archive),
    ("bz2", TypeCategory::Archive),
    ("xz", TypeCategory::Archive),
];

impl TypeCategory {
    /// Look up the category for an extension.
    ///
    /// The extension may be given with or without its leading dot and in any
    /// case. Unknown or empty extensions resolve to [`TypeCategory::Other`].
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.');
        EXTENSION_TABLE
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|(_, category)| *category)
            .unwrap_or(TypeCategory::Other)
    }

    /// Lowercase name, also used as the default directory name.
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// All extensions mapped to this category.
    pub fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        EXTENSION_TABLE
            .iter()
            .filter(move |(_, category)| category == self)
            .map(|(ext, _)| *ext)
    }
}

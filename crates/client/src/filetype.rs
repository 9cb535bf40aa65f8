//! Extension-based file classification.
//!
//! Classification is a pure lookup on the lowercased extension string; no
//! content sniffing. Unknown or missing extensions fall through to
//! [`FileCategory::Other`].

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Category of a file, as derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Code,
    Archive,
    Document,
    Excel,
    Ppt,
    #[default]
    Other,
}

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tiff"];
const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm", "m4v"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac", "wma"];
const DOC_EXTS: &[&str] = &["doc", "docx", "txt", "rtf", "odt", "md"];
const PDF_EXTS: &[&str] = &["pdf"];
const CODE_EXTS: &[&str] = &[
    "js", "java", "py", "html", "css", "cpp", "c", "json", "xml", "php", "rb", "go", "rs", "ts",
];
const ARCHIVE_EXTS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"];
const EXCEL_EXTS: &[&str] = &["xls", "xlsx", "csv", "ods"];
const PPT_EXTS: &[&str] = &["ppt", "pptx", "odp"];

/// Classifies a file name by its extension, case-insensitively.
pub fn classify(name: &str) -> FileCategory {
    let ext = name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let ext = ext.as_str();

    if IMAGE_EXTS.contains(&ext) {
        FileCategory::Image
    } else if VIDEO_EXTS.contains(&ext) {
        FileCategory::Video
    } else if AUDIO_EXTS.contains(&ext) {
        FileCategory::Audio
    } else if PDF_EXTS.contains(&ext) {
        FileCategory::Pdf
    } else if CODE_EXTS.contains(&ext) {
        FileCategory::Code
    } else if ARCHIVE_EXTS.contains(&ext) {
        FileCategory::Archive
    } else if EXCEL_EXTS.contains(&ext) {
        FileCategory::Excel
    } else if PPT_EXTS.contains(&ext) {
        FileCategory::Ppt
    } else if DOC_EXTS.contains(&ext) {
        FileCategory::Document
    } else {
        FileCategory::Other
    }
}

impl FileCategory {
    /// Display glyph for the category.
    pub fn glyph(&self) -> &'static str {
        match self {
            FileCategory::Image => "\u{1F5BC}",
            FileCategory::Video => "\u{1F39E}",
            FileCategory::Audio => "\u{266B}",
            FileCategory::Pdf => "\u{1F4D5}",
            FileCategory::Code => "\u{2328}",
            FileCategory::Archive => "\u{1F4E6}",
            FileCategory::Document => "\u{1F4C4}",
            FileCategory::Excel => "\u{1F4CA}",
            FileCategory::Ppt => "\u{1F4FD}",
            FileCategory::Other => "\u{1F4C3}",
        }
    }

    /// Accent color for the category.
    pub fn color(&self) -> Color {
        match self {
            FileCategory::Image => Color::Magenta,
            FileCategory::Video => Color::LightRed,
            FileCategory::Audio => Color::LightGreen,
            FileCategory::Pdf => Color::Red,
            FileCategory::Code => Color::Cyan,
            FileCategory::Archive => Color::Yellow,
            FileCategory::Document => Color::Blue,
            FileCategory::Excel => Color::Green,
            FileCategory::Ppt => Color::LightMagenta,
            FileCategory::Other => Color::Gray,
        }
    }

    /// Short label used in list view.
    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Pdf => "pdf",
            FileCategory::Code => "code",
            FileCategory::Archive => "archive",
            FileCategory::Document => "document",
            FileCategory::Excel => "excel",
            FileCategory::Ppt => "ppt",
            FileCategory::Other => "other",
        }
    }
}

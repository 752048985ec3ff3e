//! Naming and validation of uploaded media files.

use std::path::Path;

use super::MediaError;

/// Directory under the media root that receives uploads.
pub const UPLOADS_DIR: &str = "uploads";

const FILE_EXTENSIONS: &[&str] = &[
    ".txt", ".pdf", ".doc", ".docx", ".odt", ".xls", ".xlsx", ".ods",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mpeg", ".m4v", ".webm", ".ogg", ".ogv", ".flv", ".jpg",
];
const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tif", ".tiff",
];

/// The kind of upload, which decides both the storage context directory and
/// the accepted extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UploadKind {
    Image,
    File,
    Video,
}

impl UploadKind {
    pub fn context(&self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::File => "file",
            UploadKind::Video => "video",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => IMAGE_EXTENSIONS,
            UploadKind::File => FILE_EXTENSIONS,
            UploadKind::Video => VIDEO_EXTENSIONS,
        }
    }

    /// Checks the filename's extension (with the leading dot, case-sensitive)
    /// against the allowed list.
    pub fn validate_extension(&self, filename: &str) -> Result<(), MediaError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        if self.allowed_extensions().contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(MediaError::UnsupportedExtension(filename.to_string()))
        }
    }
}

/// Relative path (from the media root) where an upload is stored:
/// `uploads/<page type>/<context>/<group>/<filename>`, each component
/// slugified and empty components dropped.
pub fn upload_path(
    page_type: &str,
    kind: UploadKind,
    group: &str,
    filename: &str,
) -> Result<String, MediaError> {
    let file = slugify_filename(filename)
        .ok_or_else(|| MediaError::InvalidFilename(filename.to_string()))?;

    let parts = [
        UPLOADS_DIR.to_string(),
        slugify(page_type),
        kind.context().to_string(),
        slugify(group),
        file,
    ];
    Ok(parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Transliterates to ASCII, lowercases letters and digits, collapses runs of
/// anything else that separates words into a single `_`, and drops everything
/// else.
pub fn slugify(value: &str) -> String {
    let value = deunicode::deunicode(value);
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || matches!(c, '_' | '-' | '.' | '/' | '\\') {
            pending_separator = true;
        }
    }
    slug
}

fn slugify_filename(filename: &str) -> Option<String> {
    let name = Path::new(filename).file_name()?.to_str()?;
    let path = Path::new(name);

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let stem = slugify(stem);
    if stem.is_empty() {
        return None;
    }

    match path.extension().and_then(|e| e.to_str()).map(slugify) {
        Some(ext) if !ext.is_empty() => Some(format!("{}.{}", stem, ext)),
        _ => Some(stem),
    }
}

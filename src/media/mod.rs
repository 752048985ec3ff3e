//! Media files: URL layout under the media root and upload naming rules.

mod layout;
mod upload;

pub use layout::{DerivedLocation, MediaLayout};
pub use upload::{slugify, upload_path, UploadKind, UPLOADS_DIR};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("URL is outside the media root: {0}")]
    OutsideMediaRoot(String),

    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),
}

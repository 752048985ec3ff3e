//! Image processing backends.
//!
//! The generator only needs two things from a backend: the pixel size of a
//! source image, and a way to apply a list of [`Operation`]s while writing the
//! result to a new file. [`ImageMagickProcessor`] shells out to `identify` and
//! `convert`; [`NativeProcessor`] does the same work in-process with the
//! `image` crate.

mod imagemagick;
mod native;

pub use imagemagick::{parse_identify_output, ImageMagickProcessor};
pub use native::NativeProcessor;

use async_trait::async_trait;
use clap::ValueEnum;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::styles::{Operation, Size};

/// Errors that can occur while inspecting or transforming an image.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Inspection failed: {0}")]
    InspectFailed(String),

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("{0} did not finish within {1:?}")]
    Timeout(String, Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

#[async_trait]
pub trait ImageProcessor: Send + Sync {
    /// Short backend name, used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Pixel dimensions of the image at `path`.
    async fn inspect(&self, path: &Path) -> Result<Size, ProcessorError>;

    /// Reads `source`, applies `operations` in order and writes the result to
    /// `destination`. The output format follows the destination extension.
    async fn transform(
        &self,
        source: &Path,
        destination: &Path,
        operations: &[Operation],
    ) -> Result<(), ProcessorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProcessorKind {
    #[default]
    Imagemagick,
    Native,
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorKind::Imagemagick => write!(f, "imagemagick"),
            ProcessorKind::Native => write!(f, "native"),
        }
    }
}

//! In-process backend built on the `image` crate.

use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

use super::{ImageProcessor, ProcessorError};
use crate::styles::{fit_within, Operation, Size};

/// Decoding and resampling are CPU bound, so both operations run on tokio's
/// blocking pool.
#[derive(Debug, Default, Clone)]
pub struct NativeProcessor;

impl NativeProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageProcessor for NativeProcessor {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn inspect(&self, path: &Path) -> Result<Size, ProcessorError> {
        let path = path.to_path_buf();
        let (w, h) = tokio::task::spawn_blocking(move || image::image_dimensions(&path))
            .await
            .map_err(|e| ProcessorError::InspectFailed(e.to_string()))??;
        non_empty_size(w, h)
    }

    async fn transform(
        &self,
        source: &Path,
        destination: &Path,
        operations: &[Operation],
    ) -> Result<(), ProcessorError> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        let operations = operations.to_vec();

        tokio::task::spawn_blocking(move || apply(&source, &destination, &operations))
            .await
            .map_err(|e| ProcessorError::ConversionFailed(e.to_string()))?
    }
}

/// Some decoders accept headers that declare a zero width or height.
fn non_empty_size(w: u32, h: u32) -> Result<Size, ProcessorError> {
    if w == 0 || h == 0 {
        return Err(ProcessorError::InvalidOutput(format!(
            "image has no pixels ({}x{})",
            w, h
        )));
    }
    Ok(Size::new(w, h))
}

fn apply(
    source: &Path,
    destination: &Path,
    operations: &[Operation],
) -> Result<(), ProcessorError> {
    let mut img = image::open(source)?;

    for op in operations {
        img = match op {
            Operation::Crop(rect) => img.crop_imm(rect.x, rect.y, rect.w, rect.h),
            Operation::Thumbnail(bounds) => {
                let current = Size::new(img.width(), img.height());
                let out = fit_within(current, *bounds);
                if out == current {
                    img
                } else {
                    img.resize_exact(out.w, out.h, FilterType::Lanczos3)
                }
            }
        };
    }

    let format = ImageFormat::from_path(destination)?;
    // JPEG has no alpha channel.
    if format == ImageFormat::Jpeg && img.color().has_alpha() {
        img = DynamicImage::ImageRgb8(img.to_rgb8());
    }

    debug!(
        "Saving {}x{} {:?} to {:?}",
        img.width(),
        img.height(),
        format,
        destination
    );
    img.save_with_format(destination, format)?;
    Ok(())
}

//! Test fixture creation
//!
//! Builds a throwaway media root populated with small generated images.

use super::constants::*;
use anyhow::Result;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use media_styles::{StyleDefinition, StyleKind, StyleTable};
use std::path::Path;
use tempfile::TempDir;

fn write_gradient(root: &Path, relative: &str, (w, h): (u32, u32)) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 96])
    })
    .save(&path)?;
    Ok(())
}

/// Creates a media root containing every file named in `constants`.
pub fn create_test_media() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let root = dir.path();

    write_gradient(root, LANDSCAPE_JPG, LANDSCAPE_SIZE)?;
    write_gradient(root, SMALL_PNG, SMALL_SIZE)?;

    let portrait = root.join(PORTRAIT_PNG);
    RgbaImage::from_pixel(PORTRAIT_SIZE.0, PORTRAIT_SIZE.1, Rgba([20, 40, 60, 200]))
        .save(&portrait)?;

    std::fs::write(root.join(FAKE_IMAGE_PNG), "this is not a png")?;

    let readme = root.join(README_TXT);
    if let Some(parent) = readme.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(readme, "hello")?;

    Ok(dir)
}

pub fn create_test_styles() -> StyleTable {
    StyleTable::new()
        .with_style(STYLE_THUMB, StyleDefinition::new(StyleKind::Thumbnail, 64, 64))
        .and_then(|t| {
            t.with_style(
                STYLE_LARGE,
                StyleDefinition::new(StyleKind::ThumbnailUpscale, 120, 120),
            )
        })
        .and_then(|t| {
            t.with_style(
                STYLE_SQUARE,
                StyleDefinition::new(StyleKind::ThumbnailCrop, 50, 50),
            )
        })
        .expect("Fixture styles are valid")
}

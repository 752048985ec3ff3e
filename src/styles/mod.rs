//! Image styles: named presentation variants of an uploaded image.
//!
//! A style pairs a [`StyleKind`] with a target box. The [`StyleTable`] holds
//! the configured styles, and [`plan_derivative`] turns a style and the
//! source dimensions into the operations that produce the derivative.

mod geometry;

pub use geometry::{center_crop, fit_within, CropRect, Size};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StyleError {
    #[error("Unknown image style: {0}")]
    UnknownStyle(String),

    #[error("Invalid style name: {0:?}")]
    InvalidName(String),

    #[error("Style {0} must have positive dimensions, got {1}x{2}")]
    InvalidSize(String, u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    /// Fit within the box, never enlarging a source that is already smaller.
    Thumbnail,
    /// Fit within the box, enlarging small sources.
    ThumbnailUpscale,
    /// Center-crop to the box's aspect ratio, then resize to the box.
    ThumbnailCrop,
}

impl StyleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKind::Thumbnail => "thumbnail",
            StyleKind::ThumbnailUpscale => "thumbnail-upscale",
            StyleKind::ThumbnailCrop => "thumbnail-crop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDefinition {
    pub kind: StyleKind,
    pub target: Size,
}

impl StyleDefinition {
    pub fn new(kind: StyleKind, width: u32, height: u32) -> Self {
        Self {
            kind,
            target: Size::new(width, height),
        }
    }
}

/// A single image operation, in the order it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    /// Extract the rectangle from the image.
    Crop(CropRect),
    /// Resize to fit within the box, preserving the aspect ratio.
    Thumbnail(Size),
}

/// Computes the operations that turn a `source`-sized image into the
/// derivative for `style`.
pub fn plan_derivative(style: &StyleDefinition, source: Size) -> Vec<Operation> {
    let target = style.target;
    match style.kind {
        StyleKind::Thumbnail => {
            if target.w > source.w && target.h > source.h {
                vec![Operation::Thumbnail(source)]
            } else {
                vec![Operation::Thumbnail(target)]
            }
        }
        StyleKind::ThumbnailUpscale => vec![Operation::Thumbnail(target)],
        StyleKind::ThumbnailCrop => vec![
            Operation::Crop(center_crop(source, target)),
            Operation::Thumbnail(target),
        ],
    }
}

/// Final pixel size of a derivative once every operation has been applied.
pub fn planned_output_size(operations: &[Operation], source: Size) -> Size {
    operations.iter().fold(source, |current, op| match op {
        Operation::Crop(rect) => rect.size(),
        Operation::Thumbnail(bounds) => fit_within(current, *bounds),
    })
}

/// The configured styles, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTable {
    styles: BTreeMap<String, StyleDefinition>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a style, validating that its name can be used as a directory name
    /// and that its box is not empty.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        style: StyleDefinition,
    ) -> Result<(), StyleError> {
        let name = name.into();
        if !is_valid_style_name(&name) {
            return Err(StyleError::InvalidName(name));
        }
        if style.target.w == 0 || style.target.h == 0 {
            return Err(StyleError::InvalidSize(name, style.target.w, style.target.h));
        }
        self.styles.insert(name, style);
        Ok(())
    }

    pub fn with_style(
        mut self,
        name: impl Into<String>,
        style: StyleDefinition,
    ) -> Result<Self, StyleError> {
        self.insert(name, style)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&StyleDefinition, StyleError> {
        self.styles
            .get(name)
            .ok_or_else(|| StyleError::UnknownStyle(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleDefinition)> {
        self.styles.iter().map(|(name, style)| (name.as_str(), style))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn is_valid_style_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

//! Pixel geometry for derivative planning.

use serde::Serialize;
use std::fmt;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn ratio(&self) -> f64 {
        self.w as f64 / self.h as f64
    }

    /// Parses the `WxH` notation used by ImageMagick.
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.split_once('x')?;
        let w: u32 = w.trim().parse().ok()?;
        let h: u32 = h.trim().parse().ok()?;
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self { w, h })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// A rectangle to extract from a source image, rendered as `WxH+X+Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub w: u32,
    pub h: u32,
    pub x: u32,
    pub y: u32,
}

impl CropRect {
    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

/// Size of `source` scaled to fit inside `bounds`, preserving the aspect ratio.
///
/// The result touches `bounds` in at least one dimension, so a source smaller
/// than the box is enlarged. Callers that must not upscale check that first.
pub fn fit_within(source: Size, bounds: Size) -> Size {
    let scale = f64::min(
        bounds.w as f64 / source.w as f64,
        bounds.h as f64 / source.h as f64,
    );
    let w = (source.w as f64 * scale).round().clamp(1.0, bounds.w as f64) as u32;
    let h = (source.h as f64 * scale).round().clamp(1.0, bounds.h as f64) as u32;
    Size::new(w, h)
}

/// Largest centered rectangle of `source` with the aspect ratio of `target`.
pub fn center_crop(source: Size, target: Size) -> CropRect {
    let target_ratio = target.ratio();

    if source.ratio() > target_ratio {
        // Source is relatively wider: trim left and right.
        let w = round_within(source.h as f64 * target_ratio, source.w);
        CropRect {
            w,
            h: source.h,
            x: (source.w - w) / 2,
            y: 0,
        }
    } else {
        let h = round_within(source.w as f64 / target_ratio, source.h);
        CropRect {
            w: source.w,
            h,
            x: 0,
            y: (source.h - h) / 2,
        }
    }
}

fn round_within(value: f64, max: u32) -> u32 {
    (value.round() as u32).clamp(1, max)
}

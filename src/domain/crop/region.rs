// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/region.rs
//
// Crop geometry: target size, aspect-locked drag region and pixel rectangle.

use std::fmt;
use std::str::FromStr;

use super::transform::ScaleTransform;
use crate::error::{Error, Result};

/// Output size of a crop. Both edges are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    width: u32,
    height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidTargetSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width / height`.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `768x512`.
impl FromStr for TargetSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::user_input(format!("expected WIDTHxHEIGHT, got '{s}'")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| Error::user_input(format!("invalid size '{s}': {e}")))
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

/// Axis-aligned rectangle with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Drag rectangle in preview (display) coordinates.
///
/// The anchor is where the drag started. The horizontal extent follows the
/// pointer; the vertical extent is derived from it through the target aspect
/// ratio and points to whichever side of the anchor the pointer is on
/// (downwards when level). Extents are signed; [`CropRegion::normalized`]
/// gives the top-left form used for drawing and clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    anchor_x: f32,
    anchor_y: f32,
    width: f32,
    height: f32,
}

impl CropRegion {
    /// Zero-sized region at the drag anchor.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            anchor_x: x,
            anchor_y: y,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Follow the pointer to `(x, y)` keeping `|width| / |height| == aspect`.
    pub fn drag_to(&mut self, x: f32, y: f32, aspect: f32) {
        self.width = x - self.anchor_x;
        let height = self.width.abs() / aspect;
        self.height = if y < self.anchor_y { -height } else { height };
    }

    pub fn has_area(&self) -> bool {
        self.width != 0.0 && self.height != 0.0
    }

    pub fn normalized(&self) -> Rect {
        Rect {
            x: self.anchor_x.min(self.anchor_x + self.width),
            y: self.anchor_y.min(self.anchor_y + self.height),
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }

    /// Map into source pixels, clamped to the source bounds.
    ///
    /// The corner at the anchor stays fixed and the far edges are trimmed so
    /// the clamped rectangle keeps `aspect`. Returns `None` when nothing of
    /// the region survives at pixel resolution.
    pub fn to_source_pixels(&self, transform: &ScaleTransform, aspect: f32) -> Option<PixelRect> {
        if !self.has_area() {
            return None;
        }

        let (src_w, src_h) = transform.source_size();
        let (src_w, src_h) = (src_w as f32, src_h as f32);

        let ax = transform.to_source(self.anchor_x).clamp(0.0, src_w);
        let ay = transform.to_source(self.anchor_y).clamp(0.0, src_h);

        let room_x = if self.width >= 0.0 { src_w - ax } else { ax };
        let room_y = if self.height >= 0.0 { src_h - ay } else { ay };

        let mut w = transform.to_source(self.width.abs()).min(room_x);
        let mut h = transform.to_source(self.height.abs()).min(room_y);
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        if w / h > aspect {
            w = h * aspect;
        } else {
            h = w / aspect;
        }

        let x0 = if self.width >= 0.0 { ax } else { ax - w };
        let y0 = if self.height >= 0.0 { ay } else { ay - h };

        PixelRect::from_bounds(x0, y0, x0 + w, y0 + h, src_w, src_h)
    }
}

/// Crop region in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Snap float bounds to whole pixels inside `max_x` x `max_y`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_bounds(x0: f32, y0: f32, x1: f32, y1: f32, max_x: f32, max_y: f32) -> Option<Self> {
        let left = x0.round().clamp(0.0, max_x) as u32;
        let top = y0.round().clamp(0.0, max_y) as u32;
        let right = x1.round().clamp(0.0, max_x) as u32;
        let bottom = y1.round().clamp(0.0, max_y) as u32;

        let rect = Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        );
        rect.is_valid().then_some(rect)
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }

    /// Check if region has valid dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Intersect with a `width` x `height` image.
    pub fn clamped_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self::new(
            x,
            y,
            self.width.min(width - x),
            self.height.min(height - y),
        )
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/transform.rs
//
// Mapping between the scaled crop preview and source image pixels.

use crate::error::{Error, Result};

/// Scale between a source image and its on-screen preview.
///
/// The preview fits inside a `bound` x `bound` box and never upscales, so
/// `scale <= 1` and both displayed edges are `<= bound`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    scale: f32,
    source_width: u32,
    source_height: u32,
    display_width: u32,
    display_height: u32,
}

impl ScaleTransform {
    /// Fit a `source_width` x `source_height` image into the preview bound.
    pub fn fit(source_width: u32, source_height: u32, bound: f32) -> Result<Self> {
        if !bound.is_finite() || bound < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "preview bound must be at least 1, got {bound}"
            )));
        }
        if source_width == 0 || source_height == 0 {
            return Err(Error::user_input("Image has no pixels"));
        }

        let scale = (bound / source_width as f32)
            .min(bound / source_height as f32)
            .min(1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let display_width = ((source_width as f32 * scale).floor() as u32).max(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let display_height = ((source_height as f32 * scale).floor() as u32).max(1);

        Ok(Self {
            scale,
            source_width,
            source_height,
            display_width,
            display_height,
        })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    pub fn to_source(&self, display: f32) -> f32 {
        display / self.scale
    }

    /// Clamp a display point into the preview area.
    pub fn clamp_display_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x.clamp(0.0, self.display_width as f32),
            y.clamp(0.0, self.display_height as f32),
        )
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/operations.rs
//
// Crop-then-resize of a source image to a fixed output size.

use image::imageops::FilterType;

use super::region::{PixelRect, TargetSize};
use crate::domain::image::DisplayableImage;
use crate::error::{Error, Result};

/// Crop `rect` out of `source` and resize it to exactly `target`.
///
/// `rect` is intersected with the source bounds first; an empty
/// intersection is an [`Error::InvalidRegion`].
pub fn crop_to_target(
    source: &DisplayableImage,
    rect: PixelRect,
    target: TargetSize,
) -> Result<DisplayableImage> {
    let (width, height) = source.dimensions();
    let rect = rect.clamped_to(width, height);
    if !rect.is_valid() {
        return Err(Error::InvalidRegion(format!(
            "{:?} has no pixels inside a {width}x{height} image",
            rect.as_tuple()
        )));
    }

    log::debug!(
        "Cropping {:?} from {width}x{height}, resizing to {target}",
        rect.as_tuple()
    );
    let cropped = source.cropped(rect.x, rect.y, rect.width, rect.height);
    Ok(cropped.resized_exact(target.width(), target.height(), FilterType::Lanczos3))
}

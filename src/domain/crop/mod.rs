// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/mod.rs
//
// Crop geometry and the crop-resize operation.

mod operations;
mod region;
mod transform;

pub use operations::crop_to_target;
pub use region::{CropRegion, PixelRect, Rect, TargetSize};
pub use transform::ScaleTransform;

// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/crop/mod.rs
//
// Crop tool module: modal session and drag selection state.

mod selection;
mod tool;

pub use selection::CropSelection;
pub use tool::{CropEvent, CropOutcome, CropTool, DragGesture};

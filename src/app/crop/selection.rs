// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/crop/selection.rs
//
// Crop selection state: the drag gesture over the preview.

use crate::domain::crop::{CropRegion, Rect};

#[derive(Debug, Clone, Default)]
pub struct CropSelection {
    pub region: Option<CropRegion>,
    pub is_dragging: bool,
}

impl CropSelection {
    pub fn start_new_selection(&mut self, x: f32, y: f32) {
        self.region = Some(CropRegion::at(x, y));
        self.is_dragging = true;
    }

    pub fn update_drag(&mut self, x: f32, y: f32, aspect: f32) {
        if !self.is_dragging {
            return;
        }

        if let Some(region) = self.region.as_mut() {
            region.drag_to(x, y, aspect);
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }

    pub fn reset(&mut self) {
        self.region = None;
        self.is_dragging = false;
    }

    pub fn has_selection(&self) -> bool {
        self.region.is_some_and(|r| r.has_area())
    }

    /// Rectangle to draw over the preview.
    pub fn overlay_rect(&self) -> Option<Rect> {
        self.region.map(|r| r.normalized())
    }
}

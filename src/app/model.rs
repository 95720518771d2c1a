// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/model.rs
//
// Application state.

use crate::app::crop::CropTool;
use crate::domain::image::DisplayableImage;

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

// =============================================================================
// Model
// =============================================================================

/// One user session: everything the handlers read and write.
#[derive(Debug, Default)]
pub struct AppModel {
    // Request.
    pub prompt: String,
    pub references: Vec<DisplayableImage>,

    // Tools.
    pub crop_tool: Option<CropTool>,

    // Generation.
    pub generating: bool,
    pub progress: f32,
    pub progress_label: Option<&'static str>,
    pub generated: Option<DisplayableImage>,

    // UI state.
    pub status: StatusLine,
}

impl AppModel {
    pub fn set_status<S: Into<String>>(&mut self, msg: S) {
        self.status = StatusLine {
            message: msg.into(),
            is_error: false,
        };
    }

    pub fn set_error<S: Into<String>>(&mut self, msg: S) {
        self.status = StatusLine {
            message: msg.into(),
            is_error: true,
        };
    }

    pub fn clear_error(&mut self) {
        if self.status.is_error {
            self.status = StatusLine::default();
        }
    }

    /// Whether the generate action is available.
    pub fn can_generate(&self) -> bool {
        !self.generating && self.crop_tool.is_none()
    }

    /// Whether the save action is available.
    pub fn can_save(&self) -> bool {
        self.generated.is_some()
    }

    /// Reference passed to the next generation: the most recently added one.
    pub fn active_reference(&self) -> Option<&DisplayableImage> {
        self.references.last()
    }
}

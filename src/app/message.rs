// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/message.rs
//
// Application messages: events, user actions, and internal signals.

use std::path::PathBuf;

use crate::app::crop::CropEvent;

#[derive(Debug, Clone)]
pub enum AppMessage {
    // Prompt.
    PromptChanged(String),

    // Reference images. `None` means the file dialog was closed without a choice.
    AddReference(Option<PathBuf>),
    Crop(CropEvent),
    ClearReferences,

    // Generation.
    Generate,

    // Display tick: drains the background worker.
    Tick,

    // Save operations.
    SaveAs(Option<PathBuf>),

    // Errors.
    ClearError,
}

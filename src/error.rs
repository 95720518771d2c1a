// SPDX-License-Identifier: GPL-3.0-or-later
// src/error.rs
//
// Error types shared by the crop tool, progress tracker and session.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for pictor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the user. None of them are fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty prompt, missing file, or an action that is not available right now.
    #[error("{0}")]
    UserInput(String),

    #[error("Target size must be positive, got {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    #[error("Crop region is empty: {0}")]
    InvalidRegion(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error("An image is already being generated")]
    GenerationInFlight,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn user_input<S: Into<String>>(msg: S) -> Self {
        Error::UserInput(msg.into())
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::Image {
            path: path.into(),
            source,
        }
    }
}

/// Failure raised by an image generation backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Model loading error: {0}")]
    ModelLoading(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Backend error: {0}")]
    Backend(String),

    /// The background task ended without reporting a result.
    #[error("Generation worker stopped unexpectedly")]
    WorkerLost,
}

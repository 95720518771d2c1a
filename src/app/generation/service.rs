// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/generation/service.rs
//
// Boundary to the external two-stage image generation service.

use crate::domain::image::DisplayableImage;
use crate::domain::progress::Stage;
use crate::error::GenerationError;

/// Everything a backend needs for one run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Text prompt describing the image to generate.
    pub prompt: String,
    /// Optional image to condition the generation on.
    pub reference: Option<DisplayableImage>,
    /// Inference steps per stage.
    pub total_steps: u32,
    /// Share of the denoising done by the base stage before the refiner.
    pub split_fraction: f32,
    /// How far generation may move away from the reference (0 = keep, 1 = ignore).
    pub reference_strength: Option<f32>,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("prompt is empty".into()));
        }
        if self.total_steps == 0 {
            return Err(GenerationError::InvalidRequest("step count is zero".into()));
        }
        if !(self.split_fraction > 0.0 && self.split_fraction < 1.0) {
            return Err(GenerationError::InvalidRequest(format!(
                "split fraction {} outside (0, 1)",
                self.split_fraction
            )));
        }
        if let Some(strength) = self.reference_strength
            && !(0.0..=1.0).contains(&strength)
        {
            return Err(GenerationError::InvalidRequest(format!(
                "reference strength {strength} outside [0, 1]"
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GenerationError::InvalidRequest(format!(
                "output size {}x{} is empty",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A two-stage (base + refiner) image generator.
///
/// Implementations block for the whole run and are always called from a
/// background thread. `progress` is invoked with the stage and the step
/// index just finished.
pub trait ImageGenerator: Send + Sync {
    /// Human readable backend name for logs.
    fn name(&self) -> &str;

    /// Load model weights. Called once before the first generation.
    fn prepare(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    fn generate(
        &self,
        request: &GenerationRequest,
        progress: &mut dyn FnMut(Stage, u32),
    ) -> Result<DisplayableImage, GenerationError>;
}

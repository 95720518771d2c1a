// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/generation/placeholder.rs
//
// Placeholder backend: walks both stages and paints a prompt-seeded gradient.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::thread;
use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use super::service::{GenerationRequest, ImageGenerator};
use crate::constant::{BASE_MODEL, REFINER_MODEL};
use crate::domain::image::DisplayableImage;
use crate::domain::progress::Stage;
use crate::error::GenerationError;

/// Stand-in for the diffusion pipeline, used when no model is available.
///
/// Reports every step of both stages, optionally sleeping between them, and
/// returns a gradient derived from the prompt and guidance scale. A reference
/// image is blended in with weight `1 - strength`.
#[derive(Debug, Clone)]
pub struct PlaceholderGenerator {
    step_delay: Duration,
    base_model: String,
    refiner_model: String,
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl PlaceholderGenerator {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            step_delay,
            base_model: BASE_MODEL.into(),
            refiner_model: REFINER_MODEL.into(),
        }
    }

    /// Model ids reported while loading.
    pub fn with_models(mut self, base: impl Into<String>, refiner: impl Into<String>) -> Self {
        self.base_model = base.into();
        self.refiner_model = refiner.into();
        self
    }

    fn run_stage(&self, stage: Stage, steps: u32, progress: &mut dyn FnMut(Stage, u32)) {
        for step in 1..=steps {
            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }
            progress(stage, step);
        }
    }
}

fn request_seed(request: &GenerationRequest) -> u64 {
    let mut hasher = DefaultHasher::new();
    request.prompt.hash(&mut hasher);
    request.guidance_scale.to_bits().hash(&mut hasher);
    hasher.finish()
}

fn paint(request: &GenerationRequest, seed: u64) -> RgbImage {
    let [r0, g0, b0, r1, g1, b1, ..] = seed.to_le_bytes();
    let (w, h) = (request.width, request.height);

    RgbImage::from_fn(w, h, |x, y| {
        let t = (x + y) as f32 / (w + h).saturating_sub(2).max(1) as f32;
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb([mix(r0, r1), mix(g0, g1), mix(b0, b1)])
    })
}

fn blend(base: &mut RgbImage, reference: &DisplayableImage, weight: f32) {
    let reference = reference
        .resized_exact(base.width(), base.height(), FilterType::Triangle)
        .as_dynamic()
        .to_rgb8();

    for (dst, src) in base.pixels_mut().zip(reference.pixels()) {
        for (d, s) in dst.0.iter_mut().zip(src.0) {
            *d = (*d as f32 * (1.0 - weight) + s as f32 * weight).round() as u8;
        }
    }
}

impl ImageGenerator for PlaceholderGenerator {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn prepare(&self) -> Result<(), GenerationError> {
        for (stage, id) in [(Stage::Base, &self.base_model), (Stage::Refiner, &self.refiner_model)] {
            if id.trim().is_empty() {
                return Err(GenerationError::ModelLoading(format!(
                    "no {} model configured",
                    stage.label().to_lowercase()
                )));
            }
            log::info!("{} model: {id}", stage.label());
        }
        log::warn!("Using placeholder backend - images are generated without a model");
        Ok(())
    }

    fn generate(
        &self,
        request: &GenerationRequest,
        progress: &mut dyn FnMut(Stage, u32),
    ) -> Result<DisplayableImage, GenerationError> {
        request.validate()?;

        let seed = request_seed(request);
        log::info!("Prompt: {}", request.prompt);
        log::debug!(
            "Using seed: {seed} (guidance {:.1})",
            request.guidance_scale
        );

        self.run_stage(Stage::Base, request.total_steps, progress);

        let mut image = paint(request, seed);
        if let Some(reference) = &request.reference {
            let strength = request.reference_strength.unwrap_or(1.0);
            blend(&mut image, reference, 1.0 - strength);
        }

        self.run_stage(Stage::Refiner, request.total_steps, progress);

        Ok(DynamicImage::ImageRgb8(image).into())
    }
}

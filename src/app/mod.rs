// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/mod.rs
//
// Application wiring: session model, injected generator and the background job.

pub mod crop;
pub mod display;
pub mod generation;
pub mod message;
pub mod model;
mod update;

use std::sync::Arc;

use tokio::runtime::Handle;

use self::display::DisplaySink;
use self::generation::{GenerationHandle, GenerationWorker, ImageGenerator};
pub use self::message::AppMessage;
pub use self::model::AppModel;
pub use self::update::UpdateResult;
use crate::config::AppConfig;
use crate::domain::crop::ScaleTransform;

/// Main application type.
///
/// Owns the session model; the generator is injected once and shared with
/// the background worker. At most one generation job exists at a time.
pub struct App {
    pub model: AppModel,
    pub config: AppConfig,
    worker: GenerationWorker,
    job: Option<GenerationHandle>,
}

impl App {
    pub fn new(config: AppConfig, generator: Arc<dyn ImageGenerator>, runtime: Handle) -> Self {
        let worker = GenerationWorker::new(generator, runtime, config.progress_queue_capacity);
        Self {
            model: AppModel::default(),
            config,
            worker,
            job: None,
        }
    }

    pub fn update(&mut self, message: AppMessage) -> UpdateResult {
        update::update(self, message)
    }

    /// Push the current model to a display.
    pub fn render(&self, sink: &mut dyn DisplaySink) {
        let model = &self.model;
        if !model.status.message.is_empty() {
            sink.show_status(&model.status.message, model.status.is_error);
        }
        if model.generating || model.progress > 0.0 {
            sink.show_progress(model.progress, model.progress_label);
        }
        if let Some(image) = &model.generated {
            let (w, h) = image.dimensions();
            if let Ok(fit) = ScaleTransform::fit(w, h, self.config.display_size as f32) {
                sink.show_image(image, fit.display_size());
            }
        }
    }
}

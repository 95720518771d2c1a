// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/update.rs
//
// Message handling: validates user actions and drives the crop tool and worker.

use std::path::PathBuf;

use super::App;
use super::crop::{CropEvent, CropOutcome, CropTool};
use super::generation::{GenerationRequest, WorkerUpdate};
use super::message::AppMessage;
use crate::constant::PROGRESS_MAX;
use crate::domain::image::DisplayableImage;
use crate::error::{Error, Result};

/// What became of a message.
#[derive(Debug)]
pub enum UpdateResult {
    Handled,
    /// The action was refused; the reason is also on the status line.
    Rejected(Error),
}

impl UpdateResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, UpdateResult::Rejected(_))
    }
}

pub fn update(app: &mut App, message: AppMessage) -> UpdateResult {
    let result = match message {
        AppMessage::PromptChanged(prompt) => {
            app.model.prompt = prompt;
            Ok(())
        }
        AppMessage::AddReference(path) => open_reference(app, path),
        AppMessage::Crop(event) => handle_crop(app, event),
        AppMessage::ClearReferences => {
            app.model.references.clear();
            app.model.set_status("References cleared");
            Ok(())
        }
        AppMessage::Generate => start_generation(app),
        AppMessage::Tick => {
            poll_generation(app);
            Ok(())
        }
        AppMessage::SaveAs(path) => save(app, path),
        AppMessage::ClearError => {
            app.model.clear_error();
            Ok(())
        }
    };

    match result {
        Ok(()) => UpdateResult::Handled,
        Err(e) => {
            log::warn!("{e}");
            app.model.set_error(e.to_string());
            UpdateResult::Rejected(e)
        }
    }
}

fn open_reference(app: &mut App, path: Option<PathBuf>) -> Result<()> {
    let path = path.ok_or_else(|| Error::user_input("No file chosen."))?;
    if app.model.crop_tool.is_some() {
        return Err(Error::user_input("Finish the current crop first."));
    }

    let path = app.config.resolve_image_path(&path);
    let source = DisplayableImage::open(&path)?;
    let tool = CropTool::open(source, app.config.target_size()?, app.config.preview_bound)?;
    app.model.crop_tool = Some(tool);
    app.model
        .set_status(format!("Select a region of {}", path.display()));
    Ok(())
}

fn handle_crop(app: &mut App, event: CropEvent) -> Result<()> {
    let tool = app
        .model
        .crop_tool
        .as_mut()
        .ok_or_else(|| Error::user_input("No crop in progress."))?;

    match tool.handle(event)? {
        None => {}
        Some(CropOutcome::Cropped(image)) => {
            app.model.crop_tool = None;
            app.model.references.push(image);
            let count = app.model.references.len();
            app.model
                .set_status(format!("Reference image added ({count} total)"));
        }
        Some(CropOutcome::Cancelled) => {
            app.model.crop_tool = None;
            app.model.set_status("No reference image added");
        }
    }
    Ok(())
}

fn start_generation(app: &mut App) -> Result<()> {
    if app.model.generating {
        return Err(Error::GenerationInFlight);
    }
    if app.model.crop_tool.is_some() {
        return Err(Error::user_input("Finish the current crop first."));
    }
    let prompt = app.model.prompt.trim();
    if prompt.is_empty() {
        return Err(Error::user_input("Please enter a prompt."));
    }

    let reference = app.model.active_reference().cloned();
    let request = GenerationRequest {
        prompt: prompt.to_string(),
        reference_strength: reference.as_ref().map(|_| app.config.reference_strength),
        reference,
        total_steps: app.config.total_steps,
        split_fraction: app.config.split_fraction,
        guidance_scale: app.config.guidance_scale,
        width: app.config.image_width,
        height: app.config.image_height,
    };

    let job = app.worker.spawn(request)?;
    app.job = Some(job);
    app.model.generating = true;
    app.model.progress = 0.0;
    app.model.progress_label = None;
    app.model.set_status("Generating image...");
    Ok(())
}

fn poll_generation(app: &mut App) {
    let Some(job) = app.job.as_mut() else {
        return;
    };

    for update in job.drain() {
        match update {
            WorkerUpdate::Progress(progress) => {
                app.model.progress = progress.percent;
                app.model.progress_label = progress.label();
            }
            WorkerUpdate::Finished(Ok(image)) => {
                app.model.generated = Some(image);
                app.model.progress = PROGRESS_MAX;
                app.model.progress_label = Some("Done");
                app.model.set_status("Image generated successfully!");
            }
            WorkerUpdate::Finished(Err(e)) => {
                app.model.progress = 0.0;
                app.model.progress_label = None;
                app.model.set_error(Error::from(e).to_string());
            }
        }
    }

    if job.is_finished() {
        app.job = None;
        app.model.generating = false;
    }
}

fn save(app: &mut App, path: Option<PathBuf>) -> Result<()> {
    let image = app
        .model
        .generated
        .as_ref()
        .ok_or_else(|| Error::user_input("No image to save."))?;
    let path = path.ok_or_else(|| Error::user_input("No file chosen."))?;

    let written = image.save_png(&path)?;
    app.model
        .set_status(format!("Image saved to: {}", written.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::generation::{ImageGenerator, PlaceholderGenerator};
    use crate::config::AppConfig;
    use crate::domain::progress::Stage;
    use crate::error::GenerationError;
    use image::{DynamicImage, RgbImage};
    use std::path::Path;
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::Duration;
    use tokio::runtime::Handle;

    /// Blocks in the base stage until the test releases it.
    struct GatedGenerator {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl ImageGenerator for GatedGenerator {
        fn name(&self) -> &str {
            "gated"
        }

        fn generate(
            &self,
            request: &GenerationRequest,
            progress: &mut dyn FnMut(Stage, u32),
        ) -> std::result::Result<DisplayableImage, GenerationError> {
            progress(Stage::Base, 1);
            let gate = self.gate.lock().map_err(|e| GenerationError::Backend(e.to_string()))?;
            gate.recv()
                .map_err(|e| GenerationError::Backend(e.to_string()))?;
            Ok(DynamicImage::ImageRgb8(RgbImage::new(request.width, request.height)).into())
        }
    }

    struct FailingGenerator;

    impl ImageGenerator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate(
            &self,
            _request: &GenerationRequest,
            progress: &mut dyn FnMut(Stage, u32),
        ) -> std::result::Result<DisplayableImage, GenerationError> {
            progress(Stage::Base, 1);
            progress(Stage::Base, 2);
            Err(GenerationError::Backend("device lost".into()))
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            total_steps: 4,
            image_width: 32,
            image_height: 16,
            tick_interval_ms: 5,
            ..AppConfig::default()
        }
    }

    fn app_with(generator: Arc<dyn ImageGenerator>) -> App {
        App::new(config(), generator, Handle::current())
    }

    async fn wait_idle(app: &mut App) {
        for _ in 0..1000 {
            app.update(AppMessage::Tick);
            if !app.model.generating {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("generation did not finish");
    }

    fn write_reference(dir: &Path) -> PathBuf {
        let path = dir.join("reference.png");
        DynamicImage::ImageRgb8(RgbImage::new(1200, 900))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_prompt_is_rejected_before_work() {
        let mut app = app_with(Arc::new(PlaceholderGenerator::default()));
        app.update(AppMessage::PromptChanged("   ".into()));

        let result = app.update(AppMessage::Generate);
        assert!(matches!(result, UpdateResult::Rejected(Error::UserInput(_))));
        assert!(!app.model.generating);
        assert!(app.model.status.is_error);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_is_single_flight() {
        let (release, gate) = mpsc::channel();
        let generator = GatedGenerator {
            gate: Mutex::new(gate),
        };
        let mut app = app_with(Arc::new(generator));
        app.update(AppMessage::PromptChanged("harbor".into()));

        assert!(!app.update(AppMessage::Generate).is_rejected());
        assert!(!app.model.can_generate());
        assert!(matches!(
            app.update(AppMessage::Generate),
            UpdateResult::Rejected(Error::GenerationInFlight)
        ));

        release.send(()).unwrap();
        wait_idle(&mut app).await;
        assert!(app.model.can_generate());
        assert_eq!(app.model.progress, 100.0);
        assert!(app.model.generated.is_some());

        // Enabled again after completion.
        assert!(!app.update(AppMessage::Generate).is_rejected());
        release.send(()).unwrap();
        wait_idle(&mut app).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_re_enables_generate() {
        let mut app = app_with(Arc::new(FailingGenerator));
        app.update(AppMessage::PromptChanged("storm".into()));
        app.update(AppMessage::Generate);
        wait_idle(&mut app).await;

        assert!(app.model.can_generate());
        assert!(app.model.status.is_error);
        assert!(app.model.status.message.contains("device lost"));
        assert!(app.model.generated.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_clears_partial_progress() {
        let mut app = app_with(Arc::new(FailingGenerator));
        app.update(AppMessage::PromptChanged("storm".into()));
        app.update(AppMessage::Generate);
        wait_idle(&mut app).await;

        assert_eq!(app.model.progress, 0.0);
        assert_eq!(app.model.progress_label, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_crop_leaves_references_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path());
        let mut app = app_with(Arc::new(PlaceholderGenerator::default()));

        assert!(!app.update(AppMessage::AddReference(Some(path))).is_rejected());
        assert!(app.model.crop_tool.is_some());
        assert!(!app.update(AppMessage::Crop(CropEvent::Cancel)).is_rejected());

        assert!(app.model.crop_tool.is_none());
        assert!(app.model.references.is_empty());
        assert!(!app.model.status.is_error);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn committed_crop_becomes_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path());
        let mut app = app_with(Arc::new(PlaceholderGenerator::default()));
        app.update(AppMessage::AddReference(Some(path)));

        // Rejected commit keeps the tool open.
        assert!(app.update(AppMessage::Crop(CropEvent::Commit)).is_rejected());
        assert!(app.model.crop_tool.is_some());

        for event in [
            CropEvent::DragStart { x: 10.0, y: 10.0 },
            CropEvent::DragMove { x: 300.0, y: 200.0 },
            CropEvent::DragEnd,
            CropEvent::Commit,
        ] {
            assert!(!app.update(AppMessage::Crop(event)).is_rejected());
        }

        assert!(app.model.crop_tool.is_none());
        assert_eq!(app.model.references.len(), 1);
        assert_eq!(app.model.references[0].dimensions(), (32, 16));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_inputs_are_user_errors() {
        let mut app = app_with(Arc::new(PlaceholderGenerator::default()));
        assert!(matches!(
            app.update(AppMessage::AddReference(None)),
            UpdateResult::Rejected(Error::UserInput(_))
        ));
        assert!(matches!(
            app.update(AppMessage::SaveAs(Some("out.png".into()))),
            UpdateResult::Rejected(Error::UserInput(_))
        ));
        assert!(matches!(
            app.update(AppMessage::Crop(CropEvent::DragEnd)),
            UpdateResult::Rejected(Error::UserInput(_))
        ));

        app.update(AppMessage::ClearError);
        assert!(!app.model.status.is_error);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_save_keeps_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(PlaceholderGenerator::default()));
        app.update(AppMessage::PromptChanged("meadow".into()));
        app.update(AppMessage::Generate);
        wait_idle(&mut app).await;

        let bad = dir.path().join("missing").join("out.png");
        assert!(app.update(AppMessage::SaveAs(Some(bad))).is_rejected());
        assert!(app.model.can_save());

        let good = dir.path().join("out");
        assert!(!app.update(AppMessage::SaveAs(Some(good))).is_rejected());
        assert!(dir.path().join("out.png").exists());
        assert!(app.model.status.message.starts_with("Image saved to:"));
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
// src/ui/app.rs
//
// COSMIC application wiring: maps window events onto the session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cosmic::app::Core;
use cosmic::iced::keyboard::{self, Key, Modifiers, key::Named};
use cosmic::iced::time;
use cosmic::iced::widget::image::{Handle as ImageHandle, Image};
use cosmic::iced::{Alignment, ContentFit, Length, Subscription};
use cosmic::iced_widget::{column, progress_bar, row, stack};
use cosmic::widget::{button, container, text, text_input};
use cosmic::{Action, Element, Task};
use tokio::runtime::Handle;

use super::display::{GuiDisplay, image_handle};
use super::widgets::crop_overlay;
use crate::app::crop::{CropEvent, CropTool};
use crate::app::generation::ImageGenerator;
use crate::app::{App, AppMessage};
use crate::config::AppConfig;
use crate::constant::{OUTPUT_EXT, PROGRESS_MAX};
use crate::domain::image::DisplayableImage;
use crate::error::GenerationError;

/// Flags passed from `main` into the application.
#[derive(Clone)]
pub struct Flags {
    pub config: AppConfig,
    pub generator: Arc<dyn ImageGenerator>,
    /// Runtime the generation worker and model loading run on.
    pub runtime: Handle,
}

#[derive(Debug, Clone)]
pub enum Message {
    Session(AppMessage),
    ReferencePathChanged(String),
    SavePathChanged(String),
    AddReference,
    Save,
    /// Enter/Escape; ignored outside crop mode.
    CropKey(CropEvent),
    ModelsLoaded(Result<(), GenerationError>),
}

/// Main application type.
pub struct PictorApp {
    core: Core,
    session: App,
    display: GuiDisplay,
    preview: Option<(DisplayableImage, ImageHandle)>,
    reference_path: String,
    save_path: String,
    models_ready: bool,
}

impl cosmic::Application for PictorApp {
    type Executor = cosmic::SingleThreadExecutor;
    type Flags = Flags;
    type Message = Message;

    const APP_ID: &'static str = "io.github.pictor.Pictor";

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, Task<Action<Self::Message>>) {
        let Flags {
            config,
            generator,
            runtime,
        } = flags;

        // Start the reference field in the configured directory if it exists.
        let reference_path = config
            .default_image_dir
            .as_ref()
            .filter(|p| p.is_dir())
            .map(|p| p.join("").display().to_string())
            .unwrap_or_default();

        let load = load_models(Arc::clone(&generator), &runtime);
        let mut session = App::new(config, generator, runtime);
        session.model.set_status("Loading models...");

        let mut app = Self {
            core,
            session,
            display: GuiDisplay::default(),
            preview: None,
            reference_path,
            save_path: format!("output.{OUTPUT_EXT}"),
            models_ready: false,
        };
        app.refresh();

        (app, load)
    }

    fn update(&mut self, message: Self::Message) -> Task<Action<Self::Message>> {
        match message {
            Message::Session(msg) => {
                self.session.update(msg);
            }
            Message::ReferencePathChanged(path) => self.reference_path = path,
            Message::SavePathChanged(path) => self.save_path = path,
            Message::AddReference => {
                let path = non_empty_path(&self.reference_path);
                self.session.update(AppMessage::AddReference(path));
            }
            Message::Save => {
                let path = non_empty_path(&self.save_path);
                self.session.update(AppMessage::SaveAs(path));
            }
            Message::CropKey(event) => {
                if self.session.model.crop_tool.is_some() {
                    self.session.update(AppMessage::Crop(event));
                }
            }
            Message::ModelsLoaded(Ok(())) => {
                self.models_ready = true;
                self.session.model.set_status("Models loaded successfully!");
            }
            Message::ModelsLoaded(Err(e)) => {
                log::error!("{e}");
                self.session.model.set_error(e.to_string());
            }
        }

        self.refresh();
        Task::none()
    }

    fn view(&self) -> Element<'_, Self::Message> {
        let body = match &self.session.model.crop_tool {
            Some(tool) => self.crop_view(tool),
            None => self.main_view(),
        };

        container(body)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(16)
            .into()
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        let tick = if self.session.model.generating {
            time::every(Duration::from_millis(self.session.config.tick_interval_ms))
                .map(|_| Message::Session(AppMessage::Tick))
        } else {
            Subscription::none()
        };

        Subscription::batch([keyboard::on_key_press(handle_key_press), tick])
    }
}

impl PictorApp {
    /// Render the session into the display state and keep the crop preview
    /// handle in step with the open tool.
    fn refresh(&mut self) {
        self.display.begin_frame();
        self.session.render(&mut self.display);

        self.preview = match (&self.session.model.crop_tool, self.preview.take()) {
            (Some(tool), Some((image, handle))) if image.shares_pixels(tool.preview()) => {
                Some((image, handle))
            }
            (Some(tool), _) => {
                let image = tool.preview().clone();
                let handle = image_handle(&image);
                Some((image, handle))
            }
            (None, _) => None,
        };
    }

    fn crop_view<'a>(&'a self, tool: &'a CropTool) -> Element<'a, Message> {
        let (w, h) = tool.transform().display_size();
        let canvas: Element<'a, Message> = match &self.preview {
            Some((_, handle)) => {
                let image = Image::new(handle.clone())
                    .width(Length::Fixed(w as f32))
                    .height(Length::Fixed(h as f32))
                    .content_fit(ContentFit::Fill);
                stack![image, crop_overlay((w, h), tool.overlay(), tool.is_dragging())].into()
            }
            None => text("Preparing preview...").into(),
        };

        let hint = match self.session.config.target_size() {
            Ok(t) => format!("Drag a region; it is resized to {}x{}", t.width(), t.height()),
            Err(_) => "Drag a region to use as reference".to_string(),
        };

        let actions = row![
            button::standard("Cancel").on_press(Message::Session(AppMessage::Crop(CropEvent::Cancel))),
            button::suggested("Use crop").on_press_maybe(
                tool.commit_enabled()
                    .then_some(Message::Session(AppMessage::Crop(CropEvent::Commit)))
            ),
        ]
        .spacing(8);

        column![text(hint), canvas, actions, self.status_line()]
            .spacing(12)
            .align_x(Alignment::Center)
            .into()
    }

    fn main_view(&self) -> Element<'_, Message> {
        let model = &self.session.model;

        let prompt = text_input("Describe the image", &model.prompt)
            .on_input(|s| Message::Session(AppMessage::PromptChanged(s)));

        let reference = row![
            text_input("Reference image (PNG or JPEG)", &self.reference_path)
                .on_input(Message::ReferencePathChanged),
            button::standard("Add").on_press_maybe(model.can_generate().then_some(Message::AddReference)),
            button::standard("Clear").on_press_maybe(
                (!model.references.is_empty() && !model.generating)
                    .then_some(Message::Session(AppMessage::ClearReferences))
            ),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let references = match model.references.len() {
            0 => "No reference image".to_string(),
            1 => "1 reference image".to_string(),
            n => format!("{n} reference images (the last one is used)"),
        };

        let generate = button::suggested("Generate").on_press_maybe(
            (self.models_ready && model.can_generate())
                .then_some(Message::Session(AppMessage::Generate)),
        );

        let (percent, label) = self
            .display
            .progress
            .as_ref()
            .map(|(p, l)| (*p, l.clone().unwrap_or_default()))
            .unwrap_or_default();
        let progress = row![
            progress_bar(0.0..=PROGRESS_MAX, percent),
            text(format!("{:>3.0}% {label}", percent)),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let result: Element<'_, Message> = match &self.display.image {
            Some(shown) => Image::new(shown.handle.clone())
                .width(Length::Fixed(shown.size.0 as f32))
                .height(Length::Fixed(shown.size.1 as f32))
                .content_fit(ContentFit::Contain)
                .into(),
            None => text("No image yet").into(),
        };

        let save = row![
            text_input("Output file", &self.save_path)
                .on_input(Message::SavePathChanged),
            button::standard("Save").on_press_maybe(model.can_save().then_some(Message::Save)),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        column![
            prompt,
            reference,
            text(references),
            generate,
            progress,
            container(result).center_x(Length::Fill),
            save,
            self.status_line(),
        ]
        .spacing(12)
        .into()
    }

    fn status_line(&self) -> Element<'_, Message> {
        match &self.display.status {
            Some((message, true)) => text(format!("Error: {message}")).into(),
            Some((message, false)) => text(message.clone()).into(),
            None => text("").into(),
        }
    }
}

/// Run `prepare` on a blocking thread and report back as a message.
fn load_models(generator: Arc<dyn ImageGenerator>, runtime: &Handle) -> Task<Action<Message>> {
    log::info!("Loading models...");
    let job = runtime.spawn_blocking(move || generator.prepare());
    Task::perform(
        async move { job.await.unwrap_or(Err(GenerationError::WorkerLost)) },
        |result| Action::App(Message::ModelsLoaded(result)),
    )
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Map raw key presses into crop actions.
fn handle_key_press(key: Key, modifiers: Modifiers) -> Option<Message> {
    if modifiers.command() || modifiers.alt() || modifiers.logo() || modifiers.control() {
        return None;
    }

    match key.as_ref() {
        Key::Named(Named::Enter) => Some(Message::CropKey(CropEvent::Commit)),
        Key::Named(Named::Escape) => Some(Message::CropKey(CropEvent::Cancel)),
        _ => None,
    }
}

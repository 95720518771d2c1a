// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/display.rs
//
// Display sink boundary and a terminal implementation.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::constant::PROGRESS_MAX;
use crate::domain::image::DisplayableImage;

/// Where the session state is rendered. Only called from the display context.
pub trait DisplaySink {
    /// Show `image` scaled to `size` (width, height).
    fn show_image(&mut self, image: &DisplayableImage, size: (u32, u32));

    /// Progress bar value in 0..=100 with an optional label.
    fn show_progress(&mut self, percent: f32, label: Option<&str>);

    fn show_status(&mut self, message: &str, is_error: bool);
}

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

/// Renders to the terminal: an `indicatif` bar on stderr, status messages
/// through the logger.
#[derive(Default)]
pub struct TerminalDisplay {
    bar: Option<ProgressBar>,
    last_progress: Option<(f32, Option<String>)>,
    last_status: Option<String>,
    last_image: Option<DisplayableImage>,
    images_shown: usize,
    hidden: bool,
}

impl TerminalDisplay {
    /// A display whose bar draws nowhere.
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::default()
        }
    }

    /// Finish the progress bar so later output starts on a fresh line.
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }

    fn bar(&mut self) -> &ProgressBar {
        let hidden = self.hidden;
        self.bar.get_or_insert_with(|| {
            let target = if hidden {
                ProgressDrawTarget::hidden()
            } else {
                ProgressDrawTarget::stderr()
            };
            let bar = ProgressBar::with_draw_target(Some(PROGRESS_MAX as u64), target);
            match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                Ok(style) => bar.set_style(style.progress_chars("#>-")),
                Err(e) => log::debug!("Progress template rejected: {e}"),
            }
            bar
        })
    }

    /// Log above the bar when one is drawn.
    fn log_status(&self, message: &str, is_error: bool) {
        let emit = || {
            if is_error {
                log::error!("{message}");
            } else {
                log::info!("{message}");
            }
        };
        match &self.bar {
            Some(bar) => bar.suspend(emit),
            None => emit(),
        }
    }
}

impl DisplaySink for TerminalDisplay {
    fn show_image(&mut self, image: &DisplayableImage, size: (u32, u32)) {
        if self
            .last_image
            .as_ref()
            .is_some_and(|last| last.shares_pixels(image))
        {
            return;
        }
        self.last_image = Some(image.clone());
        self.images_shown += 1;

        let (w, h) = image.dimensions();
        self.log_status(
            &format!("Result: {w}x{h} image (shown at {}x{})", size.0, size.1),
            false,
        );
    }

    fn show_progress(&mut self, percent: f32, label: Option<&str>) {
        let current = (percent, label.map(str::to_string));
        if self.last_progress.as_ref() == Some(&current) {
            return;
        }
        self.last_progress = Some(current);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let position = percent.clamp(0.0, PROGRESS_MAX).floor() as u64;
        let bar = self.bar();
        bar.set_position(position);
        bar.set_message(label.unwrap_or_default().to_string());
    }

    fn show_status(&mut self, message: &str, is_error: bool) {
        if self.last_status.as_deref() == Some(message) {
            return;
        }
        self.last_status = Some(message.to_string());
        self.log_status(message, is_error);
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
// src/ui/display.rs
//
// Display sink that keeps what the window should draw.

use cosmic::iced::widget::image::Handle as ImageHandle;

use crate::app::display::DisplaySink;
use crate::domain::image::DisplayableImage;

/// Convert an image to an iced handle (RGBA8 upload).
pub fn image_handle(image: &DisplayableImage) -> ImageHandle {
    let rgba = image.as_dynamic().to_rgba8();
    let (w, h) = rgba.dimensions();
    ImageHandle::from_rgba(w, h, rgba.into_raw())
}

/// A generated image converted once for drawing.
pub struct ShownImage {
    source: DisplayableImage,
    pub handle: ImageHandle,
    pub size: (u32, u32),
}

/// Window-side state filled by `App::render` and read by the view.
#[derive(Default)]
pub struct GuiDisplay {
    pub image: Option<ShownImage>,
    pub progress: Option<(f32, Option<String>)>,
    pub status: Option<(String, bool)>,
}

impl GuiDisplay {
    /// Forget the per-frame values before a render. The image handle is kept
    /// while the same image keeps being shown.
    pub fn begin_frame(&mut self) {
        self.progress = None;
        self.status = None;
    }
}

impl DisplaySink for GuiDisplay {
    fn show_image(&mut self, image: &DisplayableImage, size: (u32, u32)) {
        match &mut self.image {
            Some(shown) if shown.source.shares_pixels(image) => shown.size = size,
            _ => {
                self.image = Some(ShownImage {
                    source: image.clone(),
                    handle: image_handle(image),
                    size,
                });
            }
        }
    }

    fn show_progress(&mut self, percent: f32, label: Option<&str>) {
        self.progress = Some((percent, label.map(str::to_string)));
    }

    fn show_status(&mut self, message: &str, is_error: bool) {
        self.status = Some((message.to_string(), is_error));
    }
}

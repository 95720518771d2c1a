// SPDX-License-Identifier: GPL-3.0-or-later
// src/ui/mod.rs
//
// Desktop front end on libcosmic.

mod app;
pub mod display;
pub mod widgets;

use cosmic::iced::Size;

pub use app::{Flags, Message, PictorApp};
pub use display::GuiDisplay;

use crate::constant::{WINDOW_HEIGHT, WINDOW_WIDTH};

/// Open the main window and run until it is closed.
pub fn run(flags: Flags) -> cosmic::iced::Result {
    let settings =
        cosmic::app::Settings::default().size(Size::new(WINDOW_WIDTH, WINDOW_HEIGHT));
    cosmic::app::run::<PictorApp>(settings, flags)
}

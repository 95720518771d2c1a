// SPDX-License-Identifier: GPL-3.0-or-later
// src/constant.rs
//
// Application constants that should not be changed by the user.

/// Hub id of the default base model.
pub const BASE_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";

/// Hub id of the default refiner model.
pub const REFINER_MODEL: &str = "stabilityai/stable-diffusion-xl-refiner-1.0";

/// Largest edge of the crop preview, in display units.
pub const PREVIEW_BOUND: f32 = 600.0;

/// Edge of the box the generated image is shown in.
pub const DISPLAY_SIZE: u32 = 300;

/// Upper end of the progress scale.
pub const PROGRESS_MAX: f32 = 100.0;

/// Tolerance for aspect ratio comparisons (float precision in drag rectangles).
pub const ASPECT_EPSILON: f32 = 0.0001;

/// Default number of queued progress updates between worker and display.
pub const PROGRESS_QUEUE_CAPACITY: usize = 64;

/// Default display tick in milliseconds (drains worker updates).
pub const TICK_INTERVAL_MS: u64 = 50;

/// Configuration directory name.
pub const CONFIG_DIR: &str = "pictor";

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";

/// Extension appended to save paths that carry none.
pub const OUTPUT_EXT: &str = "png";

/// Initial main window size.
pub const WINDOW_WIDTH: f32 = 720.0;
pub const WINDOW_HEIGHT: f32 = 860.0;

// SPDX-License-Identifier: GPL-3.0-or-later
// src/config.rs
//
// Global configuration for the application, persisted as TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constant::{
    BASE_MODEL, CONFIG_DIR, CONFIG_FILE, DISPLAY_SIZE, PREVIEW_BOUND, PROGRESS_QUEUE_CAPACITY,
    REFINER_MODEL, TICK_INTERVAL_MS,
};
use crate::domain::crop::TargetSize;
use crate::domain::progress::ProgressConfig;
use crate::error::{Error, Result};

/// Global configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Optional default directory to pick reference images from.
    pub default_image_dir: Option<PathBuf>,
    /// Hub id of the base model.
    pub base_model: String,
    /// Hub id of the refiner model.
    pub refiner_model: String,
    /// Inference steps per stage.
    pub total_steps: u32,
    /// Share of denoising done by the base stage (high-noise fraction).
    pub split_fraction: f32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// How far generation may drift from a reference image (0 = keep, 1 = ignore).
    pub reference_strength: f32,
    /// Generated image width; also the reference crop width.
    pub image_width: u32,
    /// Generated image height; also the reference crop height.
    pub image_height: u32,
    /// Largest preview edge in the crop tool.
    pub preview_bound: f32,
    /// Box the generated image is shown in.
    pub display_size: u32,
    /// Progress updates buffered between worker and display.
    pub progress_queue_capacity: usize,
    /// Display tick in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_image_dir: dirs::picture_dir().or_else(dirs::home_dir),
            base_model: BASE_MODEL.into(),
            refiner_model: REFINER_MODEL.into(),
            total_steps: 40,
            split_fraction: 0.8,
            guidance_scale: 7.5,
            reference_strength: 0.9,
            image_width: 768,
            image_height: 512,
            preview_bound: PREVIEW_BOUND,
            display_size: DISPLAY_SIZE,
            progress_queue_capacity: PROGRESS_QUEUE_CAPACITY,
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

impl AppConfig {
    /// `<config dir>/pictor/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => {
                    log::debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.progress_config()?;
        self.target_size()?;
        if !(0.0..=1.0).contains(&self.reference_strength) {
            return Err(Error::InvalidConfig(format!(
                "reference strength must be in [0, 1], got {}",
                self.reference_strength
            )));
        }
        if !self.preview_bound.is_finite() || self.preview_bound < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "preview bound must be at least 1, got {}",
                self.preview_bound
            )));
        }
        if self.display_size == 0 {
            return Err(Error::InvalidConfig("display size must be positive".into()));
        }
        if self.progress_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "progress queue capacity must be positive".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::InvalidConfig("tick interval must be positive".into()));
        }
        Ok(())
    }

    pub fn progress_config(&self) -> Result<ProgressConfig> {
        ProgressConfig::new(self.total_steps, self.split_fraction)
    }

    /// Resolve a reference image path chosen by the user.
    ///
    /// A relative path that does not exist from the working directory is
    /// looked up in `default_image_dir`.
    pub fn resolve_image_path(&self, path: &Path) -> PathBuf {
        if path.is_relative()
            && !path.exists()
            && let Some(dir) = &self.default_image_dir
        {
            let candidate = dir.join(path);
            if candidate.exists() {
                log::debug!("Resolved {} to {}", path.display(), candidate.display());
                return candidate;
            }
        }
        path.to_path_buf()
    }

    /// Size of generated images and of cropped references.
    pub fn target_size(&self) -> Result<TargetSize> {
        TargetSize::new(self.image_width, self.image_height)
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/image.rs
//
// Immutable raster image shared between the crop tool, the generator and the display.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::constant::OUTPUT_EXT;
use crate::error::{Error, Result};

/// A decoded raster image with known pixel dimensions.
///
/// Cloning shares the pixel buffer. Every transformation returns a new image;
/// the pixels behind an existing value never change.
#[derive(Clone)]
pub struct DisplayableImage {
    image: Arc<DynamicImage>,
}

impl fmt::Debug for DisplayableImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "DisplayableImage({w}x{h})")
    }
}

impl From<DynamicImage> for DisplayableImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl DisplayableImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Load an image from disk (PNG or JPEG).
    pub fn open(path: &Path) -> Result<Self> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let image = reader.decode().map_err(|e| Error::image(path, e))?;
        log::debug!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image))
    }

    /// Returns the native pixel dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Whether both values share one pixel buffer (the same decoded image).
    pub fn shares_pixels(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }

    /// Copy of this image resized to exactly `width` x `height`.
    pub fn resized_exact(&self, width: u32, height: u32, filter: FilterType) -> Self {
        Self::new(self.image.resize_exact(width, height, filter))
    }

    /// Copy of the `x, y, width, height` sub-region.
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::new(self.image.crop_imm(x, y, width, height))
    }

    /// Save as PNG. Any other extension (or none) is replaced by `.png`, so
    /// the file name always matches its contents.
    ///
    /// Returns the path actually written.
    pub fn save_png(&self, path: &Path) -> Result<PathBuf> {
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXT));
        let path = if is_png {
            path.to_path_buf()
        } else {
            path.with_extension(OUTPUT_EXT)
        };

        self.image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| Error::image(&path, e))?;
        log::info!("Saved {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checker(width: u32, height: u32) -> DisplayableImage {
        let buf = RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(buf).into()
    }

    #[test]
    fn clones_share_pixels() {
        let a = checker(8, 4);
        let b = a.clone();
        assert!(a.shares_pixels(&b));
        assert!(!a.shares_pixels(&checker(8, 4)));
    }

    #[test]
    fn crop_and_resize_leave_source_untouched() {
        let source = checker(40, 20);
        let cropped = source.cropped(5, 5, 10, 10);
        let resized = cropped.resized_exact(30, 7, FilterType::Lanczos3);

        assert_eq!(source.dimensions(), (40, 20));
        assert_eq!(cropped.dimensions(), (10, 10));
        assert_eq!(resized.dimensions(), (30, 7));
    }

    #[test]
    fn save_appends_png_extension() {
        let dir = tempfile::tempdir().unwrap();
        let written = checker(4, 4).save_png(&dir.path().join("result")).unwrap();

        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("png"));
        let reloaded = DisplayableImage::open(&written).unwrap();
        assert_eq!(reloaded.dimensions(), (4, 4));
    }

    #[test]
    fn save_replaces_foreign_extension() {
        let dir = tempfile::tempdir().unwrap();
        let written = checker(4, 4).save_png(&dir.path().join("out.jpg")).unwrap();

        assert_eq!(written, dir.path().join("out.png"));
        assert!(!dir.path().join("out.jpg").exists());
        let bytes = std::fs::read(&written).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn save_keeps_png_extension_in_any_case() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Result.PNG");
        assert_eq!(checker(4, 4).save_png(&target).unwrap(), target);
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DisplayableImage::open(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no-such-dir").join("out.png");
        assert!(checker(2, 2).save_png(&target).is_err());
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/crop/tool.rs
//
// Modal crop tool: preview, aspect-locked drag, commit or cancel.

use std::str::FromStr;

use image::imageops::FilterType;

use super::selection::CropSelection;
use crate::domain::crop::{self, Rect, ScaleTransform, TargetSize};
use crate::domain::image::DisplayableImage;
use crate::error::{Error, Result};

/// Pointer and window events delivered to an open crop tool.
/// Coordinates are in preview (display) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropEvent {
    DragStart { x: f32, y: f32 },
    DragMove { x: f32, y: f32 },
    DragEnd,
    Commit,
    Cancel,
}

/// How a crop session ended.
#[derive(Debug, Clone)]
pub enum CropOutcome {
    Cropped(DisplayableImage),
    Cancelled,
}

/// One crop session over a source image.
///
/// The source is shown through a preview scaled by [`ScaleTransform`]; the
/// selection is tracked in preview space and only mapped back to source
/// pixels on commit.
#[derive(Debug)]
pub struct CropTool {
    source: DisplayableImage,
    preview: DisplayableImage,
    target: TargetSize,
    transform: ScaleTransform,
    selection: CropSelection,
    commit_enabled: bool,
}

impl CropTool {
    pub fn open(source: DisplayableImage, target: TargetSize, preview_bound: f32) -> Result<Self> {
        let (width, height) = source.dimensions();
        let transform = ScaleTransform::fit(width, height, preview_bound)?;
        let (display_w, display_h) = transform.display_size();
        let preview = if transform.scale() < 1.0 {
            source.resized_exact(display_w, display_h, FilterType::Triangle)
        } else {
            source.clone()
        };

        log::info!(
            "Crop tool: {width}x{height} source, {display_w}x{display_h} preview, target {target}"
        );

        Ok(Self {
            source,
            preview,
            target,
            transform,
            selection: CropSelection::default(),
            commit_enabled: false,
        })
    }

    pub fn source(&self) -> &DisplayableImage {
        &self.source
    }

    pub fn preview(&self) -> &DisplayableImage {
        &self.preview
    }

    pub fn transform(&self) -> &ScaleTransform {
        &self.transform
    }

    pub fn commit_enabled(&self) -> bool {
        self.commit_enabled
    }

    /// Whether a drag is in progress (pointer held down).
    pub fn is_dragging(&self) -> bool {
        self.selection.is_dragging
    }

    /// Selection rectangle to draw over the preview, if any.
    pub fn overlay(&self) -> Option<Rect> {
        self.selection.overlay_rect()
    }

    /// Apply one event. Returns the outcome once the session is over.
    ///
    /// A commit without a usable region is rejected with
    /// [`Error::InvalidRegion`] and the tool stays open.
    pub fn handle(&mut self, event: CropEvent) -> Result<Option<CropOutcome>> {
        match event {
            CropEvent::DragStart { x, y } => {
                let (x, y) = self.transform.clamp_display_point(x, y);
                self.selection.start_new_selection(x, y);
                self.commit_enabled = false;
            }
            CropEvent::DragMove { x, y } => {
                let (x, y) = self.transform.clamp_display_point(x, y);
                self.selection
                    .update_drag(x, y, self.target.aspect_ratio());
            }
            CropEvent::DragEnd => {
                if self.selection.is_dragging {
                    self.selection.end_drag();
                    self.commit_enabled = self.selection.has_selection();
                }
            }
            CropEvent::Commit => {
                let cropped = self.commit()?;
                return Ok(Some(CropOutcome::Cropped(cropped)));
            }
            CropEvent::Cancel => {
                log::info!("Crop cancelled");
                self.selection.reset();
                return Ok(Some(CropOutcome::Cancelled));
            }
        }
        Ok(None)
    }

    fn commit(&mut self) -> Result<DisplayableImage> {
        if !self.commit_enabled {
            return Err(Error::InvalidRegion("drag out a region first".into()));
        }
        let region = self
            .selection
            .region
            .ok_or_else(|| Error::InvalidRegion("no selection".into()))?;

        let rect = region
            .to_source_pixels(&self.transform, self.target.aspect_ratio())
            .ok_or_else(|| {
                Error::InvalidRegion(format!(
                    "{:?} lies outside the image",
                    region.normalized()
                ))
            })?;

        let cropped = crop::crop_to_target(&self.source, rect, self.target)?;
        self.selection.reset();
        self.commit_enabled = false;
        Ok(cropped)
    }

    /// Drive a whole session from a sequence of events.
    ///
    /// Rejected commits are logged and the session continues. Running out of
    /// events without a commit is the same as closing the window.
    pub fn run<I: IntoIterator<Item = CropEvent>>(mut self, events: I) -> CropOutcome {
        for event in events {
            match self.handle(event) {
                Ok(Some(outcome)) => return outcome,
                Ok(None) => {}
                Err(e) => log::warn!("{e}"),
            }
        }
        CropOutcome::Cancelled
    }
}

/// A full drag from `(x0, y0)` to `(x1, y1)` followed by a commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl DragGesture {
    pub fn events(&self) -> [CropEvent; 4] {
        [
            CropEvent::DragStart {
                x: self.x0,
                y: self.y0,
            },
            CropEvent::DragMove {
                x: self.x1,
                y: self.y1,
            },
            CropEvent::DragEnd,
            CropEvent::Commit,
        ]
    }
}

/// Parses `X0,Y0,X1,Y1`.
impl FromStr for DragGesture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::user_input(format!("invalid region '{s}': {e}")))?;

        match values.as_slice() {
            &[x0, y0, x1, y1] => Ok(Self { x0, y0, x1, y1 }),
            _ => Err(Error::user_input(format!(
                "expected X0,Y0,X1,Y1, got '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DisplayableImage {
        let buf = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        DynamicImage::ImageRgb8(buf).into()
    }

    fn tool(width: u32, height: u32, target: (u32, u32)) -> CropTool {
        let target = TargetSize::new(target.0, target.1).unwrap();
        CropTool::open(gradient(width, height), target, 600.0).unwrap()
    }

    #[test]
    fn preview_is_scaled_copy() {
        let t = tool(1200, 900, (768, 512));
        assert_eq!(t.preview().dimensions(), (600, 450));
        assert_eq!(t.source().dimensions(), (1200, 900));
    }

    #[test]
    fn commit_requires_released_region() {
        let mut t = tool(800, 600, (64, 64));
        assert!(matches!(t.handle(CropEvent::Commit), Err(Error::InvalidRegion(_))));

        t.handle(CropEvent::DragStart { x: 10.0, y: 10.0 }).unwrap();
        t.handle(CropEvent::DragMove { x: 200.0, y: 200.0 }).unwrap();
        assert!(t.is_dragging());
        assert!(!t.commit_enabled());
        assert!(matches!(t.handle(CropEvent::Commit), Err(Error::InvalidRegion(_))));

        t.handle(CropEvent::DragEnd).unwrap();
        assert!(!t.is_dragging());
        assert!(t.commit_enabled());
    }

    #[test]
    fn zero_area_release_keeps_commit_disabled() {
        let mut t = tool(800, 600, (64, 64));
        t.handle(CropEvent::DragStart { x: 10.0, y: 10.0 }).unwrap();
        t.handle(CropEvent::DragMove { x: 10.0, y: 90.0 }).unwrap();
        t.handle(CropEvent::DragEnd).unwrap();
        assert!(!t.commit_enabled());
        assert!(t.handle(CropEvent::Commit).is_err());

        // The tool is still usable after the rejected commit.
        t.handle(CropEvent::DragStart { x: 10.0, y: 10.0 }).unwrap();
        t.handle(CropEvent::DragMove { x: 60.0, y: 90.0 }).unwrap();
        t.handle(CropEvent::DragEnd).unwrap();
        let outcome = t.handle(CropEvent::Commit).unwrap();
        assert!(matches!(outcome, Some(CropOutcome::Cropped(_))));
    }

    #[test]
    fn overlay_keeps_target_aspect_while_dragging() {
        let mut t = tool(1000, 1000, (768, 512));
        t.handle(CropEvent::DragStart { x: 100.0, y: 100.0 }).unwrap();
        for x in [101.0, 150.0, 333.3, 42.0, 599.0] {
            t.handle(CropEvent::DragMove { x, y: 500.0 }).unwrap();
            let rect = t.overlay().unwrap();
            if rect.height > 0.0 {
                assert!((rect.width / rect.height - 1.5).abs() < 1e-4, "{rect:?}");
            }
        }
    }

    #[test]
    fn commit_produces_target_size() {
        let mut t = tool(2000, 1000, (768, 512));
        let gesture: DragGesture = "20,20,380,260".parse().unwrap();
        for event in &gesture.events()[..3] {
            t.handle(*event).unwrap();
        }
        match t.handle(CropEvent::Commit).unwrap() {
            Some(CropOutcome::Cropped(img)) => assert_eq!(img.dimensions(), (768, 512)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn out_of_bounds_drag_is_clamped() {
        let t = tool(300, 200, (100, 100));
        let gesture = DragGesture {
            x0: 250.0,
            y0: 150.0,
            x1: 5000.0,
            y1: 5000.0,
        };
        match t.run(gesture.events()) {
            CropOutcome::Cropped(img) => assert_eq!(img.dimensions(), (100, 100)),
            CropOutcome::Cancelled => panic!("expected a crop"),
        }
    }

    #[test]
    fn running_out_of_events_cancels() {
        let t = tool(300, 200, (100, 100));
        let outcome = t.run([
            CropEvent::DragStart { x: 1.0, y: 1.0 },
            CropEvent::DragMove { x: 50.0, y: 50.0 },
        ]);
        assert!(matches!(outcome, CropOutcome::Cancelled));
    }

    #[test]
    fn explicit_cancel() {
        let mut t = tool(300, 200, (100, 100));
        assert!(matches!(
            t.handle(CropEvent::Cancel).unwrap(),
            Some(CropOutcome::Cancelled)
        ));
    }

    #[test]
    fn gesture_parsing() {
        let g: DragGesture = " 1, 2.5,3 ,4".parse().unwrap();
        assert_eq!(
            g,
            DragGesture {
                x0: 1.0,
                y0: 2.5,
                x1: 3.0,
                y1: 4.0
            }
        );
        assert!("1,2,3".parse::<DragGesture>().is_err());
        assert!("a,b,c,d".parse::<DragGesture>().is_err());
    }
}

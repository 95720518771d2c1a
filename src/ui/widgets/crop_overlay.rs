// SPDX-License-Identifier: GPL-3.0-or-later
// src/ui/widgets/crop_overlay.rs
//
// Selection overlay drawn on top of the crop preview.

use cosmic::{
    Element, Renderer,
    iced::{
        Color, Length, Point, Rectangle, Size,
        advanced::{
            Clipboard, Layout, Shell, Widget,
            layout::{Limits, Node},
            renderer::{Quad, Renderer as QuadRenderer},
            widget::Tree,
        },
        event::{Event, Status},
        mouse::{self, Button, Cursor},
    },
};

use crate::app::AppMessage;
use crate::app::crop::CropEvent;
use crate::domain::crop::Rect;
use crate::ui::Message;

const MARKER_SIZE: f32 = 10.0;
const OVERLAY_COLOR: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.5);
const MARKER_COLOR: Color = Color::WHITE;
const BORDER_COLOR: Color = Color::WHITE;
const BORDER_WIDTH: f32 = 2.0;
const GRID_COLOR: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.4);
const GRID_WIDTH: f32 = 1.0;

/// Covers the preview at its displayed size. Pointer positions are published
/// as crop events in preview coordinates; the crop tool owns the geometry.
pub struct CropOverlay {
    width: f32,
    height: f32,
    selection: Option<Rect>,
    dragging: bool,
}

impl CropOverlay {
    pub fn new(size: (u32, u32), selection: Option<Rect>, dragging: bool) -> Self {
        Self {
            width: size.0 as f32,
            height: size.1 as f32,
            selection,
            dragging,
        }
    }

    fn draw_border(&self, renderer: &mut Renderer, sel: Rectangle) {
        let edges = [
            Rectangle::new(sel.position(), Size::new(sel.width, BORDER_WIDTH)),
            Rectangle::new(
                Point::new(sel.x, sel.y + sel.height - BORDER_WIDTH),
                Size::new(sel.width, BORDER_WIDTH),
            ),
            Rectangle::new(sel.position(), Size::new(BORDER_WIDTH, sel.height)),
            Rectangle::new(
                Point::new(sel.x + sel.width - BORDER_WIDTH, sel.y),
                Size::new(BORDER_WIDTH, sel.height),
            ),
        ];
        for edge in edges {
            draw_quad(renderer, edge, BORDER_COLOR);
        }

        let half = MARKER_SIZE / 2.0;
        let corners = [
            Point::new(sel.x, sel.y),
            Point::new(sel.x + sel.width, sel.y),
            Point::new(sel.x, sel.y + sel.height),
            Point::new(sel.x + sel.width, sel.y + sel.height),
        ];
        for corner in corners {
            draw_quad(
                renderer,
                Rectangle::new(
                    Point::new(corner.x - half, corner.y - half),
                    Size::new(MARKER_SIZE, MARKER_SIZE),
                ),
                MARKER_COLOR,
            );
        }
    }

    fn draw_grid(&self, renderer: &mut Renderer, sel: Rectangle) {
        if sel.width <= 10.0 || sel.height <= 10.0 {
            return;
        }
        for i in 1..3 {
            let x = sel.x + sel.width * i as f32 / 3.0;
            let y = sel.y + sel.height * i as f32 / 3.0;
            draw_quad(
                renderer,
                Rectangle::new(Point::new(x, sel.y), Size::new(GRID_WIDTH, sel.height)),
                GRID_COLOR,
            );
            draw_quad(
                renderer,
                Rectangle::new(Point::new(sel.x, y), Size::new(sel.width, GRID_WIDTH)),
                GRID_COLOR,
            );
        }
    }
}

impl Widget<Message, cosmic::Theme, Renderer> for CropOverlay {
    fn size(&self) -> Size<Length> {
        Size::new(Length::Fixed(self.width), Length::Fixed(self.height))
    }

    fn layout(&self, _tree: &mut Tree, _renderer: &Renderer, _limits: &Limits) -> Node {
        Node::new(Size::new(self.width, self.height))
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut Renderer,
        _theme: &cosmic::Theme,
        _style: &cosmic::iced::advanced::renderer::Style,
        layout: Layout<'_>,
        _cursor: Cursor,
        _viewport: &Rectangle,
    ) {
        let bounds = layout.bounds();
        let selection = self
            .selection
            .filter(|rect| !rect.is_empty())
            .map(|rect| to_screen(bounds, rect));

        for shade in shaded_areas(bounds, selection) {
            draw_quad(renderer, shade, OVERLAY_COLOR);
        }
        if let Some(sel) = selection {
            self.draw_border(renderer, sel);
            self.draw_grid(renderer, sel);
        }
    }

    fn on_event(
        &mut self,
        _tree: &mut Tree,
        event: Event,
        layout: Layout<'_>,
        cursor: Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> Status {
        let bounds = layout.bounds();

        match event {
            Event::Mouse(mouse::Event::ButtonPressed(Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    shell.publish(crop(CropEvent::DragStart { x: pos.x, y: pos.y }));
                    return Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                // Keep following outside the preview; the tool clamps.
                if self.dragging {
                    let (x, y) = to_local(bounds, position);
                    shell.publish(crop(CropEvent::DragMove { x, y }));
                    return Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(Button::Left)) => {
                if self.dragging {
                    shell.publish(crop(CropEvent::DragEnd));
                    return Status::Captured;
                }
            }
            _ => {}
        }

        Status::Ignored
    }

    fn mouse_interaction(
        &self,
        _tree: &Tree,
        layout: Layout<'_>,
        cursor: Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        if self.dragging || cursor.is_over(layout.bounds()) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a> From<CropOverlay> for Element<'a, Message> {
    fn from(overlay: CropOverlay) -> Self {
        Element::new(overlay)
    }
}

fn crop(event: CropEvent) -> Message {
    Message::Session(AppMessage::Crop(event))
}

/// Window position to preview coordinates (may fall outside the preview).
fn to_local(bounds: Rectangle, position: Point) -> (f32, f32) {
    (position.x - bounds.x, position.y - bounds.y)
}

fn to_screen(bounds: Rectangle, rect: Rect) -> Rectangle {
    Rectangle::new(
        Point::new(bounds.x + rect.x, bounds.y + rect.y),
        Size::new(rect.width, rect.height),
    )
}

/// The parts of `bounds` outside the selection (all of it when none).
fn shaded_areas(bounds: Rectangle, selection: Option<Rectangle>) -> Vec<Rectangle> {
    let Some(sel) = selection else {
        return vec![bounds];
    };

    let right = bounds.x + bounds.width;
    let bottom = bounds.y + bounds.height;
    let sel_right = sel.x + sel.width;
    let sel_bottom = sel.y + sel.height;

    let mut areas = Vec::with_capacity(4);
    if sel.y > bounds.y {
        areas.push(Rectangle::new(
            bounds.position(),
            Size::new(bounds.width, sel.y - bounds.y),
        ));
    }
    if sel_bottom < bottom {
        areas.push(Rectangle::new(
            Point::new(bounds.x, sel_bottom),
            Size::new(bounds.width, bottom - sel_bottom),
        ));
    }
    if sel.x > bounds.x {
        areas.push(Rectangle::new(
            Point::new(bounds.x, sel.y),
            Size::new(sel.x - bounds.x, sel.height),
        ));
    }
    if sel_right < right {
        areas.push(Rectangle::new(
            Point::new(sel_right, sel.y),
            Size::new(right - sel_right, sel.height),
        ));
    }
    areas
}

fn draw_quad(renderer: &mut Renderer, bounds: Rectangle, color: Color) {
    renderer.fill_quad(
        Quad {
            bounds,
            ..Quad::default()
        },
        color,
    );
}

pub fn crop_overlay<'a>(
    size: (u32, u32),
    selection: Option<Rect>,
    dragging: bool,
) -> Element<'a, Message> {
    CropOverlay::new(size, selection, dragging).into()
}

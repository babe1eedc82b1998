//! Canvas editor: viewport transform, annotation tools and the interactive session.

pub mod interaction;
pub mod labels;
pub mod session;
pub mod tools;

use crate::geometry::Point;

pub use interaction::{DragMode, DragState, InteractionState, SelectionTarget};
pub use labels::{default_palette, FixedLabelPolicy, LabelPolicy, LabelSwatch, RandomLabelPolicy};
pub use session::{CanvasSession, SessionEvent, SessionOptions, TaskDialog};
pub use tools::{Annotation, AnnotationShape, AnnotationStore, ToolError, ToolKind};

pub const VIEWPORT_ZOOM_MIN: f64 = 0.5;
pub const VIEWPORT_ZOOM_MAX: f64 = 3.0;
pub const VIEWPORT_ZOOM_STEP: f64 = 0.25;
const VIEWPORT_ZOOM_DEFAULT: f64 = 1.0;

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return VIEWPORT_ZOOM_DEFAULT;
    }
    zoom.clamp(VIEWPORT_ZOOM_MIN, VIEWPORT_ZOOM_MAX)
}

/// Zoom and pan shared by pointer mapping and rendering.
///
/// `pan` is measured in screen pixels; world coordinates are scaled by `zoom`
/// after the pan offset is removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorViewport {
    zoom: f64,
    pan: Point,
}

impl Default for EditorViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorViewport {
    pub const fn new() -> Self {
        Self {
            zoom: VIEWPORT_ZOOM_DEFAULT,
            pan: Point::new(0.0, 0.0),
        }
    }

    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    pub const fn pan(&self) -> Point {
        self.pan
    }

    /// Zoom as a whole percentage, for status display.
    pub fn zoom_percent(&self) -> u16 {
        (self.zoom * 100.0).round() as u16
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + VIEWPORT_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - VIEWPORT_ZOOM_STEP);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn pan_by(&mut self, delta_x: f64, delta_y: f64) {
        self.pan = self.pan.offset(delta_x, delta_y);
    }

    /// Back to 100% with no pan offset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Maps a client-space point to world space; `origin` is the surface's top-left in client space.
    pub fn screen_to_world(&self, screen: Point, origin: Point) -> Point {
        Point::new(
            (screen.x - origin.x - self.pan.x) / self.zoom,
            (screen.y - origin.y - self.pan.y) / self.zoom,
        )
    }

    pub fn world_to_screen(&self, world: Point, origin: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.pan.x + origin.x,
            world.y * self.zoom + self.pan.y + origin.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_viewport_defaults_to_actual_size() {
        let viewport = EditorViewport::new();
        assert_eq!(viewport.zoom(), 1.0);
        assert_eq!(viewport.pan(), Point::new(0.0, 0.0));
        assert_eq!(viewport.zoom_percent(), 100);
    }

    #[test]
    fn editor_viewport_zoom_controls_clamp() {
        let mut viewport = EditorViewport::new();
        viewport.zoom_out();
        assert_eq!(viewport.zoom(), 0.75);

        for _ in 0..20 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom(), VIEWPORT_ZOOM_MIN);

        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom(), VIEWPORT_ZOOM_MAX);

        viewport.set_zoom(12.0);
        assert_eq!(viewport.zoom(), VIEWPORT_ZOOM_MAX);
        viewport.set_zoom(f64::NAN);
        assert_eq!(viewport.zoom(), 1.0);
    }

    #[test]
    fn editor_viewport_maps_screen_to_world_through_pan_and_zoom() {
        let mut viewport = EditorViewport::new();
        viewport.set_zoom(2.0);
        viewport.pan_by(40.0, -20.0);
        let origin = Point::new(100.0, 50.0);

        let world = viewport.screen_to_world(Point::new(240.0, 130.0), origin);
        assert_eq!(world, Point::new(50.0, 50.0));
        assert_eq!(
            viewport.world_to_screen(world, origin),
            Point::new(240.0, 130.0)
        );
    }

    #[test]
    fn editor_viewport_reset_clears_offsets() {
        let mut viewport = EditorViewport::new();
        viewport.zoom_in();
        viewport.pan_by(120.0, -30.0);
        assert_eq!(viewport.zoom_percent(), 125);
        assert_eq!(viewport.pan(), Point::new(120.0, -30.0));

        viewport.reset();
        assert_eq!(viewport, EditorViewport::new());
    }
}

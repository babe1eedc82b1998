//! Shared geometric and color primitives used across editor and render modules.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::tools::BoxHandle;

/// Screen-space radius within which a box handle or polygon vertex is grabbed.
pub const HANDLE_HIT_RADIUS_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, delta_x: f64, delta_y: f64) -> Self {
        Self::new(self.x + delta_x, self.y + delta_y)
    }

    /// Component-wise `self - other`.
    pub fn delta_from(self, other: Point) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        let (dx, dy) = self.delta_from(other);
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0}")]
    MissingHash(String),
    #[error("color must have six hex digits: {0}")]
    InvalidLength(String),
    #[error("invalid hex digit in color: {0}")]
    InvalidDigit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(value.to_string()))?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::InvalidLength(value.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorParseError::InvalidDigit(value.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Min/max extent of a point set as `(min_x, min_y, max_x, max_y)`.
pub fn point_extent(points: &[Point]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let mut min_x = first.x;
    let mut max_x = first.x;
    let mut min_y = first.y;
    let mut max_y = first.y;
    for point in &points[1..] {
        min_x = min_x.min(point.x);
        max_x = max_x.max(point.x);
        min_y = min_y.min(point.y);
        max_y = max_y.max(point.y);
    }
    Some((min_x, min_y, max_x, max_y))
}

/// Inclusive containment test against the extent of a box's corner points.
pub fn point_in_bbox(point: Point, corners: &[Point]) -> bool {
    let Some((min_x, min_y, max_x, max_y)) = point_extent(corners) else {
        return false;
    };
    point.x >= min_x && point.x <= max_x && point.y >= min_y && point.y <= max_y
}

/// Even-odd ray casting over the ring formed by `vertices` (implicitly closed).
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        if (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn within_screen_radius(world: Point, target: Point, zoom: f64, radius_px: f64) -> bool {
    world.distance_to(target) * zoom <= radius_px
}

/// First corner handle (TL, TR, BR, BL order) under the pointer.
pub fn nearest_handle(world: Point, corners: &[Point; 4], zoom: f64) -> Option<BoxHandle> {
    BoxHandle::ALL.into_iter().find(|handle| {
        within_screen_radius(world, corners[handle.index()], zoom, HANDLE_HIT_RADIUS_PX)
    })
}

/// First polygon vertex under the pointer.
pub fn nearest_vertex(world: Point, vertices: &[Point], zoom: f64) -> Option<usize> {
    vertices
        .iter()
        .position(|vertex| within_screen_radius(world, *vertex, zoom, HANDLE_HIT_RADIUS_PX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> [Point; 4] {
        [
            Point::new(10.0, 10.0),
            Point::new(110.0, 10.0),
            Point::new(110.0, 110.0),
            Point::new(10.0, 110.0),
        ]
    }

    #[test]
    fn point_in_bbox_includes_edges() {
        let corners = square();
        assert!(point_in_bbox(Point::new(10.0, 10.0), &corners));
        assert!(point_in_bbox(Point::new(110.0, 60.0), &corners));
        assert!(point_in_bbox(Point::new(50.0, 50.0), &corners));
        assert!(!point_in_bbox(Point::new(110.5, 60.0), &corners));
        assert!(!point_in_bbox(Point::new(50.0, 9.9), &corners));
    }

    #[test]
    fn point_in_bbox_and_polygon_are_repeatable() {
        let corners = square();
        let probe = Point::new(42.0, 77.0);
        assert_eq!(
            point_in_bbox(probe, &corners),
            point_in_bbox(probe, &corners)
        );
        assert_eq!(
            point_in_polygon(probe, &corners),
            point_in_polygon(probe, &corners)
        );
        assert_eq!(corners, square());
    }

    #[test]
    fn point_in_polygon_uses_even_odd_rule_on_concave_shape() {
        let notch = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(50.0, 40.0),
            Point::new(0.0, 100.0),
        ];
        assert!(point_in_polygon(Point::new(20.0, 20.0), &notch));
        assert!(point_in_polygon(Point::new(90.0, 80.0), &notch));
        assert!(!point_in_polygon(Point::new(50.0, 80.0), &notch));
        assert!(!point_in_polygon(Point::new(150.0, 50.0), &notch));
    }

    #[test]
    fn point_in_polygon_rejects_degenerate_rings() {
        let segment = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &segment));
    }

    #[test]
    fn nearest_handle_measures_distance_in_screen_space() {
        let corners = square();
        let near_br = Point::new(115.0, 110.0);
        assert_eq!(
            nearest_handle(near_br, &corners, 1.0),
            Some(BoxHandle::BottomRight)
        );
        // 5 world units at zoom 2 is 10 screen px: out of reach.
        assert_eq!(nearest_handle(near_br, &corners, 2.0), None);
        // 5 world units at zoom 0.5 is 2.5 screen px.
        assert_eq!(
            nearest_handle(near_br, &corners, 0.5),
            Some(BoxHandle::BottomRight)
        );
    }

    #[test]
    fn nearest_vertex_returns_first_match() {
        let vertices = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(50.0, 50.0),
        ];
        assert_eq!(nearest_vertex(Point::new(2.0, 0.0), &vertices, 1.0), Some(0));
        assert_eq!(nearest_vertex(Point::new(50.0, 57.0), &vertices, 1.0), Some(2));
        assert_eq!(nearest_vertex(Point::new(80.0, 80.0), &vertices, 1.0), None);
    }

    #[test]
    fn color_hex_round_trips_through_serde() {
        let color = Color::from_hex("#0D9488").expect("valid hex");
        assert_eq!(color, Color::new(0x0D, 0x94, 0x88));
        let json = serde_json::to_string(&color).expect("serialize color");
        assert_eq!(json, "\"#0D9488\"");
        let back: Color = serde_json::from_str(&json).expect("deserialize color");
        assert_eq!(back, color);
    }

    #[test]
    fn color_rejects_malformed_hex() {
        assert!(matches!(
            Color::from_hex("0D9488"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            Color::from_hex("#0D94"),
            Err(ColorParseError::InvalidLength(_))
        ));
        assert!(matches!(
            Color::from_hex("#0D94ZZ"),
            Err(ColorParseError::InvalidDigit(_))
        ));
    }
}

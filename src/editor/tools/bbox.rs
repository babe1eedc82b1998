use crate::geometry::{point_extent, Point};

/// Corner handles of a box, in stored point order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxHandle {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl BoxHandle {
    pub const ALL: [BoxHandle; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }
}

/// Axis-aligned corners (TL, TR, BR, BL) spanned by two opposite points.
pub fn rect_corners(a: Point, b: Point) -> [Point; 4] {
    let left = a.x.min(b.x);
    let right = a.x.max(b.x);
    let top = a.y.min(b.y);
    let bottom = a.y.max(b.y);
    [
        Point::new(left, top),
        Point::new(right, top),
        Point::new(right, bottom),
        Point::new(left, bottom),
    ]
}

/// Rebuilds the TL, TR, BR, BL layout from whatever extent `corners` covers.
pub fn normalize_corners(corners: &[Point; 4]) -> [Point; 4] {
    match point_extent(corners) {
        Some((min_x, min_y, max_x, max_y)) => {
            rect_corners(Point::new(min_x, min_y), Point::new(max_x, max_y))
        }
        None => *corners,
    }
}

pub fn is_axis_aligned(corners: &[Point; 4]) -> bool {
    corners[0].x == corners[3].x
        && corners[1].x == corners[2].x
        && corners[0].y == corners[1].y
        && corners[2].y == corners[3].y
}

/// Moves `handle` by the delta while its opposite corner stays put.
pub fn resize_corners(
    baseline: &[Point; 4],
    handle: BoxHandle,
    delta_x: f64,
    delta_y: f64,
) -> [Point; 4] {
    let anchor = baseline[handle.opposite().index()];
    let moved = baseline[handle.index()].offset(delta_x, delta_y);
    rect_corners(anchor, moved)
}

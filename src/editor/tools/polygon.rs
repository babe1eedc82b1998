use crate::geometry::Point;

/// Screen-space radius around the first vertex that closes a polygon draft.
pub const POLYGON_CLOSE_RADIUS_PX: f64 = 15.0;
pub const MIN_POLYGON_VERTICES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum PolygonStep {
    Appended { vertex_count: usize },
    Closed(Vec<Point>),
}

/// Click-to-place polygon under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonDraft {
    vertices: Vec<Point>,
    hover: Option<Point>,
}

impl PolygonDraft {
    pub fn start(first: Point) -> Self {
        Self {
            vertices: vec![first],
            hover: None,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub const fn hover(&self) -> Option<Point> {
        self.hover
    }

    pub fn set_hover(&mut self, point: Point) {
        self.hover = Some(point);
    }

    pub fn would_close(&self, point: Point, zoom: f64) -> bool {
        self.vertices.len() >= MIN_POLYGON_VERTICES
            && self
                .vertices
                .first()
                .is_some_and(|first| first.distance_to(point) * zoom < POLYGON_CLOSE_RADIUS_PX)
    }

    /// Places the next click: closes the ring when it lands on the first vertex.
    pub fn place(&mut self, point: Point, zoom: f64) -> PolygonStep {
        if self.would_close(point, zoom) {
            self.hover = None;
            return PolygonStep::Closed(std::mem::take(&mut self.vertices));
        }
        self.vertices.push(point);
        PolygonStep::Appended {
            vertex_count: self.vertices.len(),
        }
    }
}

/// Baseline vertices with only `index` shifted by the delta.
pub fn move_vertex(baseline: &[Point], index: usize, delta_x: f64, delta_y: f64) -> Vec<Point> {
    baseline
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            if i == index {
                vertex.offset(delta_x, delta_y)
            } else {
                *vertex
            }
        })
        .collect()
}

pub fn translate_vertices(baseline: &[Point], delta_x: f64, delta_y: f64) -> Vec<Point> {
    baseline
        .iter()
        .map(|vertex| vertex.offset(delta_x, delta_y))
        .collect()
}

/// Arithmetic mean of the vertices, used to anchor the label chip.
pub fn centroid(vertices: &[Point]) -> Option<Point> {
    if vertices.is_empty() {
        return None;
    }
    let count = vertices.len() as f64;
    let (sum_x, sum_y) = vertices
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sum_x / count, sum_y / count))
}

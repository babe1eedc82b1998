use image::{Rgba, RgbaImage};

use super::{DrawCommand, Scene, Stroke};
use crate::editor::EditorViewport;
use crate::geometry::Point;

/// Paints `scene` onto a fresh `width` x `height` surface.
///
/// Text is not shaped; label chips still get their background rectangle.
pub fn rasterize(scene: &Scene, width: u32, height: u32) -> RgbaImage {
    let mut canvas = Canvas::new(width, height, scene.viewport);
    for command in &scene.commands {
        canvas.draw(command);
    }
    canvas.image
}

struct Canvas {
    image: RgbaImage,
    viewport: EditorViewport,
}

impl Canvas {
    fn new(width: u32, height: u32, viewport: EditorViewport) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            viewport,
        }
    }

    fn to_screen(&self, world: Point) -> Point {
        self.viewport.world_to_screen(world, Point::default())
    }

    fn to_screen_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|point| self.to_screen(*point)).collect()
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Clear(color) => {
                for pixel in self.image.pixels_mut() {
                    *pixel = *color;
                }
            }
            DrawCommand::FillRect { min, max, color } => {
                let corners = rect_path(*min, *max);
                let screen = self.to_screen_all(&corners);
                self.fill_polygon(&screen, *color);
            }
            DrawCommand::StrokeRect { min, max, stroke } => {
                let corners = rect_path(*min, *max);
                self.stroke_path(&corners, true, stroke);
            }
            DrawCommand::FillPolygon { points, color } => {
                let screen = self.to_screen_all(points);
                self.fill_polygon(&screen, *color);
            }
            DrawCommand::StrokePath {
                points,
                closed,
                stroke,
            } => self.stroke_path(points, *closed, stroke),
            DrawCommand::Line { from, to, stroke } => self.stroke_path(&[*from, *to], false, stroke),
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => self.circle(*center, *radius, *fill, stroke),
            DrawCommand::Text { .. } => {}
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= i64::from(self.image.width()) || y >= i64::from(self.image.height())
        {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        *pixel = source_over(*pixel, color);
    }

    /// Even-odd scanline fill sampling pixel centers.
    fn fill_polygon(&mut self, points: &[Point], color: Rgba<u8>) {
        if points.len() < 3 {
            return;
        }
        let Some((_, min_y, _, max_y)) = crate::geometry::point_extent(points) else {
            return;
        };
        let height = i64::from(self.image.height());
        let first_row = (min_y.floor() as i64).max(0);
        let last_row = (max_y.ceil() as i64).min(height - 1);

        let mut crossings = Vec::with_capacity(points.len());
        for row in first_row..=last_row {
            let sample_y = row as f64 + 0.5;
            crossings.clear();
            let mut j = points.len() - 1;
            for i in 0..points.len() {
                let (a, b) = (points[i], points[j]);
                if (a.y > sample_y) != (b.y > sample_y) {
                    crossings.push(a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
                j = i;
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil() as i64;
                let end = (span[1] - 0.5).ceil() as i64;
                for column in start..end {
                    self.blend(column, row, color);
                }
            }
        }
    }

    fn stroke_path(&mut self, world: &[Point], closed: bool, stroke: &Stroke) {
        let points = self.to_screen_all(world);
        if points.len() < 2 {
            return;
        }
        let zoom = self.viewport.zoom();
        let width = stroke.width * zoom;
        let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if closed && points.len() > 2 {
            if let (Some(last), Some(first)) = (points.last(), points.first()) {
                segments.push((*last, *first));
            }
        }

        match stroke.dash {
            None => {
                for (from, to) in segments {
                    self.segment(from, to, width, stroke.color);
                }
            }
            Some((on, off)) => {
                let mut dasher = Dasher::new(on * zoom, off * zoom);
                for (from, to) in segments {
                    for (a, b) in dasher.split(from, to) {
                        self.segment(a, b, width, stroke.color);
                    }
                }
            }
        }
    }

    /// Pixels whose centers lie within half the width of the segment.
    fn segment(&mut self, from: Point, to: Point, width: f64, color: Rgba<u8>) {
        let half = (width / 2.0).max(0.5);
        let left = (from.x.min(to.x) - half).floor() as i64;
        let right = (from.x.max(to.x) + half).ceil() as i64;
        let top = (from.y.min(to.y) - half).floor() as i64;
        let bottom = (from.y.max(to.y) + half).ceil() as i64;
        let (left, right, top, bottom) = self.clip(left, right, top, bottom);

        for y in top..bottom {
            for x in left..right {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if distance_to_segment(center, from, to) <= half {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn circle(&mut self, center: Point, radius: f64, fill: Rgba<u8>, stroke: &Stroke) {
        let zoom = self.viewport.zoom();
        let center = self.to_screen(center);
        let radius = radius * zoom;
        let half = (stroke.width * zoom / 2.0).max(0.5);
        let reach = radius + half;
        let (left, right, top, bottom) = self.clip(
            (center.x - reach).floor() as i64,
            (center.x + reach).ceil() as i64,
            (center.y - reach).floor() as i64,
            (center.y + reach).ceil() as i64,
        );

        for y in top..bottom {
            for x in left..right {
                let distance = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance_to(center);
                if (distance - radius).abs() <= half {
                    self.blend(x, y, stroke.color);
                } else if distance < radius {
                    self.blend(x, y, fill);
                }
            }
        }
    }

    fn clip(&self, left: i64, right: i64, top: i64, bottom: i64) -> (i64, i64, i64, i64) {
        let width = i64::from(self.image.width());
        let height = i64::from(self.image.height());
        (
            left.max(0),
            right.min(width),
            top.max(0),
            bottom.min(height),
        )
    }
}

fn rect_path(min: Point, max: Point) -> [Point; 4] {
    [
        min,
        Point::new(max.x, min.y),
        max,
        Point::new(min.x, max.y),
    ]
}

fn distance_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = b.delta_from(a);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return point.distance_to(a);
    }
    let (px, py) = point.delta_from(a);
    let t = ((px * dx + py * dy) / length_sq).clamp(0.0, 1.0);
    point.distance_to(Point::new(a.x + t * dx, a.y + t * dy))
}

fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let alpha = f64::from(src[3]) / 255.0;
    if alpha >= 1.0 {
        return src;
    }
    let dst_alpha = f64::from(dst[3]) / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let value = (f64::from(src[i]) * alpha + f64::from(dst[i]) * dst_alpha * (1.0 - alpha))
            / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Splits a polyline into dash segments; the pattern phase carries across segments.
struct Dasher {
    on: f64,
    off: f64,
    drawing: bool,
    remaining: f64,
}

impl Dasher {
    fn new(on: f64, off: f64) -> Self {
        Self {
            on: on.max(0.5),
            off: off.max(0.5),
            drawing: true,
            remaining: on.max(0.5),
        }
    }

    fn split(&mut self, from: Point, to: Point) -> Vec<(Point, Point)> {
        let length = from.distance_to(to);
        let mut dashes = Vec::new();
        if length == 0.0 {
            return dashes;
        }
        let (dx, dy) = to.delta_from(from);
        let at = |distance: f64| Point::new(from.x + dx * distance / length, from.y + dy * distance / length);

        let mut travelled = 0.0;
        while travelled < length {
            let step = self.remaining.min(length - travelled);
            if self.drawing {
                dashes.push((at(travelled), at(travelled + step)));
            }
            travelled += step;
            self.remaining -= step;
            if self.remaining <= f64::EPSILON {
                self.drawing = !self.drawing;
                self.remaining = if self.drawing { self.on } else { self.off };
            }
        }
        dashes
    }
}

#[cfg(test)]
mod tests {
    use super::super::{build_scene, DraftPreview, SceneInput};
    use super::*;
    use crate::editor::tools::{rect_corners, Annotation, AnnotationShape};
    use crate::geometry::Color;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn scene(viewport: EditorViewport, commands: Vec<DrawCommand>) -> Scene {
        let mut all = vec![DrawCommand::Clear(BLACK)];
        all.extend(commands);
        Scene {
            viewport,
            commands: all,
        }
    }

    #[test]
    fn fill_rect_covers_exactly_its_pixels() {
        let image = rasterize(
            &scene(
                EditorViewport::new(),
                vec![DrawCommand::FillRect {
                    min: Point::new(2.0, 2.0),
                    max: Point::new(6.0, 5.0),
                    color: RED,
                }],
            ),
            10,
            10,
        );
        assert_eq!(*image.get_pixel(2, 2), RED);
        assert_eq!(*image.get_pixel(5, 4), RED);
        assert_eq!(*image.get_pixel(6, 4), BLACK);
        assert_eq!(*image.get_pixel(5, 5), BLACK);
        assert_eq!(*image.get_pixel(1, 2), BLACK);
    }

    #[test]
    fn translucent_fill_blends_with_background() {
        let image = rasterize(
            &scene(
                EditorViewport::new(),
                vec![DrawCommand::FillRect {
                    min: Point::new(0.0, 0.0),
                    max: Point::new(4.0, 4.0),
                    color: Rgba([255, 255, 255, 0x20]),
                }],
            ),
            4,
            4,
        );
        let pixel = image.get_pixel(1, 1);
        assert_eq!(pixel[3], 255);
        assert!(pixel[0] > 0 && pixel[0] < 64, "got {pixel:?}");
    }

    #[test]
    fn zoom_and_pan_move_world_geometry_on_screen() {
        let mut viewport = EditorViewport::new();
        viewport.set_zoom(2.0);
        viewport.pan_by(10.0, 0.0);
        let image = rasterize(
            &scene(
                viewport,
                vec![DrawCommand::FillRect {
                    min: Point::new(0.0, 0.0),
                    max: Point::new(5.0, 5.0),
                    color: RED,
                }],
            ),
            30,
            30,
        );
        assert_eq!(*image.get_pixel(9, 1), BLACK);
        assert_eq!(*image.get_pixel(10, 1), RED);
        assert_eq!(*image.get_pixel(19, 9), RED);
        assert_eq!(*image.get_pixel(20, 9), BLACK);
    }

    #[test]
    fn even_odd_fill_leaves_concave_notch_empty() {
        let notch = vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(10.0, 8.0),
            Point::new(0.0, 20.0),
        ];
        let image = rasterize(
            &scene(
                EditorViewport::new(),
                vec![DrawCommand::FillPolygon {
                    points: notch,
                    color: RED,
                }],
            ),
            20,
            20,
        );
        assert_eq!(*image.get_pixel(3, 3), RED);
        assert_eq!(*image.get_pixel(10, 16), BLACK);
    }

    #[test]
    fn dashed_stroke_leaves_gaps() {
        let stroke = Stroke {
            color: RED,
            width: 1.0,
            dash: Some((5.0, 5.0)),
        };
        let image = rasterize(
            &scene(
                EditorViewport::new(),
                vec![DrawCommand::Line {
                    from: Point::new(0.0, 2.5),
                    to: Point::new(40.0, 2.5),
                    stroke,
                }],
            ),
            40,
            5,
        );
        assert_eq!(*image.get_pixel(2, 2), RED);
        assert_eq!(*image.get_pixel(7, 2), BLACK);
        assert_eq!(*image.get_pixel(12, 2), RED);
    }

    #[test]
    fn dasher_carries_phase_across_segments() {
        let mut dasher = Dasher::new(5.0, 5.0);
        let first = dasher.split(Point::new(0.0, 0.0), Point::new(3.0, 0.0));
        let second = dasher.split(Point::new(3.0, 0.0), Point::new(13.0, 0.0));
        assert_eq!(first, vec![(Point::new(0.0, 0.0), Point::new(3.0, 0.0))]);
        assert_eq!(
            second,
            vec![
                (Point::new(3.0, 0.0), Point::new(5.0, 0.0)),
                (Point::new(10.0, 0.0), Point::new(13.0, 0.0)),
            ]
        );
    }

    #[test]
    fn full_scene_paints_annotation_color_inside_box() {
        let annotations = [Annotation {
            id: "a1".to_string(),
            task_id: "t1".to_string(),
            label: "cat".to_string(),
            shape: AnnotationShape::BBox {
                points: rect_corners(Point::new(100.0, 100.0), Point::new(200.0, 200.0)),
            },
            color: Color::new(0xEF, 0x44, 0x44),
            confidence: None,
            created_by: "Alex Kim".to_string(),
        }];
        let input = SceneInput {
            file_name: "parking_003.jpg",
            annotations: &annotations,
            suggestions: Vec::new(),
            selection: None,
            locked: false,
            preview: Some(DraftPreview {
                points: vec![Point::new(300.0, 300.0), Point::new(340.0, 300.0)],
                closed: false,
            }),
            cursors: &[],
            viewport: EditorViewport::new(),
            width: 640,
            height: 480,
        };
        let image = rasterize(&build_scene(&input), 640, 480);
        assert_eq!(image.dimensions(), (640, 480));

        // Stroke on the box edge is the opaque label color.
        assert_eq!(*image.get_pixel(150, 100), Rgba([0xEF, 0x44, 0x44, 0xFF]));
        // Interior is the placeholder tinted toward red.
        let inside = image.get_pixel(150, 150);
        assert!(inside[0] > 0x1A, "got {inside:?}");
        // Label chip sits above the box.
        assert_eq!(*image.get_pixel(102, 90), Rgba([0xEF, 0x44, 0x44, 0xFF]));
    }
}

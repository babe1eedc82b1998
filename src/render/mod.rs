//! Canvas rendering: a pure scene builder producing a display list, and a
//! rasterizer that paints it onto an `RgbaImage`.

mod raster;

pub use raster::rasterize;

use image::Rgba;
use thiserror::Error;

use crate::editor::tools::{centroid, Annotation, AnnotationShape};
use crate::editor::{EditorViewport, SelectionTarget};
use crate::geometry::{point_extent, Color, Point};
use crate::presence::CursorGlyph;

pub const GRID_SPACING: f64 = 40.0;
/// On-screen radius of selection handles; divided by zoom in world space.
pub const HANDLE_RADIUS_PX: f64 = 5.0;
pub const IMAGE_PLACEHOLDER_MIN: Point = Point::new(40.0, 40.0);
pub const IMAGE_PLACEHOLDER_MAX: Point = Point::new(600.0, 400.0);

const BACKGROUND: Rgba<u8> = Rgba([0x0F, 0x17, 0x2A, 0xFF]);
const GRID_LINE: Rgba<u8> = Rgba([0x1E, 0x29, 0x3B, 0xFF]);
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0x1A, 0x23, 0x38, 0xFF]);
const PLACEHOLDER_STROKE: Rgba<u8> = Rgba([0x33, 0x41, 0x55, 0xFF]);
const PLACEHOLDER_TEXT: Rgba<u8> = Rgba([0x47, 0x55, 0x69, 0xFF]);
const CHIP_TEXT: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const HANDLE_FILL: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const PREVIEW_STROKE: Rgba<u8> = Rgba([0x3B, 0x82, 0xF6, 0xFF]);
const ANNOTATION_FILL_ALPHA: u8 = 0x20;
const CHIP_HEIGHT: f64 = 20.0;
const CHIP_PADDING: f64 = 8.0;
const CHIP_CHAR_WIDTH: f64 = 6.0;
const PREVIEW_DASH: (f64, f64) = (5.0, 5.0);

pub fn paint(color: Color, alpha: u8) -> Rgba<u8> {
    let (r, g, b) = color.rgb();
    Rgba([r, g, b, alpha])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba<u8>,
    /// World units; scaled by zoom when rasterized.
    pub width: f64,
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub const fn solid(color: Rgba<u8>, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// One display-list entry. Everything except `Clear` is in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba<u8>),
    FillRect {
        min: Point,
        max: Point,
        color: Rgba<u8>,
    },
    StrokeRect {
        min: Point,
        max: Point,
        stroke: Stroke,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Rgba<u8>,
    },
    StrokePath {
        points: Vec<Point>,
        closed: bool,
        stroke: Stroke,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Rgba<u8>,
        stroke: Stroke,
    },
    Text {
        anchor: Point,
        text: String,
        color: Rgba<u8>,
        size: f64,
        align: TextAlign,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub viewport: EditorViewport,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// In-progress outline drawn dashed on top of the annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPreview {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Everything the renderer reads from the session for one frame.
#[derive(Debug, Clone)]
pub struct SceneInput<'a> {
    pub file_name: &'a str,
    pub annotations: &'a [Annotation],
    /// Selected suggestions while the review is open.
    pub suggestions: Vec<&'a Annotation>,
    pub selection: Option<&'a SelectionTarget>,
    /// Confirmed tasks keep the selection outline but lose their handles.
    pub locked: bool,
    pub preview: Option<DraftPreview>,
    pub cursors: &'a [CursorGlyph],
    pub viewport: EditorViewport,
    pub width: u32,
    pub height: u32,
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write canvas image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),
}

pub fn build_scene(input: &SceneInput<'_>) -> Scene {
    let mut commands = vec![DrawCommand::Clear(BACKGROUND)];
    let zoom = input.viewport.zoom();

    push_grid(&mut commands, input, zoom);
    push_placeholder(&mut commands, input.file_name);

    let annotations = input
        .annotations
        .iter()
        .map(|annotation| (annotation, false))
        .chain(input.suggestions.iter().map(|suggestion| (*suggestion, true)));
    for (annotation, is_suggestion) in annotations {
        let selected = is_selected(input.selection, annotation, is_suggestion);
        push_annotation(&mut commands, annotation, selected);
    }

    if let Some(selected) = selected_annotation(input).filter(|_| !input.locked) {
        push_handles(&mut commands, selected, zoom);
    }

    if let Some(preview) = &input.preview {
        commands.push(DrawCommand::StrokePath {
            points: preview.points.clone(),
            closed: preview.closed,
            stroke: Stroke {
                color: PREVIEW_STROKE,
                width: 2.0,
                dash: Some(PREVIEW_DASH),
            },
        });
    }

    for cursor in input.cursors {
        commands.push(DrawCommand::FillPolygon {
            points: cursor.outline().to_vec(),
            color: paint(cursor.user.color, 0xFF),
        });
        commands.push(DrawCommand::Text {
            anchor: cursor.label_anchor(),
            text: cursor.user.name.clone(),
            color: paint(cursor.user.color, 0xFF),
            size: 10.0,
            align: TextAlign::Left,
        });
    }

    Scene {
        viewport: input.viewport,
        commands,
    }
}

fn push_grid(commands: &mut Vec<DrawCommand>, input: &SceneInput<'_>, zoom: f64) {
    let world_width = f64::from(input.width) / zoom;
    let world_height = f64::from(input.height) / zoom;
    let stroke = Stroke::solid(GRID_LINE, 0.5);

    let mut x = 0.0;
    while x < world_width {
        commands.push(DrawCommand::Line {
            from: Point::new(x, 0.0),
            to: Point::new(x, world_height),
            stroke,
        });
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y < world_height {
        commands.push(DrawCommand::Line {
            from: Point::new(0.0, y),
            to: Point::new(world_width, y),
            stroke,
        });
        y += GRID_SPACING;
    }
}

fn push_placeholder(commands: &mut Vec<DrawCommand>, file_name: &str) {
    commands.push(DrawCommand::FillRect {
        min: IMAGE_PLACEHOLDER_MIN,
        max: IMAGE_PLACEHOLDER_MAX,
        color: PLACEHOLDER_FILL,
    });
    commands.push(DrawCommand::StrokeRect {
        min: IMAGE_PLACEHOLDER_MIN,
        max: IMAGE_PLACEHOLDER_MAX,
        stroke: Stroke::solid(PLACEHOLDER_STROKE, 1.0),
    });
    commands.push(DrawCommand::Text {
        anchor: Point::new(320.0, 225.0),
        text: file_name.to_string(),
        color: PLACEHOLDER_TEXT,
        size: 14.0,
        align: TextAlign::Center,
    });
}

fn is_selected(
    selection: Option<&SelectionTarget>,
    annotation: &Annotation,
    is_suggestion: bool,
) -> bool {
    match selection {
        Some(SelectionTarget::Annotation(id)) => !is_suggestion && *id == annotation.id,
        Some(SelectionTarget::Suggestion(id)) => is_suggestion && *id == annotation.id,
        None => false,
    }
}

fn selected_annotation<'a>(input: &SceneInput<'a>) -> Option<&'a Annotation> {
    match input.selection? {
        SelectionTarget::Annotation(id) => input.annotations.iter().find(|a| a.id == *id),
        SelectionTarget::Suggestion(id) => input.suggestions.iter().copied().find(|s| s.id == *id),
    }
}

fn chip_width(text: &str) -> f64 {
    text.chars().count() as f64 * CHIP_CHAR_WIDTH + CHIP_PADDING
}

fn push_annotation(commands: &mut Vec<DrawCommand>, annotation: &Annotation, selected: bool) {
    let fill = paint(annotation.color, ANNOTATION_FILL_ALPHA);
    let stroke = Stroke::solid(
        paint(annotation.color, 0xFF),
        if selected { 3.0 } else { 2.0 },
    );
    let label = annotation.display_label();
    let chip_color = paint(annotation.color, 0xFF);

    match &annotation.shape {
        AnnotationShape::BBox { points } => {
            let Some((min_x, min_y, max_x, max_y)) = point_extent(points) else {
                return;
            };
            let min = Point::new(min_x, min_y);
            let max = Point::new(max_x, max_y);
            commands.push(DrawCommand::FillRect {
                min,
                max,
                color: fill,
            });
            commands.push(DrawCommand::StrokeRect { min, max, stroke });

            let width = chip_width(&label);
            commands.push(DrawCommand::FillRect {
                min: min.offset(0.0, -CHIP_HEIGHT),
                max: min.offset(width, 0.0),
                color: chip_color,
            });
            commands.push(DrawCommand::Text {
                anchor: min.offset(4.0, -6.0),
                text: label,
                color: CHIP_TEXT,
                size: 11.0,
                align: TextAlign::Left,
            });
        }
        AnnotationShape::Polygon { points } => {
            let Some(center) = centroid(points) else {
                return;
            };
            commands.push(DrawCommand::FillPolygon {
                points: points.clone(),
                color: fill,
            });
            commands.push(DrawCommand::StrokePath {
                points: points.clone(),
                closed: true,
                stroke,
            });

            let half = chip_width(&label) / 2.0;
            commands.push(DrawCommand::FillRect {
                min: center.offset(-half, -CHIP_HEIGHT / 2.0),
                max: center.offset(half, CHIP_HEIGHT / 2.0),
                color: chip_color,
            });
            commands.push(DrawCommand::Text {
                anchor: center.offset(0.0, 4.0),
                text: label,
                color: CHIP_TEXT,
                size: 11.0,
                align: TextAlign::Center,
            });
        }
    }
}

fn push_handles(commands: &mut Vec<DrawCommand>, annotation: &Annotation, zoom: f64) {
    let radius = HANDLE_RADIUS_PX / zoom;
    let stroke = Stroke::solid(paint(annotation.color, 0xFF), 1.5 / zoom);
    for point in annotation.shape.points() {
        commands.push(DrawCommand::Circle {
            center: *point,
            radius,
            fill: HANDLE_FILL,
            stroke,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::{rect_corners, AUTHOR_AI};
    use crate::presence::PresenceBoard;

    fn annotation(id: &str, shape: AnnotationShape, confidence: Option<f64>) -> Annotation {
        Annotation {
            id: id.to_string(),
            task_id: "t1".to_string(),
            label: "car".to_string(),
            shape,
            color: Color::new(0x0D, 0x94, 0x88),
            confidence,
            created_by: "Alex Kim".to_string(),
        }
    }

    fn bbox(id: &str) -> Annotation {
        annotation(
            id,
            AnnotationShape::BBox {
                points: rect_corners(Point::new(80.0, 120.0), Point::new(220.0, 240.0)),
            },
            None,
        )
    }

    fn input<'a>(annotations: &'a [Annotation]) -> SceneInput<'a> {
        SceneInput {
            file_name: "intersection_001.jpg",
            annotations,
            suggestions: Vec::new(),
            selection: None,
            locked: false,
            preview: None,
            cursors: &[],
            viewport: EditorViewport::new(),
            width: 640,
            height: 480,
        }
    }

    fn count(scene: &Scene, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        scene.commands.iter().filter(|command| predicate(command)).count()
    }

    #[test]
    fn scene_starts_with_clear_grid_and_placeholder() {
        let scene = build_scene(&input(&[]));
        assert_eq!(scene.commands[0], DrawCommand::Clear(BACKGROUND));
        // 640 / 40 vertical lines plus 480 / 40 horizontal lines.
        assert_eq!(
            count(&scene, |c| matches!(c, DrawCommand::Line { .. })),
            16 + 12
        );
        assert_eq!(scene.texts().collect::<Vec<_>>(), ["intersection_001.jpg"]);
    }

    #[test]
    fn grid_covers_more_world_when_zoomed_out() {
        let mut input = input(&[]);
        input.viewport.set_zoom(0.5);
        let scene = build_scene(&input);
        assert_eq!(
            count(&scene, |c| matches!(c, DrawCommand::Line { .. })),
            32 + 24
        );
    }

    #[test]
    fn bbox_gets_translucent_fill_and_label_chip_above() {
        let annotations = [bbox("a1")];
        let scene = build_scene(&input(&annotations));
        assert!(scene.commands.contains(&DrawCommand::FillRect {
            min: Point::new(80.0, 120.0),
            max: Point::new(220.0, 240.0),
            color: Rgba([0x0D, 0x94, 0x88, 0x20]),
        }));
        assert!(scene.commands.contains(&DrawCommand::StrokeRect {
            min: Point::new(80.0, 120.0),
            max: Point::new(220.0, 240.0),
            stroke: Stroke::solid(Rgba([0x0D, 0x94, 0x88, 0xFF]), 2.0),
        }));
        assert!(scene.commands.iter().any(|c| matches!(
            c,
            DrawCommand::FillRect { min, .. } if *min == Point::new(80.0, 100.0)
        )));
        assert!(scene.texts().any(|text| text == "car"));
    }

    #[test]
    fn selection_thickens_stroke_and_scales_handles_with_zoom() {
        let annotations = [bbox("a1")];
        let selection = SelectionTarget::Annotation("a1".to_string());
        let mut input = input(&annotations);
        input.selection = Some(&selection);
        input.viewport.set_zoom(2.0);
        let scene = build_scene(&input);

        assert!(scene.commands.iter().any(|c| matches!(
            c,
            DrawCommand::StrokeRect { stroke, .. } if stroke.width == 3.0
        )));
        let radii: Vec<f64> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert_eq!(radii, vec![HANDLE_RADIUS_PX / 2.0; 4]);
    }

    #[test]
    fn locked_selection_is_outlined_without_handles() {
        let annotations = [bbox("a1")];
        let selection = SelectionTarget::Annotation("a1".to_string());
        let mut input = input(&annotations);
        input.selection = Some(&selection);
        input.locked = true;
        let scene = build_scene(&input);

        assert!(scene.commands.iter().any(|c| matches!(
            c,
            DrawCommand::StrokeRect { stroke, .. } if stroke.width == 3.0
        )));
        assert_eq!(count(&scene, |c| matches!(c, DrawCommand::Circle { .. })), 0);
    }

    #[test]
    fn polygon_chip_is_centered_on_centroid() {
        let annotations = [annotation(
            "a3",
            AnnotationShape::Polygon {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(60.0, 0.0),
                    Point::new(60.0, 30.0),
                    Point::new(0.0, 30.0),
                ],
            },
            None,
        )];
        let scene = build_scene(&input(&annotations));
        assert!(scene.commands.iter().any(|c| matches!(
            c,
            DrawCommand::Text { anchor, align: TextAlign::Center, .. }
                if *anchor == Point::new(30.0, 19.0)
        )));
        assert!(scene.commands.iter().any(|c| matches!(
            c,
            DrawCommand::StrokePath { closed: true, .. }
        )));
    }

    #[test]
    fn suggestions_show_rounded_confidence() {
        let mut suggestion = bbox("s-1-1");
        suggestion.confidence = Some(0.886);
        suggestion.created_by = AUTHOR_AI.to_string();
        let mut input = input(&[]);
        input.suggestions = vec![&suggestion];
        let scene = build_scene(&input);
        assert!(scene.texts().any(|text| text == "car 89%"));
    }

    #[test]
    fn preview_is_dashed_and_cursors_are_drawn_last() {
        let board = PresenceBoard::demo();
        let mut input = input(&[]);
        input.preview = Some(DraftPreview {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            closed: false,
        });
        input.cursors = board.cursors();
        let scene = build_scene(&input);

        assert!(scene.commands.iter().any(|c| matches!(
            c,
            DrawCommand::StrokePath { closed: false, stroke, .. }
                if stroke.dash == Some((5.0, 5.0))
        )));
        assert!(matches!(
            scene.commands.last(),
            Some(DrawCommand::Text { text, .. }) if text == "Sam R"
        ));
    }
}

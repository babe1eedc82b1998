use crate::editor::tools::{rect_corners, BoxHandle, PolygonDraft};
use crate::geometry::Point;

/// What the current selection points at. Suggestions live outside the annotation store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    Annotation(String),
    Suggestion(String),
}

impl SelectionTarget {
    pub fn id(&self) -> &str {
        match self {
            Self::Annotation(id) | Self::Suggestion(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    Resize(BoxHandle),
    Vertex(usize),
    Pan,
}

/// An in-flight drag. `baseline` holds the target's points at pointer-down;
/// every move recomputes from it so deltas never accumulate error.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub mode: DragMode,
    pub target: Option<SelectionTarget>,
    pub start_world: Point,
    pub anchor_screen: Point,
    pub baseline: Vec<Point>,
}

impl DragState {
    pub fn pan(anchor_screen: Point) -> Self {
        Self {
            mode: DragMode::Pan,
            target: None,
            start_world: Point::default(),
            anchor_screen,
            baseline: Vec::new(),
        }
    }

    pub fn edit(
        mode: DragMode,
        target: SelectionTarget,
        start_world: Point,
        anchor_screen: Point,
        baseline: Vec<Point>,
    ) -> Self {
        Self {
            mode,
            target: Some(target),
            start_world,
            anchor_screen,
            baseline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    DrawingBox {
        start: Point,
        current: Point,
    },
    DrawingPolygon(PolygonDraft),
    Dragging(DragState),
}

impl InteractionState {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DrawingBox { .. } => "drawing_box",
            Self::DrawingPolygon(_) => "drawing_polygon",
            Self::Dragging(_) => "dragging",
        }
    }

    /// Dashed outline shown while drawing: box corners, or the open polygon
    /// path followed by the hover point.
    pub fn preview_path(&self) -> Option<Vec<Point>> {
        match self {
            Self::DrawingBox { start, current } => Some(rect_corners(*start, *current).to_vec()),
            Self::DrawingPolygon(draft) => {
                let mut path = draft.vertices().to_vec();
                path.extend(draft.hover());
                Some(path)
            }
            Self::Idle | Self::Dragging(_) => None,
        }
    }
}

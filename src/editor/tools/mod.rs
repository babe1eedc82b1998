mod bbox;
mod operations;
mod polygon;
mod query;

pub use crate::geometry::{Color, Point};
pub use bbox::{is_axis_aligned, normalize_corners, rect_corners, resize_corners, BoxHandle};
pub use polygon::{
    centroid, move_vertex, translate_vertices, PolygonDraft, PolygonStep,
    MIN_POLYGON_VERTICES, POLYGON_CLOSE_RADIUS_PX,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Author name carried by machine-suggested annotations.
pub const AUTHOR_AI: &str = "AI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    BBox,
    Polygon,
    Pan,
    ZoomIn,
    ZoomOut,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        Self::Select,
        Self::BBox,
        Self::Polygon,
        Self::Pan,
        Self::ZoomIn,
        Self::ZoomOut,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::BBox => "Bounding Box",
            Self::Polygon => "Polygon",
            Self::Pan => "Pan",
            Self::ZoomIn => "Zoom In",
            Self::ZoomOut => "Zoom Out",
        }
    }

    pub const fn shortcut(self) -> char {
        match self {
            Self::Select => 'v',
            Self::BBox => 'b',
            Self::Polygon => 'p',
            Self::Pan => 'h',
            Self::ZoomIn => '+',
            Self::ZoomOut => '-',
        }
    }

    pub const fn is_drawing_tool(self) -> bool {
        matches!(self, Self::BBox | Self::Polygon)
    }
}

/// Geometry of an annotation in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationShape {
    /// Corners in TL, TR, BR, BL order.
    #[serde(rename = "bbox")]
    BBox { points: [Point; 4] },
    /// Vertices in edge order; the ring closes from last to first.
    Polygon { points: Vec<Point> },
}

impl AnnotationShape {
    pub fn points(&self) -> &[Point] {
        match self {
            Self::BBox { points } => points,
            Self::Polygon { points } => points,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::BBox { .. } => "bbox",
            Self::Polygon { .. } => "polygon",
        }
    }

    /// Same variant with `points` written back; bbox corners are renormalized.
    pub fn with_points(&self, points: &[Point]) -> Result<Self, ToolError> {
        match self {
            Self::BBox { .. } => {
                let corners: [Point; 4] = points
                    .try_into()
                    .map_err(|_| ToolError::InvalidBoxGeometry)?;
                Ok(Self::BBox {
                    points: normalize_corners(&corners),
                })
            }
            Self::Polygon { .. } => {
                if points.len() < MIN_POLYGON_VERTICES {
                    return Err(ToolError::InvalidPolygonGeometry);
                }
                Ok(Self::Polygon {
                    points: points.to_vec(),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub task_id: String,
    pub label: String,
    #[serde(flatten)]
    pub shape: AnnotationShape,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub created_by: String,
}

impl Annotation {
    pub fn is_suggestion(&self) -> bool {
        self.created_by == AUTHOR_AI
    }

    /// Chip text: the label, plus the rounded confidence when present.
    pub fn display_label(&self) -> String {
        match self.confidence {
            Some(confidence) => format!("{} {:.0}%", self.label, (confidence * 100.0).round()),
            None => self.label.clone(),
        }
    }
}

/// Label, color and author stamped onto a newly drawn annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationStyle {
    pub label: String,
    pub color: Color,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("bounding box needs two distinct corners")]
    InvalidBoxGeometry,
    #[error("polygon needs at least 3 vertices")]
    InvalidPolygonGeometry,
    #[error("annotation not found: {0}")]
    AnnotationNotFound(String),
    #[error("annotation id already in use: {0}")]
    DuplicateId(String),
}

/// Ordered annotation list for one task; later entries draw on top.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    task_id: String,
    annotations: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            annotations: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_annotations(task_id: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        let mut store = Self::new(task_id);
        store.replace_annotations(annotations);
        store
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let id = format!("a-{}", self.next_id);
            self.next_id = self.next_id.saturating_add(1);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.annotations
            .iter_mut()
            .find(|annotation| annotation.id == id)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

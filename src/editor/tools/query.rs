use crate::geometry::{point_in_bbox, point_in_polygon};

use super::*;

impl AnnotationShape {
    pub fn contains_point(&self, point: Point) -> bool {
        match self {
            Self::BBox { points } => point_in_bbox(point, points),
            Self::Polygon { points } => point_in_polygon(point, points),
        }
    }
}

impl AnnotationStore {
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|annotation| annotation.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Topmost annotation under `point`; later entries win.
    pub fn top_annotation_at(&self, point: Point) -> Option<&Annotation> {
        self.annotations
            .iter()
            .rev()
            .find(|annotation| annotation.shape.contains_point(point))
    }

    pub fn ids(&self) -> Vec<String> {
        self.annotations
            .iter()
            .map(|annotation| annotation.id.clone())
            .collect()
    }
}

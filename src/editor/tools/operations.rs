use std::collections::HashSet;

use super::*;

impl AnnotationStore {
    pub fn add_bbox(
        &mut self,
        start: Point,
        end: Point,
        style: AnnotationStyle,
    ) -> Result<String, ToolError> {
        if start.x == end.x || start.y == end.y {
            return Err(ToolError::InvalidBoxGeometry);
        }

        let id = self.allocate_id();
        let annotation = self.build(
            id.clone(),
            AnnotationShape::BBox {
                points: rect_corners(start, end),
            },
            style,
        );
        self.annotations.push(annotation);
        Ok(id)
    }

    pub fn add_polygon(
        &mut self,
        vertices: Vec<Point>,
        style: AnnotationStyle,
    ) -> Result<String, ToolError> {
        if vertices.len() < MIN_POLYGON_VERTICES {
            return Err(ToolError::InvalidPolygonGeometry);
        }

        let id = self.allocate_id();
        let annotation = self.build(
            id.clone(),
            AnnotationShape::Polygon { points: vertices },
            style,
        );
        self.annotations.push(annotation);
        Ok(id)
    }

    fn build(&self, id: String, shape: AnnotationShape, style: AnnotationStyle) -> Annotation {
        Annotation {
            id,
            task_id: self.task_id.clone(),
            label: style.label,
            shape,
            color: style.color,
            confidence: None,
            created_by: style.created_by,
        }
    }

    /// Appends annotations produced elsewhere (applied suggestions), keeping ids unique.
    pub fn extend_annotations(&mut self, incoming: Vec<Annotation>) -> Result<usize, ToolError> {
        self.check_new_ids(&incoming)?;
        let count = incoming.len();
        let task_id = self.task_id.clone();
        self.annotations
            .extend(incoming.into_iter().map(|mut annotation| {
                annotation.task_id = task_id.clone();
                annotation
            }));
        Ok(count)
    }

    /// Rejects a batch whose ids collide with stored annotations or with each other.
    pub fn check_new_ids(&self, incoming: &[Annotation]) -> Result<(), ToolError> {
        let mut seen = HashSet::new();
        for annotation in incoming {
            if self.contains(&annotation.id) || !seen.insert(annotation.id.as_str()) {
                return Err(ToolError::DuplicateId(annotation.id.clone()));
            }
        }
        Ok(())
    }

    /// Writes new geometry into an existing annotation of the same kind.
    pub fn set_points(&mut self, id: &str, points: &[Point]) -> Result<(), ToolError> {
        let annotation = self
            .find_mut(id)
            .ok_or_else(|| ToolError::AnnotationNotFound(id.to_string()))?;
        annotation.shape = annotation.shape.with_points(points)?;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Annotation> {
        let index = self
            .annotations
            .iter()
            .position(|annotation| annotation.id == id)?;
        Some(self.annotations.remove(index))
    }

    pub fn replace_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.next_id = self
            .annotations
            .iter()
            .filter_map(|annotation| annotation.id.strip_prefix("a-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            .saturating_add(1);
    }
}

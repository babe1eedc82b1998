use std::collections::HashSet;

use super::{SuggestionError, SuggestionResult};
use crate::editor::tools::{Annotation, ToolError};
use crate::geometry::Point;

/// Pending suggestions and the user's review of them.
///
/// A suggestion is applied only once it is selected and has been adjusted,
/// either by dragging it on the canvas or by an explicit mark.
#[derive(Debug, Clone, Default)]
pub struct SuggestionReview {
    pending: Vec<Annotation>,
    open: bool,
    selected: HashSet<String>,
    adjusted: HashSet<String>,
}

impl SuggestionReview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending batch; the review stays closed until opened.
    pub fn load(&mut self, suggestions: Vec<Annotation>) {
        self.pending = suggestions;
        self.open = false;
        self.selected.clear();
        self.adjusted.clear();
    }

    pub fn pending(&self) -> &[Annotation] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.pending.iter().find(|suggestion| suggestion.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_adjusted(&self, id: &str) -> bool {
        self.adjusted.contains(id)
    }

    /// Opens the review with every suggestion selected and none adjusted.
    pub fn open(&mut self) {
        self.open = true;
        self.selected = self.pending.iter().map(|s| s.id.clone()).collect();
        self.adjusted.clear();
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
        true
    }

    pub fn mark_adjusted(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.adjusted.insert(id.to_string());
        true
    }

    /// Writes edited geometry back into a suggestion and marks it adjusted.
    pub fn set_points(&mut self, id: &str, points: &[Point]) -> Result<(), ToolError> {
        let suggestion = self
            .pending
            .iter_mut()
            .find(|suggestion| suggestion.id == id)
            .ok_or_else(|| ToolError::AnnotationNotFound(id.to_string()))?;
        suggestion.shape = suggestion.shape.with_points(points)?;
        self.adjusted.insert(id.to_string());
        Ok(())
    }

    /// Drops a single suggestion from the batch.
    pub fn discard(&mut self, id: &str) -> Option<Annotation> {
        let index = self.pending.iter().position(|s| s.id == id)?;
        self.selected.remove(id);
        self.adjusted.remove(id);
        Some(self.pending.remove(index))
    }

    /// Closes the review and throws the whole batch away.
    pub fn dismiss(&mut self) {
        self.load(Vec::new());
    }

    /// Selected suggestions drawn on the canvas while the review is open.
    pub fn visible(&self) -> impl Iterator<Item = &Annotation> {
        self.pending
            .iter()
            .filter(move |suggestion| self.open && self.selected.contains(&suggestion.id))
    }

    /// Topmost visible suggestion under `point`.
    pub fn top_visible_at(&self, point: Point) -> Option<&Annotation> {
        self.pending.iter().rev().find(|suggestion| {
            self.open
                && self.selected.contains(&suggestion.id)
                && suggestion.shape.contains_point(point)
        })
    }

    /// The selected, adjusted suggestions, ready to be committed.
    ///
    /// Rejected when nothing is selected or any selected suggestion is still
    /// unadjusted. The review is left as is; callers `dismiss` once the batch
    /// has been stored.
    pub fn accepted(&self) -> SuggestionResult<Vec<Annotation>> {
        if !self.open {
            return Err(SuggestionError::ReviewClosed);
        }
        let selected: Vec<&Annotation> = self
            .pending
            .iter()
            .filter(|suggestion| self.selected.contains(&suggestion.id))
            .collect();
        if selected.is_empty() {
            return Err(SuggestionError::NothingSelected);
        }
        let remaining = selected
            .iter()
            .filter(|suggestion| !self.adjusted.contains(&suggestion.id))
            .count();
        if remaining > 0 {
            return Err(SuggestionError::Unadjusted { remaining });
        }

        Ok(selected.into_iter().cloned().collect())
    }
}

//! Machine-suggested annotations: background generation and the review gate
//! that decides which suggestions become real annotations.

mod job;
mod review;

pub use job::{SuggestUpdate, SuggestionDelays, SuggestionJob};
pub use review::SuggestionReview;

use thiserror::Error;

use crate::editor::tools::{rect_corners, Annotation, AnnotationShape, AUTHOR_AI};
use crate::geometry::{Color, Point};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuggestStatus {
    #[default]
    Idle,
    Queued,
    Running,
    Ready,
}

impl SuggestStatus {
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

pub type SuggestionResult<T> = std::result::Result<T, SuggestionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionError {
    #[error("no suggestions selected")]
    NothingSelected,
    #[error("{remaining} suggestion(s) need adjustment before applying")]
    Unadjusted { remaining: usize },
    #[error("suggestion review is not open")]
    ReviewClosed,
    #[error("suggestions are already being generated")]
    AlreadyRunning,
}

/// Source of suggested annotations for a task.
pub trait SuggestionProvider: Send + Sync {
    fn suggest(&self, task: &Task) -> Vec<Annotation>;
}

/// Canned detections used by the demo workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSuggestionProvider;

impl DemoSuggestionProvider {
    fn suggestion(
        task: &Task,
        batch: i64,
        index: usize,
        label: &str,
        color: Color,
        confidence: f64,
        corners: (Point, Point),
    ) -> Annotation {
        Annotation {
            id: format!("s-{batch}-{index}"),
            task_id: task.id.clone(),
            label: label.to_string(),
            shape: AnnotationShape::BBox {
                points: rect_corners(corners.0, corners.1),
            },
            color,
            confidence: Some(confidence),
            created_by: AUTHOR_AI.to_string(),
        }
    }
}

impl SuggestionProvider for DemoSuggestionProvider {
    fn suggest(&self, task: &Task) -> Vec<Annotation> {
        let batch = chrono::Utc::now().timestamp_millis();
        vec![
            Self::suggestion(
                task,
                batch,
                1,
                "car",
                Color::new(0x0D, 0x94, 0x88),
                0.89,
                (Point::new(100.0, 160.0), Point::new(220.0, 260.0)),
            ),
            Self::suggestion(
                task,
                batch,
                2,
                "person",
                Color::new(0x3B, 0x82, 0xF6),
                0.76,
                (Point::new(340.0, 120.0), Point::new(390.0, 300.0)),
            ),
            Self::suggestion(
                task,
                batch,
                3,
                "bicycle",
                Color::new(0x8B, 0x5C, 0xF6),
                0.62,
                (Point::new(440.0, 200.0), Point::new(520.0, 300.0)),
            ),
        ]
    }
}

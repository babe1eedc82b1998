use crate::editor::ToolError;
use crate::members::MemberError;
use crate::render::RenderError;
use crate::state::StateError;
use crate::storage::StorageError;
use crate::suggest::SuggestionError;
use crate::task::TaskError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Member(#[from] MemberError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("task {0} is confirmed and read-only")]
    TaskLocked(String),
}

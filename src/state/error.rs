use super::event::TaskEvent;
use super::model::TaskStatus;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid task status transition: from {from:?} using event {event:?}")]
    InvalidStateTransition { from: TaskStatus, event: TaskEvent },
}

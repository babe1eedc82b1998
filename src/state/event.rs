use super::model::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Start,
    Confirm,
    Reopen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<TaskStatus>,
    pub event: TaskEvent,
    pub to: TaskStatus,
}

impl StateTransition {
    pub const fn new(from: Option<TaskStatus>, event: TaskEvent, to: TaskStatus) -> Self {
        Self { from, event, to }
    }
}

//! Task records and the confirm/reopen lifecycle that locks or unlocks editing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{StateError, StateTransition, TaskEvent, TaskStatus, TaskStatusMachine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub file_name: String,
    #[serde(default)]
    pub image_url: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub annotation_count: u32,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<NaiveDate>,
}

impl Task {
    pub const fn is_locked(&self) -> bool {
        self.status.is_locked()
    }
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("a reason is required to reopen a confirmed task")]
    EmptyReason,
    #[error("only the project owner can reopen a confirmed task")]
    NotOwner,
    #[error(transparent)]
    State(#[from] StateError),
}

/// A task paired with the status machine that guards its transitions.
#[derive(Debug)]
pub struct TaskLifecycle {
    task: Task,
    machine: TaskStatusMachine,
}

impl TaskLifecycle {
    pub fn new(task: Task) -> Self {
        let machine = TaskStatusMachine::new(task.status);
        Self { task, machine }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn status(&self) -> TaskStatus {
        self.machine.state()
    }

    pub fn is_locked(&self) -> bool {
        self.status().is_locked()
    }

    pub fn history(&self) -> &[StateTransition] {
        self.machine.history()
    }

    /// Marks a TODO task as started; the editor does this on the first edit.
    pub fn start(&mut self) -> TaskResult<&Task> {
        self.task.status = self.machine.transition(TaskEvent::Start)?;
        tracing::debug!(task_id = %self.task.id, "task started");
        Ok(&self.task)
    }

    pub fn confirm(&mut self, user: &str, date: NaiveDate) -> TaskResult<&Task> {
        self.task.status = self.machine.transition(TaskEvent::Confirm)?;
        self.task.confirmed_by = Some(user.to_string());
        self.task.confirmed_at = Some(date);
        tracing::info!(task_id = %self.task.id, user, %date, "task confirmed");
        Ok(&self.task)
    }

    pub fn reopen(&mut self, reason: &str, is_owner: bool) -> TaskResult<&Task> {
        let reason = reason.trim();
        if reason.is_empty() {
            tracing::warn!(task_id = %self.task.id, "reopen rejected: empty reason");
            return Err(TaskError::EmptyReason);
        }
        if !is_owner {
            tracing::warn!(task_id = %self.task.id, "reopen rejected: not owner");
            return Err(TaskError::NotOwner);
        }

        self.task.status = self.machine.transition(TaskEvent::Reopen)?;
        self.task.confirmed_by = None;
        self.task.confirmed_at = None;
        tracing::info!(task_id = %self.task.id, reason, "task reopened");
        Ok(&self.task)
    }
}

#[cfg(test)]
pub(crate) fn sample_task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        project_id: "p1".to_string(),
        file_name: "highway_002.jpg".to_string(),
        image_url: String::new(),
        status,
        assignee: "Alex Kim".to_string(),
        annotation_count: 0,
        created_at: NaiveDate::from_ymd_opt(2026, 1, 17).expect("valid date"),
        confirmed_by: None,
        confirmed_at: None,
    }
}

use super::error::{StateError, StateResult};
use super::{StateTransition, TaskEvent, TaskStatus};

#[derive(Debug)]
pub struct TaskStatusMachine {
    state: TaskStatus,
    transition_history: Vec<StateTransition>,
}

impl TaskStatusMachine {
    pub fn new(initial: TaskStatus) -> Self {
        Self {
            state: initial,
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> TaskStatus {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }

    pub fn can_transition(&self, event: TaskEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: TaskEvent) -> Option<TaskStatus> {
        use TaskEvent::*;
        match (self.state, event) {
            (TaskStatus::Todo, Start) => Some(TaskStatus::InProgress),
            (TaskStatus::Todo | TaskStatus::InProgress, Confirm) => Some(TaskStatus::Confirmed),
            (TaskStatus::Confirmed, Reopen) => Some(TaskStatus::InProgress),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: TaskEvent) -> StateResult<TaskStatus> {
        tracing::debug!(from = ?self.state, event = ?event, "request task status transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid task status transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

impl Default for TaskStatusMachine {
    fn default() -> Self {
        Self::new(TaskStatus::default())
    }
}

impl std::fmt::Display for TaskStatusMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskStatus::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = TaskStatusMachine::new(TaskStatus::Todo);
        assert!(machine.can_transition(TaskEvent::Start));
        assert!(machine.can_transition(TaskEvent::Confirm));
        assert!(!machine.can_transition(TaskEvent::Reopen));

        let _ = machine
            .transition(TaskEvent::Confirm)
            .expect("todo -> confirmed should transition");

        assert!(machine.can_transition(TaskEvent::Reopen));
        assert!(!machine.can_transition(TaskEvent::Start));
        assert!(!machine.can_transition(TaskEvent::Confirm));
    }

    #[test]
    fn transition_records_history_with_ordered_entries() {
        let mut machine = TaskStatusMachine::default();
        let _ = machine
            .transition(TaskEvent::Start)
            .expect("start should work");
        let _ = machine
            .transition(TaskEvent::Confirm)
            .expect("confirm should work");
        let _ = machine
            .transition(TaskEvent::Reopen)
            .expect("reopen should work");

        assert_eq!(machine.state(), TaskStatus::InProgress);
        assert_eq!(
            machine.history(),
            &[
                StateTransition::new(
                    Some(TaskStatus::Todo),
                    TaskEvent::Start,
                    TaskStatus::InProgress
                ),
                StateTransition::new(
                    Some(TaskStatus::InProgress),
                    TaskEvent::Confirm,
                    TaskStatus::Confirmed
                ),
                StateTransition::new(
                    Some(TaskStatus::Confirmed),
                    TaskEvent::Reopen,
                    TaskStatus::InProgress
                ),
            ]
        );
        assert_eq!(machine.to_string(), "TaskStatus::InProgress");
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = TaskStatusMachine::new(TaskStatus::InProgress);

        let err = machine
            .transition(TaskEvent::Reopen)
            .expect_err("in progress -> reopen should fail");
        assert_eq!(
            err,
            StateError::InvalidStateTransition {
                from: TaskStatus::InProgress,
                event: TaskEvent::Reopen
            }
        );
        assert_eq!(machine.state(), TaskStatus::InProgress);
        assert!(machine.history().is_empty());
    }
}

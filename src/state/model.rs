use serde::{Deserialize, Serialize};

/// Review status of a labeling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Confirmed,
}

impl TaskStatus {
    /// Confirmed tasks are read-only in the editor.
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Confirmed => "CONFIRMED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_upper_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).expect("serialize status");
        assert_eq!(json, "\"IN_PROGRESS\"");
        let parsed: TaskStatus = serde_json::from_str("\"CONFIRMED\"").expect("parse status");
        assert_eq!(parsed, TaskStatus::Confirmed);
        assert_eq!(parsed.as_str(), "CONFIRMED");
    }

    #[test]
    fn only_confirmed_is_locked() {
        assert!(TaskStatus::Confirmed.is_locked());
        assert!(!TaskStatus::InProgress.is_locked());
        assert!(!TaskStatus::Todo.is_locked());
    }
}

pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{StateTransition, TaskEvent};
pub use machine::TaskStatusMachine;
pub use model::TaskStatus;

//! Tasks: the backend-owned todo items the client reads and mutates.

pub mod model;

pub use model::{
    NewTask, Task, TaskList, TaskPriority, TaskStatus, TaskStatusFilter, TaskSummary, TaskUpdate,
};

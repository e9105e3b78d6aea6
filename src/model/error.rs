use thiserror::Error;

// Task payload validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
    #[error("Invalid task ID: {0:?}")]
    InvalidId(String),
}

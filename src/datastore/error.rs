use thiserror::*;

use crate::model::TaskId;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum DataStoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("storage returned error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for DataStoreError {
    fn from(err: rusqlite::Error) -> Self {
        DataStoreError::Storage(err.to_string())
    }
}

use async_trait::async_trait;

use super::error::DataStoreError;
use crate::model::{Task, TaskId};

/// Owner of the authoritative set of tasks.
///
/// Implementations assign ids (monotonic, never reused) and make each
/// operation atomic on its own; nothing spans more than one call.
#[async_trait]
pub trait TaskDataStore: Send + Sync + 'static {
    /// Short name used in logs.
    fn backend(&self) -> &'static str;

    async fn create(&self, title: String, completed: bool) -> Result<Task, DataStoreError>;

    /// All tasks in ascending id order, which is also insertion order.
    async fn list(&self) -> Result<Vec<Task>, DataStoreError>;

    async fn update(
        &self,
        id: TaskId,
        title: String,
        completed: bool,
    ) -> Result<Task, DataStoreError>;

    async fn delete(&self, id: TaskId) -> Result<(), DataStoreError>;
}

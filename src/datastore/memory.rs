use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::{error::DataStoreError, TaskDataStore};
use crate::model::{Task, TaskId};

struct Tasks {
    items: BTreeMap<TaskId, Task>,
    next_id: TaskId,
}

/// Keeps tasks in memory. A single lock guards the map and the id counter;
/// every operation holds it from start to end.
pub struct MemoryTaskStore {
    tasks: Mutex<Tasks>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Tasks {
                items: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskDataStore for MemoryTaskStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, title: String, completed: bool) -> Result<Task, DataStoreError> {
        let mut tasks = self.tasks.lock();
        let id = tasks.next_id;
        tasks.next_id = id
            .checked_add(1)
            .ok_or_else(|| DataStoreError::Storage("task id space exhausted".to_string()))?;

        let task = Task::new(id, title, completed);
        tasks.items.insert(id, task.clone());
        Ok(task)
    }

    async fn list(&self) -> Result<Vec<Task>, DataStoreError> {
        let tasks = self.tasks.lock();
        Ok(tasks.items.values().cloned().collect())
    }

    async fn update(
        &self,
        id: TaskId,
        title: String,
        completed: bool,
    ) -> Result<Task, DataStoreError> {
        let mut tasks = self.tasks.lock();
        match tasks.items.get_mut(&id) {
            Some(task) => {
                task.title = title;
                task.completed = completed;
                Ok(task.clone())
            }
            None => Err(DataStoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: TaskId) -> Result<(), DataStoreError> {
        let mut tasks = self.tasks.lock();
        match tasks.items.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DataStoreError::NotFound(id)),
        }
    }
}

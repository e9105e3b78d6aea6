use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, types::Type, Connection, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{error::DataStoreError, TaskDataStore};
use crate::model::{Task, TaskId};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT 0
    )";

/// Keeps tasks in a single SQLite table, one statement per operation.
///
/// The mutex is only there because a connection cannot be shared between
/// threads; isolation is whatever SQLite gives a single statement.
/// Statements run on tokio's blocking pool, so a request waiting for the
/// connection never holds a runtime worker.
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataStoreError> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened task database.");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self, DataStoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, DataStoreError> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Rejects every write from now on.
    #[cfg(test)]
    pub(crate) fn set_query_only(&self, on: bool) -> Result<(), DataStoreError> {
        let pragma = if on { "ON" } else { "OFF" };
        self.conn
            .lock()
            .execute_batch(&format!("PRAGMA query_only = {}", pragma))?;
        Ok(())
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, DataStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DataStoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|err| DataStoreError::Storage(err.to_string()))?
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Task> {
        let id: i64 = row.get(0)?;
        let id = TaskId::try_from(id).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err))
        })?;
        Ok(Task::new(id, row.get(1)?, row.get(2)?))
    }
}

// Ids above i64::MAX cannot be rows, so they can only be "not found".
fn row_id(id: TaskId) -> Result<i64, DataStoreError> {
    i64::try_from(id).map_err(|_| DataStoreError::NotFound(id))
}

#[async_trait]
impl TaskDataStore for SqliteTaskStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn create(&self, title: String, completed: bool) -> Result<Task, DataStoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO tasks (title, completed) VALUES (?1, ?2)",
                params![title, completed],
            )?;
            let id = TaskId::try_from(conn.last_insert_rowid())
                .map_err(|err| DataStoreError::Storage(err.to_string()))?;
            Ok(Task::new(id, title, completed))
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Task>, DataStoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, title, completed FROM tasks ORDER BY id")?;
            let rows = stmt.query_map([], Self::map_row)?;
            let tasks = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
        .await
    }

    async fn update(
        &self,
        id: TaskId,
        title: String,
        completed: bool,
    ) -> Result<Task, DataStoreError> {
        let rid = row_id(id)?;
        self.with_conn(move |conn| {
            let affected = conn.execute(
                "UPDATE tasks SET title = ?1, completed = ?2 WHERE id = ?3",
                params![title, completed, rid],
            )?;
            if affected == 0 {
                return Err(DataStoreError::NotFound(id));
            }
            Ok(Task::new(id, title, completed))
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> Result<(), DataStoreError> {
        let rid = row_id(id)?;
        self.with_conn(move |conn| {
            let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![rid])?;
            if affected == 0 {
                return Err(DataStoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

mod datastore;
mod error;
mod memory;
mod sqlite;

pub use datastore::TaskDataStore;
pub use error::DataStoreError;
pub use memory::MemoryTaskStore;
pub use sqlite::SqliteTaskStore;

#![forbid(unsafe_code)]

//! Storage for study progress: a key-value contract, an in-memory adapter,
//! a `SQLite` adapter, and the JSON record format the app persists.

pub mod kv;
pub mod record;
pub mod sqlite;

pub use kv::{InMemoryStore, KeyValueStore, StorageError};
pub use record::{ProgressRecord, QuizAttemptRecord};
pub use sqlite::{SqliteInitError, SqliteStore};

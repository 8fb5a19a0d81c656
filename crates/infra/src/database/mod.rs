//! SQLite persistence

pub mod batch_store;
pub mod manager;

pub use batch_store::SqliteBatchStore;
pub use manager::{DbManager, SqliteConnection, SqlitePool};

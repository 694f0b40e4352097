// Declare modules within the adapters directory
pub mod in_memory_store;
pub mod postgres_store;

pub use in_memory_store::InMemoryStore;
pub use postgres_store::{MIGRATOR, PostgresStore};

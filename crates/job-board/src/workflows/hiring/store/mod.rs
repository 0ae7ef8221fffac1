//! Repository implementations: a process-local store for tests and demos, and SQLite for
//! durable deployments.

mod memory;
mod sqlite;

pub use memory::InMemoryHiringRepository;
pub use sqlite::SqliteHiringRepository;

//! Local store capability backing the cache-fused request path.
//!
//! The store is an opaque record source: read the latest value, observe it
//! as a cold stream, write one value. Two backends are provided - a SQLite
//! record cache for persistent offline support and an in-memory snapshot
//! for cache-disabled runs and tests.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::{RecordStore, SqliteStore};
pub use traits::{LocalStore, QueryKey};

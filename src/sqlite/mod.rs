// SQLite backend:
// - engine: the blocking handle trait and its rusqlite implementation
// - params / query: value conversion in both directions
// - pool: handle ownership, pragmas, statement dispatch
// - search_index: FTS shadow table and its triggers

pub mod engine;
pub mod params;
pub mod pool;
pub mod query;
pub mod search_index;

pub use engine::{EngineOpener, RusqliteEngine, SqliteEngine, rusqlite_opener};
pub use pool::{PRAGMAS, SqliteOptions, SqlitePool};

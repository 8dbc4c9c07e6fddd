// Postgres backend:
// - numeric: binary NUMERIC codec (tokio-postgres has none without extra crates)
// - params / query: value conversion in both directions
// - pool: deadpool pool with transaction pinning

pub mod numeric;
pub mod params;
pub mod pool;
pub mod query;

pub use params::Params;
pub use pool::PostgresPool;
pub use query::{build_result_set_from_statement, postgres_extract_value};

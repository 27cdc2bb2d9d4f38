// Database layer module
// SQLite connection pool, schema bootstrap and repositories

pub mod pool;
pub mod repositories;

pub use pool::DbPool;

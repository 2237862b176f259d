//! MySQL access for the bookshelf service.
//!
//! - One bounded pool per process, created at start-up and injected into
//!   stores; connections are checked out per statement or per transaction
//!   and returned when the guard drops.
//! - Store failures surface as [`DbError`]; [`StoreFault`] names the ones
//!   callers map to specific responses.

pub mod error;
pub mod pool;

pub use error::{DbError, StoreFault};
pub use pool::{apply_migrations, connect, connect_options};
pub use sqlx::MySqlPool;

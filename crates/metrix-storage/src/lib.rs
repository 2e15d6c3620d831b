//! Metrix Storage - metric repository backends
//!
//! - [`InMemoryRepository`] - process-local map behind one reader/writer lock
//! - [`FileRepository`] - in-memory cache journaled to a JSON-lines file
//! - [`PostgresRepository`] - JSONB table with upserts and transactional batches
//!
//! [`Storage::open`] builds whichever backend the configuration selects.

pub mod factory;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod retry;

pub use factory::Storage;
pub use file::FileRepository;
pub use memory::{InMemoryRepository, SharedStore, Store};
pub use postgres::PostgresRepository;
pub use retry::{check_connection_with_retry, retry_with_backoff};

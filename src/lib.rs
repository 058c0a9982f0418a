pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod idempotency;
pub mod job;
pub mod logging;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod types;

pub use error::{EtlError, Result};

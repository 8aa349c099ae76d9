//! Common error handling for the shardplan query planner.

pub mod error;

pub use error::{Error, ErrorKind, Result};

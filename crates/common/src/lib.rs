//! Shared error plumbing and small utilities used across all skillknife crates.

pub mod error;
pub mod time;

pub use error::{Error, FromMessage, Result};

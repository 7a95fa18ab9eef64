//! Persisted user state: custom markets, profiles and preferred agents.
//!
//! Each concern is its own JSON document in the data directory. Writes are
//! atomic; unreadable documents load as empty.

pub mod document;
pub mod error;
pub mod profile;
pub mod store;

pub use {
    error::{Error, Result},
    profile::snapshot_profile,
    store::Store,
};

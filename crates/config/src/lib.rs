//! Configuration loading, env substitution, data directories, and the
//! built-in reader and market catalogs.
//!
//! Config files: `skillknife.toml`, `skillknife.yaml`, or `skillknife.json`
//! Searched in `./` then `~/.config/skillknife/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod markets;
pub mod readers;
pub mod schema;

pub use {
    loader::{
        clear_data_dir, config_dir, data_dir, discover_and_load, home_dir, load_config,
        set_data_dir,
    },
    markets::{Market, MarketKind, default_markets, merge_markets},
    readers::{Reader, ReaderOverride, UNIVERSAL_READER_ID, default_readers, merge_readers},
    schema::{CacheConfig, InstallMode, KnifeConfig, SearchConfig, ToolConfig},
};

//! Config schema types (packaging tool, caches, scraped search, readers).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::readers::ReaderOverride;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnifeConfig {
    pub tool: ToolConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    /// Partial reader definitions merged over the built-in catalog by `id`.
    pub readers: Vec<ReaderOverride>,
}

/// How install/update/uninstall operations are carried out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Copy the cached market tree and write `.openskills.json` ourselves.
    Direct,
    /// Hand the operation to the external packaging tool.
    #[default]
    Delegated,
}

/// External packaging tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program and leading arguments, e.g. `["npx", "skills"]`.
    pub command: Vec<String>,
    pub mode: InstallMode,
    /// Working directory for global-scope invocations. Defaults to `$HOME`.
    pub cwd: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".into(), "skills".into()],
            mode: InstallMode::default(),
            cwd: None,
        }
    }
}

/// Cache locations and lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a parsed lock file is reused before re-reading it.
    pub lock_ttl_ms: u64,
    /// Global lock file written by the packaging tool.
    /// Defaults to `~/.agents/.skill-lock.json`.
    pub lock_file: Option<PathBuf>,
    /// Root for market git mirrors. Defaults to `<data_dir>/cache`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lock_ttl_ms: 1000,
            lock_file: None,
            cache_dir: None,
        }
    }
}

impl CacheConfig {
    /// Configured lock file, else `~/.agents/.skill-lock.json`. `None` when
    /// neither is available.
    pub fn resolved_lock_file(&self) -> Option<PathBuf> {
        self.lock_file.clone().or_else(|| {
            crate::home_dir().map(|home| home.join(".agents").join(".skill-lock.json"))
        })
    }

    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| crate::data_dir().join("cache"))
    }
}

/// Scraped global-search market settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// Maximum number of results requested from the search API.
    pub limit: u32,
    /// Pause between detail-page fetches during hydration.
    pub hydrate_delay_ms: u64,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://skills.sh".into(),
            limit: 50,
            hydrate_delay_ms: 250,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
            timeout_secs: 20,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: KnifeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.tool.command, vec!["npx", "skills"]);
        assert_eq!(cfg.tool.mode, InstallMode::Delegated);
        assert_eq!(cfg.cache.lock_ttl_ms, 1000);
        assert_eq!(cfg.search.limit, 50);
        assert!(cfg.readers.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: KnifeConfig = toml::from_str(
            r#"
[tool]
mode = "direct"

[search]
base_url = "http://localhost:9999"

[[readers]]
id = "claude-code"
globalPath = "~/custom/claude"
"#,
        )
        .unwrap();
        assert_eq!(cfg.tool.mode, InstallMode::Direct);
        assert_eq!(cfg.tool.command, vec!["npx", "skills"]);
        assert_eq!(cfg.search.base_url, "http://localhost:9999");
        assert_eq!(cfg.search.hydrate_delay_ms, 250);
        assert_eq!(cfg.readers.len(), 1);
        assert_eq!(cfg.readers[0].global_path.as_deref(), Some("~/custom/claude"));
    }

    #[test]
    fn explicit_lock_file_wins() {
        let cfg: KnifeConfig = toml::from_str(
            r#"
[cache]
lock_file = "/tmp/lock.json"
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.cache.resolved_lock_file(),
            Some(PathBuf::from("/tmp/lock.json"))
        );
    }
}

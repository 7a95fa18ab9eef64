use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    futures::future::join_all,
    skillknife_config::Market,
    skillknife_skills::{MarketSkill, parse::read_description, scan::list_bundles},
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    git::{GitClient, clone_url, parse_ls_tree, sanitize_cache_key},
};

/// Directory inside a market repo that holds bundles, when present.
const SKILLS_SUBDIR: &str = "skills";

/// Fetches git-backed markets through a local mirror cache.
///
/// Each market owns `cache_dir/<sanitized git ref>`, so fetches of different
/// markets never touch the same directory.
#[derive(Clone)]
pub struct MarketCatalog {
    git: Arc<dyn GitClient>,
    cache_dir: PathBuf,
}

impl MarketCatalog {
    pub fn new(git: Arc<dyn GitClient>, cache_dir: PathBuf) -> Self {
        Self { git, cache_dir }
    }

    /// Local mirror directory for a git reference.
    pub fn mirror_dir(&self, git_ref: &str) -> PathBuf {
        self.cache_dir.join(sanitize_cache_key(git_ref))
    }

    /// Clone the market on first use, pull on every later call.
    pub async fn sync(&self, market: &Market) -> Result<PathBuf> {
        if market.is_search() || market.git.is_empty() {
            return Err(Error::message(format!(
                "market '{}' is not backed by a git repository",
                market.name
            )));
        }
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let repo_dir = self.mirror_dir(&market.git);
        if repo_dir.exists() {
            self.git.pull(&repo_dir).await?;
        } else {
            let url = clone_url(&market.git);
            info!(market = %market.name, %url, "cloning market");
            self.git.clone_shallow(&url, &repo_dir).await?;
        }
        Ok(repo_dir)
    }

    /// Refresh the mirror and list every bundle it offers.
    pub async fn fetch(&self, market: &Market) -> Result<Vec<MarketSkill>> {
        let repo_dir = self.sync(market).await?;
        let skills_root = repo_dir.join(SKILLS_SUBDIR);
        let prefix = skills_root.is_dir().then_some(SKILLS_SUBDIR);
        let hashes = self.tree_hashes(&repo_dir, prefix).await;

        let skills: Vec<MarketSkill> = list_bundles(if prefix.is_some() {
            &skills_root
        } else {
            &repo_dir
        })
        .into_iter()
        .map(|(name, path)| {
            let subpath = match prefix {
                Some(p) => format!("{p}/{name}"),
                None => name.clone(),
            };
            MarketSkill {
                description: read_description(&path),
                market: market.clone(),
                repo_path: market.git.clone(),
                content_hash: hashes.get(&subpath).cloned(),
                subpath,
                name,
                installs: None,
                install_command: None,
            }
        })
        .collect();

        info!(market = %market.name, count = skills.len(), "fetched market");
        Ok(skills)
    }

    /// Fetch every market concurrently. One market failing does not affect
    /// the others.
    pub async fn fetch_all(&self, markets: &[Market]) -> Vec<(Market, Result<Vec<MarketSkill>>)> {
        let futures = markets
            .iter()
            .filter(|m| !m.is_search())
            .map(|market| async move { (market.clone(), self.fetch(market).await) });
        let results = join_all(futures).await;
        for (market, result) in &results {
            if let Err(e) = result {
                warn!(market = %market.name, error = %e, "market fetch failed");
            }
        }
        results
    }

    /// Flattened catalog of every market that fetched successfully.
    pub async fn fetch_all_skills(&self, markets: &[Market]) -> Vec<MarketSkill> {
        self.fetch_all(markets)
            .await
            .into_iter()
            .filter_map(|(_, result)| result.ok())
            .flatten()
            .collect()
    }

    async fn tree_hashes(&self, repo_dir: &Path, prefix: Option<&str>) -> HashMap<String, String> {
        let pathspec = prefix.map(|p| format!("{p}/"));
        match self.git.ls_tree(repo_dir, pathspec.as_deref()).await {
            Ok(output) => parse_ls_tree(&output),
            Err(e) => {
                warn!(repo = %repo_dir.display(), error = %e, "could not read tree hashes");
                HashMap::new()
            },
        }
    }
}

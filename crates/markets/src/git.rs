use std::{collections::HashMap, path::Path};

use {
    async_trait::async_trait,
    tokio::process::Command,
    tracing::debug,
};

use crate::error::{Context, Error, Result};

/// The handful of git operations a market mirror needs.
#[async_trait]
pub trait GitClient: Send + Sync {
    /// `git clone --depth 1 <url> <dest>`.
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<()>;

    /// `git pull` inside an existing mirror.
    async fn pull(&self, repo_dir: &Path) -> Result<()>;

    /// Raw `git ls-tree HEAD [<prefix>]` output.
    async fn ls_tree(&self, repo_dir: &Path, prefix: Option<&str>) -> Result<String>;
}

/// [`GitClient`] backed by the `git` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".into(),
        }
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str], cwd: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .with_context(|| format!("failed to run {} {}", self.program, args.join(" ")))?;

        let subcommand = args.first().copied().unwrap_or_default();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::git(subcommand, stderr));
        }
        debug!(cwd = %cwd.display(), command = subcommand, "git ok");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitClient for GitCli {
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<()> {
        let parent = dest
            .parent()
            .context("clone destination has no parent directory")?;
        let dest = dest.to_string_lossy().into_owned();
        self.run(&["clone", "--depth", "1", url, dest.as_str()], parent)
            .await
            .map(drop)
    }

    async fn pull(&self, repo_dir: &Path) -> Result<()> {
        self.run(&["pull"], repo_dir).await.map(drop)
    }

    async fn ls_tree(&self, repo_dir: &Path, prefix: Option<&str>) -> Result<String> {
        let mut args = vec!["ls-tree", "HEAD"];
        if let Some(prefix) = prefix {
            args.push(prefix);
        }
        self.run(&args, repo_dir).await
    }
}

/// Cache subdirectory name for a market's git reference.
pub fn sanitize_cache_key(git_ref: &str) -> String {
    git_ref.replace(['/', '\\', ':'], "_")
}

/// Clone URL for a git reference: full URLs and scp-style remotes pass
/// through, `owner/repo` shorthand becomes a GitHub HTTPS URL.
pub fn clone_url(git_ref: &str) -> String {
    if git_ref.contains("://") || git_ref.starts_with("git@") {
        git_ref.to_string()
    } else {
        format!("https://github.com/{git_ref}.git")
    }
}

/// Map of path to tree hash for every `tree` entry in `ls-tree` output.
///
/// Lines look like `040000 tree <hash>\t<path>`.
pub fn parse_ls_tree(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let (meta, path) = line.split_once('\t')?;
            let mut fields = meta.split_whitespace();
            let _mode = fields.next()?;
            if fields.next()? != "tree" {
                return None;
            }
            let hash = fields.next()?;
            Some((path.trim_end_matches('/').to_string(), hash.to_string()))
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_replaces_separators() {
        assert_eq!(sanitize_cache_key("anthropics/skills"), "anthropics_skills");
        assert_eq!(
            sanitize_cache_key("https://gitlab.com/a/b.git"),
            "https___gitlab.com_a_b.git"
        );
        assert_eq!(sanitize_cache_key(r"C:\repos\x"), "C__repos_x");
    }

    #[test]
    fn clone_url_forms() {
        assert_eq!(clone_url("obra/superpowers"), "https://github.com/obra/superpowers.git");
        assert_eq!(clone_url("https://gitlab.com/a/b.git"), "https://gitlab.com/a/b.git");
        assert_eq!(clone_url("git@github.com:a/b.git"), "git@github.com:a/b.git");
    }

    #[test]
    fn ls_tree_keeps_only_trees() {
        let output = "\
040000 tree 1111111111111111111111111111111111111111\tskills/pdf
100644 blob 2222222222222222222222222222222222222222\tskills/README.md
040000 tree 3333333333333333333333333333333333333333\tskills/docx
";
        let hashes = parse_ls_tree(output);
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes["skills/pdf"], "1111111111111111111111111111111111111111");
        assert!(!hashes.contains_key("skills/README.md"));
    }

    #[tokio::test]
    async fn failing_git_reports_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let git = GitCli::default();
        // Not a repository, so `git pull` fails (or git is absent entirely).
        let err = git.pull(tmp.path()).await.unwrap_err();
        match err {
            Error::Git { command, stderr } => {
                assert_eq!(command, "pull");
                assert!(!stderr.is_empty());
            },
            Error::Message { .. } => {},
            other => panic!("unexpected error: {other}"),
        }
    }
}

use std::path::{Path, PathBuf};

use skillknife_config::Reader;

use crate::types::Scope;

/// Expands reader path templates into concrete skill directories.
#[derive(Debug, Clone)]
pub struct PathResolver {
    home: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    /// Resolver bound to the current user's home directory.
    pub fn from_env() -> Self {
        Self::new(skillknife_config::home_dir())
    }

    /// Replace a leading `~` or `~/` with the home directory. Other paths
    /// pass through untouched, as does `~` when no home is known.
    pub fn expand_home(&self, template: &str) -> PathBuf {
        let Some(ref home) = self.home else {
            return PathBuf::from(template);
        };
        if template == "~" {
            return home.clone();
        }
        match template.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(template),
        }
    }

    pub fn global_dir(&self, reader: &Reader) -> PathBuf {
        self.expand_home(&reader.global_path)
    }

    pub fn project_dir(&self, reader: &Reader, root: &Path) -> PathBuf {
        root.join(&reader.project_path)
    }

    /// Directory for `scope`. Project scope requires a workspace root.
    pub fn scope_dir(&self, reader: &Reader, scope: Scope, root: Option<&Path>) -> Option<PathBuf> {
        match scope {
            Scope::Global => Some(self.global_dir(reader)),
            Scope::Project => root.map(|r| self.project_dir(reader, r)),
        }
    }

    /// Every directory to scan for `reader`, global first, then one per
    /// search root in the order given.
    pub fn reader_dirs(&self, reader: &Reader, search_roots: &[PathBuf]) -> Vec<(Scope, PathBuf)> {
        let mut dirs = Vec::with_capacity(1 + search_roots.len());
        dirs.push((Scope::Global, self.global_dir(reader)));
        dirs.extend(
            search_roots
                .iter()
                .map(|root| (Scope::Project, self.project_dir(reader, root))),
        );
        dirs
    }
}

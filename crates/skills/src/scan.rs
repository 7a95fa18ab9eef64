use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {skillknife_config::Reader, tracing::debug};

use crate::{
    metadata::MetadataReader,
    parse::read_description,
    paths::PathResolver,
    types::{Installation, SKILL_MANIFEST, Scope, Skill},
};

/// Walks every reader's global and project directories and builds the local
/// inventory.
pub struct InventoryScanner {
    readers: Vec<Reader>,
    resolver: PathResolver,
    metadata: MetadataReader,
}

impl InventoryScanner {
    pub fn new(readers: Vec<Reader>, resolver: PathResolver, metadata: MetadataReader) -> Self {
        Self {
            readers,
            resolver,
            metadata,
        }
    }

    /// Scan all readers and return skills sorted by name.
    ///
    /// Directories are visited in reader catalog order, global before
    /// project, and project roots in the order given. Bundles sharing a name
    /// merge into one [`Skill`]; its description and metadata come from the
    /// first installation visited. Missing or unreadable directories are
    /// skipped, so a scan never fails.
    pub fn scan(&self, search_roots: &[PathBuf]) -> Vec<Skill> {
        let mut order: Vec<String> = Vec::new();
        let mut by_name: HashMap<String, Vec<Installation>> = HashMap::new();

        for reader in &self.readers {
            for (scope, dir) in self.resolver.reader_dirs(reader, search_roots) {
                for (name, path) in list_bundles(&dir) {
                    let installations = by_name.entry(name.clone()).or_insert_with(|| {
                        order.push(name.clone());
                        Vec::new()
                    });
                    installations.push(Installation {
                        scope,
                        reader_id: reader.id.clone(),
                        path,
                    });
                }
            }
        }

        let mut skills: Vec<Skill> = order
            .into_iter()
            .filter_map(|name| {
                let installations = by_name.remove(&name)?;
                let first = installations.first()?.path.clone();
                Some(Skill {
                    description: read_description(&first),
                    metadata: self.metadata.read(&name, &first),
                    name,
                    installations,
                })
            })
            .collect();

        skills.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        skills
    }

    /// Skills with at least one project-scope installation.
    pub fn project_skills(&self, search_roots: &[PathBuf]) -> Vec<Skill> {
        self.scan(search_roots)
            .into_iter()
            .filter(|s| s.has_scope(Scope::Project))
            .collect()
    }
}

/// Bundle directories directly under `dir`, in file-name order.
///
/// An entry qualifies when it is a directory (or a symlink to one), its name
/// does not start with `.`, and it contains `SKILL.md`.
pub fn list_bundles(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable skills directory");
            }
            return Vec::new();
        },
    };

    let mut bundles: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().to_str()?.to_string();
            if name.starts_with('.') {
                return None;
            }
            let path = entry.path();
            // `is_dir` follows symlinks.
            if !path.is_dir() || !path.join(SKILL_MANIFEST).is_file() {
                return None;
            }
            Some((name, path))
        })
        .collect();
    bundles.sort();
    bundles
}

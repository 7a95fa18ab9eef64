//! Direct installs: copy a bundle out of the market mirror cache and record
//! its provenance next to it.

use std::{
    io,
    path::{Path, PathBuf},
};

use {
    skillknife_common::time::now_rfc3339,
    skillknife_config::Market,
    skillknife_markets::MarketCatalog,
    skillknife_skills::{
        MarketSkill, SKILL_MANIFEST,
        metadata::{InstallMetadataFile, write_install_metadata},
        source::{normalize_repo_url, repo_slug},
    },
    tracing::{debug, info, warn},
};

use crate::error::{Error, Result};

/// Files and directories never copied out of a mirror.
const SKIP_ENTRIES: &[&str] = &[".git"];

pub struct DirectInstaller {
    catalog: MarketCatalog,
}

impl DirectInstaller {
    pub fn new(catalog: MarketCatalog) -> Self {
        Self { catalog }
    }

    /// Copy `skill` into every directory in `targets`, replacing whatever is
    /// there, and write `.openskills.json` into each copy.
    pub async fn install(&self, skill: &MarketSkill, targets: &[PathBuf]) -> Result<()> {
        let slug = repo_slug(&skill.repo_path);
        let mirror = match self.catalog.mirror_dir(&skill.repo_path) {
            dir if dir.exists() => dir,
            _ => {
                let mirror = self.catalog.mirror_dir(&slug);
                if !mirror.exists() {
                    self.catalog.sync(&Market::git(slug.clone(), slug.clone())).await?;
                }
                mirror
            },
        };

        let (subpath, source) = locate_bundle(&mirror, &skill.subpath, &skill.name)
            .ok_or_else(|| {
                Error::validation(format!(
                    "skill '{}' not found in cached mirror of {}",
                    skill.name, skill.repo_path
                ))
            })?;

        let metadata = InstallMetadataFile {
            source: Some(slug.clone()),
            source_type: Some("git".into()),
            repo_url: Some(normalize_repo_url(&skill.repo_path)),
            subpath: Some(subpath),
            installed_at: Some(now_rfc3339()),
            commit_hash: skill.content_hash.clone(),
        };

        for target in targets {
            let (src, dst) = (source.clone(), target.clone());
            tokio::task::spawn_blocking(move || replace_dir(&src, &dst))
                .await
                .map_err(|e| Error::message(format!("copy task failed: {e}")))??;
            write_install_metadata(target, &metadata)?;
            info!(skill = %skill.name, target = %target.display(), "installed skill");
        }
        Ok(())
    }
}

/// Find the bundle for `name` inside a mirror.
///
/// Tries the recorded subpath, then `skills/<name>`, then `<name>` at the
/// root. Returns the subpath that matched and its absolute directory.
pub fn locate_bundle(mirror: &Path, subpath: &str, name: &str) -> Option<(String, PathBuf)> {
    let subpath = subpath.trim_matches('/');
    let candidates = [subpath.to_string(), format!("skills/{name}"), name.to_string()];
    candidates
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|c| {
            let dir = mirror.join(&c);
            (c, dir)
        })
        .find(|(_, dir)| dir.join(SKILL_MANIFEST).is_file())
}

/// Replace `dst` with a recursive copy of `src`.
pub fn replace_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if std::fs::symlink_metadata(dst).is_ok() {
        remove_path(dst)?;
    }
    copy_dir_all(src, dst)
}

/// Recursive copy. Symlinks inside the bundle are followed.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if SKIP_ENTRIES.iter().any(|s| name == *s) {
            continue;
        }
        let from = entry.path();
        let to = dst.join(&name);
        if from.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

fn remove_path(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Delete an installed bundle. Missing targets and broken symlinks are fine;
/// other failures are logged. Returns whether the path is gone.
pub fn delete_installation(path: &Path) -> bool {
    match remove_path(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed skill installation");
            true
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "installation already absent");
            true
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove skill installation");
            false
        },
    }
}

//! Provenance metadata for installed skills.
//!
//! Two on-disk shapes exist: a per-installation `.openskills.json` written by
//! direct installs, and a global lock file maintained by the packaging tool.
//! Both are normalized into [`SkillMetadata`] here, at the read boundary.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use {
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::{
    error::{Context, Result},
    types::{INSTALL_METADATA_FILE, SKILL_MANIFEST, SkillMetadata},
};

/// `.openskills.json` as written next to a directly installed bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallMetadataFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
}

/// The packaging tool's global lock file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub skills: BTreeMap<String, LockEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Path to the manifest inside the source repo, e.g. `skills/pdf/SKILL.md`.
    #[serde(default)]
    pub skill_path: Option<String>,
    #[serde(default)]
    pub skill_folder_hash: Option<String>,
    #[serde(default)]
    pub installed_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub fn normalize_install_file(file: InstallMetadataFile) -> SkillMetadata {
    SkillMetadata {
        source: file.source,
        source_type: file.source_type,
        repo_url: file.repo_url,
        subpath: file.subpath,
        content_hash: file.commit_hash,
        installed_at: file.installed_at,
        updated_at: None,
    }
}

pub fn normalize_lock_entry(entry: &LockEntry) -> SkillMetadata {
    SkillMetadata {
        source: entry.source.clone(),
        source_type: entry.source_type.clone(),
        repo_url: entry.source_url.clone(),
        subpath: entry.skill_path.as_deref().map(skill_dir_of),
        content_hash: entry.skill_folder_hash.clone(),
        installed_at: entry.installed_at.clone(),
        updated_at: entry.updated_at.clone(),
    }
}

/// `skills/pdf/SKILL.md` → `skills/pdf`; a bare `SKILL.md` is the repo root.
fn skill_dir_of(skill_path: &str) -> String {
    let trimmed = skill_path.trim_end_matches('/');
    if trimmed == SKILL_MANIFEST {
        return String::new();
    }
    trimmed
        .strip_suffix(SKILL_MANIFEST)
        .map(|dir| dir.trim_end_matches('/'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Read `.openskills.json` from a bundle directory.
pub fn read_install_metadata(skill_dir: &Path) -> Option<SkillMetadata> {
    let path = skill_dir.join(INSTALL_METADATA_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<InstallMetadataFile>(&raw) {
        Ok(file) => Some(normalize_install_file(file)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring malformed install metadata");
            None
        },
    }
}

/// Write `.openskills.json` into a bundle directory.
pub fn write_install_metadata(skill_dir: &Path, file: &InstallMetadataFile) -> Result<()> {
    let path = skill_dir.join(INSTALL_METADATA_FILE);
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ── Lock file cache ──────────────────────────────────────────────────────────

type CachedLock = (Instant, Option<Arc<LockFile>>);

/// Read-through cache of the global lock file, expiring by wall-clock age.
///
/// A missing or unreadable lock file is cached as `None` for the same TTL.
/// Without a path (no home directory) every read is `None`.
#[derive(Debug)]
pub struct LockFileCache {
    path: Option<PathBuf>,
    ttl: Duration,
    state: Mutex<Option<CachedLock>>,
}

impl LockFileCache {
    pub fn new(path: impl Into<Option<PathBuf>>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            state: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<Arc<LockFile>> {
        let path = self.path.as_deref()?;
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((loaded_at, ref lock)) = *state
            && loaded_at.elapsed() < self.ttl
        {
            return lock.clone();
        }
        let lock = load_lock_file(path).map(Arc::new);
        *state = Some((Instant::now(), lock.clone()));
        lock
    }

    /// Drop the cached copy so the next read goes to disk.
    pub fn invalidate(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *state = None;
    }
}

fn load_lock_file(path: &Path) -> Option<LockFile> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read skill lock file");
            return None;
        },
    };
    match serde_json::from_str(&raw) {
        Ok(lock) => Some(lock),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed skill lock file");
            None
        },
    }
}

/// Resolves provenance for an installed bundle.
///
/// The per-installation file wins; the lock entry for the skill name is the
/// fallback.
#[derive(Debug)]
pub struct MetadataReader {
    lock: LockFileCache,
}

impl MetadataReader {
    pub fn new(lock: LockFileCache) -> Self {
        Self { lock }
    }

    pub fn read(&self, name: &str, skill_dir: &Path) -> Option<SkillMetadata> {
        read_install_metadata(skill_dir).or_else(|| {
            let lock = self.lock.get()?;
            lock.skills.get(name).map(normalize_lock_entry)
        })
    }
}

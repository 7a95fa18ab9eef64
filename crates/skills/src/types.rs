use std::{fmt, path::PathBuf};

use {
    serde::{Deserialize, Serialize},
    skillknife_config::Market,
};

/// File whose presence marks a directory as a skill bundle.
pub const SKILL_MANIFEST: &str = "SKILL.md";

/// Per-installation provenance file written by direct installs.
pub const INSTALL_METADATA_FILE: &str = ".openskills.json";

// ── Local inventory ──────────────────────────────────────────────────────────

/// Installation locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// User-wide, under the reader's global directory.
    Global,
    /// Workspace-relative, under `<root>/<reader project path>`.
    Project,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::Project => "project",
        })
    }
}

/// One directory where a skill bundle exists for a given reader and scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub scope: Scope,
    pub reader_id: String,
    /// Absolute path to the bundle directory.
    pub path: PathBuf,
}

/// A locally installed skill: a view over every installation sharing a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Directory base name; the identity key.
    pub name: String,
    pub description: Option<String>,
    /// Never empty.
    pub installations: Vec<Installation>,
    pub metadata: Option<SkillMetadata>,
}

impl Skill {
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.installations.iter().any(|i| i.scope == scope)
    }

    /// Case-insensitive substring match on name or description. Blank text
    /// matches every skill.
    pub fn matches(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn installations_in(&self, scope: Scope) -> impl Iterator<Item = &Installation> {
        self.installations.iter().filter(move |i| i.scope == scope)
    }

    /// Content or commit hash recorded at install time, if any.
    pub fn installed_hash(&self) -> Option<&str> {
        self.metadata.as_ref()?.content_hash.as_deref()
    }
}

/// Canonical provenance record, normalized from either metadata file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub source: Option<String>,
    pub source_type: Option<String>,
    pub repo_url: Option<String>,
    /// Bundle directory relative to the repository root.
    pub subpath: Option<String>,
    pub content_hash: Option<String>,
    pub installed_at: Option<String>,
    pub updated_at: Option<String>,
}

// ── Market side ──────────────────────────────────────────────────────────────

/// A skill offered by a market. Produced fresh on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSkill {
    pub name: String,
    pub description: Option<String>,
    pub market: Market,
    /// `owner/repo` or a git URL.
    pub repo_path: String,
    /// Bundle directory relative to the repository root.
    pub subpath: String,
    pub content_hash: Option<String>,
    /// Install counter reported by the scraped search market.
    #[serde(default)]
    pub installs: Option<u64>,
    /// Literal install command scraped from a detail page.
    #[serde(default)]
    pub install_command: Option<String>,
}

/// Result of comparing one installed skill with its market counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub skill: Skill,
    pub market_skill: MarketSkill,
    pub has_update: bool,
    pub installed_hash: Option<String>,
    pub latest_hash: Option<String>,
}

// ── Profiles ─────────────────────────────────────────────────────────────────

/// A named snapshot of project-scope skills and where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub created_at: String,
    pub skills: Vec<ProfileSkill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSkill {
    pub name: String,
    pub install_source: String,
}

// ── Identity by name ─────────────────────────────────────────────────────────

/// Anything identified by a flat skill name.
pub trait SkillName {
    fn skill_name(&self) -> &str;
}

impl SkillName for Skill {
    fn skill_name(&self) -> &str {
        &self.name
    }
}

impl SkillName for MarketSkill {
    fn skill_name(&self) -> &str {
        &self.name
    }
}

impl SkillName for ProfileSkill {
    fn skill_name(&self) -> &str {
        &self.name
    }
}

impl SkillName for String {
    fn skill_name(&self) -> &str {
        self
    }
}

impl<T: SkillName + ?Sized> SkillName for &T {
    fn skill_name(&self) -> &str {
        (**self).skill_name()
    }
}

//! Local skill inventory: path resolution, scanning, provenance metadata,
//! and reconciliation against market catalogs.
//!
//! Skills are directories containing a `SKILL.md` file, optionally opening
//! with YAML frontmatter. A skill's identity is its directory name.

pub mod error;
pub mod metadata;
pub mod parse;
pub mod paths;
pub mod reconcile;
pub mod scan;
pub mod source;
pub mod types;

pub use {
    error::{Error, Result},
    metadata::{LockFileCache, MetadataReader},
    paths::PathResolver,
    scan::InventoryScanner,
    source::{SkillRef, resolve_install_source},
    types::{
        INSTALL_METADATA_FILE, Installation, MarketSkill, Profile, ProfileSkill, SKILL_MANIFEST,
        Scope, Skill, SkillMetadata, SkillName, UpdateInfo,
    },
};

//! Remote skill catalogs: git-backed markets mirrored into a local cache and
//! the scraped skills.sh search.

pub mod catalog;
pub mod error;
pub mod git;
pub mod hydrate;
pub mod skills_sh;

pub use {
    catalog::MarketCatalog,
    error::{Error, Result},
    git::{GitCli, GitClient},
    hydrate::{DetailSource, DetailUpdate, Generation, GenerationGuard, Hydrator},
    skills_sh::{SearchResult, SkillDetails, SkillsShClient},
};

//! Install-source resolution for the two skill shapes the orchestrator
//! accepts.

use skillknife_config::Market;

use crate::types::{MarketSkill, ProfileSkill, Skill, SkillName};

const GITHUB_PREFIX: &str = "https://github.com/";

/// Either a locally scanned skill or a market entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillRef {
    Local(Skill),
    Market(MarketSkill),
}

impl SkillRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Local(skill) => &skill.name,
            Self::Market(skill) => &skill.name,
        }
    }

    /// The repository locator the packaging tool should install from.
    pub fn install_source(&self) -> String {
        resolve_install_source(self)
    }

    /// `[<locator>, --skill, <name>]`, the source half of an install argv.
    pub fn install_args(&self) -> Vec<String> {
        let skill_name = match self {
            Self::Market(skill) => skill
                .subpath
                .rsplit('/')
                .find(|s| !s.is_empty())
                .unwrap_or(&skill.name)
                .to_string(),
            Self::Local(skill) => skill.name.clone(),
        };
        vec![self.install_source(), "--skill".into(), skill_name]
    }

    /// A profile entry, installable from its recorded locator.
    ///
    /// `None` when the locator is a bare name rather than a repository
    /// (`owner/repo`, a URL or an scp-style remote).
    pub fn from_profile(entry: &ProfileSkill) -> Option<Self> {
        if !entry.install_source.contains('/') {
            return None;
        }
        let slug = repo_slug(&entry.install_source);
        Some(Self::Market(MarketSkill {
            name: entry.name.clone(),
            description: None,
            market: Market::git(slug.clone(), slug),
            repo_path: entry.install_source.clone(),
            subpath: entry.name.clone(),
            content_hash: None,
            installs: None,
            install_command: None,
        }))
    }

    /// Market-shaped view for installers that need a repository and a
    /// subpath. `None` for local skills with no recorded provenance.
    pub fn to_market_skill(&self) -> Option<MarketSkill> {
        match self {
            Self::Market(skill) => Some(skill.clone()),
            Self::Local(skill) => {
                let locator = self.install_source();
                if locator == skill.name {
                    return None;
                }
                let slug = repo_slug(&locator);
                let subpath = skill
                    .metadata
                    .as_ref()
                    .and_then(|m| m.subpath.clone())
                    .unwrap_or_else(|| skill.name.clone());
                Some(MarketSkill {
                    name: skill.name.clone(),
                    description: skill.description.clone(),
                    market: Market::git(slug.clone(), slug),
                    repo_path: locator,
                    subpath,
                    content_hash: None,
                    installs: None,
                    install_command: None,
                })
            },
        }
    }
}

impl SkillName for SkillRef {
    fn skill_name(&self) -> &str {
        self.name()
    }
}

/// Resolve the install locator for either shape.
///
/// Market skills expand `owner/repo` shorthand to a GitHub URL without a
/// `.git` suffix. Local skills use the recorded repository URL, drop a
/// `/tree/...` deep-link tail, and fall back to the bare skill name when no
/// provenance was recorded.
pub fn resolve_install_source(skill: &SkillRef) -> String {
    match skill {
        SkillRef::Market(market_skill) => normalize_repo_url(&market_skill.repo_path),
        SkillRef::Local(local) => {
            let recorded = local
                .metadata
                .as_ref()
                .and_then(|m| m.repo_url.as_deref().or(m.source.as_deref()))
                .filter(|url| !url.is_empty());
            match recorded {
                Some(url) => strip_tree_suffix(url).to_string(),
                None => local.name.clone(),
            }
        },
    }
}

/// Expand `owner/repo` to `https://github.com/owner/repo`, leaving URLs and
/// scp-style remotes alone, and drop a trailing `.git`.
pub fn normalize_repo_url(repo: &str) -> String {
    let repo = repo.trim().trim_end_matches('/');
    let url = if repo.starts_with("http") || repo.starts_with("git@") {
        repo.to_string()
    } else {
        format!("{GITHUB_PREFIX}{repo}")
    };
    url.strip_suffix(".git").map(str::to_string).unwrap_or(url)
}

/// Reverse of [`normalize_repo_url`] for GitHub: `https://github.com/a/b`
/// becomes `a/b`. Other locators are returned unchanged.
pub fn repo_slug(locator: &str) -> String {
    let trimmed = strip_tree_suffix(locator.trim().trim_end_matches('/'));
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed
        .strip_prefix(GITHUB_PREFIX)
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
        .unwrap_or(trimmed)
        .to_string()
}

fn strip_tree_suffix(url: &str) -> &str {
    match url.find("/tree/") {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::{Installation, Scope, SkillMetadata},
        std::path::PathBuf,
    };

    fn market_skill(repo: &str, subpath: &str) -> MarketSkill {
        MarketSkill {
            name: "pdf".into(),
            description: None,
            market: Market::git("Anthropic Official", repo),
            repo_path: repo.into(),
            subpath: subpath.into(),
            content_hash: None,
            installs: None,
            install_command: None,
        }
    }

    fn local_skill(metadata: Option<SkillMetadata>) -> Skill {
        Skill {
            name: "pdf".into(),
            description: None,
            installations: vec![Installation {
                scope: Scope::Global,
                reader_id: "claude-code".into(),
                path: PathBuf::from("/home/u/.claude/skills/pdf"),
            }],
            metadata,
        }
    }

    #[test]
    fn market_shorthand_expands_to_github() {
        let skill = SkillRef::Market(market_skill("anthropics/skills", "skills/pdf"));
        assert_eq!(
            skill.install_args(),
            vec!["https://github.com/anthropics/skills", "--skill", "pdf"]
        );
    }

    #[test]
    fn market_git_suffix_is_dropped() {
        let skill = SkillRef::Market(market_skill(
            "https://gitlab.com/acme/skills.git",
            "tools/lint",
        ));
        assert_eq!(skill.install_source(), "https://gitlab.com/acme/skills");
        assert_eq!(skill.install_args()[2], "lint");
    }

    #[test]
    fn local_prefers_repo_url_and_strips_deep_link() {
        let skill = SkillRef::Local(local_skill(Some(SkillMetadata {
            repo_url: Some("https://github.com/anthropics/skills/tree/main/skills/pdf".into()),
            ..Default::default()
        })));
        assert_eq!(skill.install_source(), "https://github.com/anthropics/skills");
        assert_eq!(skill.install_args()[2], "pdf");
    }

    #[test]
    fn local_without_provenance_falls_back_to_name() {
        assert_eq!(SkillRef::Local(local_skill(None)).install_source(), "pdf");
    }

    #[test]
    fn profile_entries_install_by_locator() {
        let entry = ProfileSkill {
            name: "brainstorming".into(),
            install_source: "https://github.com/obra/superpowers".into(),
        };
        let skill = SkillRef::from_profile(&entry).unwrap();
        assert_eq!(skill.install_args(), vec![
            "https://github.com/obra/superpowers",
            "--skill",
            "brainstorming"
        ]);
        let SkillRef::Market(market_skill) = skill else {
            panic!("profile entries are market-shaped");
        };
        assert_eq!(market_skill.market.git, "obra/superpowers");
    }

    #[test]
    fn bare_profile_locator_has_nothing_to_install() {
        let entry = ProfileSkill {
            name: "notes".into(),
            install_source: "notes".into(),
        };
        assert!(SkillRef::from_profile(&entry).is_none());
        assert!(
            SkillRef::from_profile(&ProfileSkill {
                name: "notes".into(),
                install_source: "acme/notes".into(),
            })
            .is_some()
        );
    }

    #[test]
    fn local_market_view_uses_recorded_subpath() {
        let skill = SkillRef::Local(local_skill(Some(SkillMetadata {
            repo_url: Some("https://github.com/anthropics/skills".into()),
            subpath: Some("skills/pdf".into()),
            ..Default::default()
        })));
        let view = skill.to_market_skill().unwrap();
        assert_eq!(view.subpath, "skills/pdf");
        assert_eq!(view.repo_path, "https://github.com/anthropics/skills");
        assert!(SkillRef::Local(local_skill(None)).to_market_skill().is_none());
    }

    #[test]
    fn slug_reverses_github_urls() {
        assert_eq!(repo_slug("https://github.com/obra/superpowers"), "obra/superpowers");
        assert_eq!(repo_slug("https://github.com/obra/superpowers.git/"), "obra/superpowers");
        assert_eq!(repo_slug("obra/superpowers"), "obra/superpowers");
        assert_eq!(repo_slug("git@gitlab.com:a/b.git"), "git@gitlab.com:a/b");
    }
}

//! Market definitions: built-in git catalogs, the scraped global search, and
//! the name-keyed merge with user markets.

use serde::{Deserialize, Serialize};

/// Display name of the sentinel market backed by the scraped search site.
pub const GLOBAL_SEARCH_MARKET: &str = "skills.sh";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// A git repository mirrored locally and scanned for bundles.
    #[default]
    Git,
    /// The scraped global search; `git` is empty.
    Search,
}

impl MarketKind {
    fn is_git(&self) -> bool {
        *self == Self::Git
    }
}

/// A named remote catalog of skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub name: String,
    /// `owner/repo` shorthand or a full git URL.
    #[serde(default)]
    pub git: String,
    #[serde(default, skip_serializing_if = "MarketKind::is_git")]
    pub kind: MarketKind,
}

impl Market {
    pub fn git(name: impl Into<String>, git: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            git: git.into(),
            kind: MarketKind::Git,
        }
    }

    /// The virtual market representing the scraped global search.
    pub fn global_search() -> Self {
        Self {
            name: GLOBAL_SEARCH_MARKET.into(),
            git: String::new(),
            kind: MarketKind::Search,
        }
    }

    pub fn is_search(&self) -> bool {
        self.kind == MarketKind::Search
    }
}

/// Built-in git markets, immutable at runtime.
pub fn default_markets() -> Vec<Market> {
    vec![
        Market::git("Anthropic Official", "anthropics/skills"),
        Market::git("Superpowers", "obra/superpowers"),
        Market::git("Vercel Labs", "vercel-labs/agent-browser"),
        Market::git("ComposioHQ Awesome", "ComposioHQ/awesome-claude-skills"),
    ]
}

/// Merge user markets over the built-ins by name.
///
/// A user market with a built-in's name replaces it in place; other user
/// markets are appended in the order given.
pub fn merge_markets(builtins: Vec<Market>, user: &[Market]) -> Vec<Market> {
    let mut markets = builtins;
    for market in user {
        match markets.iter_mut().find(|m| m.name == market.name) {
            Some(existing) => *existing = market.clone(),
            None => markets.push(market.clone()),
        }
    }
    markets
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_market_overrides_builtin_by_name() {
        let merged = merge_markets(default_markets(), &[Market::git(
            "Superpowers",
            "me/superpowers-fork",
        )]);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged[1].name, "Superpowers");
        assert_eq!(merged[1].git, "me/superpowers-fork");
    }

    #[test]
    fn new_user_markets_are_appended_in_order() {
        let merged = merge_markets(default_markets(), &[
            Market::git("Team", "acme/skills"),
            Market::git("Mine", "me/skills"),
        ]);
        let names: Vec<_> = merged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names[4..], ["Team", "Mine"]);
    }

    #[test]
    fn git_kind_is_omitted_from_json() {
        let json = serde_json::to_string(&Market::git("A", "a/b")).unwrap();
        assert_eq!(json, r#"{"name":"A","git":"a/b"}"#);
        let back: Market = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, MarketKind::Git);
        assert!(Market::global_search().is_search());
    }
}

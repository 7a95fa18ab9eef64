use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    skillknife_config::Market,
    skillknife_skills::Profile,
    tracing::info,
};

use crate::{
    document::{load_or_default, save_atomic},
    error::Result,
};

const MARKETS_FILE: &str = "markets.json";
const PROFILES_FILE: &str = "profiles.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct MarketsDoc {
    #[serde(default)]
    markets: Vec<Market>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfilesDoc {
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDoc {
    #[serde(default)]
    preferred_agents: Vec<String>,
}

/// JSON documents under one data directory.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted at [`skillknife_config::data_dir`].
    pub fn open_default() -> Self {
        Self::new(skillknife_config::data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Markets ──────────────────────────────────────────────────────────────

    /// User-added markets, in the order they were saved.
    pub fn user_markets(&self) -> Vec<Market> {
        load_or_default::<MarketsDoc>(&self.dir.join(MARKETS_FILE)).markets
    }

    pub fn save_user_markets(&self, markets: &[Market]) -> Result<()> {
        save_atomic(&self.dir.join(MARKETS_FILE), &MarketsDoc {
            markets: markets.to_vec(),
        })
    }

    // ── Profiles ─────────────────────────────────────────────────────────────

    pub fn profiles(&self) -> BTreeMap<String, Profile> {
        load_or_default::<ProfilesDoc>(&self.dir.join(PROFILES_FILE)).profiles
    }

    pub fn profile(&self, name: &str) -> Option<Profile> {
        self.profiles().remove(name)
    }

    /// Insert or replace the profile with `profile.name`.
    pub fn save_profile(&self, profile: Profile) -> Result<()> {
        let mut doc: ProfilesDoc = load_or_default(&self.dir.join(PROFILES_FILE));
        info!(profile = %profile.name, skills = profile.skills.len(), "saving profile");
        doc.profiles.insert(profile.name.clone(), profile);
        save_atomic(&self.dir.join(PROFILES_FILE), &doc)
    }

    /// Returns whether a profile by that name existed.
    pub fn delete_profile(&self, name: &str) -> Result<bool> {
        let mut doc: ProfilesDoc = load_or_default(&self.dir.join(PROFILES_FILE));
        if doc.profiles.remove(name).is_none() {
            return Ok(false);
        }
        save_atomic(&self.dir.join(PROFILES_FILE), &doc)?;
        Ok(true)
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    pub fn preferred_agents(&self) -> Vec<String> {
        load_or_default::<SettingsDoc>(&self.dir.join(SETTINGS_FILE)).preferred_agents
    }

    pub fn save_preferred_agents(&self, agents: &[String]) -> Result<()> {
        save_atomic(&self.dir.join(SETTINGS_FILE), &SettingsDoc {
            preferred_agents: agents.to_vec(),
        })
    }
}

//! Pure set arithmetic between the local inventory and market catalogs.
//! Identity is the flat skill name throughout.

use std::collections::HashSet;

use crate::types::{MarketSkill, Profile, ProfileSkill, Skill, SkillName, UpdateInfo};

/// True only when both hashes are known and differ.
pub fn has_update(installed: Option<&str>, latest: Option<&str>) -> bool {
    matches!((installed, latest), (Some(i), Some(l)) if i != l)
}

/// Pair each installed skill with the first market skill of the same name.
///
/// Installed skills with no market counterpart are left out, as are market
/// skills that are not installed. Output follows `local` order.
pub fn reconcile(local: &[Skill], market: &[MarketSkill]) -> Vec<UpdateInfo> {
    local
        .iter()
        .filter_map(|skill| {
            let market_skill = market.iter().find(|m| m.name == skill.name)?;
            let installed_hash = skill.installed_hash().map(str::to_string);
            let latest_hash = market_skill.content_hash.clone();
            Some(UpdateInfo {
                has_update: has_update(installed_hash.as_deref(), latest_hash.as_deref()),
                skill: skill.clone(),
                market_skill: market_skill.clone(),
                installed_hash,
                latest_hash,
            })
        })
        .collect()
}

/// Local state of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillState {
    NotInstalled,
    Current,
    /// Installed, and the market carries a different known hash.
    Stale,
}

/// Classify a catalog entry against the local inventory by name.
pub fn classify(market_skill: &MarketSkill, installed: &[Skill]) -> SkillState {
    match installed.iter().find(|s| s.name == market_skill.name) {
        None => SkillState::NotInstalled,
        Some(local) if has_update(local.installed_hash(), market_skill.content_hash.as_deref()) => {
            SkillState::Stale
        },
        Some(_) => SkillState::Current,
    }
}

fn names<T: SkillName>(items: &[T]) -> HashSet<&str> {
    items.iter().map(SkillName::skill_name).collect()
}

/// Visible items whose name is not installed.
pub fn install_candidates<'a, T: SkillName>(visible: &'a [T], installed: &[Skill]) -> Vec<&'a T> {
    let installed = names(installed);
    visible
        .iter()
        .filter(|item| !installed.contains(item.skill_name()))
        .collect()
}

/// Installed skills whose name is visible.
pub fn uninstall_candidates<'a, T: SkillName>(
    visible: &[T],
    installed: &'a [Skill],
) -> Vec<&'a Skill> {
    let visible = names(visible);
    installed
        .iter()
        .filter(|skill| visible.contains(skill.name.as_str()))
        .collect()
}

/// What it takes to make the project match a saved profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_install: Vec<ProfileSkill>,
    pub to_remove: Vec<Skill>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_remove.is_empty()
    }
}

pub fn plan_profile_sync(profile: &Profile, project_skills: &[Skill]) -> SyncPlan {
    let present = names(project_skills);
    let wanted = names(&profile.skills);
    SyncPlan {
        to_install: profile
            .skills
            .iter()
            .filter(|s| !present.contains(s.name.as_str()))
            .cloned()
            .collect(),
        to_remove: project_skills
            .iter()
            .filter(|s| !wanted.contains(s.name.as_str()))
            .cloned()
            .collect(),
    }
}

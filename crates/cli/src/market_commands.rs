use std::{sync::Arc, time::Duration};

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    skillknife_config::{Market, default_markets},
    skillknife_markets::{Generation, Hydrator},
    skillknife_skills::{
        MarketSkill, Skill,
        reconcile::{SkillState, classify},
    },
    tokio::sync::mpsc,
};

use crate::app::App;

#[derive(Subcommand)]
pub enum MarketsAction {
    /// List built-in and user markets.
    List,
    /// Add a git market, or override a built-in one by name.
    Add {
        name: String,
        /// `owner/repo` shorthand or a git URL.
        git: String,
    },
    /// Remove a user market.
    Remove { name: String },
}

pub fn handle_markets(app: &App, action: MarketsAction) -> Result<()> {
    match action {
        MarketsAction::List => {
            let user = app.store.user_markets();
            for market in app.markets() {
                let origin = if market.is_search() {
                    "search"
                } else if user.iter().any(|m| m.name == market.name) {
                    "user"
                } else {
                    "built-in"
                };
                println!("  {:<24} {:<9} {}", market.name, origin, market.git);
            }
        },
        MarketsAction::Add { name, git } => {
            if name.eq_ignore_ascii_case(skillknife_config::markets::GLOBAL_SEARCH_MARKET) {
                bail!("'{name}' is reserved");
            }
            let mut user = app.store.user_markets();
            match user.iter_mut().find(|m| m.name == name) {
                Some(existing) => existing.git = git,
                None => user.push(Market::git(name.clone(), git)),
            }
            app.store.save_user_markets(&user)?;
            println!("Saved market '{name}'");
        },
        MarketsAction::Remove { name } => {
            let mut user = app.store.user_markets();
            let before = user.len();
            user.retain(|m| m.name != name);
            if user.len() == before {
                if default_markets().iter().any(|m| m.name == name) {
                    bail!("'{name}' is built in and cannot be removed");
                }
                bail!("no user market named '{name}'");
            }
            app.store.save_user_markets(&user)?;
            println!("Removed market '{name}'");
        },
    }
    Ok(())
}

/// Fetch one market and show each skill with its local state.
pub async fn show_market(app: &App, name: &str) -> Result<()> {
    let market = app.market(name)?;
    let skills = if market.is_search() {
        app.search_client()?
            .featured()
            .await?
            .into_iter()
            .map(|r| r.into_market_skill())
            .collect()
    } else {
        app.catalog.fetch(&market).await?
    };
    let installed = app.scan();
    print_market_skills(&skills, &installed);
    Ok(())
}

pub async fn search(app: &App, query: &str, details: bool) -> Result<()> {
    let client = app.search_client()?;
    let mut skills: Vec<MarketSkill> = client
        .search(query)
        .await?
        .into_iter()
        .map(|r| r.into_market_skill())
        .collect();
    if skills.is_empty() {
        println!("No results for '{query}'.");
        return Ok(());
    }

    if details {
        let generation = Generation::default();
        let guard = generation.advance();
        let cancel = app.cancel.clone();
        let hydrator = Hydrator::new(
            Arc::new(client),
            Duration::from_millis(app.config.search.hydrate_delay_ms),
        );
        let (tx, mut rx) = mpsc::channel(16);
        let snapshot = skills.clone();
        let collect = async {
            let mut updates = Vec::new();
            while let Some(update) = rx.recv().await {
                updates.push(update);
            }
            updates
        };
        let relevant = move || guard.is_current() && !cancel.is_cancelled();
        let (_, updates) = tokio::join!(hydrator.hydrate(&snapshot, tx, relevant), collect);
        for update in &updates {
            update.apply(&mut skills);
        }
    }

    print_market_skills(&skills, &app.scan());
    Ok(())
}

pub async fn featured(app: &App) -> Result<()> {
    let skills: Vec<MarketSkill> = app
        .search_client()?
        .featured()
        .await?
        .into_iter()
        .map(|r| r.into_market_skill())
        .collect();
    print_market_skills(&skills, &app.scan());
    Ok(())
}

fn print_market_skills(skills: &[MarketSkill], installed: &[Skill]) {
    if skills.is_empty() {
        println!("No skills.");
        return;
    }
    for skill in skills {
        let state = match classify(skill, installed) {
            SkillState::Stale => "update",
            SkillState::Current => "installed",
            SkillState::NotInstalled => "",
        };
        let installs = skill
            .installs
            .map(|n| format!("{n} installs"))
            .unwrap_or_default();
        println!(
            "  {:<32} {:<9} {:<14} {}",
            skill.name,
            state,
            installs,
            skill.description.as_deref().unwrap_or("")
        );
        if let Some(ref command) = skill.install_command {
            println!("      {command}");
        }
    }
}

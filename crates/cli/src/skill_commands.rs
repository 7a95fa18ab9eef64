use {
    anyhow::{Context, Result, bail},
    clap::Args,
    skillknife_markets::SearchResult,
    skillknife_skills::{
        MarketSkill, SKILL_MANIFEST, Scope, Skill, SkillRef,
        parse::strip_frontmatter,
        reconcile::{install_candidates, reconcile, uninstall_candidates},
    },
};

use crate::app::{App, print_report, progress_printer};

/// Scope selection shared by install-style commands. Project is the default.
#[derive(Args, Debug, Clone, Copy)]
pub struct ScopeArgs {
    /// Target the user-wide directories.
    #[arg(long, short = 'g')]
    pub global: bool,
}

impl ScopeArgs {
    pub fn scope(self) -> Scope {
        if self.global {
            Scope::Global
        } else {
            Scope::Project
        }
    }
}

/// Optional scope filter for removals: all scopes unless one is named.
#[derive(Args, Debug, Clone, Copy)]
pub struct ScopeFilter {
    #[arg(long, conflicts_with = "project")]
    pub global: bool,
    #[arg(long)]
    pub project: bool,
}

impl ScopeFilter {
    pub fn scope(self) -> Option<Scope> {
        match (self.global, self.project) {
            (true, _) => Some(Scope::Global),
            (_, true) => Some(Scope::Project),
            _ => None,
        }
    }
}

pub fn list(app: &App, json: bool, filter: Option<&str>) -> Result<()> {
    let mut skills = app.scan();
    if let Some(text) = filter {
        skills.retain(|s| s.matches(text));
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&skills)?);
        return Ok(());
    }
    if skills.is_empty() {
        match filter {
            Some(text) => println!("No installed skills match '{text}'."),
            None => println!("No skills installed."),
        }
        return Ok(());
    }
    for skill in &skills {
        let description = skill.description.as_deref().unwrap_or("");
        println!("  {:<32} {:<24} {description}", skill.name, installation_tags(app, skill));
    }
    Ok(())
}

/// Installations, recorded source and `SKILL.md` body of one skill.
pub fn show(app: &App, name: &str) -> Result<()> {
    let skill = app
        .scan()
        .into_iter()
        .find(|s| s.name == name)
        .with_context(|| format!("skill '{name}' is not installed"))?;

    println!("{}", skill.name);
    if let Some(ref description) = skill.description {
        println!("{description}");
    }
    println!();
    println!("Installed at:");
    for installation in &skill.installations {
        let reader = app
            .readers
            .iter()
            .find(|r| r.id == installation.reader_id)
            .map_or(installation.reader_id.as_str(), |r| r.name.as_str());
        println!(
            "  {:<8} {:<28} {}",
            installation.scope.to_string(),
            reader,
            installation.path.display()
        );
    }
    let source = skill
        .metadata
        .as_ref()
        .and_then(|m| m.repo_url.as_deref().or(m.source.as_deref()));
    println!("Source: {}", source.unwrap_or("not recorded"));
    if let Some(hash) = skill.installed_hash() {
        println!("Hash:   {}", short_hash(Some(hash)));
    }

    let Some(first) = skill.installations.first() else {
        return Ok(());
    };
    let manifest = first.path.join(SKILL_MANIFEST);
    match std::fs::read_to_string(&manifest) {
        Ok(content) => {
            println!();
            println!("{}", strip_frontmatter(&content).trim_end());
        },
        Err(e) => println!("\n(could not read {}: {e})", manifest.display()),
    }
    Ok(())
}

pub fn readers(app: &App) {
    for reader in &app.readers {
        println!(
            "  {:<16} {:<4} {:<28} {:<32} {}",
            reader.id, reader.short_name, reader.name, reader.global_path, reader.project_path
        );
    }
}

/// `G:CC P:CU`, one tag per installation.
fn installation_tags(app: &App, skill: &Skill) -> String {
    skill
        .installations
        .iter()
        .map(|i| {
            let short = app
                .readers
                .iter()
                .find(|r| r.id == i.reader_id)
                .map_or(i.reader_id.as_str(), |r| r.short_name.as_str());
            let scope = match i.scope {
                Scope::Global => 'G',
                Scope::Project => 'P',
            };
            format!("{scope}:{short}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find `skill` in `market`. For the search market, `skill` is
/// `owner/repo/name`.
pub async fn resolve_market_skill(app: &App, market: &str, skill: &str) -> Result<MarketSkill> {
    let market = app.market(market)?;
    if market.is_search() {
        let (repo, name) = skill
            .rsplit_once('/')
            .filter(|(repo, _)| repo.contains('/'))
            .with_context(|| {
                format!("expected owner/repo/name for {}, got '{skill}'", market.name)
            })?;
        return Ok(SearchResult {
            id: name.to_string(),
            name: name.to_string(),
            installs: 0,
            top_source: repo.to_string(),
        }
        .into_market_skill());
    }
    app.catalog
        .fetch(&market)
        .await?
        .into_iter()
        .find(|s| s.name == skill)
        .with_context(|| format!("skill '{skill}' not found in market '{}'", market.name))
}

pub async fn install(
    app: &App,
    market: &str,
    skill: &str,
    scope: ScopeArgs,
    agents: &[String],
) -> Result<()> {
    let market_skill = resolve_market_skill(app, market, skill).await?;
    let readers = app.target_readers(agents)?;
    app.orchestrator
        .install(&SkillRef::Market(market_skill), scope.scope(), &readers)
        .await?;
    println!("Installed {skill} ({})", scope.scope());
    Ok(())
}

pub async fn uninstall(app: &App, name: &str, filter: ScopeFilter) -> Result<()> {
    let skill = app
        .scan()
        .into_iter()
        .find(|s| s.name == name)
        .with_context(|| format!("skill '{name}' is not installed"))?;
    app.orchestrator.uninstall_skill(&skill, filter.scope()).await?;
    println!("Uninstalled {name}");
    Ok(())
}

async fn visible_market_skills(
    app: &App,
    market: &str,
    filter: Option<&str>,
) -> Result<Vec<MarketSkill>> {
    let market = app.market(market)?;
    if market.is_search() {
        bail!("batch operations need a git market, not {}", market.name);
    }
    let needle = filter.map(str::to_lowercase);
    Ok(app
        .catalog
        .fetch(&market)
        .await?
        .into_iter()
        .filter(|s| {
            needle
                .as_deref()
                .is_none_or(|n| s.name.to_lowercase().contains(n))
        })
        .collect())
}

pub async fn install_all(
    app: &App,
    market: &str,
    filter: Option<&str>,
    scope: ScopeArgs,
    agents: &[String],
) -> Result<()> {
    let visible = visible_market_skills(app, market, filter).await?;
    let installed = app.scan();
    let items: Vec<SkillRef> = install_candidates(&visible, &installed)
        .into_iter()
        .map(|s| SkillRef::Market(s.clone()))
        .collect();
    if items.is_empty() {
        println!("Nothing to install.");
        return Ok(());
    }
    let readers = app.target_readers(agents)?;

    let (tx, printer) = progress_printer();
    let report = app
        .orchestrator
        .install_all(&items, scope.scope(), &readers, Some(&tx), &app.cancel)
        .await;
    drop(tx);
    let _ = printer.await;
    print_report("Installed", &report);
    Ok(())
}

pub async fn uninstall_all(
    app: &App,
    market: &str,
    filter: Option<&str>,
    scope: ScopeFilter,
) -> Result<()> {
    let visible = visible_market_skills(app, market, filter).await?;
    let installed = app.scan();
    let targets: Vec<Skill> = uninstall_candidates(&visible, &installed)
        .into_iter()
        .filter(|s| scope.scope().is_none_or(|sc| s.has_scope(sc)))
        .cloned()
        .collect();
    if targets.is_empty() {
        println!("Nothing to uninstall.");
        return Ok(());
    }

    let (tx, printer) = progress_printer();
    let report = app
        .orchestrator
        .uninstall_all(&targets, scope.scope(), Some(&tx), &app.cancel)
        .await;
    drop(tx);
    let _ = printer.await;
    print_report("Uninstalled", &report);
    Ok(())
}

async fn pending_updates(app: &App) -> Vec<skillknife_skills::UpdateInfo> {
    let git_markets: Vec<_> = app.markets().into_iter().filter(|m| !m.is_search()).collect();
    let market_skills = app.catalog.fetch_all_skills(&git_markets).await;
    reconcile(&app.scan(), &market_skills)
}

pub async fn check(app: &App) -> Result<()> {
    let updates = pending_updates(app).await;
    let pending: Vec<_> = updates.iter().filter(|u| u.has_update).collect();
    if pending.is_empty() {
        println!("All {} tracked skill(s) are up to date.", updates.len());
        return Ok(());
    }
    for update in pending {
        println!(
            "  {:<32} {} -> {}  ({})",
            update.skill.name,
            short_hash(update.installed_hash.as_deref()),
            short_hash(update.latest_hash.as_deref()),
            update.market_skill.market.name
        );
    }
    Ok(())
}

pub async fn update_all(app: &App) -> Result<()> {
    let updates = pending_updates(app).await;
    if !updates.iter().any(|u| u.has_update) {
        println!("Everything is up to date.");
        return Ok(());
    }
    let (tx, printer) = progress_printer();
    let report = app.orchestrator.update_all(&updates, Some(&tx), &app.cancel).await;
    drop(tx);
    let _ = printer.await;
    print_report("Updated", &report);
    Ok(())
}

/// Remove every installation in one scope.
pub fn clear(app: &App, scope: ScopeArgs, yes: bool) -> Result<()> {
    let scope = scope.scope();
    let skills = app.scan();
    let count: usize = skills.iter().map(|s| s.installations_in(scope).count()).sum();
    if count == 0 {
        println!("No {scope} installations.");
        return Ok(());
    }
    if !yes && !crate::confirm(&format!("Delete {count} {scope} installation(s)?"))? {
        println!("Aborted.");
        return Ok(());
    }
    let removed = app.orchestrator.delete_scope(&skills, scope);
    println!("Removed {removed}/{count} {scope} installation(s)");
    Ok(())
}

fn short_hash(hash: Option<&str>) -> &str {
    hash.map_or("-", |h| h.get(..8).unwrap_or(h))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_filter_defaults_to_everywhere() {
        let none = ScopeFilter {
            global: false,
            project: false,
        };
        assert_eq!(none.scope(), None);
        let project = ScopeFilter {
            global: false,
            project: true,
        };
        assert_eq!(project.scope(), Some(Scope::Project));
        assert_eq!(ScopeArgs { global: false }.scope(), Scope::Project);
    }

    #[test]
    fn short_hash_truncates() {
        assert_eq!(short_hash(Some("0123456789abcdef")), "01234567");
        assert_eq!(short_hash(Some("abc")), "abc");
        assert_eq!(short_hash(None), "-");
    }
}

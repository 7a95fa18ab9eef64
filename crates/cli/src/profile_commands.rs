use {
    anyhow::{Context, Result, bail},
    clap::Subcommand,
    skillknife_skills::reconcile::plan_profile_sync,
    skillknife_store::snapshot_profile,
};

use crate::app::{App, print_report, progress_printer};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Snapshot the workspace's project skills under a name.
    Save { name: String },
    /// Make the workspace match a saved profile.
    Load {
        name: String,
        /// Remove extra skills without asking.
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long = "agent")]
        agents: Vec<String>,
    },
    List,
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum AgentsAction {
    /// Show the agents new installs target by default.
    Get,
    /// Replace the default target agents. No ids means every agent.
    Set { ids: Vec<String> },
}

pub async fn handle_profile(app: &App, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Save { name } => {
            let skills = app.project_skills();
            if skills.is_empty() {
                bail!("no project skills in {}", app.workspace.display());
            }
            let (profile, skipped) = snapshot_profile(&name, &skills);
            if profile.skills.is_empty() {
                bail!(
                    "none of the project skills have a recorded source ({})",
                    skipped.join(", ")
                );
            }
            let count = profile.skills.len();
            app.store.save_profile(profile)?;
            println!("Saved profile '{name}' with {count} skill(s)");
            if !skipped.is_empty() {
                println!(
                    "Skipped {} skill(s) with no recorded source: {}",
                    skipped.len(),
                    skipped.join(", ")
                );
            }
        },
        ProfileAction::Load { name, yes, agents } => {
            let profile = app
                .store
                .profile(&name)
                .with_context(|| format!("no profile named '{name}'"))?;
            let plan = plan_profile_sync(&profile, &app.project_skills());
            if plan.is_empty() {
                println!("Workspace already matches '{name}'.");
                return Ok(());
            }
            let readers = app.target_readers(&agents)?;

            let (tx, printer) = progress_printer();
            let report = app
                .orchestrator
                .apply_profile_sync(
                    &plan,
                    &readers,
                    |extras| {
                        if yes {
                            return true;
                        }
                        let names: Vec<&str> = extras.iter().map(|s| s.name.as_str()).collect();
                        crate::confirm(&format!(
                            "Remove {} skill(s) not in '{name}' ({})?",
                            names.len(),
                            names.join(", ")
                        ))
                        .unwrap_or(false)
                    },
                    Some(&tx),
                    &app.cancel,
                )
                .await;
            drop(tx);
            let _ = printer.await;

            if !plan.to_install.is_empty() {
                print_report("Installed", &report.installed);
            }
            if let Some(ref removed) = report.removed {
                print_report("Removed", removed);
            }
        },
        ProfileAction::List => {
            let profiles = app.store.profiles();
            if profiles.is_empty() {
                println!("No profiles saved.");
            }
            for profile in profiles.values() {
                println!(
                    "  {:<24} {:>3} skill(s)  {}",
                    profile.name,
                    profile.skills.len(),
                    profile.created_at
                );
            }
        },
        ProfileAction::Delete { name } => {
            if !app.store.delete_profile(&name)? {
                bail!("no profile named '{name}'");
            }
            println!("Deleted profile '{name}'");
        },
    }
    Ok(())
}

pub fn handle_agents(app: &App, action: AgentsAction) -> Result<()> {
    match action {
        AgentsAction::Get => {
            let agents = app.store.preferred_agents();
            if agents.is_empty() {
                println!("All agents");
            } else {
                println!("{}", agents.join(" "));
            }
        },
        AgentsAction::Set { ids } => {
            app.validate_agents(&ids)?;
            app.store.save_preferred_agents(&ids)?;
            println!("Saved {} preferred agent(s)", ids.len());
        },
    }
    Ok(())
}

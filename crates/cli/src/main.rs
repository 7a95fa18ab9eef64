mod app;
mod market_commands;
mod profile_commands;
mod skill_commands;

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use {
    anyhow::Result,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{
    app::App,
    skill_commands::{ScopeArgs, ScopeFilter},
};

#[derive(Parser)]
#[command(name = "skillknife", version, about = "Skill Knife: manage agent skills across markets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom data directory (overrides default ~/.cache/skill-knife).
    #[arg(long, global = true, env = "SKILLKNIFE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (overrides discovery).
    #[arg(long, global = true, env = "SKILLKNIFE_CONFIG")]
    config: Option<PathBuf>,

    /// Workspace root for project-scope skills (defaults to the current directory).
    #[arg(long, short = 'w', global = true)]
    workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed skills.
    List {
        #[arg(long)]
        json: bool,
        /// Only skills whose name or description contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show one installed skill: locations, source and SKILL.md body.
    Show { skill: String },
    /// List known agents and their skill directories.
    Readers,
    /// Manage markets.
    Markets {
        #[command(subcommand)]
        action: market_commands::MarketsAction,
    },
    /// Fetch a market and show its skills.
    Market { name: String },
    /// Search skills.sh.
    Search {
        query: String,
        /// Fetch each result's detail page for description and install command.
        #[arg(long)]
        details: bool,
    },
    /// Show skills.sh featured skills.
    Featured,
    /// Report installed skills with newer market versions.
    Check,
    /// Install one skill from a market.
    Install {
        market: String,
        /// Skill name; `owner/repo/name` for skills.sh.
        skill: String,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Target agent id (repeatable). Defaults to the saved preference.
        #[arg(long = "agent")]
        agents: Vec<String>,
    },
    /// Uninstall a skill.
    Uninstall {
        skill: String,
        #[command(flatten)]
        scope: ScopeFilter,
    },
    /// Install every market skill not yet installed.
    InstallAll {
        market: String,
        /// Only names containing this text.
        #[arg(long)]
        filter: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long = "agent")]
        agents: Vec<String>,
    },
    /// Uninstall every installed skill the market offers.
    UninstallAll {
        market: String,
        #[arg(long)]
        filter: Option<String>,
        #[command(flatten)]
        scope: ScopeFilter,
    },
    /// Update every skill with a newer market version.
    UpdateAll,
    /// Delete every installation in one scope.
    Clear {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Workspace profiles.
    Profile {
        #[command(subcommand)]
        action: profile_commands::ProfileAction,
    },
    /// Default target agents.
    Agents {
        #[command(subcommand)]
        action: profile_commands::AgentsAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is no.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "skillknife starting");

    if let Some(ref dir) = cli.data_dir {
        skillknife_config::set_data_dir(dir.clone());
    }
    let config = match cli.config {
        Some(ref path) => skillknife_config::load_config(path)?,
        None => skillknife_config::discover_and_load(),
    };
    let workspace = match cli.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let app = App::new(config, workspace)?;

    match cli.command {
        Commands::List { json, filter } => skill_commands::list(&app, json, filter.as_deref()),
        Commands::Show { skill } => skill_commands::show(&app, &skill),
        Commands::Readers => {
            skill_commands::readers(&app);
            Ok(())
        },
        Commands::Markets { action } => market_commands::handle_markets(&app, action),
        Commands::Market { name } => market_commands::show_market(&app, &name).await,
        Commands::Search { query, details } => {
            market_commands::search(&app, &query, details).await
        },
        Commands::Featured => market_commands::featured(&app).await,
        Commands::Check => skill_commands::check(&app).await,
        Commands::Install {
            market,
            skill,
            scope,
            agents,
        } => skill_commands::install(&app, &market, &skill, scope, &agents).await,
        Commands::Uninstall { skill, scope } => {
            skill_commands::uninstall(&app, &skill, scope).await
        },
        Commands::InstallAll {
            market,
            filter,
            scope,
            agents,
        } => {
            skill_commands::install_all(&app, &market, filter.as_deref(), scope, &agents).await
        },
        Commands::UninstallAll {
            market,
            filter,
            scope,
        } => skill_commands::uninstall_all(&app, &market, filter.as_deref(), scope).await,
        Commands::UpdateAll => skill_commands::update_all(&app).await,
        Commands::Clear { scope, yes } => skill_commands::clear(&app, scope, yes),
        Commands::Profile { action } => profile_commands::handle_profile(&app, action).await,
        Commands::Agents { action } => profile_commands::handle_agents(&app, action),
    }
}

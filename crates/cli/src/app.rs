use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result, bail},
    skillknife_config::{
        KnifeConfig, Market, Reader, default_markets, default_readers, merge_markets,
        merge_readers,
    },
    skillknife_installer::{
        BatchProgress, BatchReport, CommandTool, DirectInstaller, Orchestrator, ProgressSender,
    },
    skillknife_markets::{GitCli, MarketCatalog, SkillsShClient},
    skillknife_skills::{InventoryScanner, LockFileCache, MetadataReader, PathResolver, Skill},
    skillknife_store::Store,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

/// Everything a command needs, assembled once from config and the store.
pub struct App {
    pub config: KnifeConfig,
    pub store: Store,
    pub readers: Vec<Reader>,
    pub workspace: PathBuf,
    pub scanner: InventoryScanner,
    pub catalog: MarketCatalog,
    pub orchestrator: Orchestrator,
    pub cancel: CancellationToken,
}

impl App {
    pub fn new(config: KnifeConfig, workspace: PathBuf) -> Result<Self> {
        let store = Store::open_default();
        let readers = merge_readers(default_readers(), &config.readers);
        let resolver = PathResolver::from_env();

        let lock = LockFileCache::new(
            config.cache.resolved_lock_file(),
            Duration::from_millis(config.cache.lock_ttl_ms),
        );
        let scanner =
            InventoryScanner::new(readers.clone(), resolver.clone(), MetadataReader::new(lock));

        let catalog = MarketCatalog::new(
            Arc::new(GitCli::default()),
            config.cache.resolved_cache_dir(),
        );

        // Single operations stream tool output; batches only capture it.
        let batch_tool = CommandTool::new(&config.tool.command)?;
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        spawn_line_printer(line_rx);
        let tool = batch_tool.clone().streaming(line_tx);

        let cancel = CancellationToken::new();
        spawn_ctrl_c(cancel.clone());

        let mut orchestrator = Orchestrator::new(
            config.tool.mode,
            Arc::new(tool),
            DirectInstaller::new(catalog.clone()),
            resolver,
            readers.clone(),
        )
        .with_batch_tool(Arc::new(batch_tool))
        .with_workspace_root(Some(workspace.clone()))
        .with_cancel(cancel.clone());
        if let Some(ref cwd) = config.tool.cwd {
            orchestrator = orchestrator.with_global_cwd(cwd.clone());
        }

        debug!(
            workspace = %workspace.display(),
            mode = ?config.tool.mode,
            readers = readers.len(),
            "skillknife ready"
        );

        Ok(Self {
            config,
            store,
            readers,
            workspace,
            scanner,
            catalog,
            orchestrator,
            cancel,
        })
    }

    /// Built-in markets merged with the user's, plus the search market last.
    pub fn markets(&self) -> Vec<Market> {
        let mut markets = merge_markets(default_markets(), &self.store.user_markets());
        markets.push(Market::global_search());
        markets
    }

    pub fn market(&self, name: &str) -> Result<Market> {
        self.markets()
            .into_iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("unknown market '{name}' (see `skillknife markets list`)"))
    }

    pub fn search_client(&self) -> Result<SkillsShClient> {
        Ok(SkillsShClient::new(&self.config.search)?)
    }

    pub fn scan(&self) -> Vec<Skill> {
        self.scanner.scan(std::slice::from_ref(&self.workspace))
    }

    pub fn project_skills(&self) -> Vec<Skill> {
        self.scanner.project_skills(std::slice::from_ref(&self.workspace))
    }

    /// Readers for explicit `--agent` ids, else the saved preference.
    /// Empty means "every agent".
    pub fn target_readers(&self, agents: &[String]) -> Result<Vec<Reader>> {
        let ids = if agents.is_empty() {
            self.store.preferred_agents()
        } else {
            agents.to_vec()
        };
        self.validate_agents(&ids)?;
        Ok(self.orchestrator.readers_by_id(&ids))
    }

    pub fn validate_agents(&self, ids: &[String]) -> Result<()> {
        let unknown: Vec<&str> = ids
            .iter()
            .filter(|id| !self.readers.iter().any(|r| &r.id == *id))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            bail!("unknown agent id(s): {}", unknown.join(", "));
        }
        Ok(())
    }
}

/// Print a batch's progress events as they arrive. Await the returned
/// handle after dropping the sender to flush the tail.
pub fn progress_printer() -> (ProgressSender, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                BatchProgress::Started { index, total, name } => {
                    eprintln!("[{}/{total}] {name}", index + 1);
                },
                BatchProgress::Succeeded { name, .. } => eprintln!("  ok    {name}"),
                BatchProgress::Failed { name, error, .. } => eprintln!("  FAIL  {name}: {error}"),
                BatchProgress::Cancelled { completed } => {
                    eprintln!("cancelled after {completed} item(s)");
                },
            }
        }
    });
    (tx, handle)
}

pub fn print_report(verb: &str, report: &BatchReport) {
    println!("{verb} {}", report.ratio());
    for (name, error) in &report.failed {
        println!("  {name}: {error}");
    }
}

fn spawn_line_printer(mut rx: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if !line.trim().is_empty() {
                eprintln!("  | {line}");
            }
        }
    });
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received, cancelling");
                cancel.cancel();
            },
            Err(e) => debug!(error = %e, "ctrl-c handler unavailable"),
        }
    });
}

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    serde::Serialize,
    skillknife_config::{InstallMode, Reader, UNIVERSAL_READER_ID},
    skillknife_skills::{
        Installation, PathResolver, Scope, Skill, SkillRef, UpdateInfo, reconcile::SyncPlan,
    },
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{
    batch::{BatchReport, BatchRun, ProgressSender},
    direct::{DirectInstaller, delete_installation},
    error::{Error, Result},
    tool::{PackageTool, agent_args},
};

/// What applying a profile did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub installed: BatchReport,
    /// `None` when nothing needed removing or the removal was not confirmed.
    pub removed: Option<BatchReport>,
}

/// Executes install, update and uninstall operations using either the
/// external packaging tool or direct copies from the mirror cache.
///
/// Single operations run through `tool`; batches run through `batch_tool`,
/// which is the same tool unless [`Orchestrator::with_batch_tool`] sets one.
pub struct Orchestrator {
    mode: InstallMode,
    tool: Arc<dyn PackageTool>,
    batch_tool: Arc<dyn PackageTool>,
    direct: DirectInstaller,
    resolver: PathResolver,
    readers: Vec<Reader>,
    workspace_root: Option<PathBuf>,
    global_cwd: PathBuf,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        mode: InstallMode,
        tool: Arc<dyn PackageTool>,
        direct: DirectInstaller,
        resolver: PathResolver,
        readers: Vec<Reader>,
    ) -> Self {
        let global_cwd = skillknife_config::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            mode,
            batch_tool: Arc::clone(&tool),
            tool,
            direct,
            resolver,
            readers,
            workspace_root: None,
            global_cwd,
            cancel: CancellationToken::new(),
        }
    }

    /// Workspace used for project-scope operations.
    #[must_use]
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Tool used by batch operations, typically one that captures output
    /// instead of streaming it.
    #[must_use]
    pub fn with_batch_tool(mut self, tool: Arc<dyn PackageTool>) -> Self {
        self.batch_tool = tool;
        self
    }

    /// Working directory for global-scope tool invocations.
    #[must_use]
    pub fn with_global_cwd(mut self, cwd: PathBuf) -> Self {
        self.global_cwd = cwd;
        self
    }

    /// Token that aborts single operations when cancelled.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn mode(&self) -> InstallMode {
        self.mode
    }

    pub fn readers(&self) -> &[Reader] {
        &self.readers
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Readers matching `ids`, in catalog order. Unknown ids are dropped.
    pub fn readers_by_id<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Reader> {
        self.readers
            .iter()
            .filter(|r| ids.iter().any(|id| id.as_ref() == r.id))
            .cloned()
            .collect()
    }

    // ── Single-item operations ───────────────────────────────────────────────

    /// Install `skill` into `scope` for `readers`.
    ///
    /// With no readers the packaging tool targets every agent, and direct
    /// installs use the universal directory.
    pub async fn install(&self, skill: &SkillRef, scope: Scope, readers: &[Reader]) -> Result<()> {
        self.install_with(skill, scope, readers, self.tool.as_ref(), &self.cancel)
            .await
    }

    async fn install_with(
        &self,
        skill: &SkillRef,
        scope: Scope,
        readers: &[Reader],
        tool: &dyn PackageTool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let cwd = self.scope_cwd(scope)?;
        match self.mode {
            InstallMode::Delegated => {
                let ids: Vec<&str> = readers.iter().map(|r| r.id.as_str()).collect();
                let mut args = vec!["add".to_string()];
                args.extend(skill.install_args());
                args.extend(agent_args(&ids));
                if scope == Scope::Global {
                    args.push("--global".into());
                }
                args.push("-y".into());
                tool.run(&args, &cwd, cancel).await?;
            },
            InstallMode::Direct => {
                let market_skill = skill.to_market_skill().ok_or_else(|| {
                    Error::validation(format!(
                        "skill '{}' has no recorded source to install from",
                        skill.name()
                    ))
                })?;
                let targets = self.target_dirs(skill.name(), scope, readers)?;
                self.direct.install(&market_skill, &targets).await?;
            },
        }
        info!(skill = skill.name(), %scope, mode = ?self.mode, "install complete");
        Ok(())
    }

    /// Delete one installation directory. Failures are logged.
    pub fn uninstall(&self, installation: &Installation) -> bool {
        delete_installation(&installation.path)
    }

    /// Remove `skill` from `scope`, or from everywhere when `scope` is `None`.
    pub async fn uninstall_skill(&self, skill: &Skill, scope: Option<Scope>) -> Result<()> {
        self.uninstall_skill_with(skill, scope, self.tool.as_ref(), &self.cancel)
            .await
    }

    async fn uninstall_skill_with(
        &self,
        skill: &Skill,
        scope: Option<Scope>,
        tool: &dyn PackageTool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let by_scope = group_by_scope(skill, scope);
        if by_scope.is_empty() {
            return Err(Error::validation(format!(
                "skill '{}' is not installed in the requested scope",
                skill.name
            )));
        }

        match self.mode {
            InstallMode::Delegated => {
                for (scope, reader_ids) in by_scope {
                    let cwd = self.scope_cwd(scope)?;
                    let mut args = vec!["remove".to_string(), skill.name.clone()];
                    if scope == Scope::Global {
                        args.push("--global".into());
                    }
                    args.extend(agent_args(&reader_ids));
                    args.push("-y".into());
                    tool.run(&args, &cwd, cancel).await?;
                }
            },
            InstallMode::Direct => {
                let mut removed = HashSet::new();
                for installation in skill
                    .installations
                    .iter()
                    .filter(|i| scope.is_none_or(|s| i.scope == s))
                {
                    if removed.insert(&installation.path) {
                        self.uninstall(installation);
                    }
                }
            },
        }
        info!(skill = %skill.name, ?scope, "uninstall complete");
        Ok(())
    }

    /// Delete every installation in `scope` across `skills`. Returns how many
    /// directories were removed; readers sharing a directory count once.
    pub fn delete_scope(&self, skills: &[Skill], scope: Scope) -> usize {
        let mut seen = HashSet::new();
        skills
            .iter()
            .flat_map(|s| s.installations_in(scope))
            .filter(|i| seen.insert(&i.path))
            .filter(|i| self.uninstall(i))
            .count()
    }

    // ── Batches ──────────────────────────────────────────────────────────────

    /// Install each item in order. One failure does not stop the rest.
    pub async fn install_all(
        &self,
        items: &[SkillRef],
        scope: Scope,
        readers: &[Reader],
        progress: Option<&ProgressSender>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let mut run = BatchRun::new(items.len(), progress, cancel);
        for (index, item) in items.iter().enumerate() {
            if run.should_stop() {
                break;
            }
            run.start(index, item.name());
            let result = self
                .install_with(
                    item,
                    scope,
                    readers,
                    self.batch_tool.as_ref(),
                    run.cancel_token(),
                )
                .await;
            run.record(index, item.name(), result);
        }
        run.finish()
    }

    /// Uninstall each skill in order from `scope` (or everywhere).
    pub async fn uninstall_all(
        &self,
        skills: &[Skill],
        scope: Option<Scope>,
        progress: Option<&ProgressSender>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let mut run = BatchRun::new(skills.len(), progress, cancel);
        for (index, skill) in skills.iter().enumerate() {
            if run.should_stop() {
                break;
            }
            run.start(index, &skill.name);
            let result = self
                .uninstall_skill_with(skill, scope, self.batch_tool.as_ref(), run.cancel_token())
                .await;
            run.record(index, &skill.name, result);
        }
        run.finish()
    }

    /// Reinstall every skill with a pending update into the scopes and
    /// readers it is currently installed for.
    pub async fn update_all(
        &self,
        updates: &[UpdateInfo],
        progress: Option<&ProgressSender>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let pending: Vec<&UpdateInfo> = updates.iter().filter(|u| u.has_update).collect();
        let mut run = BatchRun::new(pending.len(), progress, cancel);
        for (index, update) in pending.into_iter().enumerate() {
            if run.should_stop() {
                break;
            }
            let name = update.skill.name.as_str();
            run.start(index, name);
            let result = self.update_one(update, run.cancel_token()).await;
            run.record(index, name, result);
        }
        run.finish()
    }

    async fn update_one(&self, update: &UpdateInfo, cancel: &CancellationToken) -> Result<()> {
        let skill = SkillRef::Market(update.market_skill.clone());
        for (scope, reader_ids) in group_by_scope(&update.skill, None) {
            let readers = self.readers_by_id(&reader_ids);
            self.install_with(&skill, scope, &readers, self.batch_tool.as_ref(), cancel)
                .await?;
        }
        Ok(())
    }

    /// Install what the profile is missing, then remove extras only if
    /// `confirm` agrees to the list.
    pub async fn apply_profile_sync<F>(
        &self,
        plan: &SyncPlan,
        readers: &[Reader],
        confirm: F,
        progress: Option<&ProgressSender>,
        cancel: &CancellationToken,
    ) -> SyncReport
    where
        F: FnOnce(&[Skill]) -> bool,
    {
        let mut items = Vec::new();
        let mut unsourced = Vec::new();
        for entry in &plan.to_install {
            match SkillRef::from_profile(entry) {
                Some(item) => items.push(item),
                None => unsourced.push(entry.name.clone()),
            }
        }
        let mut installed = self
            .install_all(&items, Scope::Project, readers, progress, cancel)
            .await;
        if !unsourced.is_empty() {
            warn!(skills = ?unsourced, "profile entries have no install source");
            installed.total += unsourced.len();
            installed.failed.extend(
                unsourced
                    .into_iter()
                    .map(|name| (name, "no recorded install source".to_string())),
            );
        }

        let removed = if plan.to_remove.is_empty() || cancel.is_cancelled() {
            None
        } else if confirm(&plan.to_remove) {
            Some(
                self.uninstall_all(&plan.to_remove, Some(Scope::Project), progress, cancel)
                    .await,
            )
        } else {
            info!(count = plan.to_remove.len(), "profile removals declined");
            None
        };

        SyncReport { installed, removed }
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn scope_cwd(&self, scope: Scope) -> Result<PathBuf> {
        match scope {
            Scope::Global => Ok(self.global_cwd.clone()),
            Scope::Project => self.workspace_root.clone().ok_or_else(|| {
                Error::validation("project scope requires an open workspace folder")
            }),
        }
    }

    /// `<scope dir>/<name>` for every reader, de-duplicated, in reader order.
    fn target_dirs(&self, name: &str, scope: Scope, readers: &[Reader]) -> Result<Vec<PathBuf>> {
        let fallback;
        let readers = if readers.is_empty() {
            fallback = self.readers_by_id(&[UNIVERSAL_READER_ID]);
            if fallback.is_empty() {
                warn!("universal reader missing from catalog");
            }
            fallback.as_slice()
        } else {
            readers
        };

        let root = self.workspace_root.as_deref();
        let mut targets: Vec<PathBuf> = Vec::new();
        for reader in readers {
            let dir = self
                .resolver
                .scope_dir(reader, scope, root)
                .ok_or_else(|| {
                    Error::validation("project scope requires an open workspace folder")
                })?
                .join(name);
            if !targets.contains(&dir) {
                targets.push(dir);
            }
        }
        if targets.is_empty() {
            return Err(Error::validation("no target readers for install"));
        }
        Ok(targets)
    }
}

/// Reader ids per scope among `skill`'s installations, optionally limited to
/// one scope.
fn group_by_scope(skill: &Skill, only: Option<Scope>) -> BTreeMap<Scope, Vec<String>> {
    let mut by_scope: BTreeMap<Scope, Vec<String>> = BTreeMap::new();
    for installation in &skill.installations {
        if only.is_some_and(|s| s != installation.scope) {
            continue;
        }
        let ids = by_scope.entry(installation.scope).or_default();
        if !ids.contains(&installation.reader_id) {
            ids.push(installation.reader_id.clone());
        }
    }
    by_scope
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::batch::BatchProgress,
        async_trait::async_trait,
        skillknife_config::{Market, default_readers},
        skillknife_markets::{GitCli, MarketCatalog},
        skillknife_skills::{
            InventoryScanner, MarketSkill, ProfileSkill,
            metadata::{LockFileCache, MetadataReader},
            reconcile::plan_profile_sync,
        },
        std::{sync::Mutex, time::Duration},
        tokio::sync::mpsc,
    };

    #[derive(Default)]
    struct FakeTool {
        calls: Mutex<Vec<(Vec<String>, PathBuf)>>,
        fail_on: Option<&'static str>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl FakeTool {
        fn calls(&self) -> Vec<(Vec<String>, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PackageTool for FakeTool {
        async fn run(
            &self,
            args: &[String],
            cwd: &Path,
            _cancel: &CancellationToken,
        ) -> Result<String> {
            let count = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((args.to_vec(), cwd.to_path_buf()));
                calls.len()
            };
            if let Some((after, ref token)) = self.cancel_after
                && count >= after
            {
                token.cancel();
            }
            if self.fail_on.is_some_and(|f| args.iter().any(|a| a == f)) {
                return Err(Error::Subprocess {
                    command: args.join(" "),
                    code: Some(1),
                    stderr: "boom".into(),
                });
            }
            Ok(String::new())
        }
    }

    struct Fixture {
        tmp: tempfile::TempDir,
        home: PathBuf,
        project: PathBuf,
        cache: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let home = tmp.path().join("home");
            let project = tmp.path().join("project");
            let cache = tmp.path().join("cache");
            for dir in [&home, &project, &cache] {
                std::fs::create_dir_all(dir).unwrap();
            }
            Self {
                tmp,
                home,
                project,
                cache,
            }
        }

        fn orchestrator(&self, mode: InstallMode, tool: Arc<FakeTool>) -> Orchestrator {
            let catalog = MarketCatalog::new(Arc::new(GitCli::default()), self.cache.clone());
            Orchestrator::new(
                mode,
                tool,
                DirectInstaller::new(catalog),
                PathResolver::new(Some(self.home.clone())),
                default_readers(),
            )
            .with_workspace_root(Some(self.project.clone()))
            .with_global_cwd(self.home.clone())
        }

        fn scanner(&self) -> InventoryScanner {
            InventoryScanner::new(
                default_readers(),
                PathResolver::new(Some(self.home.clone())),
                MetadataReader::new(LockFileCache::new(
                    self.tmp.path().join("lock.json"),
                    Duration::ZERO,
                )),
            )
        }

        fn seed_mirror(&self, name: &str) {
            let dir = self.cache.join("anthropics_skills/skills").join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(
                dir.join("SKILL.md"),
                format!("---\ndescription: {name}\n---\n"),
            )
            .unwrap();
        }
    }

    fn market_skill(name: &str, hash: &str) -> MarketSkill {
        MarketSkill {
            name: name.into(),
            description: None,
            market: Market::git("Anthropic Official", "anthropics/skills"),
            repo_path: "anthropics/skills".into(),
            subpath: format!("skills/{name}"),
            content_hash: Some(hash.into()),
            installs: None,
            install_command: None,
        }
    }

    fn installed(name: &str, installs: &[(Scope, &str)]) -> Skill {
        Skill {
            name: name.into(),
            description: None,
            installations: installs
                .iter()
                .map(|(scope, reader)| Installation {
                    scope: *scope,
                    reader_id: (*reader).into(),
                    path: PathBuf::from(format!("/nowhere/{reader}/{name}")),
                })
                .collect(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn delegated_install_builds_argv() {
        let fx = Fixture::new();
        let tool = Arc::new(FakeTool::default());
        let orch = fx.orchestrator(InstallMode::Delegated, Arc::clone(&tool));
        let readers = orch.readers_by_id(&["claude-code", "skills-cli"]);

        orch.install(
            &SkillRef::Market(market_skill("pdf", "h")),
            Scope::Global,
            &readers,
        )
        .await
        .unwrap();
        orch.install(&SkillRef::Market(market_skill("pdf", "h")), Scope::Project, &[])
            .await
            .unwrap();

        let calls = tool.calls();
        assert_eq!(calls[0].0, [
            "add",
            "https://github.com/anthropics/skills",
            "--skill",
            "pdf",
            "--agent",
            "claude-code",
            "--global",
            "-y"
        ]);
        assert_eq!(calls[0].1, fx.home);
        assert_eq!(calls[1].0, [
            "add",
            "https://github.com/anthropics/skills",
            "--skill",
            "pdf",
            "--all",
            "-y"
        ]);
        assert_eq!(calls[1].1, fx.project);
    }

    #[tokio::test]
    async fn project_scope_without_workspace_is_rejected() {
        let fx = Fixture::new();
        let tool = Arc::new(FakeTool::default());
        let orch = fx
            .orchestrator(InstallMode::Delegated, Arc::clone(&tool))
            .with_workspace_root(None);
        let err = orch
            .install(&SkillRef::Market(market_skill("pdf", "h")), Scope::Project, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(tool.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_uninstall_continues_past_failures() {
        let fx = Fixture::new();
        let tool = Arc::new(FakeTool {
            fail_on: Some("x"),
            ..Default::default()
        });
        let orch = fx.orchestrator(InstallMode::Delegated, Arc::clone(&tool));
        let skills = [
            installed("a", &[(Scope::Global, "claude-code")]),
            installed("x", &[(Scope::Global, "claude-code")]),
            installed("b", &[(Scope::Global, "claude-code")]),
        ];
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = orch
            .uninstall_all(&skills, None, Some(&tx), &CancellationToken::new())
            .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, ["a", "b"]);
        assert_eq!(report.failed_names(), ["x"]);
        assert_eq!(report.ratio(), "2/3");
        assert_eq!(tool.calls()[0].0, [
            "remove",
            "a",
            "--global",
            "--agent",
            "claude-code",
            "-y"
        ]);

        drop(tx);
        let mut failed = Vec::new();
        while let Some(event) = rx.recv().await {
            if let BatchProgress::Failed { name, .. } = event {
                failed.push(name);
            }
        }
        assert_eq!(failed, ["x"]);
    }

    #[tokio::test]
    async fn cancellation_stops_between_items() {
        let fx = Fixture::new();
        let cancel = CancellationToken::new();
        let tool = Arc::new(FakeTool {
            cancel_after: Some((1, cancel.clone())),
            ..Default::default()
        });
        let orch = fx.orchestrator(InstallMode::Delegated, Arc::clone(&tool));
        let items: Vec<SkillRef> = ["a", "b", "c"]
            .into_iter()
            .map(|n| SkillRef::Market(market_skill(n, "h")))
            .collect();

        let report = orch
            .install_all(&items, Scope::Global, &[], None, &cancel)
            .await;
        assert!(report.cancelled);
        assert_eq!(report.succeeded, ["a"]);
        assert_eq!(tool.calls().len(), 1);
    }

    #[tokio::test]
    async fn update_all_reinstalls_into_existing_scopes() {
        let fx = Fixture::new();
        let tool = Arc::new(FakeTool::default());
        let orch = fx.orchestrator(InstallMode::Delegated, Arc::clone(&tool));
        let skill = installed("pdf", &[
            (Scope::Global, "claude-code"),
            (Scope::Global, "codex"),
            (Scope::Project, "cursor"),
        ]);
        let updates = [
            UpdateInfo {
                skill: skill.clone(),
                market_skill: market_skill("pdf", "new"),
                has_update: true,
                installed_hash: Some("old".into()),
                latest_hash: Some("new".into()),
            },
            UpdateInfo {
                skill: installed("docx", &[(Scope::Global, "claude-code")]),
                market_skill: market_skill("docx", "same"),
                has_update: false,
                installed_hash: Some("same".into()),
                latest_hash: Some("same".into()),
            },
        ];

        let report = orch
            .update_all(&updates, None, &CancellationToken::new())
            .await;
        assert_eq!(report.total, 1);
        assert_eq!(report.succeeded, ["pdf"]);

        let calls = tool.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].0.contains(&"--global".to_string()));
        assert!(calls[0].0.windows(2).any(|w| w == ["--agent", "codex"]));
        assert!(!calls[1].0.contains(&"--global".to_string()));
        assert!(calls[1].0.windows(2).any(|w| w == ["--agent", "cursor"]));
        assert_eq!(calls[1].1, fx.project);
    }

    #[tokio::test]
    async fn direct_reinstall_keeps_one_installation() {
        let fx = Fixture::new();
        fx.seed_mirror("pdf");
        let orch = fx.orchestrator(InstallMode::Direct, Arc::new(FakeTool::default()));
        let readers = orch.readers_by_id(&["claude-code"]);
        let skill = SkillRef::Market(market_skill("pdf", "h1"));

        orch.install(&skill, Scope::Project, &readers).await.unwrap();
        orch.install(&skill, Scope::Project, &readers).await.unwrap();

        let skills = fx.scanner().scan(std::slice::from_ref(&fx.project));
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].installations.len(), 1);
        assert_eq!(skills[0].installed_hash(), Some("h1"));
        assert_eq!(
            skills[0].installations[0].path,
            fx.project.join(".claude/skills/pdf")
        );
    }

    #[tokio::test]
    async fn direct_install_without_readers_uses_universal_dir() {
        let fx = Fixture::new();
        fx.seed_mirror("pdf");
        let orch = fx.orchestrator(InstallMode::Direct, Arc::new(FakeTool::default()));
        orch.install(&SkillRef::Market(market_skill("pdf", "h")), Scope::Global, &[])
            .await
            .unwrap();
        assert!(fx.home.join(".agents/skills/pdf/SKILL.md").is_file());
    }

    #[tokio::test]
    async fn direct_uninstall_removes_only_requested_scope() {
        let fx = Fixture::new();
        fx.seed_mirror("pdf");
        let orch = fx.orchestrator(InstallMode::Direct, Arc::new(FakeTool::default()));
        let readers = orch.readers_by_id(&["claude-code"]);
        let skill = SkillRef::Market(market_skill("pdf", "h"));
        orch.install(&skill, Scope::Global, &readers).await.unwrap();
        orch.install(&skill, Scope::Project, &readers).await.unwrap();

        let roots = [fx.project.clone()];
        let scanned = fx.scanner().scan(&roots);
        orch.uninstall_skill(&scanned[0], Some(Scope::Project))
            .await
            .unwrap();

        let after = fx.scanner().scan(&roots);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].installations.len(), 1);
        assert_eq!(after[0].installations[0].scope, Scope::Global);

        assert_eq!(orch.delete_scope(&after, Scope::Global), 1);
        assert!(fx.scanner().scan(&roots).is_empty());
    }

    #[tokio::test]
    async fn batches_use_batch_tool_and_single_items_the_main_tool() {
        let fx = Fixture::new();
        let single = Arc::new(FakeTool::default());
        let batch = Arc::new(FakeTool::default());
        let orch = fx
            .orchestrator(InstallMode::Delegated, Arc::clone(&single))
            .with_batch_tool(Arc::<FakeTool>::clone(&batch));
        let item = SkillRef::Market(market_skill("pdf", "h"));

        orch.install(&item, Scope::Global, &[]).await.unwrap();
        let report = orch
            .install_all(
                &[item.clone(), item],
                Scope::Global,
                &[],
                None,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(single.calls().len(), 1);
        assert_eq!(batch.calls().len(), 2);
    }

    #[tokio::test]
    async fn shared_directory_is_removed_once() {
        let fx = Fixture::new();
        fx.seed_mirror("pdf");
        let orch = fx.orchestrator(InstallMode::Direct, Arc::new(FakeTool::default()));
        let readers = orch.readers_by_id(&["amp", "skills-cli"]);
        orch.install(&SkillRef::Market(market_skill("pdf", "h")), Scope::Project, &readers)
            .await
            .unwrap();

        let roots = [fx.project.clone()];
        let scanned = fx.scanner().scan(&roots);
        assert_eq!(scanned[0].installations.len(), 2);
        assert_eq!(
            scanned[0].installations[0].path,
            scanned[0].installations[1].path
        );

        assert_eq!(orch.delete_scope(&scanned, Scope::Project), 1);
        assert!(fx.scanner().scan(&roots).is_empty());
    }

    #[tokio::test]
    async fn profile_entries_without_source_fail_without_running_tool() {
        let fx = Fixture::new();
        let tool = Arc::new(FakeTool::default());
        let orch = fx.orchestrator(InstallMode::Delegated, Arc::clone(&tool));
        let profile = skillknife_skills::Profile {
            name: "web".into(),
            created_at: "2025-01-01T00:00:00.000Z".into(),
            skills: vec![
                ProfileSkill {
                    name: "notes".into(),
                    install_source: "notes".into(),
                },
                ProfileSkill {
                    name: "pdf".into(),
                    install_source: "anthropics/skills".into(),
                },
            ],
        };
        let plan = plan_profile_sync(&profile, &[]);

        let report = orch
            .apply_profile_sync(&plan, &[], |_| true, None, &CancellationToken::new())
            .await;
        assert_eq!(report.installed.total, 2);
        assert_eq!(report.installed.succeeded, ["pdf"]);
        assert_eq!(report.installed.failed_names(), ["notes"]);
        assert_eq!(tool.calls().len(), 1);
        assert_eq!(tool.calls()[0].0[1], "https://github.com/anthropics/skills");
    }

    #[tokio::test]
    async fn profile_sync_removes_only_when_confirmed() {
        let fx = Fixture::new();
        let tool = Arc::new(FakeTool::default());
        let orch = fx.orchestrator(InstallMode::Delegated, Arc::clone(&tool));
        let profile = skillknife_skills::Profile {
            name: "web".into(),
            created_at: "2025-01-01T00:00:00.000Z".into(),
            skills: vec![
                ProfileSkill {
                    name: "a".into(),
                    install_source: "https://github.com/acme/skills".into(),
                },
                ProfileSkill {
                    name: "b".into(),
                    install_source: "https://github.com/acme/skills".into(),
                },
            ],
        };
        let project = [
            installed("b", &[(Scope::Project, "claude-code")]),
            installed("c", &[(Scope::Project, "claude-code")]),
        ];
        let plan = plan_profile_sync(&profile, &project);

        let declined = orch
            .apply_profile_sync(&plan, &[], |_| false, None, &CancellationToken::new())
            .await;
        assert_eq!(declined.installed.succeeded, ["a"]);
        assert!(declined.removed.is_none());
        assert_eq!(tool.calls().len(), 1);
        assert_eq!(tool.calls()[0].0[..4], [
            "add",
            "https://github.com/acme/skills",
            "--skill",
            "a"
        ]);

        let mut offered = Vec::new();
        let accepted = orch
            .apply_profile_sync(
                &plan,
                &[],
                |extras| {
                    offered = extras.iter().map(|s| s.name.clone()).collect();
                    true
                },
                None,
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(offered, ["c"]);
        assert_eq!(accepted.removed.unwrap().succeeded, ["c"]);
        assert_eq!(tool.calls().last().unwrap().0[..2], ["remove", "c"]);
    }
}

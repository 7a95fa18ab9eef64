//! Best-effort enrichment of search results with detail-page data.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    skillknife_skills::MarketSkill,
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use crate::{
    error::Result,
    skills_sh::{SkillDetails, SkillsShClient},
};

/// Where detail pages come from.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn details(&self, repo_path: &str, name: &str) -> Result<SkillDetails>;
}

#[async_trait]
impl DetailSource for SkillsShClient {
    async fn details(&self, repo_path: &str, name: &str) -> Result<SkillDetails> {
        SkillsShClient::details(self, repo_path, name).await
    }
}

/// Details for the item at `index` of the list being hydrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailUpdate {
    pub index: usize,
    pub name: String,
    pub details: SkillDetails,
}

impl DetailUpdate {
    /// Merge into the matching entry of `skills`, if it is still there.
    pub fn apply(&self, skills: &mut [MarketSkill]) {
        if let Some(skill) = skills.get_mut(self.index)
            && skill.name == self.name
        {
            if self.details.description.is_some() {
                skill.description.clone_from(&self.details.description);
            }
            if self.details.install_command.is_some() {
                skill.install_command.clone_from(&self.details.install_command);
            }
        }
    }
}

/// Monotonic counter identifying the latest market selection or query.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Start a new generation, making every earlier guard stale.
    pub fn advance(&self) -> GenerationGuard {
        let value = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationGuard {
            counter: Arc::clone(&self.0),
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationGuard {
    counter: Arc<AtomicU64>,
    value: u64,
}

impl GenerationGuard {
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.value
    }
}

/// Visits detail pages one at a time with a pause between requests.
pub struct Hydrator {
    source: Arc<dyn DetailSource>,
    delay: Duration,
}

impl Hydrator {
    pub fn new(source: Arc<dyn DetailSource>, delay: Duration) -> Self {
        Self { source, delay }
    }

    /// Fetch details for each item in order, pushing results through `tx`.
    ///
    /// `is_relevant` is consulted before every item; once it returns false
    /// the run stops. Failed fetches are logged and skipped. Returns the
    /// number of updates delivered.
    pub async fn hydrate<F>(
        &self,
        items: &[MarketSkill],
        tx: mpsc::Sender<DetailUpdate>,
        is_relevant: F,
    ) -> usize
    where
        F: Fn() -> bool + Send + Sync,
    {
        let mut delivered = 0;
        for (index, item) in items.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if !is_relevant() {
                debug!(remaining = items.len() - index, "hydration superseded");
                break;
            }
            let details = match self.source.details(&item.repo_path, &item.subpath).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(skill = %item.name, error = %e, "failed to fetch skill details");
                    continue;
                },
            };
            let update = DetailUpdate {
                index,
                name: item.name.clone(),
                details,
            };
            if tx.send(update).await.is_err() {
                break;
            }
            delivered += 1;
        }
        delivered
    }
}

use {
    serde::Serialize, tokio::sync::mpsc, tokio_util::sync::CancellationToken, tracing::warn,
};

use crate::error::Result;

/// Per-item progress of a sequential batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchProgress {
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    Succeeded {
        index: usize,
        name: String,
    },
    Failed {
        index: usize,
        name: String,
        error: String,
    },
    /// The batch stopped early; `completed` items were attempted.
    Cancelled { completed: usize },
}

/// Outcome of a batch: every item either succeeded or failed with a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    /// `succeeded/total`, e.g. `2/3`.
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.succeeded.len(), self.total)
    }
}

pub type ProgressSender = mpsc::UnboundedSender<BatchProgress>;

/// Bookkeeping for one batch run.
pub(crate) struct BatchRun<'a> {
    report: BatchReport,
    progress: Option<&'a ProgressSender>,
    cancel: &'a CancellationToken,
}

impl<'a> BatchRun<'a> {
    pub(crate) fn new(
        total: usize,
        progress: Option<&'a ProgressSender>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            report: BatchReport {
                total,
                ..Default::default()
            },
            progress,
            cancel,
        }
    }

    pub(crate) fn cancel_token(&self) -> &'a CancellationToken {
        self.cancel
    }

    /// Check for cancellation before the next item. Emits the cancelled
    /// event once when it trips.
    pub(crate) fn should_stop(&mut self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        if !self.report.cancelled {
            self.report.cancelled = true;
            self.emit(BatchProgress::Cancelled {
                completed: self.report.succeeded.len() + self.report.failed.len(),
            });
        }
        true
    }

    pub(crate) fn start(&self, index: usize, name: &str) {
        self.emit(BatchProgress::Started {
            index,
            total: self.report.total,
            name: name.to_string(),
        });
    }

    pub(crate) fn record(&mut self, index: usize, name: &str, result: Result<()>) {
        match result {
            Ok(()) => {
                self.report.succeeded.push(name.to_string());
                self.emit(BatchProgress::Succeeded {
                    index,
                    name: name.to_string(),
                });
            },
            Err(e) => {
                warn!(skill = name, error = %e, "batch item failed");
                let error = e.to_string();
                self.report.failed.push((name.to_string(), error.clone()));
                self.emit(BatchProgress::Failed {
                    index,
                    name: name.to_string(),
                    error,
                });
            },
        }
    }

    pub(crate) fn finish(self) -> BatchReport {
        self.report
    }

    fn emit(&self, event: BatchProgress) {
        if let Some(tx) = self.progress {
            let _ = tx.send(event);
        }
    }
}

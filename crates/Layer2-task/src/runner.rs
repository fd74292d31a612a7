//! Runner - drives tasks in order and owns the run-scoped state
//!
//! Tasks execute strictly one after another, in the order the caller hands
//! them over. The first error aborts the rest of the sequence and is
//! returned unchanged; nothing is recorded for the failing task.

use crate::state::{TaskHistory, TaskRecord};
use crate::store::SharedStore;
use crate::task::{Task, TaskContext, TaskId};
use buildkit_foundation::{Config, Result};
use std::fmt::Write as _;
use std::time::Instant;
use tracing::{debug, error, info};

/// Pipeline runner
pub struct Runner {
    config: Config,
    store: SharedStore,
    history: TaskHistory,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: SharedStore::new(),
            history: TaskHistory::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SharedStore {
        &mut self.store
    }

    pub fn history(&self) -> &TaskHistory {
        &self.history
    }

    pub fn has_completed_task(&self, id: &TaskId) -> bool {
        self.history.has_completed(id)
    }

    /// Record `id` as completed, overwriting any earlier record.
    ///
    /// Fails only when `id` is not a valid task id.
    pub fn task_completed(
        &mut self,
        id: &str,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Result<()> {
        let id = TaskId::parse(id)?;
        self.complete(TaskRecord::completed(id, summary, detail));
        Ok(())
    }

    fn complete(&mut self, record: TaskRecord) {
        info!("{} {}", record.id, record.summary);
        self.history.record(record);
    }

    /// Drive one task: preconditions, execute, report, completion
    pub async fn run(&mut self, task: &mut dyn Task) -> Result<()> {
        let id = task.id();
        info!("Running task {}", id);
        let started = Instant::now();

        if let Err(e) = task.check_preconditions(&self.config) {
            error!("Task {} precondition failed: {}", id, e);
            return Err(e);
        }

        let report = {
            let mut ctx = TaskContext {
                config: &self.config,
                store: &mut self.store,
                history: &self.history,
            };
            if let Err(e) = task.execute(&mut ctx).await {
                error!("Task {} failed: {}", id, e);
                return Err(e);
            }
            task.report(&ctx)
        };

        debug!("Task {} finished in {:.1}s", id, started.elapsed().as_secs_f64());
        let record = TaskRecord::completed(id, report.summary, report.detail);
        self.complete(record.with_duration(started.elapsed()));
        Ok(())
    }

    /// Run tasks in order, stopping at the first error
    pub async fn run_all(&mut self, tasks: Vec<Box<dyn Task>>) -> Result<()> {
        for mut task in tasks {
            self.run(task.as_mut()).await?;
        }
        Ok(())
    }

    /// Check every task's preconditions without running anything
    pub fn check(&self, tasks: &[Box<dyn Task>]) -> Result<()> {
        for task in tasks {
            task.check_preconditions(&self.config)?;
            debug!("Task {} preconditions satisfied", task.id());
        }
        Ok(())
    }

    pub fn records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.history.iter()
    }

    /// End-of-run summary, one line per completed task
    pub fn summary(&self) -> String {
        let mut out = String::from("Pipeline summary:\n");
        if self.history.is_empty() {
            out.push_str("  (no tasks completed)\n");
            return out;
        }
        for record in self.history.iter() {
            let _ = write!(out, "  {} {}: {}", record.symbol(), record.id, record.summary);
            if let Some(duration) = record.duration {
                let _ = write!(out, " ({:.1}s)", duration.as_secs_f64());
            }
            out.push('\n');
        }
        out
    }
}

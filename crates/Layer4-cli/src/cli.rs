//! Pipeline commands

use buildkit_foundation::{Config, ConfigKey, PipelineStep, ProjectFile};
use buildkit_task::{BackupLedger, LocalExecutor, Runner, Task, TaskFactory};
use std::sync::Arc;
use tracing::{info, warn};

/// Configured steps, or the requested ones with their configured options
fn select_steps(project: &ProjectFile, only: &[String]) -> anyhow::Result<Vec<PipelineStep>> {
    let steps = if only.is_empty() {
        project.steps()
    } else {
        only.iter()
            .map(|task| PipelineStep {
                task: task.clone(),
                options: project.options_for(task),
            })
            .collect()
    };
    if steps.is_empty() {
        anyhow::bail!("no tasks to run: add them to [pipeline] tasks or pass --task");
    }
    Ok(steps)
}

fn build_tasks(project: &ProjectFile, only: &[String]) -> anyhow::Result<Vec<Box<dyn Task>>> {
    let factory = TaskFactory::new(Arc::new(LocalExecutor::new()));
    Ok(factory.create_all(&select_steps(project, only)?)?)
}

/// Run the pipeline and print its summary.
///
/// Returns `false` when a build ran and failed.
pub async fn run_pipeline(project: ProjectFile, only: &[String]) -> anyhow::Result<bool> {
    let tasks = build_tasks(&project, only)?;
    let mut runner = Runner::new(project.config);

    // every precondition up front, so a bad build config never leaves icons decorated
    runner.check(&tasks)?;

    let result = runner.run_all(tasks).await;
    if result.is_err() && !runner.store().icon_backups.is_empty() {
        warn!("Pipeline aborted, restoring original icons");
        if let Err(e) = runner.store_mut().icon_backups.restore_all() {
            warn!("Could not restore every icon, run `buildkit restore`: {}", e);
        }
    }

    println!("{}", runner.summary());
    result?;
    Ok(runner.store().build_succeeded() != Some(false))
}

/// Check preconditions of the selected tasks
pub fn check_pipeline(project: &ProjectFile, only: &[String]) -> anyhow::Result<()> {
    let tasks = build_tasks(project, only)?;
    let runner = Runner::new(project.config.clone());
    runner.check(&tasks)?;

    for task in &tasks {
        println!("✓ {}", task.id());
    }
    Ok(())
}

/// Restore `_Original-*` backups left in the icon directory
pub fn restore_icons(project: &ProjectFile) -> anyhow::Result<()> {
    let restored = restore_leftovers(&project.config)?;
    if restored == 0 {
        println!("No icon backups to restore.");
    } else {
        println!("✓ Restored {} original icons", restored);
    }
    Ok(())
}

fn restore_leftovers(config: &Config) -> anyhow::Result<usize> {
    let icon_dir = config.require_path(ConfigKey::IconDir)?;
    let mut ledger = BackupLedger::from_leftovers(&icon_dir)?;
    let restored = ledger.restore_all()?;
    info!("Restored {} icons in {}", restored, icon_dir.display());
    Ok(restored)
}

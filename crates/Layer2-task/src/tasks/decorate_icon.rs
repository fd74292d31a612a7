//! decorate_icon - stamp the app version onto every app icon
//!
//! Each icon is moved to its `_Original-` backup and a decorated copy is
//! written in its place. The backups are handed to the store so the build
//! task can put the originals back once the app is built.

use crate::backup::{backup_path_for, BackupLedger};
use crate::icon::{IconDecorator, IconSource};
use crate::task::{Task, TaskContext, TaskId, TaskReport};
use crate::version::VersionSource;
use async_trait::async_trait;
use buildkit_foundation::{assert_required_paths, Config, ConfigKey, Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

const REQUIRED: [ConfigKey; 2] = [ConfigKey::InfoPlist, ConfigKey::IconDir];

/// Overlays the version label on the icons in `icon_dir`
pub struct DecorateIconTask {
    versions: Arc<dyn VersionSource>,
    decorator: Arc<dyn IconDecorator>,
    label: Option<String>,
    decorated: Vec<PathBuf>,
}

impl DecorateIconTask {
    pub fn new(versions: Arc<dyn VersionSource>, decorator: Arc<dyn IconDecorator>) -> Self {
        Self {
            versions,
            decorator,
            label: None,
            decorated: Vec::new(),
        }
    }

    /// Version produced earlier in this run, else the one in Info.plist
    fn resolve_label(&self, ctx: &TaskContext<'_>, plist: &Path) -> Result<String> {
        if let Some(version) = &ctx.store.new_version {
            debug!("Using version {} from this run", version.full);
            return Ok(version.full.clone());
        }
        Ok(self.versions.read(plist)?.full)
    }

    async fn decorate_all(
        &self,
        icons: &[PathBuf],
        label: &str,
        ledger: &mut BackupLedger,
    ) -> Result<()> {
        for icon in icons {
            let backup = ledger.back_up(icon)?;
            self.decorator.decorate(&backup, icon, label).await?;
            debug!("Decorated {}", icon.display());
        }
        Ok(())
    }
}

/// Every icon must have a free backup slot before anything is renamed
fn check_backup_slots(icons: &[PathBuf]) -> Result<()> {
    let mut stale = Vec::new();
    for icon in icons {
        match backup_path_for(icon) {
            Some(backup) if backup.exists() => stale.push(backup.display().to_string()),
            Some(_) => {}
            None => {
                return Err(Error::Validation(format!(
                    "{} cannot be backed up",
                    icon.display()
                )))
            }
        }
    }

    if stale.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "stale icon backups from an earlier run, run `buildkit restore` first: {}",
            stale.join(", ")
        )))
    }
}

#[async_trait]
impl Task for DecorateIconTask {
    fn id(&self) -> TaskId {
        TaskId::DECORATE_ICON
    }

    fn check_preconditions(&self, config: &Config) -> Result<()> {
        assert_required_paths(&REQUIRED, config)
    }

    async fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        let plist = ctx.config.require_path(ConfigKey::InfoPlist)?;
        let icon_dir = ctx.config.require_path(ConfigKey::IconDir)?;

        let label = match &self.label {
            Some(label) => label.clone(),
            None => self.resolve_label(ctx, &plist)?,
        };
        self.label = Some(label.clone());

        let icons = IconSource::detect(&icon_dir).icon_files()?;
        check_backup_slots(&icons)?;
        info!("Decorating {} icons with {}", icons.len(), label);

        let mut ledger = BackupLedger::new();
        if let Err(e) = self.decorate_all(&icons, &label, &mut ledger).await {
            error!("Icon decoration failed, restoring {} originals", ledger.len());
            if let Err(restore_err) = ledger.restore_all() {
                // unrestored backups go to the store for the pipeline abort path
                error!("Failed to restore original icons: {}", restore_err);
                ctx.store.icon_backups.extend(ledger);
            }
            return Err(e);
        }

        ctx.store.icon_backups.extend(ledger);
        self.decorated = icons;
        Ok(())
    }

    fn report(&self, _ctx: &TaskContext<'_>) -> TaskReport {
        let label = self.label.as_deref().unwrap_or_default();
        let paths = self
            .decorated
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",\n     ");
        TaskReport::new(
            format!("Decorated {} icons with {}", self.decorated.len(), label),
            format!(
                "Icons have been decorated with {}. They are here: \n{}",
                label, paths
            ),
        )
    }
}

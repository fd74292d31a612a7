//! increment_version - bump CFBundleVersion before the icons are stamped

use crate::task::{Task, TaskContext, TaskId, TaskReport};
use crate::version::{VersionNumber, VersionSource};
use async_trait::async_trait;
use buildkit_foundation::{assert_required_paths, Config, ConfigKey, Result};
use std::sync::Arc;
use tracing::info;

const REQUIRED: [ConfigKey; 1] = [ConfigKey::InfoPlist];

/// Bumps the build number in Info.plist and publishes it in the store
pub struct IncrementVersionTask {
    versions: Arc<dyn VersionSource>,
    previous: Option<VersionNumber>,
}

impl IncrementVersionTask {
    pub fn new(versions: Arc<dyn VersionSource>) -> Self {
        Self {
            versions,
            previous: None,
        }
    }
}

#[async_trait]
impl Task for IncrementVersionTask {
    fn id(&self) -> TaskId {
        TaskId::INCREMENT_VERSION
    }

    fn check_preconditions(&self, config: &Config) -> Result<()> {
        assert_required_paths(&REQUIRED, config)
    }

    async fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        let plist = ctx.config.require_path(ConfigKey::InfoPlist)?;

        let current = self.versions.read(&plist)?;
        let next = current.bump_build()?;
        self.versions.write_build(&plist, &next.build)?;
        info!("Version {} -> {}", current.full, next.full);

        self.previous = Some(current);
        ctx.store.new_version = Some(next);
        Ok(())
    }

    fn report(&self, ctx: &TaskContext<'_>) -> TaskReport {
        let new = ctx
            .store
            .new_version
            .as_ref()
            .map(|v| v.full.as_str())
            .unwrap_or_default();
        let old = self
            .previous
            .as_ref()
            .map(|v| v.full.as_str())
            .unwrap_or_default();
        TaskReport::new(
            format!("Version bumped to {}", new),
            format!("Build number changed from {} to {}", old, new),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Runner;
    use crate::version::PlistVersionSource;
    use buildkit_foundation::Error;
    use std::fs;

    const PLIST: &str = "<plist><dict>\
        <key>CFBundleShortVersionString</key><string>3.1</string>\
        <key>CFBundleVersion</key><string>41</string>\
        </dict></plist>";

    #[tokio::test]
    async fn test_bumps_build_and_stores_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Info.plist"), PLIST).unwrap();
        let config = Config::new(dir.path()).with("info_plist", "Info.plist");

        let mut runner = Runner::new(config);
        let mut task = IncrementVersionTask::new(Arc::new(PlistVersionSource::new()));
        runner.run(&mut task).await.unwrap();

        let version = runner.store().new_version.clone().unwrap();
        assert_eq!(version.full, "3.1 (42)");
        assert!(fs::read_to_string(dir.path().join("Info.plist"))
            .unwrap()
            .contains("<string>42</string>"));

        let record = runner.records().next().unwrap();
        assert_eq!(record.summary, "Version bumped to 3.1 (42)");
        assert!(record.detail.contains("3.1 (41)"));
    }

    #[tokio::test]
    async fn test_missing_plist_is_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path()).with("info_plist", "Info.plist");

        let mut runner = Runner::new(config);
        let mut task = IncrementVersionTask::new(Arc::new(PlistVersionSource::new()));
        let err = runner.run(&mut task).await.unwrap_err();

        assert!(matches!(err, Error::MissingPaths { .. }));
        assert!(runner.store().new_version.is_none());
    }
}

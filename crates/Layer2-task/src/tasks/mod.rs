//! Built-in pipeline tasks
//!
//! - `increment_version`: bump CFBundleVersion
//! - `decorate_icon`: stamp the version onto the app icons
//! - `xcode_build`: build the app, then restore the original icons

pub mod build_status;
pub mod decorate_icon;
pub mod increment_version;
pub mod xcode_build;

pub use build_status::{build_succeeded, parse_exit_marker, ExitStatusSource, EXIT_MARKER};
pub use decorate_icon::DecorateIconTask;
pub use increment_version::IncrementVersionTask;
pub use xcode_build::{xcodebuild_args, BuildAction, XcodeBuildOptions, XcodeBuildTask};

use crate::executor::Executor;
use crate::icon::{IconDecorator, MagickDecorator};
use crate::task::{Task, TaskId};
use crate::version::{PlistVersionSource, VersionSource};
use buildkit_foundation::{Error, PipelineStep, Result, TaskOptions};
use std::sync::Arc;

/// Creates tasks by id, wiring in the shared collaborators
pub struct TaskFactory {
    executor: Arc<dyn Executor>,
    versions: Arc<dyn VersionSource>,
    decorator: Arc<dyn IconDecorator>,
}

impl TaskFactory {
    /// Factory using the plist version source and ImageMagick over `executor`
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            versions: Arc::new(PlistVersionSource::new()),
            decorator: Arc::new(MagickDecorator::new(Arc::clone(&executor))),
            executor,
        }
    }

    pub fn with_version_source(mut self, versions: Arc<dyn VersionSource>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_decorator(mut self, decorator: Arc<dyn IconDecorator>) -> Self {
        self.decorator = decorator;
        self
    }

    /// Ids this factory can build, in pipeline order
    pub fn known_ids() -> [TaskId; 3] {
        [
            TaskId::INCREMENT_VERSION,
            TaskId::DECORATE_ICON,
            TaskId::XCODE_BUILD,
        ]
    }

    pub fn create(&self, id: &str, options: &TaskOptions) -> Result<Box<dyn Task>> {
        let id = TaskId::parse(id)?;
        let task: Box<dyn Task> = match id.as_str() {
            "increment_version" => Box::new(IncrementVersionTask::new(Arc::clone(&self.versions))),
            "decorate_icon" => Box::new(DecorateIconTask::new(
                Arc::clone(&self.versions),
                Arc::clone(&self.decorator),
            )),
            "xcode_build" => Box::new(XcodeBuildTask::new(
                Arc::clone(&self.executor),
                XcodeBuildOptions::from_options(options)?,
            )),
            _ => return Err(Error::UnknownTask(id.to_string())),
        };
        Ok(task)
    }

    /// Tasks for every step, failing on the first unknown one
    pub fn create_all(&self, steps: &[PipelineStep]) -> Result<Vec<Box<dyn Task>>> {
        steps
            .iter()
            .map(|step| self.create(&step.task, &step.options))
            .collect()
    }
}

//! Project file loader
//!
//! ```toml
//! [config]
//! info_plist = "App/Info.plist"
//! icon_dir = "App/Images.xcassets/AppIcon.appiconset"
//!
//! [pipeline]
//! tasks = ["decorate_icon", "xcode_build"]
//!
//! [tasks.xcode_build]
//! clean = true
//! ```

use super::{Config, ConfigKey, TaskOptions};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default project file name
pub const DEFAULT_CONFIG_FILE: &str = "buildkit.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "BUILDKIT_";

/// On-disk format of a project file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from the file extension (TOML unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawProjectFile {
    #[serde(default)]
    config: BTreeMap<String, Value>,

    #[serde(default)]
    pipeline: RawPipeline,

    #[serde(default)]
    tasks: BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPipeline {
    #[serde(default)]
    tasks: Vec<String>,
}

/// One configured pipeline step
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub task: String,
    pub options: TaskOptions,
}

/// Parsed project file
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub config: Config,
    pub pipeline: Vec<String>,
    pub task_options: BTreeMap<String, TaskOptions>,
}

impl ProjectFile {
    /// Options configured for a task (empty when none)
    pub fn options_for(&self, task: &str) -> TaskOptions {
        self.task_options.get(task).cloned().unwrap_or_default()
    }

    /// Configured steps in pipeline order
    pub fn steps(&self) -> Vec<PipelineStep> {
        self.pipeline
            .iter()
            .map(|task| PipelineStep {
                task: task.clone(),
                options: self.options_for(task),
            })
            .collect()
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loads project files and applies `BUILDKIT_*` environment overrides
pub struct ConfigLoader {
    env: EnvLookup,
}

impl ConfigLoader {
    /// Loader reading overrides from the process environment
    pub fn new() -> Self {
        Self {
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Loader with a custom override lookup
    pub fn with_env(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            env: Box::new(lookup),
        }
    }

    /// Loader ignoring the environment
    pub fn without_env() -> Self {
        Self::with_env(|_| None)
    }

    /// Load a project file; relative paths resolve against its directory
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ProjectFile> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));

        debug!("Loading project file {}", path.display());
        self.parse(&content, ConfigFormat::from_path(path), root)
            .map_err(|e| match e {
                Error::Config(msg) => {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), msg))
                }
                other => other,
            })
    }

    /// Parse project file content
    pub fn parse(
        &self,
        content: &str,
        format: ConfigFormat,
        root: impl Into<PathBuf>,
    ) -> Result<ProjectFile> {
        let raw: RawProjectFile = match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))?
            }
        };

        let mut values = raw.config;
        for key in ConfigKey::ALL {
            if let Some(value) = (self.env)(&key.env_var()) {
                debug!("Config key {} overridden from environment", key);
                values.insert(key.as_str().to_string(), Value::String(value));
            }
        }

        let task_options = raw
            .tasks
            .into_iter()
            .map(|(task, opts)| (task, TaskOptions::from_values(opts)))
            .collect();

        Ok(ProjectFile {
            config: Config::from_values(values, root),
            pipeline: raw.pipeline.tasks,
            task_options,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

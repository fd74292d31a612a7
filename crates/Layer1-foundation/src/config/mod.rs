//! Config - read-only pipeline configuration
//!
//! - `loader.rs` - project file loading (TOML / JSON) with env overrides
//! - `options.rs` - per-task option tables

mod loader;
mod options;

pub use loader::{ConfigFormat, ConfigLoader, PipelineStep, ProjectFile, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use options::TaskOptions;

use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Config Keys
// ============================================================================

/// Well-known configuration keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    InfoPlist,
    IconDir,
    AppName,
    Workspace,
    Sdk,
    BuildConfiguration,
    BuildDir,
    Scheme,
    CodeSign,
    ProvisioningProfile,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 10] = [
        ConfigKey::InfoPlist,
        ConfigKey::IconDir,
        ConfigKey::AppName,
        ConfigKey::Workspace,
        ConfigKey::Sdk,
        ConfigKey::BuildConfiguration,
        ConfigKey::BuildDir,
        ConfigKey::Scheme,
        ConfigKey::CodeSign,
        ConfigKey::ProvisioningProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::InfoPlist => "info_plist",
            ConfigKey::IconDir => "icon_dir",
            ConfigKey::AppName => "app_name",
            ConfigKey::Workspace => "workspace",
            ConfigKey::Sdk => "sdk",
            ConfigKey::BuildConfiguration => "build_configuration",
            ConfigKey::BuildDir => "build_dir",
            ConfigKey::Scheme => "scheme",
            ConfigKey::CodeSign => "code_sign",
            ConfigKey::ProvisioningProfile => "provisioning_profile",
        }
    }

    /// Environment variable that overrides this key (`BUILDKIT_ICON_DIR`, ...)
    pub fn env_var(&self) -> String {
        format!("{}{}", ENV_PREFIX, self.as_str().to_ascii_uppercase())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConfigKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown config key: {}", s)))
    }
}

// ============================================================================
// Config
// ============================================================================

/// Immutable view over the configuration source.
///
/// Values are kept as JSON values so that TOML and JSON project files share
/// one representation. Relative paths resolve against `root`, which is the
/// directory of the project file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: BTreeMap<String, Value>,
    root: PathBuf,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            values: BTreeMap::new(),
            root: root.into(),
        }
    }

    pub fn from_values(values: BTreeMap<String, Value>, root: impl Into<PathBuf>) -> Self {
        Self {
            values,
            root: root.into(),
        }
    }

    /// Builder-style setter, only usable while constructing
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.values.insert(key.as_ref().to_string(), value.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw value lookup. `null` and empty strings count as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| is_present(v))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, v)| is_present(v))
            .map(|(k, _)| k.as_str())
    }

    pub fn get_str(&self, key: ConfigKey) -> Option<&str> {
        self.get(key.as_str()).and_then(Value::as_str)
    }

    /// Path value resolved against the project root
    pub fn get_path(&self, key: ConfigKey) -> Option<PathBuf> {
        self.get_str(key).map(|p| self.resolve(p))
    }

    pub fn require_str(&self, key: ConfigKey) -> Result<&str> {
        self.get_str(key).ok_or_else(|| Error::MissingConfig {
            keys: vec![key.to_string()],
        })
    }

    pub fn require_path(&self, key: ConfigKey) -> Result<PathBuf> {
        self.require_str(key).map(|p| self.resolve(p))
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    pub fn info_plist(&self) -> Option<PathBuf> {
        self.get_path(ConfigKey::InfoPlist)
    }

    pub fn icon_dir(&self) -> Option<PathBuf> {
        self.get_path(ConfigKey::IconDir)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.get_str(ConfigKey::AppName)
    }

    pub fn workspace(&self) -> Option<PathBuf> {
        self.get_path(ConfigKey::Workspace)
    }

    pub fn sdk(&self) -> Option<&str> {
        self.get_str(ConfigKey::Sdk)
    }

    pub fn build_configuration(&self) -> Option<&str> {
        self.get_str(ConfigKey::BuildConfiguration)
    }

    pub fn build_dir(&self) -> Option<&str> {
        self.get_str(ConfigKey::BuildDir)
    }

    /// `build_dir` resolved against the project root
    pub fn absolute_build_dir(&self) -> Option<PathBuf> {
        self.get_path(ConfigKey::BuildDir)
    }

    pub fn scheme(&self) -> Option<&str> {
        self.get_str(ConfigKey::Scheme)
    }

    pub fn code_sign(&self) -> Option<&str> {
        self.get_str(ConfigKey::CodeSign)
    }

    pub fn provisioning_profile(&self) -> Option<&str> {
        self.get_str(ConfigKey::ProvisioningProfile)
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_round_trip() {
        for key in ConfigKey::ALL {
            assert_eq!(key.as_str().parse::<ConfigKey>().unwrap(), key);
        }
        assert!("icon_directory".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(ConfigKey::IconDir.env_var(), "BUILDKIT_ICON_DIR");
    }

    #[test]
    fn test_null_and_empty_are_absent() {
        let config = Config::new("/project")
            .with("sdk", Value::Null)
            .with("scheme", "")
            .with("app_name", "Demo");

        assert!(config.sdk().is_none());
        assert!(config.scheme().is_none());
        assert_eq!(config.app_name(), Some("Demo"));
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["app_name"]);
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let config = Config::new("/project")
            .with("build_dir", "build")
            .with("workspace", "/abs/App.xcworkspace");

        assert_eq!(config.build_dir(), Some("build"));
        assert_eq!(
            config.absolute_build_dir(),
            Some(PathBuf::from("/project/build"))
        );
        assert_eq!(
            config.workspace(),
            Some(PathBuf::from("/abs/App.xcworkspace"))
        );
    }

    #[test]
    fn test_require_str_names_key() {
        let config = Config::new("/project");
        match config.require_str(ConfigKey::Scheme) {
            Err(Error::MissingConfig { keys }) => assert_eq!(keys, vec!["scheme"]),
            other => panic!("unexpected: {:?}", other),
        }
    }
}

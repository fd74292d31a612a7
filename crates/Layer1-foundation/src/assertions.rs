//! Precondition assertions
//!
//! Pure checks run before a task performs any side effect. Every missing
//! key or path is collected so the error names all of them at once.

use crate::config::{Config, ConfigKey};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Fail with [`Error::MissingConfig`] naming every key without a value.
///
/// Well-known keys are string valued, so a number or table counts as missing.
pub fn assert_required_config(keys: &[ConfigKey], config: &Config) -> Result<()> {
    let missing: Vec<String> = keys
        .iter()
        .filter(|key| config.get_str(**key).is_none())
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingConfig { keys: missing })
    }
}

/// Fail with [`Error::MissingPaths`] naming every path that does not exist
pub fn assert_files_exist<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    let mut missing: Vec<PathBuf> = Vec::new();
    for path in paths {
        let path: &Path = path.as_ref();
        if !path.exists() {
            missing.push(path.to_path_buf());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingPaths { paths: missing })
    }
}

/// Required keys first, then the paths of the path-valued keys among them.
///
/// Paths are only checked once every key is present, since an absent key
/// has no path to check.
pub fn assert_required_paths(keys: &[ConfigKey], config: &Config) -> Result<()> {
    assert_required_config(keys, config)?;
    let paths: Vec<PathBuf> = keys.iter().filter_map(|key| config.get_path(*key)).collect();
    assert_files_exist(&paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_missing_keys_are_named() {
        let config = Config::new("/project").with("sdk", "iphoneos");
        let keys = [ConfigKey::Sdk, ConfigKey::Scheme, ConfigKey::CodeSign];

        match assert_required_config(&keys, &config) {
            Err(Error::MissingConfig { keys }) => {
                assert_eq!(keys, vec!["scheme", "code_sign"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_present_keys_pass() {
        let config = Config::new("/project")
            .with("sdk", "iphoneos")
            .with("scheme", "Demo");
        assert!(assert_required_config(&[ConfigKey::Sdk, ConfigKey::Scheme], &config).is_ok());
        assert!(assert_required_config(&[], &config).is_ok());
    }

    #[test]
    fn test_non_string_values_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path())
            .with("build_dir", 5)
            .with("info_plist", true)
            .with("sdk", "iphoneos");

        match assert_required_paths(&[ConfigKey::BuildDir, ConfigKey::InfoPlist, ConfigKey::Sdk], &config) {
            Err(Error::MissingConfig { keys }) => assert_eq!(keys, vec!["build_dir", "info_plist"]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_every_subset_of_missing_keys_is_reported() {
        let required = [ConfigKey::AppName, ConfigKey::Sdk, ConfigKey::Scheme];
        for mask in 0u8..8 {
            let mut config = Config::new("/project");
            let mut expected = Vec::new();
            for (i, key) in required.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    config = config.with(key.as_str(), "value");
                } else {
                    expected.push(key.to_string());
                }
            }

            let result = assert_required_config(&required, &config);
            if expected.is_empty() {
                assert!(result.is_ok());
            } else {
                match result {
                    Err(Error::MissingConfig { keys }) => assert_eq!(keys, expected),
                    other => panic!("mask {}: unexpected {:?}", mask, other),
                }
            }
        }
    }

    #[test]
    fn test_missing_paths_are_named() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("Info.plist");
        std::fs::write(&present, "<plist/>").unwrap();
        let absent_a = dir.path().join("Icons");
        let absent_b = dir.path().join("App.xcworkspace");

        match assert_files_exist(&[&present, &absent_a, &absent_b]) {
            Err(Error::MissingPaths { paths }) => assert_eq!(paths, vec![absent_a.clone(), absent_b.clone()]),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(assert_files_exist(&[&present]).is_ok());
    }

    #[test]
    fn test_required_paths_checks_keys_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path()).with("info_plist", "Info.plist");

        let err = assert_required_paths(&[ConfigKey::InfoPlist, ConfigKey::IconDir], &config)
            .unwrap_err();
        assert!(matches!(err, Error::MissingConfig { .. }));

        let err = assert_required_paths(&[ConfigKey::InfoPlist], &config).unwrap_err();
        assert!(matches!(err, Error::MissingPaths { .. }));
    }
}

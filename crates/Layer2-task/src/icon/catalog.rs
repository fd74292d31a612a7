//! Icon discovery
//!
//! An icon directory is either an asset catalog icon set, described by a
//! `Contents.json` manifest, or a plain directory of PNG files.

use crate::backup::is_backup;
use buildkit_foundation::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Manifest file of an asset catalog icon set
pub const MANIFEST_FILE: &str = "Contents.json";

/// `Contents.json` of an icon set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

/// One slot of an icon set; slots without a file have no `filename`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogImage {
    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub idiom: Option<String>,

    #[serde(default)]
    pub size: Option<String>,

    #[serde(default)]
    pub scale: Option<String>,
}

impl CatalogManifest {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Manifest(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Manifest(format!("{}: {}", path.display(), e)))
    }

    /// File names referenced by the manifest, each once, in manifest order
    pub fn filenames(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.images
            .iter()
            .filter_map(|image| image.filename.as_deref())
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Where the icons of an app live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// Icon set with a `Contents.json` manifest
    AssetCatalog { dir: PathBuf },

    /// Loose `*.png` files
    LooseFiles { dir: PathBuf },
}

impl IconSource {
    pub fn detect(dir: &Path) -> Self {
        if dir.join(MANIFEST_FILE).is_file() {
            IconSource::AssetCatalog {
                dir: dir.to_path_buf(),
            }
        } else {
            IconSource::LooseFiles {
                dir: dir.to_path_buf(),
            }
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            IconSource::AssetCatalog { dir } | IconSource::LooseFiles { dir } => dir,
        }
    }

    /// Icon files to decorate
    pub fn icon_files(&self) -> Result<Vec<PathBuf>> {
        match self {
            IconSource::AssetCatalog { dir } => catalog_icon_files(dir),
            IconSource::LooseFiles { dir } => loose_icon_files(dir),
        }
    }
}

fn catalog_icon_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let manifest = CatalogManifest::load(&dir.join(MANIFEST_FILE))?;
    let mut files = Vec::new();

    for name in manifest.filenames() {
        let plain = Path::new(name)
            .file_name()
            .map(|f| f == std::ffi::OsStr::new(name))
            .unwrap_or(false);
        if !plain {
            warn!("Skipping catalog entry with unexpected filename {:?}", name);
            continue;
        }

        let path = dir.join(name);
        if path.is_file() {
            files.push(path);
        } else {
            warn!("Skipping catalog entry {}: file not found", name);
        }
    }

    debug!(
        "Asset catalog {} lists {} icon files",
        dir.display(),
        files.len()
    );
    Ok(files)
}

fn loose_icon_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::Validation(format!("non UTF-8 icon dir: {}", dir.display())))?;
    let pattern = format!("{}/*.png", glob::Pattern::escape(dir_str));

    let entries = glob::glob(&pattern).map_err(|e| Error::Validation(e.to_string()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file() && !is_backup(path))
        .collect();
    files.sort();

    debug!("Found {} loose icon files in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_filenames_skip_entries_without_file() {
        let manifest = CatalogManifest::parse(
            r#"{
                "images": [
                    {"idiom": "iphone", "size": "20x20", "scale": "2x", "filename": "Icon-40.png"},
                    {"idiom": "iphone", "size": "20x20", "scale": "3x"},
                    {"idiom": "iphone", "size": "29x29", "scale": "2x", "filename": "Icon-58.png"},
                    {"idiom": "ipad", "size": "20x20", "scale": "2x", "filename": "Icon-40.png"},
                    {"idiom": "ios-marketing", "size": "1024x1024", "scale": "1x", "filename": ""}
                ],
                "info": {"version": 1, "author": "xcode"}
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.images.len(), 5);
        assert_eq!(manifest.filenames(), vec!["Icon-40.png", "Icon-58.png"]);
    }

    #[test]
    fn test_manifest_without_images() {
        let manifest = CatalogManifest::parse(r#"{"info": {"version": 1}}"#).unwrap();
        assert!(manifest.filenames().is_empty());
        assert!(matches!(
            CatalogManifest::parse("not json"),
            Err(Error::Manifest(_))
        ));
    }

    #[test]
    fn test_detect_asset_catalog() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            IconSource::detect(dir.path()),
            IconSource::LooseFiles { .. }
        ));

        fs::write(dir.path().join(MANIFEST_FILE), r#"{"images": []}"#).unwrap();
        let source = IconSource::detect(dir.path());
        assert!(matches!(source, IconSource::AssetCatalog { .. }));
        assert_eq!(source.dir(), dir.path());
    }

    #[test]
    fn test_catalog_uses_manifest_not_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"images": [{"filename": "b.png"}, {"size": "40x40"}, {"filename": "missing.png"}, {"filename": "../escape.png"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("a.png"), b"a").unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();

        let files = IconSource::detect(dir.path()).icon_files().unwrap();
        assert_eq!(files, vec![dir.path().join("b.png")]);
    }

    #[test]
    fn test_loose_files_skip_backups_and_other_types() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "_Original-c.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = IconSource::detect(dir.path()).icon_files().unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.png"), dir.path().join("b.png")]
        );
    }
}

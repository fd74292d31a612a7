//! Icon backup ledger
//!
//! Originals are renamed to `_Original-<name>` next to themselves before an
//! icon is decorated. The ledger remembers every `(original, backup)` pair so
//! the originals can be put back, newest first, without scanning directories.

use buildkit_foundation::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name prefix of backed-up originals
pub const BACKUP_PREFIX: &str = "_Original-";

/// Backup location for `original`, or `None` when it has no file name or is
/// itself a backup
pub fn backup_path_for(original: &Path) -> Option<PathBuf> {
    let name = original.file_name()?.to_str()?;
    if name.starts_with(BACKUP_PREFIX) {
        return None;
    }
    Some(original.with_file_name(format!("{}{}", BACKUP_PREFIX, name)))
}

/// Original location for `backup`, or `None` when it is not a backup
pub fn original_path_for(backup: &Path) -> Option<PathBuf> {
    let name = backup.file_name()?.to_str()?;
    let original = name.strip_prefix(BACKUP_PREFIX)?;
    if original.is_empty() {
        return None;
    }
    Some(backup.with_file_name(original))
}

pub fn is_backup(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(BACKUP_PREFIX))
        .unwrap_or(false)
}

/// One backed-up file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub original: PathBuf,
    pub backup: PathBuf,
}

/// Ordered list of backups, restored in reverse order
#[derive(Debug, Clone, Default)]
pub struct BackupLedger {
    entries: Vec<BackupEntry>,
}

impl BackupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from `_Original-*` files left in `dir` by an
    /// interrupted run
    pub fn from_leftovers(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let backup = entry?.path();
            if let Some(original) = original_path_for(&backup) {
                entries.push(BackupEntry { original, backup });
            }
        }
        entries.sort_by(|a, b| a.original.cmp(&b.original));
        Ok(Self { entries })
    }

    /// Move `original` aside and record it
    pub fn back_up(&mut self, original: &Path) -> Result<PathBuf> {
        let backup = backup_path_for(original).ok_or_else(|| {
            Error::Validation(format!("cannot back up {}", original.display()))
        })?;
        fs::rename(original, &backup)?;
        debug!("Backed up {} -> {}", original.display(), backup.display());
        self.entries.push(BackupEntry {
            original: original.to_path_buf(),
            backup: backup.clone(),
        });
        Ok(backup)
    }

    /// Move every backup back over its original, newest first.
    ///
    /// Returns the number of restored files. On failure the entries that
    /// were not restored stay in the ledger.
    pub fn restore_all(&mut self) -> Result<usize> {
        let mut restored = 0;
        while let Some(entry) = self.entries.pop() {
            if let Err(e) = restore_entry(&entry) {
                self.entries.push(entry);
                return Err(e);
            }
            restored += 1;
        }
        Ok(restored)
    }

    /// Append all entries of `other`
    pub fn extend(&mut self, other: BackupLedger) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[BackupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn restore_entry(entry: &BackupEntry) -> Result<()> {
    // rename does not replace an existing file on every platform
    if entry.original.exists() {
        fs::remove_file(&entry.original)?;
    }
    fs::rename(&entry.backup, &entry.original)?;
    debug!(
        "Restored {} -> {}",
        entry.backup.display(),
        entry.original.display()
    );
    Ok(())
}

//! Shared store - typed state passed between tasks of one run

use crate::backup::BackupLedger;
use crate::version::VersionNumber;

/// Result of the native build step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    pub succeeded: bool,

    /// Exit code the success decision was based on, if any was found
    pub exit_code: Option<i32>,
}

impl BuildOutcome {
    pub fn from_exit_code(exit_code: Option<i32>) -> Self {
        Self {
            succeeded: exit_code == Some(0),
            exit_code,
        }
    }
}

/// Cross-task state of a single pipeline run.
///
/// Each field has exactly one writer:
/// - `new_version`: `increment_version`
/// - `icon_backups`: `decorate_icon` (drained by `xcode_build`)
/// - `build`: `xcode_build`
#[derive(Debug, Default)]
pub struct SharedStore {
    pub new_version: Option<VersionNumber>,
    pub icon_backups: BackupLedger,
    pub build: Option<BuildOutcome>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until a build task has run
    pub fn build_succeeded(&self) -> Option<bool> {
        self.build.map(|b| b.succeeded)
    }
}

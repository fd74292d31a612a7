//! # buildkit-task
//!
//! Task pipeline for BuildKit.
//! Drives build steps in order, sharing typed state between them.
//!
//! ## Features
//!
//! - Fixed task driver (preconditions, execute, report, completion)
//! - Typed shared store with one writer per field
//! - Icon backup ledger restored newest first
//! - Version bump, icon decoration and xcodebuild tasks
//! - Local process execution with line-by-line log streaming

pub mod backup;
pub mod executor;
pub mod icon;
pub mod runner;
pub mod state;
pub mod store;
pub mod task;
pub mod tasks;
pub mod version;

// Pipeline
pub use runner::Runner;
pub use state::{TaskHistory, TaskRecord};
pub use store::{BuildOutcome, SharedStore};
pub use task::{Task, TaskContext, TaskId, TaskReport};

// Built-in tasks
pub use tasks::{
    build_succeeded, parse_exit_marker, xcodebuild_args, BuildAction, DecorateIconTask,
    ExitStatusSource, IncrementVersionTask, TaskFactory, XcodeBuildOptions, XcodeBuildTask,
    EXIT_MARKER,
};

// Collaborators
pub use backup::{BackupEntry, BackupLedger, BACKUP_PREFIX};
pub use executor::{CommandOutput, CommandSpec, Executor, LocalExecutor};
pub use icon::{
    BandGeometry, CatalogImage, CatalogManifest, DecorationStyle, IconDecorator, IconSource,
    MagickDecorator, MANIFEST_FILE,
};
pub use version::{PlistVersionSource, VersionNumber, VersionSource};

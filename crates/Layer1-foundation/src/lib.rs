//! # buildkit-foundation
//!
//! Foundation layer for BuildKit:
//! - Error: central error type and `Result` alias
//! - Config: immutable pipeline configuration, per-task options, project file loading
//! - Assertions: precondition checks for required config keys and paths

pub mod assertions;
pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    Config, ConfigFormat, ConfigKey, ConfigLoader, PipelineStep, ProjectFile, TaskOptions,
    DEFAULT_CONFIG_FILE, ENV_PREFIX,
};

// ============================================================================
// Assertions
// ============================================================================
pub use assertions::{assert_files_exist, assert_required_config, assert_required_paths};

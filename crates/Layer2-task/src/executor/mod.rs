//! Command executors
//!
//! - `LocalExecutor` - runs processes on the host with output streaming

pub mod local;
pub mod r#trait;

pub use local::LocalExecutor;
pub use r#trait::{CommandOutput, CommandSpec, Executor};

//! Task definition and types

use crate::state::TaskHistory;
use crate::store::SharedStore;
use async_trait::async_trait;
use buildkit_foundation::{Config, Error, Result};
use std::borrow::Cow;
use std::str::FromStr;

/// Identifier of a pipeline task (`decorate_icon`, `xcode_build`, ...)
///
/// Non-empty, lowercase ASCII letters, digits and `_` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Cow<'static, str>);

impl TaskId {
    pub const INCREMENT_VERSION: TaskId = TaskId(Cow::Borrowed("increment_version"));
    pub const DECORATE_ICON: TaskId = TaskId(Cow::Borrowed("decorate_icon"));
    pub const XCODE_BUILD: TaskId = TaskId(Cow::Borrowed("xcode_build"));

    /// Validate and wrap an identifier
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if Self::is_valid(&id) {
            Ok(Self(Cow::Owned(id)))
        } else {
            Err(Error::InvalidTaskId(id))
        }
    }

    pub fn is_valid(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// What a task hands to the runner when it completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    /// One-line summary
    pub summary: String,

    /// Full detail (command output, file lists, ...)
    pub detail: String,
}

impl TaskReport {
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// Everything a running task may see: config, the shared store, and the
/// history of tasks completed earlier in this run.
pub struct TaskContext<'a> {
    pub config: &'a Config,
    pub store: &'a mut SharedStore,
    pub history: &'a TaskHistory,
}

impl TaskContext<'_> {
    pub fn has_completed_task(&self, id: &TaskId) -> bool {
        self.history.has_completed(id)
    }
}

/// A pipeline step.
///
/// Tasks never call each other or the runner. [`crate::Runner::run`] drives
/// every task through `check_preconditions`, `execute` and `report`, in that
/// order, and records the report as the task's completion.
#[async_trait]
pub trait Task: Send {
    fn id(&self) -> TaskId;

    /// Validate required config keys and paths. Must not mutate anything.
    fn check_preconditions(&self, config: &Config) -> Result<()>;

    async fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()>;

    /// Summary of a successful `execute`
    fn report(&self, ctx: &TaskContext<'_>) -> TaskReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_valid() {
        for id in [TaskId::INCREMENT_VERSION, TaskId::DECORATE_ICON, TaskId::XCODE_BUILD] {
            assert!(TaskId::is_valid(id.as_str()));
        }
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for bad in ["", "Decorate", "xcode-build", "two words", "naïve"] {
            assert!(
                matches!(TaskId::parse(bad), Err(Error::InvalidTaskId(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert_eq!(TaskId::parse("sign_ipa2").unwrap().as_str(), "sign_ipa2");
    }

    #[test]
    fn test_parsed_id_equals_constant() {
        assert_eq!("xcode_build".parse::<TaskId>().unwrap(), TaskId::XCODE_BUILD);
    }
}

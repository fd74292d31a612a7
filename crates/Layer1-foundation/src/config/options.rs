//! Per-task options (`[tasks.<id>]` tables)

use serde_json::Value;
use std::collections::BTreeMap;

/// Option table handed to a single task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOptions {
    values: BTreeMap<String, Value>,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    /// Boolean switch; absent or non-boolean means `false`
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_to_false() {
        let opts = TaskOptions::new().with("clean", true).with("log", "yes");
        assert!(opts.flag("clean"));
        assert!(!opts.flag("log"));
        assert!(!opts.flag("missing"));
    }

    #[test]
    fn test_blank_string_is_absent() {
        let opts = TaskOptions::new()
            .with("formatter", "  ")
            .with("program", "xcodebuild");
        assert_eq!(opts.string("formatter"), None);
        assert_eq!(opts.string("program"), Some("xcodebuild"));
    }
}

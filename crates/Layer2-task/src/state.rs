//! Completion history of a pipeline run

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Completion record of one task
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,

    pub completed: bool,

    /// One-line summary, shown in the end-of-run report
    pub summary: String,

    /// Full detail (command output, decorated files, ...)
    pub detail: String,

    pub finished_at: DateTime<Utc>,

    /// Wall time spent in the task, when driven by the runner
    pub duration: Option<Duration>,
}

impl TaskRecord {
    pub fn completed(id: TaskId, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id,
            completed: true,
            summary: summary.into(),
            detail: detail.into(),
            finished_at: Utc::now(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Symbol for terminal output
    pub fn symbol(&self) -> &'static str {
        if self.completed {
            "✓"
        } else {
            "◯"
        }
    }
}

/// Ordered task history. Re-recording an id overwrites its entry in place.
#[derive(Debug, Clone, Default)]
pub struct TaskHistory {
    records: Vec<TaskRecord>,
}

impl TaskHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: TaskRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn has_completed(&self, id: &TaskId) -> bool {
        self.get(id).map(|r| r.completed).unwrap_or(false)
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_query() {
        let mut history = TaskHistory::new();
        assert!(!history.has_completed(&TaskId::DECORATE_ICON));

        history.record(TaskRecord::completed(TaskId::DECORATE_ICON, "done", "details"));
        assert!(history.has_completed(&TaskId::DECORATE_ICON));
        assert!(!history.has_completed(&TaskId::XCODE_BUILD));
    }

    #[test]
    fn test_rerecord_overwrites_in_place() {
        let mut history = TaskHistory::new();
        history.record(TaskRecord::completed(TaskId::DECORATE_ICON, "first", ""));
        history.record(TaskRecord::completed(TaskId::XCODE_BUILD, "build", ""));
        history.record(TaskRecord::completed(TaskId::DECORATE_ICON, "second", ""));

        assert_eq!(history.len(), 2);
        let ids: Vec<_> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["decorate_icon", "xcode_build"]);
        assert_eq!(history.get(&TaskId::DECORATE_ICON).unwrap().summary, "second");
    }

    #[test]
    fn test_incomplete_record_is_not_completed() {
        let mut history = TaskHistory::new();
        let mut record = TaskRecord::completed(TaskId::XCODE_BUILD, "", "");
        record.completed = false;
        history.record(record);
        assert!(!history.has_completed(&TaskId::XCODE_BUILD));
    }
}

//! AI patches: `{id, priority, reason}` applied to existing tasks.

use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub id: String,
    pub priority: i64,
    pub reason: String,
}

impl Patch {
    pub fn new(id: impl Into<String>, priority: i64, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority,
            reason: reason.into(),
        }
    }
}

/// Apply patches to a copy of `tasks`.
///
/// Only `priority` and `aiReason` change. Unknown ids are skipped, tasks
/// without a patch are untouched, and collection order is preserved. When an
/// id appears twice the later patch wins.
///
/// Returns the new collection and the number of tasks that were patched.
pub fn merge(tasks: &[Task], patches: &[Patch]) -> (Vec<Task>, usize) {
    let by_id: HashMap<&str, &Patch> = patches.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut touched = 0;
    let merged = tasks
        .iter()
        .map(|t| match by_id.get(t.id.as_str()) {
            Some(p) => {
                touched += 1;
                Task {
                    priority: Some(p.priority),
                    ai_reason: Some(p.reason.clone()),
                    ..t.clone()
                }
            }
            None => t.clone(),
        })
        .collect();

    (merged, touched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches_only_matching_tasks() {
        let tasks = vec![Task::new("task-1", "a"), Task::new("task-2", "b")];
        let (out, n) = merge(&tasks, &[Patch::new("task-2", 1, "urgent")]);

        assert_eq!(n, 1);
        assert_eq!(out[0], tasks[0]);
        assert_eq!(out[1].priority, Some(1));
        assert_eq!(out[1].ai_reason.as_deref(), Some("urgent"));
        assert_eq!(out[1].description, "b");
    }

    #[test]
    fn unknown_ids_never_create_tasks() {
        let tasks = vec![Task::new("task-1", "a")];
        let (out, n) = merge(&tasks, &[Patch::new("ghost", 1, "?")]);
        assert_eq!(n, 0);
        assert_eq!(out, tasks);
    }

    #[test]
    fn later_duplicate_wins() {
        let tasks = vec![Task::new("task-1", "a")];
        let (out, _) = merge(
            &tasks,
            &[Patch::new("task-1", 4, "first"), Patch::new("task-1", 2, "second")],
        );
        assert_eq!(out[0].priority, Some(2));
        assert_eq!(out[0].ai_reason.as_deref(), Some("second"));
    }
}

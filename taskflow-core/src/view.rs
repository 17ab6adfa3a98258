//! Filter/sort pipeline — pure, deterministic view over a task collection.
//!
//! Ordering (ascending):
//! - priority (missing sorts last)
//! - deadline (missing sorts last)
//! - creation order: `createdAt` millis, else the numeric segment of the id

use crate::task::{Task, TaskStatus};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => task.status == s,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        Ok(StatusFilter::Only(s.parse()?))
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(s) => s.fmt(f),
        }
    }
}

/// Filter by status, then by case-insensitive description match, then sort.
pub fn view(tasks: &[Task], filter: StatusFilter, search: &str) -> Vec<Task> {
    let needle = search.to_lowercase();

    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| filter.matches(t))
        .filter(|t| needle.is_empty() || t.description.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    // sort_by is stable: full ties keep input order.
    out.sort_by(compare_tasks);
    out
}

pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    missing_last(a.priority, b.priority)
        .then_with(|| missing_last(a.deadline, b.deadline))
        .then_with(|| creation_rank(a).cmp(&creation_rank(b)))
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+").expect("static regex"));

/// Best-effort creation order. Tasks created by this crate carry `createdAt`;
/// older ones fall back to the millis segment of `task-<millis>-<suffix>`.
pub fn creation_rank(task: &Task) -> i64 {
    if let Some(created) = task.created_at {
        return created.timestamp_millis();
    }
    id_suffix_number(&task.id)
}

/// Leading digits of the segment after the first `-`; 0 when there are none.
pub fn id_suffix_number(id: &str) -> i64 {
    id.split('-')
        .nth(1)
        .and_then(|seg| LEADING_DIGITS.find(seg))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

//! Plain-text rendering of tasks for the terminal.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskflow_core::time::format_local;
use taskflow_core::Task;

pub fn task_line(t: &Task, now: DateTime<Utc>, tz: Tz) -> String {
    let priority = t
        .priority
        .map(|p| format!("P{p}"))
        .unwrap_or_else(|| "--".to_string());

    let due = match t.deadline {
        Some(d) => format_local(d, tz),
        None => "no deadline".to_string(),
    };
    let overdue = if t.is_overdue(now) { " (overdue)" } else { "" };

    let mut line = format!(
        "[{:<11}] {:>4} | {} | due {}{} | {}",
        t.status.label(),
        priority,
        t.id,
        due,
        overdue,
        t.description
    );
    if !t.dependencies.is_empty() {
        line.push_str(&format!(" | after: {}", t.dependencies.join(", ")));
    }
    line
}

pub fn task_detail(t: &Task, now: DateTime<Utc>, tz: Tz) -> String {
    let mut s = task_line(t, now, tz);
    if let Some(reason) = &t.ai_reason {
        s.push_str(&format!("\n      AI: {reason}"));
    }
    s
}

use chrono::{DateTime, Duration, Utc};
use taskflow_core::{Task, TaskStatus};

/// Starter tasks shown on first run, before any task file exists.
pub fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let due = |days: i64| now + Duration::days(days);

    let mut setup = Task::new("task-1", "Setup project structure")
        .with_deadline(due(2))
        .with_status(TaskStatus::Done)
        .with_priority(1);
    setup.ai_reason = Some("Completed task, lowest priority.".to_string());

    let mut ui = Task::new("task-2", "Implement UI components based on Figma designs")
        .with_deadline(due(5))
        .with_dependencies(["task-1"])
        .with_status(TaskStatus::InProgress)
        .with_priority(2);
    ui.ai_reason = Some("In progress, moderate priority.".to_string());

    let mut auth = Task::new(
        "task-3",
        "Connect frontend to backend user authentication API endpoints",
    )
    .with_deadline(due(7))
    .with_dependencies(["task-2"])
    .with_priority(3);
    auth.ai_reason = Some("Upcoming task, standard priority.".to_string());

    vec![
        setup,
        ui,
        auth,
        Task::new("task-4", "Write unit tests for core task logic functions")
            .with_deadline(due(10))
            .with_dependencies(["task-3"]),
        Task::new(
            "task-5",
            "Configure CI/CD pipeline for automated deployment to staging",
        )
        .with_deadline(due(14))
        .with_dependencies(["task-4"])
        .with_status(TaskStatus::Backlog),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_core::validate_task;

    #[test]
    fn samples_are_valid_and_chained() {
        let tasks = sample_tasks(Utc::now());
        assert_eq!(tasks.len(), 5);
        for t in &tasks {
            validate_task(t).unwrap();
        }
        assert!(tasks[4].depends_on("task-4"));
        assert!(tasks[3].priority.is_none());
    }
}

use crate::error::ValidationError;
use crate::task::Task;
use std::collections::HashSet;

pub const MAX_DESCRIPTION_CHARS: usize = 100;

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(())
}

/// Checks a task about to be created or edited. Dependency ids are not
/// checked for existence.
pub fn validate_task(task: &Task) -> Result<(), ValidationError> {
    validate_description(&task.description)?;
    if task.deadline.is_none() {
        return Err(ValidationError::MissingDeadline);
    }
    if task.depends_on(&task.id) {
        return Err(ValidationError::SelfDependency(task.id.clone()));
    }
    Ok(())
}

/// Drops blanks and repeats, keeping first-seen order.
pub fn normalize_dependencies(deps: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    deps.into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty() && seen.insert(d.clone()))
        .collect()
}

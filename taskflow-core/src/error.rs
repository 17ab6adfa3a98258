//! Error taxonomy for the core crate.

use thiserror::Error;

/// Malformed task input, rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("description is required")]
    EmptyDescription,

    #[error("description must be {max} characters or less (got {len})")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("deadline is required")]
    MissingDeadline,

    #[error("task '{0}' cannot depend on itself")]
    SelfDependency(String),
}

/// Failure inside a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse stored value for key '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task '{0}' not found")]
    NotFound(String),

    #[error("task id '{0}' already exists")]
    DuplicateId(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Everything that can go wrong around one AI prioritization request.
/// The store is never touched when one of these is returned.
#[derive(Debug, Error)]
pub enum AiRequestError {
    #[error("no tasks to prioritize")]
    NothingToPrioritize,

    #[error("a prioritization request is already in flight")]
    AlreadyInFlight,

    #[error("suggestion service failed: {0:#}")]
    Service(anyhow::Error),

    #[error("malformed suggestion response: {0}")]
    MalformedResponse(String),
}

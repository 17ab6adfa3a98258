//! taskflow-core: task model, view pipeline, persistent store and AI prioritization

pub mod backend;
pub mod error;
pub mod patch;
pub mod prioritize;
pub mod store;
pub mod task;
pub mod time;
pub mod validate;
pub mod view;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use error::{AiRequestError, StorageError, StoreError, ValidationError};
pub use patch::{merge, Patch};
pub use prioritize::{
    build_request, parse_response, PrioritizeReport, PrioritizeStoreError, Prioritizer,
    SuggestionRequest, SuggestionService,
};
pub use store::{NewTask, TaskEdit, TaskStore, STORE_KEY};
pub use task::{generate_task_id, Task, TaskStatus};
pub use validate::{validate_task, MAX_DESCRIPTION_CHARS};
pub use view::{view, StatusFilter};

//! TaskStore — the canonical task collection, mirrored to a storage backend.
//!
//! Every mutation funnels through [`TaskStore::update`]: the new collection is
//! serialized and written first, and only a successful write replaces the
//! in-memory state. A failed write leaves the store exactly as it was.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::error::{StorageError, StoreError};
use crate::patch::{merge, Patch};
use crate::task::{generate_task_id, Task, TaskStatus};
use crate::validate::{normalize_dependencies, validate_task};

pub const STORE_KEY: &str = "tasks";

/// User input for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Generated when `None`.
    pub id: Option<String>,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub dependencies: Vec<String>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn new(description: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            id: None,
            description: description.into(),
            deadline: Some(deadline),
            dependencies: Vec::new(),
            status: TaskStatus::Todo,
        }
    }
}

/// Field-wise edit. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub dependencies: Option<Vec<String>>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug)]
pub struct TaskStore<B> {
    backend: B,
    key: String,
    tasks: Vec<Task>,
}

impl<B: StorageBackend> TaskStore<B> {
    /// Load once from `backend`, falling back to `defaults` when the slot is
    /// absent, unreadable or unparsable. Never fails.
    pub fn load(backend: B, defaults: Vec<Task>) -> Self {
        Self::load_with_key(backend, STORE_KEY, defaults)
    }

    pub fn load_with_key(backend: B, key: impl Into<String>, defaults: Vec<Task>) -> Self {
        Self::open(backend, key.into(), defaults, false)
    }

    /// Like [`TaskStore::load`], but an absent slot is seeded with `defaults`
    /// so they stay fixed across sessions. A corrupt slot is not overwritten.
    pub fn load_seeded(backend: B, defaults: Vec<Task>) -> Self {
        Self::open(backend, STORE_KEY.to_string(), defaults, true)
    }

    fn open(backend: B, key: String, defaults: Vec<Task>, seed_absent: bool) -> Self {
        let (tasks, absent) = match read_tasks(&backend, &key) {
            Ok(Some(tasks)) => {
                debug!(key = %key, count = tasks.len(), "loaded tasks");
                (tasks, false)
            }
            Ok(None) => {
                debug!(key = %key, "no stored tasks; using defaults");
                (defaults, true)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read stored tasks; using defaults");
                (defaults, false)
            }
        };

        let mut store = Self { backend, key, tasks };
        if absent && seed_absent {
            let defaults = store.tasks.clone();
            if let Err(e) = store.commit(defaults) {
                warn!(key = %store.key, error = %e, "failed to persist default tasks");
            }
        }
        store
    }

    pub fn get(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replace the whole collection.
    pub fn replace(&mut self, tasks: Vec<Task>) -> Result<(), StoreError> {
        self.commit(tasks)
    }

    /// Derive the next collection from the current one.
    pub fn update(&mut self, f: impl FnOnce(&[Task]) -> Vec<Task>) -> Result<(), StoreError> {
        let next = f(&self.tasks);
        self.commit(next)
    }

    /// Create a task. Stamps `createdAt` with `now` and returns the stored task.
    pub fn add(&mut self, input: NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let task = Task {
            id: input.id.unwrap_or_else(|| generate_task_id(now)),
            description: input.description.trim().to_string(),
            deadline: input.deadline,
            dependencies: normalize_dependencies(input.dependencies),
            status: input.status,
            priority: None,
            ai_reason: None,
            created_at: Some(now),
        };
        validate_task(&task)?;
        if self.find(&task.id).is_some() {
            return Err(StoreError::DuplicateId(task.id));
        }

        let added = task.clone();
        self.update(|prev| {
            let mut next = prev.to_vec();
            next.push(task);
            next
        })?;
        debug!(id = %added.id, "task added");
        Ok(added)
    }

    /// Apply a user edit. Priority and AI reason are kept.
    pub fn edit(&mut self, id: &str, edit: TaskEdit) -> Result<Task, StoreError> {
        let mut task = self.require(id)?.clone();
        if let Some(d) = edit.description {
            task.description = d.trim().to_string();
        }
        if let Some(d) = edit.deadline {
            task.deadline = Some(d);
        }
        if let Some(deps) = edit.dependencies {
            task.dependencies = normalize_dependencies(deps);
        }
        if let Some(s) = edit.status {
            task.status = s;
        }
        validate_task(&task)?;

        self.put(task.clone())?;
        Ok(task)
    }

    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task, StoreError> {
        let task = self.require(id)?.clone().with_status(status);
        self.put(task.clone())?;
        Ok(task)
    }

    /// Manual priority. Clears the AI reason, which no longer explains it.
    pub fn set_priority(&mut self, id: &str, priority: Option<i64>) -> Result<Task, StoreError> {
        let mut task = self.require(id)?.clone();
        task.priority = priority;
        task.ai_reason = None;
        self.put(task.clone())?;
        Ok(task)
    }

    /// Remove a task and strip its id from every other task's dependencies,
    /// in a single write.
    pub fn delete(&mut self, id: &str) -> Result<Task, StoreError> {
        let removed = self.require(id)?.clone();
        self.update(|prev| {
            prev.iter()
                .filter(|t| t.id != id)
                .map(|t| {
                    let mut t = t.clone();
                    t.dependencies.retain(|d| d != id);
                    t
                })
                .collect()
        })?;
        debug!(id = %id, "task deleted");
        Ok(removed)
    }

    /// Merge AI patches as one update. Returns how many tasks changed.
    pub fn apply_patches(&mut self, patches: &[Patch]) -> Result<usize, StoreError> {
        let (next, touched) = merge(&self.tasks, patches);
        self.commit(next)?;
        debug!(
            patched = touched,
            ignored = patches.len().saturating_sub(touched),
            "applied patches"
        );
        Ok(touched)
    }

    fn require(&self, id: &str) -> Result<&Task, StoreError> {
        self.find(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put(&mut self, task: Task) -> Result<(), StoreError> {
        self.update(|prev| {
            prev.iter()
                .map(|t| if t.id == task.id { task.clone() } else { t.clone() })
                .collect()
        })
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&next).map_err(|source| StorageError::Serialize {
            key: self.key.clone(),
            source,
        })?;
        self.backend.write(&self.key, &json)?;
        self.tasks = next;
        Ok(())
    }
}

fn read_tasks<B: StorageBackend>(
    backend: &B,
    key: &str,
) -> Result<Option<Vec<Task>>, StorageError> {
    let Some(raw) = backend.read(key)? else {
        return Ok(None);
    };
    let tasks = serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
        key: key.to_string(),
        source,
    })?;
    Ok(Some(tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::ValidationError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap()
    }

    fn seeded(backend: &MemoryBackend) -> TaskStore<&MemoryBackend> {
        let tasks = vec![
            Task::new("task-1", "setup").with_deadline(now()),
            Task::new("task-2", "build")
                .with_deadline(now())
                .with_dependencies(["task-1"]),
            Task::new("task-3", "ship")
                .with_deadline(now())
                .with_dependencies(["task-1", "task-2"]),
        ];
        TaskStore::load(backend, tasks)
    }

    fn stored(backend: &MemoryBackend) -> Vec<Task> {
        serde_json::from_str(&backend.get(STORE_KEY).unwrap()).unwrap()
    }

    #[test]
    fn falls_back_to_defaults_when_absent_or_corrupt() {
        let empty = MemoryBackend::new();
        let s = TaskStore::load(&empty, vec![Task::new("d", "default")]);
        assert_eq!(s.get()[0].id, "d");

        let corrupt = MemoryBackend::with_value(STORE_KEY, "{not json");
        let s = TaskStore::load(&corrupt, vec![Task::new("d", "default")]);
        assert_eq!(s.len(), 1);
        // loading alone never writes
        assert_eq!(corrupt.get(STORE_KEY).as_deref(), Some("{not json"));
    }

    #[test]
    fn seeded_load_persists_defaults_only_when_absent() {
        let empty = MemoryBackend::new();
        let s = TaskStore::load_seeded(&empty, vec![Task::new("d", "default")]);
        assert_eq!(s.len(), 1);
        assert_eq!(stored(&empty), s.get());

        // second session sees the same tasks, not a fresh set of defaults
        let again = TaskStore::load_seeded(&empty, vec![Task::new("other", "x")]);
        assert_eq!(again.get()[0].id, "d");

        let corrupt = MemoryBackend::with_value(STORE_KEY, "{not json");
        let s = TaskStore::load_seeded(&corrupt, vec![Task::new("d", "default")]);
        assert_eq!(s.get()[0].id, "d");
        assert_eq!(corrupt.get(STORE_KEY).as_deref(), Some("{not json"));
    }

    #[test]
    fn seeded_load_survives_a_failing_backend() {
        let s = TaskStore::load_seeded(FailingBackend, vec![Task::new("d", "default")]);
        assert_eq!(s.get()[0].id, "d");
    }

    #[test]
    fn prefers_stored_tasks_over_defaults() {
        let b = MemoryBackend::with_value(
            STORE_KEY,
            r#"[{"id":"task-7","description":"stored","deadline":"2026-01-01T00:00:00Z","dependencies":[],"status":"done"}]"#,
        );
        let s = TaskStore::load(&b, vec![Task::new("d", "default")]);
        assert_eq!(s.get().len(), 1);
        assert_eq!(s.get()[0].status, TaskStatus::Done);
    }

    #[test]
    fn every_mutation_is_persisted() {
        let b = MemoryBackend::new();
        let mut s = seeded(&b);

        let t = s
            .add(NewTask::new("  new thing  ", now() + Duration::days(1)), now())
            .unwrap();
        assert_eq!(t.description, "new thing");
        assert_eq!(t.created_at, Some(now()));
        assert_eq!(stored(&b), s.get());

        s.set_status("task-2", TaskStatus::InProgress).unwrap();
        assert_eq!(stored(&b)[1].status, TaskStatus::InProgress);
    }

    #[test]
    fn add_rejects_invalid_input_without_touching_storage() {
        let b = MemoryBackend::new();
        let mut s = seeded(&b);

        let err = s.add(NewTask::new("", now()), now()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::EmptyDescription)));

        let mut dup = NewTask::new("again", now());
        dup.id = Some("task-1".to_string());
        assert!(matches!(s.add(dup, now()), Err(StoreError::DuplicateId(_))));

        assert!(b.get(STORE_KEY).is_none());
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn delete_cascades_dependencies_in_one_write() {
        let b = MemoryBackend::new();
        let mut s = seeded(&b);

        s.delete("task-1").unwrap();

        let on_disk = stored(&b);
        assert_eq!(on_disk, s.get());
        assert!(s.find("task-1").is_none());
        assert!(s.get().iter().all(|t| !t.depends_on("task-1")));
        assert_eq!(s.find("task-3").unwrap().dependencies, vec!["task-2"]);
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let b = MemoryBackend::new();
        let mut s = seeded(&b);
        assert!(matches!(s.delete("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn edit_keeps_ai_fields_and_manual_priority_clears_reason() {
        let b = MemoryBackend::new();
        let mut s = seeded(&b);
        s.apply_patches(&[Patch::new("task-2", 1, "blocks release")]).unwrap();

        let edited = s
            .edit(
                "task-2",
                TaskEdit {
                    description: Some("build harder".to_string()),
                    ..TaskEdit::default()
                },
            )
            .unwrap();
        assert_eq!(edited.priority, Some(1));
        assert_eq!(edited.ai_reason.as_deref(), Some("blocks release"));

        let manual = s.set_priority("task-2", Some(4)).unwrap();
        assert_eq!(manual.priority, Some(4));
        assert!(manual.ai_reason.is_none());
    }

    #[test]
    fn edit_rejects_self_dependency() {
        let b = MemoryBackend::new();
        let mut s = seeded(&b);
        let err = s
            .edit(
                "task-2",
                TaskEdit {
                    dependencies: Some(vec!["task-2".to_string()]),
                    ..TaskEdit::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::SelfDependency(_))));
        assert_eq!(s.find("task-2").unwrap().dependencies, vec!["task-1"]);
    }

    struct FailingBackend;

    impl StorageBackend for FailingBackend {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let mut s = TaskStore::load(
            FailingBackend,
            vec![Task::new("task-1", "a").with_deadline(now())],
        );
        let before = s.get().to_vec();

        assert!(matches!(s.delete("task-1"), Err(StoreError::Storage(_))));
        assert_eq!(s.get(), before.as_slice());
    }
}

//! AI prioritization adapter.
//!
//! Flow:
//! 1) refuse empty input and concurrent re-entry
//! 2) build one request item per task
//! 3) call the suggestion service once
//! 4) validate the whole response before anything is merged
//!
//! The adapter never writes to the store itself; [`Prioritizer::prioritize`]
//! returns patches and [`Prioritizer::prioritize_store`] applies them after the
//! call completes.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::StorageBackend;
use crate::error::{AiRequestError, StoreError};
use crate::patch::Patch;
use crate::store::TaskStore;
use crate::task::Task;

/// One task as sent to the suggestion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub id: String,
    pub description: String,
    /// RFC 3339.
    pub deadline: String,
    pub dependencies: Vec<String>,
}

/// The external AI collaborator. Returns the raw JSON it produced; shape
/// checking is the adapter's job.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(&self, request: &[SuggestionRequest]) -> anyhow::Result<Value>;
}

#[async_trait]
impl<S: SuggestionService + ?Sized> SuggestionService for std::sync::Arc<S> {
    async fn suggest(&self, request: &[SuggestionRequest]) -> anyhow::Result<Value> {
        (**self).suggest(request).await
    }
}

/// Outcome of a store-level prioritization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritizeReport {
    pub suggested: usize,
    pub applied: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PrioritizeStoreError {
    #[error(transparent)]
    Request(#[from] AiRequestError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Prioritizer<S> {
    service: S,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path, including a dropped future.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: SuggestionService> Prioritizer<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Ask the service for priorities. `now` stands in for missing deadlines.
    pub async fn prioritize(
        &self,
        tasks: &[Task],
        now: DateTime<Utc>,
    ) -> Result<Vec<Patch>, AiRequestError> {
        if tasks.is_empty() {
            return Err(AiRequestError::NothingToPrioritize);
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(AiRequestError::AlreadyInFlight);
        };

        let request = build_request(tasks, now);
        debug!(tasks = request.len(), "requesting priority suggestions");

        let raw = self
            .service
            .suggest(&request)
            .await
            .map_err(AiRequestError::Service)?;

        parse_response(&raw)
    }

    /// Snapshot the store, call the service without holding the lock, then
    /// merge the accepted response in one update.
    pub async fn prioritize_store<B: StorageBackend>(
        &self,
        store: &Mutex<TaskStore<B>>,
        now: DateTime<Utc>,
    ) -> Result<PrioritizeReport, PrioritizeStoreError> {
        let snapshot = lock(store).get().to_vec();

        let patches = match self.prioritize(&snapshot, now).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "prioritization failed; tasks unchanged");
                return Err(e.into());
            }
        };

        let applied = lock(store).apply_patches(&patches)?;
        info!(suggested = patches.len(), applied, "tasks prioritized");
        Ok(PrioritizeReport {
            suggested: patches.len(),
            applied,
        })
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

pub fn build_request(tasks: &[Task], now: DateTime<Utc>) -> Vec<SuggestionRequest> {
    tasks
        .iter()
        .map(|t| SuggestionRequest {
            id: t.id.clone(),
            description: t.description.clone(),
            deadline: t
                .deadline
                .unwrap_or(now)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            dependencies: t.dependencies.clone(),
        })
        .collect()
}

/// Accept the response only if every element is `{id: string, priority:
/// integral number, reason: string}`. Extra fields are ignored.
pub fn parse_response(raw: &Value) -> Result<Vec<Patch>, AiRequestError> {
    let malformed = |msg: String| AiRequestError::MalformedResponse(msg);

    let items = raw
        .as_array()
        .ok_or_else(|| malformed(format!("expected a JSON array, got {}", kind(raw))))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item.as_object().ok_or_else(|| {
                malformed(format!("element {i}: expected an object, got {}", kind(item)))
            })?;

            let id = match obj.get("id") {
                Some(Value::String(s)) => s.clone(),
                other => {
                    return Err(malformed(format!(
                        "element {i}: 'id' must be a string, got {}",
                        kind_opt(other)
                    )));
                }
            };
            let priority = match obj.get("priority") {
                Some(Value::Number(n)) => integral(n).ok_or_else(|| {
                    malformed(format!(
                        "element {i}: 'priority' must be a whole number, got {n} \
                         (fractional priorities are rejected)"
                    ))
                })?,
                other => {
                    return Err(malformed(format!(
                        "element {i}: 'priority' must be a number, got {}",
                        kind_opt(other)
                    )));
                }
            };
            let reason = match obj.get("reason") {
                Some(Value::String(s)) => s.clone(),
                other => {
                    return Err(malformed(format!(
                        "element {i}: 'reason' must be a string, got {}",
                        kind_opt(other)
                    )));
                }
            };

            Ok(Patch { id, priority, reason })
        })
        .collect()
}

fn integral(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn kind_opt(v: Option<&Value>) -> &'static str {
    v.map_or("nothing", kind)
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use taskflow_core::{
    AiRequestError, PrioritizeReport, PrioritizeStoreError, Prioritizer, StorageBackend,
    SuggestionService, TaskStore,
};

#[derive(Debug, PartialEq, Eq)]
pub enum PrioritizeOutcome {
    NothingToPrioritize,
    Applied(PrioritizeReport),
}

/// Prioritize every task in `store`.
///
/// An empty store short-circuits before `make_service` runs, so missing
/// credentials or config never mask the "nothing to do" answer.
pub async fn run<B, S, F>(
    store: &Mutex<TaskStore<B>>,
    make_service: F,
    now: DateTime<Utc>,
) -> Result<PrioritizeOutcome>
where
    B: StorageBackend,
    S: SuggestionService,
    F: FnOnce() -> Result<S>,
{
    let count = store.lock().map(|s| s.len()).unwrap_or(0);
    if count == 0 {
        return Ok(PrioritizeOutcome::NothingToPrioritize);
    }

    let prioritizer = Prioritizer::new(make_service()?);
    eprintln!("Prioritizing {count} tasks…");

    match prioritizer.prioritize_store(store, now).await {
        Ok(report) => Ok(PrioritizeOutcome::Applied(report)),
        Err(PrioritizeStoreError::Request(AiRequestError::NothingToPrioritize)) => {
            Ok(PrioritizeOutcome::NothingToPrioritize)
        }
        Err(e) => Err(anyhow::Error::new(e).context("Prioritization failed; tasks unchanged")),
    }
}

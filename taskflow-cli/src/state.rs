use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use taskflow_core::FileBackend;

/// `$TASKFLOW_HOME`, else `~/.taskflow`.
pub fn taskflow_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("TASKFLOW_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".taskflow"))
}

pub fn ensure_taskflow_home() -> Result<PathBuf> {
    let dir = taskflow_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Task file backend rooted in the taskflow home (`tasks.json`).
pub fn task_backend() -> Result<FileBackend> {
    Ok(FileBackend::new(ensure_taskflow_home()?))
}

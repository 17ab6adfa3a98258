use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::Mutex;
use std::time::Duration;
use taskflow_core::time::{parse_local_deadline_to_utc, parse_timezone};
use taskflow_core::{view, FileBackend, NewTask, StatusFilter, TaskEdit, TaskStatus, TaskStore};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod llm;
mod prioritize_cmd;
mod prompt;
mod render;
mod seed;
mod state;

use prioritize_cmd::PrioritizeOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "taskflow",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TASKFLOW_BUILD_SHA"), ")"),
    about = "Personal task tracker with AI-assisted prioritization"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a task
    Add {
        #[arg(long, short)]
        description: String,

        /// Deadline as "YYYY-MM-DD HH:MM" (or "YYYY-MM-DD") in the configured timezone
        #[arg(long)]
        due: String,

        /// Id of a prerequisite task (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,

        #[arg(long, default_value = "todo", value_parser = parse_status)]
        status: TaskStatus,
    },

    /// Edit description, deadline or dependencies of a task
    Edit {
        id: String,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long)]
        due: Option<String>,

        /// Replace dependencies with these ids (repeatable)
        #[arg(long = "depends-on", conflicts_with = "clear_deps")]
        depends_on: Vec<String>,

        /// Remove all dependencies
        #[arg(long, default_value_t = false)]
        clear_deps: bool,
    },

    /// Move a task to another status (todo, in-progress, done, backlog)
    Status {
        id: String,

        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },

    /// Set a manual priority (lower is more urgent); omit the number to clear it
    Priority { id: String, priority: Option<i64> },

    /// Delete a task and drop it from other tasks' dependencies
    Delete { id: String },

    /// List tasks ordered by priority, deadline, then creation
    List {
        /// all, todo, in-progress, done or backlog
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        status: StatusFilter,

        /// Case-insensitive description filter
        #[arg(long, short, default_value = "")]
        search: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Ask the configured model to suggest priorities for every task
    Prioritize,

    /// Manage ~/.taskflow/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store model credentials in ~/.taskflow/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteOpenaiApiKey,
    PasteAnthropicToken,
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_filter(s: &str) -> Result<StatusFilter, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("TASKFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Add {
            description,
            due,
            depends_on,
            status,
        } => {
            let cfg = config::load_config()?;
            let deadline = parse_local_deadline_to_utc(&due, &cfg.display.timezone)?;
            let mut store = open_store()?;

            let mut input = NewTask::new(description, deadline);
            input.dependencies = depends_on;
            input.status = status;

            let t = store.add(input, Utc::now()).context("Task not created")?;
            println!("Task created: {}", t.id);
        }

        Command::Edit {
            id,
            description,
            due,
            depends_on,
            clear_deps,
        } => {
            let cfg = config::load_config()?;
            let deadline = due
                .map(|d| parse_local_deadline_to_utc(&d, &cfg.display.timezone))
                .transpose()?;
            let dependencies = if clear_deps {
                Some(Vec::new())
            } else if depends_on.is_empty() {
                None
            } else {
                Some(depends_on)
            };

            let mut store = open_store()?;
            let t = store
                .edit(
                    &id,
                    TaskEdit {
                        description,
                        deadline,
                        dependencies,
                        status: None,
                    },
                )
                .context("Task not updated")?;
            println!("Task updated: {}", t.id);
        }

        Command::Status { id, status } => {
            let mut store = open_store()?;
            let t = store.set_status(&id, status)?;
            println!("{} is now {}", t.id, t.status.label());
        }

        Command::Priority { id, priority } => {
            let mut store = open_store()?;
            let t = store.set_priority(&id, priority)?;
            match t.priority {
                Some(p) => println!("{} priority set to {}", t.id, p),
                None => println!("{} priority cleared", t.id),
            }
        }

        Command::Delete { id } => {
            let mut store = open_store()?;
            let t = store.delete(&id)?;
            println!("Task deleted: {} ({})", t.id, t.description);
        }

        Command::List {
            status,
            search,
            limit,
        } => {
            list(status, &search, limit)?;
        }

        Command::Prioritize => {
            prioritize().await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::paste(auth::Credential::OpenAiApiKey)?,
            AuthCommand::PasteAnthropicToken => auth::paste(auth::Credential::AnthropicToken)?,
        },
    }

    Ok(())
}

fn open_store() -> Result<TaskStore<FileBackend>> {
    let backend = state::task_backend()?;
    Ok(TaskStore::load_seeded(backend, seed::sample_tasks(Utc::now())))
}

fn list(filter: StatusFilter, search: &str, limit: Option<usize>) -> Result<()> {
    let cfg = config::load_config()?;
    let tz = parse_timezone(&cfg.display.timezone)?;
    let store = open_store()?;
    let now = Utc::now();

    let tasks = view(store.get(), filter, search);
    if tasks.is_empty() {
        println!("No tasks found.");
        println!("Try adjusting your search or filters, or create a new task!");
        return Ok(());
    }

    for t in tasks.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{}", render::task_detail(t, now, tz));
    }
    Ok(())
}

async fn prioritize() -> Result<()> {
    let cfg = config::load_config()?;
    let store = Mutex::new(open_store()?);

    let make_service = || -> Result<llm::LlmSuggestionService> {
        let llm_cfg = llm::LlmConfig::resolve(&cfg.llm, &auth::load_auth()?)?;
        llm::LlmSuggestionService::new(llm_cfg, Duration::from_secs(cfg.llm.timeout_secs))
    };

    match prioritize_cmd::run(&store, make_service, Utc::now()).await? {
        PrioritizeOutcome::Applied(report) => {
            println!(
                "Tasks prioritized: {} of {} suggestions applied.",
                report.applied, report.suggested
            );
            list(StatusFilter::All, "", None)
        }
        PrioritizeOutcome::NothingToPrioritize => {
            println!(
                "No tasks to prioritize. Please add some tasks before using AI prioritization."
            );
            Ok(())
        }
    }
}

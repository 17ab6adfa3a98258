//! Prompt text for the prioritization model and extraction of its JSON reply.

use anyhow::{Context, Result};
use serde_json::Value;
use taskflow_core::SuggestionRequest;

pub const SYSTEM_PROMPT: &str = "You are an AI task prioritization expert. \
You reply with a JSON array only, no prose and no code fences.";

pub fn render_prompt(tasks: &[SuggestionRequest]) -> String {
    let mut s = String::new();
    s.push_str(
        "Given the following tasks, suggest a priority for each task based on its deadline and dependencies.\n\n",
    );
    s.push_str("Tasks:\n");
    for t in tasks {
        s.push_str(&format!("  - ID: {}\n", t.id));
        s.push_str(&format!("    Description: {}\n", t.description));
        s.push_str(&format!("    Deadline: {}\n", t.deadline));
        let deps = if t.dependencies.is_empty() {
            "none".to_string()
        } else {
            t.dependencies.join(", ")
        };
        s.push_str(&format!("    Dependencies: {}\n", deps));
    }
    s.push_str(
        "\nPrioritize the tasks such that tasks with earlier deadlines and more dependencies are given higher priority (lower number).\n\
Explain your reasoning for each task's priority.\n\n\
Return a JSON array of tasks with their suggested priorities and reasons.\n\
Each object in the array must include the task's \"id\" (string), suggested \"priority\" (integer), and \"reason\" (string).",
    );
    s
}

/// Pull the JSON array out of a model reply. Models like to wrap it in code
/// fences or a sentence, so take the outermost `[` .. `]` span.
pub fn extract_json_array(reply: &str) -> Result<Value> {
    let start = reply.find('[').context("model reply contains no JSON array")?;
    let end = reply.rfind(']').context("model reply contains no JSON array")?;
    if end < start {
        anyhow::bail!("model reply contains no JSON array");
    }
    serde_json::from_str(&reply[start..=end]).context("parse JSON array from model reply")
}

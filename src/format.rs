//! Output formatting for the CLI: markdown and JSON.

use crate::types::{StatusHistoryEntry, StatusTransition, Task, TaskWithSubtasks};
use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// Human-readable markdown
    #[value(alias = "md")]
    Markdown,
}

/// Pretty-printed JSON for any result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_ms(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task {}: {}\n", task.id, task.title));
    md.push_str(&format!("- **status**: {}\n", task.status));
    md.push_str(&format!("- **priority**: {}\n", task.priority));
    md.push_str(&format!("- **start**: {}\n", date_or_dash(task.start_date)));
    md.push_str(&format!("- **deadline**: {}\n", date_or_dash(task.deadline)));

    if task.recurring > 0 {
        md.push_str(&format!("- **recurs every**: {} day(s)\n", task.recurring));
    }
    if let Some(project_id) = task.project_id {
        md.push_str(&format!("- **project**: {}\n", project_id));
    }
    if !task.active {
        md.push_str("- **deleted**: yes\n");
    }

    if let Some(ref desc) = task.description {
        md.push_str("\n### Description\n");
        md.push_str(desc);
        md.push('\n');
    }

    md
}

/// One line per task, for listings.
fn format_task_line(task: &Task) -> String {
    format!(
        "- [{}] **{}** (#{}, priority {}, due {})\n",
        task.status,
        task.title,
        task.id,
        task.priority,
        date_or_dash(task.deadline)
    )
}

/// Format a task and its direct subtasks as markdown.
pub fn format_task_tree_markdown(tree: &TaskWithSubtasks) -> String {
    let mut md = format_task_markdown(&tree.task);

    md.push_str(&format!("\n### Subtasks ({})\n", tree.subtasks.len()));
    for subtask in &tree.subtasks {
        md.push_str(&format_task_line(subtask));
    }
    md
}

/// Format a root listing as markdown.
pub fn format_tasks_markdown(tasks: &[Task]) -> String {
    let mut md = format!("# Tasks ({})\n\n", tasks.len());
    for task in tasks {
        md.push_str(&format_task_line(task));
    }
    md
}

pub fn format_transition_markdown(transition: &StatusTransition) -> String {
    let mut md = format!(
        "Task {} ({}): {} -> {}\n",
        transition.task.id, transition.task.title, transition.previous_status, transition.task.status
    );
    if let Some(ref next) = transition.next_occurrence {
        md.push_str(&format!(
            "Next occurrence: task {} from {} to {}\n",
            next.id,
            date_or_dash(next.start_date),
            date_or_dash(next.deadline)
        ));
    }
    md
}

pub fn format_history_markdown(entries: &[StatusHistoryEntry]) -> String {
    let mut md = String::from("| status | entered | left |\n|---|---|---|\n");
    for entry in entries {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            entry.status,
            format_ms(entry.timestamp),
            entry.end_timestamp.map(format_ms).unwrap_or_else(|| "-".to_string())
        ));
    }
    md
}

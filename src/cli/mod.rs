//! CLI command definitions for task-tree
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod create;
pub mod list;
pub mod update;

use crate::format::OutputFormat;
use crate::types::TaskId;
use clap::{Parser, Subcommand};
use create::CreateArgs;
use list::ListArgs;
use update::UpdateArgs;

/// Task hierarchy and lifecycle tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a task, optionally under a parent
    Create(CreateArgs),

    /// Show a task with its direct subtasks
    Get {
        id: TaskId,
    },

    /// Update plain fields of an active task
    Update(UpdateArgs),

    /// List root tasks (tasks that are nobody's subtask)
    List(ListArgs),

    /// Link one or more tasks under a parent
    Attach {
        parent: TaskId,
        #[arg(required = true)]
        subtasks: Vec<TaskId>,
    },

    /// Remove a parent -> subtask link
    Detach {
        parent: TaskId,
        subtask: TaskId,
    },

    /// Soft-delete a task
    Delete {
        id: TaskId,
        /// Also remove every link the task takes part in
        #[arg(long)]
        detach: bool,
    },

    /// Set a task's status by label (To-do, In-progress, Completed, Blocked)
    Status {
        id: TaskId,
        status: String,
    },

    /// Mark a task In-progress
    Start {
        id: TaskId,
    },

    /// Mark a task Completed, spawning its next occurrence if recurring
    Complete {
        id: TaskId,
    },

    /// Mark a task Blocked
    Block {
        id: TaskId,
    },

    /// Put a task back to To-do
    Reopen {
        id: TaskId,
    },

    /// Show a task's status history
    History {
        id: TaskId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["task-tree", "attach", "1", "2", "3", "--format", "markdown", "-l", "0"]);
        assert_eq!(cli.format, OutputFormat::Markdown);
        assert_eq!(cli.log, "0");
        match cli.command {
            Command::Attach { parent, subtasks } => {
                assert_eq!(parent, 1);
                assert_eq!(subtasks, vec![2, 3]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn attach_requires_subtasks() {
        assert!(Cli::try_parse_from(["task-tree", "attach", "1"]).is_err());
    }
}

//! Create subcommand arguments.

use crate::types::{NewTask, Priority, TaskId, TaskStatus};
use chrono::NaiveDate;
use clap::Args;

/// Arguments for the create subcommand
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Task title (must not be blank)
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// Deadline (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub deadline: Option<NaiveDate>,

    /// Initial status label (default: To-do)
    #[arg(long)]
    pub status: Option<TaskStatus>,

    /// Priority 1-10 (default from config)
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Recurrence period in days; 0 means not recurring
    #[arg(long, default_value_t = 0)]
    pub recurring: u32,

    #[arg(long)]
    pub project: Option<i64>,

    /// Link the new task under this parent
    #[arg(long)]
    pub parent: Option<TaskId>,
}

impl CreateArgs {
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            deadline: self.deadline,
            status: self.status,
            priority: self.priority,
            recurring: self.recurring,
            project_id: self.project,
            parent_id: self.parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use crate::types::TaskStatus;
    use chrono::NaiveDate;
    use clap::Parser;

    #[test]
    fn parses_dates_and_status() {
        let cli = Cli::parse_from([
            "task-tree",
            "create",
            "Weekly review",
            "--deadline",
            "2025-10-11",
            "--recurring",
            "7",
            "--status",
            "In-progress",
            "--parent",
            "4",
        ]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let new = args.into_new_task();
        assert_eq!(new.title, "Weekly review");
        assert_eq!(new.deadline, NaiveDate::from_ymd_opt(2025, 10, 11));
        assert_eq!(new.recurring, 7);
        assert_eq!(new.status, Some(TaskStatus::InProgress));
        assert_eq!(new.parent_id, Some(4));
        assert_eq!(new.priority, None);
    }

    #[test]
    fn bad_date_rejected() {
        assert!(Cli::try_parse_from(["task-tree", "create", "x", "--deadline", "11/10/2025"]).is_err());
    }
}

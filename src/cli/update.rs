//! Update subcommand arguments.

use crate::types::{Priority, TaskId, TaskUpdate};
use chrono::NaiveDate;
use clap::Args;

/// Arguments for the update subcommand
#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: TaskId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    #[arg(long)]
    pub clear_description: bool,

    #[arg(long, value_name = "DATE", conflicts_with = "clear_start_date")]
    pub start_date: Option<NaiveDate>,

    #[arg(long)]
    pub clear_start_date: bool,

    #[arg(long, value_name = "DATE", conflicts_with = "clear_deadline")]
    pub deadline: Option<NaiveDate>,

    #[arg(long)]
    pub clear_deadline: bool,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub recurring: Option<u32>,

    #[arg(long, conflicts_with = "clear_project")]
    pub project: Option<i64>,

    #[arg(long)]
    pub clear_project: bool,
}

/// `--value` sets, `--clear-*` nulls, neither leaves the field alone.
fn nullable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

impl UpdateArgs {
    pub fn to_update(&self) -> TaskUpdate {
        TaskUpdate {
            title: self.title.clone(),
            description: nullable(self.description.clone(), self.clear_description),
            start_date: nullable(self.start_date, self.clear_start_date),
            deadline: nullable(self.deadline, self.clear_deadline),
            priority: self.priority,
            recurring: self.recurring,
            project_id: nullable(self.project, self.clear_project),
        }
    }
}

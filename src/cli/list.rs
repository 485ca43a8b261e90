//! List subcommand arguments.

use crate::error::{EngineError, EngineResult};
use crate::types::{ListOptions, Priority, TaskFilter, TaskSort, TaskStatus};
use chrono::NaiveDate;
use clap::Args;

/// Arguments for the list subcommand
///
/// At most one filter may be given.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Sort order (default from config): deadline_asc, deadline_desc,
    /// priority_desc, priority_asc, start_date_asc, start_date_desc, status
    #[arg(long)]
    pub sort: Option<TaskSort>,

    #[arg(long)]
    pub project: Option<i64>,

    /// Include soft-deleted root tasks
    #[arg(long)]
    pub include_inactive: bool,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub priority_range: Option<Vec<Priority>>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long, value_name = "DATE")]
    pub created_after: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub created_before: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub due_after: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub due_before: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub start_after: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub start_before: Option<NaiveDate>,
}

impl ListArgs {
    /// The single filter given, if any.
    pub fn filter(&self) -> EngineResult<Option<TaskFilter>> {
        let range = match self.priority_range.as_deref() {
            None => None,
            Some(&[min, max]) => Some(TaskFilter::PriorityRange(min, max)),
            Some(_) => {
                return Err(EngineError::invalid_value(
                    "priority_range",
                    "expected MIN and MAX",
                ));
            }
        };

        let filters: Vec<TaskFilter> = [
            self.priority.map(TaskFilter::Priority),
            range,
            self.status.map(TaskFilter::Status),
            self.created_after.map(TaskFilter::CreatedAfter),
            self.created_before.map(TaskFilter::CreatedBefore),
            self.due_after.map(TaskFilter::DueAfter),
            self.due_before.map(TaskFilter::DueBefore),
            self.start_after.map(TaskFilter::StartAfter),
            self.start_before.map(TaskFilter::StartBefore),
        ]
        .into_iter()
        .flatten()
        .collect();

        match filters.as_slice() {
            [] => Ok(None),
            [filter] => Ok(Some(*filter)),
            _ => Err(EngineError::invalid_value(
                "filter",
                "only one filter may be given",
            )),
        }
    }

    pub fn to_options(&self, default_sort: TaskSort) -> EngineResult<ListOptions> {
        Ok(ListOptions {
            active_only: !self.include_inactive,
            project_id: self.project,
            filter: self.filter()?,
            sort: self.sort.unwrap_or(default_sort),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn no_filter() {
        let args = ListArgs::default();
        assert_eq!(args.filter().unwrap(), None);
        let options = args.to_options(TaskSort::PriorityDesc).unwrap();
        assert!(options.active_only);
        assert_eq!(options.sort, TaskSort::PriorityDesc);
    }

    #[test]
    fn priority_range_filter() {
        let args = ListArgs {
            priority_range: Some(vec![3, 7]),
            ..Default::default()
        };
        assert_eq!(args.filter().unwrap(), Some(TaskFilter::PriorityRange(3, 7)));
    }

    #[test]
    fn two_filters_rejected() {
        let args = ListArgs {
            priority: Some(4),
            status: Some(TaskStatus::Blocked),
            ..Default::default()
        };
        assert_eq!(args.filter().unwrap_err().code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn explicit_sort_wins() {
        let args = ListArgs {
            sort: Some(TaskSort::Status),
            ..Default::default()
        };
        assert_eq!(args.to_options(TaskSort::DeadlineAsc).unwrap().sort, TaskSort::Status);
    }
}

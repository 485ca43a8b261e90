//! Root listing: tasks that are nobody's subtask.

use super::Database;
use super::tasks::parse_task_row;
use crate::error::{EngineError, EngineResult};
use crate::types::{ListOptions, Task, TaskFilter, TaskSort};
use chrono::{Days, NaiveDate};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

/// Build an ORDER BY clause for a sort. Every clause ends with `t.id ASC`.
fn build_order_clause(sort: TaskSort) -> &'static str {
    match sort {
        TaskSort::DeadlineAsc => "t.deadline IS NULL, t.deadline ASC, t.id ASC",
        TaskSort::DeadlineDesc => "t.deadline IS NULL, t.deadline DESC, t.priority DESC, t.id ASC",
        TaskSort::PriorityDesc => "t.priority DESC, t.deadline IS NULL, t.deadline ASC, t.id ASC",
        TaskSort::PriorityAsc => "t.priority ASC, t.deadline IS NULL, t.deadline ASC, t.id ASC",
        TaskSort::StartDateAsc => {
            "t.start_date IS NULL, t.start_date ASC, t.priority DESC, t.id ASC"
        }
        TaskSort::StartDateDesc => {
            "t.start_date IS NULL, t.start_date DESC, t.priority DESC, t.id ASC"
        }
        TaskSort::Status => {
            "CASE t.status
                WHEN 'In-progress' THEN 0
                WHEN 'To-do' THEN 1
                WHEN 'Blocked' THEN 2
                ELSE 3
             END, t.priority DESC, t.id ASC"
        }
    }
}

/// Midnight UTC of `date` in unix milliseconds.
fn day_start_ms(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
}

/// SQL condition and bound values for a single filter.
fn build_filter(filter: TaskFilter) -> EngineResult<(&'static str, Vec<Value>)> {
    let date_value = |d: NaiveDate| Value::Text(d.format("%Y-%m-%d").to_string());

    Ok(match filter {
        TaskFilter::Priority(p) => ("t.priority = ?", vec![Value::Integer(i64::from(p))]),
        TaskFilter::PriorityRange(min, max) => {
            if min > max {
                return Err(EngineError::invalid_value(
                    "priority_range",
                    format!("min {} is greater than max {}", min, max),
                ));
            }
            (
                "t.priority BETWEEN ? AND ?",
                vec![Value::Integer(i64::from(min)), Value::Integer(i64::from(max))],
            )
        }
        TaskFilter::Status(s) => ("t.status = ?", vec![Value::Text(s.as_str().to_string())]),
        TaskFilter::CreatedAfter(d) => ("t.created_at >= ?", vec![Value::Integer(day_start_ms(d))]),
        TaskFilter::CreatedBefore(d) => {
            // Inclusive of the whole day.
            let next_day = d
                .checked_add_days(Days::new(1))
                .ok_or_else(|| EngineError::invalid_value("created_before", "date out of range"))?;
            ("t.created_at < ?", vec![Value::Integer(day_start_ms(next_day))])
        }
        TaskFilter::DueAfter(d) => ("t.deadline >= ?", vec![date_value(d)]),
        TaskFilter::DueBefore(d) => ("t.deadline <= ?", vec![date_value(d)]),
        TaskFilter::StartAfter(d) => ("t.start_date >= ?", vec![date_value(d)]),
        TaskFilter::StartBefore(d) => ("t.start_date <= ?", vec![date_value(d)]),
    })
}

impl Database {
    /// List root tasks: tasks that are not the child end of any edge.
    pub fn list_parent_tasks(&self, options: &ListOptions) -> EngineResult<Vec<Task>> {
        let mut conditions: Vec<&str> = vec![
            "NOT EXISTS (SELECT 1 FROM parent_assignment pa WHERE pa.subtask_id = t.id)",
        ];
        let mut values: Vec<Value> = Vec::new();

        if options.active_only {
            conditions.push("t.active = 1");
        }
        if let Some(project_id) = options.project_id {
            conditions.push("t.project_id = ?");
            values.push(Value::Integer(project_id));
        }
        if let Some(filter) = options.filter {
            let (condition, bound) = build_filter(filter)?;
            conditions.push(condition);
            values.extend(bound);
        }

        let sql = format!(
            "SELECT t.* FROM tasks t WHERE {} ORDER BY {}",
            conditions.join(" AND "),
            build_order_clause(options.sort)
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_order_clause_ends_with_id() {
        for sort in TaskSort::ALL {
            assert!(build_order_clause(sort).ends_with("t.id ASC"), "{:?}", sort);
        }
    }

    #[test]
    fn inverted_priority_range_rejected() {
        assert!(build_filter(TaskFilter::PriorityRange(7, 3)).is_err());
        assert!(build_filter(TaskFilter::PriorityRange(3, 7)).is_ok());
    }

    #[test]
    fn created_before_covers_whole_day() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let (_, values) = build_filter(TaskFilter::CreatedBefore(day)).unwrap();
        let next = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(values, vec![Value::Integer(day_start_ms(next))]);
    }
}

//! Integration tests for status transitions and recurring tasks.

use chrono::NaiveDate;
use task_tree::db::Database;
use task_tree::error::ErrorCode;
use task_tree::types::{ListOptions, NewTask, TaskStatus};

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod transition_tests {
    use super::*;

    #[test]
    fn any_status_can_follow_any_other() {
        let db = setup_db();
        let task = db.create_task(NewTask::new("Flexible")).unwrap();

        for status in [
            TaskStatus::Completed,
            TaskStatus::Blocked,
            TaskStatus::InProgress,
            TaskStatus::Todo,
            TaskStatus::Completed,
        ] {
            let transition = db.set_task_status(task.id, status).unwrap();
            assert_eq!(transition.task.status, status);
            assert_eq!(db.get_task(task.id).unwrap().unwrap().status, status);
        }
    }

    #[test]
    fn transition_reports_previous_status() {
        let db = setup_db();
        let task = db.create_task(NewTask::new("Work")).unwrap();

        let transition = db.start_task(task.id).unwrap();
        assert_eq!(transition.previous_status, TaskStatus::Todo);
        assert_eq!(transition.task.status, TaskStatus::InProgress);
        assert!(transition.next_occurrence.is_none());
    }

    #[test]
    fn labels_are_exact() {
        let db = setup_db();
        let task = db.create_task(NewTask::new("Work")).unwrap();

        let transition = db.set_task_status_label(task.id, "In-progress").unwrap();
        assert_eq!(transition.task.status, TaskStatus::InProgress);

        for label in ["in-progress", "Done", "", "Todo"] {
            let err = db.set_task_status_label(task.id, label).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidArgument, "label {:?}", label);
        }
        assert_eq!(db.get_task(task.id).unwrap().unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let db = setup_db();
        assert_eq!(db.complete_task(8).unwrap_err().code, ErrorCode::NotFound);
    }

    #[test]
    fn deleted_task_is_invalid_state() {
        let db = setup_db();
        let task = db.create_task(NewTask::new("Gone")).unwrap();
        db.delete_task(task.id, false).unwrap();

        assert_eq!(db.start_task(task.id).unwrap_err().code, ErrorCode::InvalidState);
    }

    #[test]
    fn status_change_does_not_touch_links() {
        let db = setup_db();
        let parent = db.create_task(NewTask::new("Parent")).unwrap();
        let child = db.create_task(NewTask::new("Child").with_parent(parent.id)).unwrap();

        db.complete_task(parent.id).unwrap();
        db.complete_task(child.id).unwrap();

        assert_eq!(db.parent_of(child.id).unwrap(), Some(parent.id));
    }
}

mod recurrence_tests {
    use super::*;

    #[test]
    fn completing_weekly_task_spawns_next_week() {
        let db = setup_db();
        let task = db
            .create_task(
                NewTask::new("Weekly review")
                    .with_description("Look back at the week")
                    .with_deadline(date(2025, 10, 11))
                    .with_priority(8)
                    .with_recurring(7)
                    .with_project(3),
            )
            .unwrap();

        let transition = db.complete_task(task.id).unwrap();
        assert_eq!(transition.task.status, TaskStatus::Completed);

        let next = transition.next_occurrence.expect("next occurrence");
        assert_ne!(next.id, task.id);
        assert_eq!(next.title, "Weekly review");
        assert_eq!(next.description.as_deref(), Some("Look back at the week"));
        assert_eq!(next.start_date, Some(date(2025, 10, 11)));
        assert_eq!(next.deadline, Some(date(2025, 10, 18)));
        assert_eq!(next.status, TaskStatus::Todo);
        assert_eq!(next.priority, 8);
        assert_eq!(next.recurring, 7);
        assert_eq!(next.project_id, Some(3));
        assert!(next.active);

        assert_eq!(db.get_task(next.id).unwrap().unwrap(), next);
        assert_eq!(db.get_task(task.id).unwrap().unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn next_occurrence_is_a_root() {
        let db = setup_db();
        let parent = db.create_task(NewTask::new("Parent")).unwrap();
        let task = db
            .create_task(
                NewTask::new("Standup")
                    .with_deadline(date(2025, 1, 31))
                    .with_recurring(1)
                    .with_parent(parent.id),
            )
            .unwrap();

        let next = db.complete_task(task.id).unwrap().next_occurrence.unwrap();

        assert_eq!(next.deadline, Some(date(2025, 2, 1)));
        assert_eq!(db.parent_of(next.id).unwrap(), None);
        let roots = db.list_parent_tasks(&ListOptions::default()).unwrap();
        assert!(roots.iter().any(|t| t.id == next.id));
    }

    #[test]
    fn recurring_without_deadline_fails_and_keeps_status() {
        let db = setup_db();
        let task = db
            .create_task(NewTask::new("Vague").with_recurring(5).with_status(TaskStatus::InProgress))
            .unwrap();

        let err = db.complete_task(task.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        assert_eq!(db.get_task(task.id).unwrap().unwrap().status, TaskStatus::InProgress);
        assert_eq!(db.list_parent_tasks(&ListOptions::default()).unwrap().len(), 1);
        assert_eq!(db.get_status_history(task.id).unwrap().len(), 1);
    }

    #[test]
    fn non_recurring_task_spawns_nothing() {
        let db = setup_db();
        let task = db
            .create_task(NewTask::new("Once").with_deadline(date(2025, 5, 5)))
            .unwrap();

        let transition = db.complete_task(task.id).unwrap();
        assert!(transition.next_occurrence.is_none());
        assert_eq!(db.list_parent_tasks(&ListOptions::default()).unwrap().len(), 1);
    }

    #[test]
    fn completing_twice_spawns_once() {
        let db = setup_db();
        let task = db
            .create_task(NewTask::new("Weekly").with_deadline(date(2025, 10, 11)).with_recurring(7))
            .unwrap();

        assert!(db.complete_task(task.id).unwrap().next_occurrence.is_some());
        let again = db.complete_task(task.id).unwrap();
        assert!(again.next_occurrence.is_none());
        assert_eq!(again.previous_status, TaskStatus::Completed);

        assert_eq!(db.list_parent_tasks(&ListOptions::default()).unwrap().len(), 2);
    }

    #[test]
    fn other_statuses_do_not_recur() {
        let db = setup_db();
        let task = db
            .create_task(NewTask::new("Weekly").with_deadline(date(2025, 10, 11)).with_recurring(7))
            .unwrap();

        assert!(db.start_task(task.id).unwrap().next_occurrence.is_none());
        assert!(db.mark_blocked(task.id).unwrap().next_occurrence.is_none());
        assert_eq!(db.list_parent_tasks(&ListOptions::default()).unwrap().len(), 1);
    }

    #[test]
    fn reopen_then_complete_spawns_again() {
        let db = setup_db();
        let task = db
            .create_task(NewTask::new("Weekly").with_deadline(date(2025, 10, 11)).with_recurring(7))
            .unwrap();

        db.complete_task(task.id).unwrap();
        db.reopen_task(task.id).unwrap();
        let second = db.complete_task(task.id).unwrap().next_occurrence.unwrap();

        assert_eq!(second.deadline, Some(date(2025, 10, 18)));
        assert_eq!(db.list_parent_tasks(&ListOptions::default()).unwrap().len(), 3);
    }
}

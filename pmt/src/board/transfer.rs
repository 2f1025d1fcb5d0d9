//! Drives a complete drop against a [`TaskUpdater`]: apply optimistically,
//! send the update, then confirm or roll back.

use pmt_proto::project::ProjectId;
use pmt_proto::task::Task;

use super::{Board, BoardError, DragDrop, DropOutcome};
use crate::api::{ApiError, TaskUpdater};

/// How a drop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReport {
    /// Same-column move; no request was sent.
    Reordered,
    /// The server accepted the new status.
    Confirmed(Task),
    /// The server rejected the update and the board was restored.
    RolledBack(ApiError),
}

/// Applies `drop` to `board` and, for a cross-column move, persists the
/// new status with exactly one update call.
///
/// The updater is responsible for notifying the user of a failure; this
/// function only restores the board.
///
/// # Errors
///
/// Returns a [`BoardError`] if the drop is invalid (nothing is sent) or if
/// the rollback cannot find the task.
pub async fn drop_task<U: TaskUpdater>(
    board: &mut Board,
    drop: DragDrop,
    project_id: ProjectId,
    updater: &U,
) -> Result<DropReport, BoardError> {
    let pending = match board.apply(drop)? {
        DropOutcome::Reordered => return Ok(DropReport::Reordered),
        DropOutcome::Transfer(pending) => pending,
    };

    match updater.update_task(&pending.payload(project_id)).await {
        Ok(saved) => {
            board.confirm(pending);
            Ok(DropReport::Confirmed(saved))
        }
        Err(error) => {
            board.rollback(pending)?;
            Ok(DropReport::RolledBack(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pmt_proto::task::{Priority, TaskId, TaskStatus};

    use super::*;

    /// Answers every update with a fixed outcome and counts the calls.
    struct ScriptedUpdater {
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedUpdater {
        const fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TaskUpdater for ScriptedUpdater {
        async fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::from_response(500, r#"{"error":"boom"}"#))
            } else {
                Ok(task.clone())
            }
        }
    }

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id: TaskId(id),
            name: format!("task {id}"),
            description: "d".to_string(),
            due_date: None,
            end_date: None,
            priority: Priority::Low,
            status,
            project_id: None,
            editor_id: None,
        }
    }

    fn todo_to_in_progress() -> DragDrop {
        DragDrop {
            from: TaskStatus::Todo,
            from_index: 0,
            to: TaskStatus::InProgress,
            to_index: 0,
            task_id: TaskId(1),
        }
    }

    #[tokio::test]
    async fn successful_transfer_keeps_the_move() {
        let mut board = Board::from_tasks([task(1, TaskStatus::Todo)]);
        let updater = ScriptedUpdater::new(false);

        let report = drop_task(&mut board, todo_to_in_progress(), ProjectId(5), &updater)
            .await
            .unwrap();

        let DropReport::Confirmed(saved) = report else {
            panic!("expected confirmation, got {report:?}");
        };
        assert_eq!(saved.status, TaskStatus::InProgress);
        assert_eq!(saved.project_id, Some(ProjectId(5)));
        assert!(board.column(TaskStatus::Todo).is_empty());
        assert_eq!(board.column(TaskStatus::InProgress).len(), 1);
        assert_eq!(board.column(TaskStatus::InProgress)[0].status, TaskStatus::InProgress);
        assert_eq!(updater.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_transfer_restores_the_board() {
        let mut board = Board::from_tasks([task(1, TaskStatus::Todo)]);
        let before = board.clone();
        let updater = ScriptedUpdater::new(true);

        let report = drop_task(&mut board, todo_to_in_progress(), ProjectId(5), &updater)
            .await
            .unwrap();

        assert!(matches!(report, DropReport::RolledBack(ref e) if e.message == "boom"));
        assert_eq!(board, before);
        assert_eq!(board.column(TaskStatus::Todo)[0].status, TaskStatus::Todo);
        assert!(board.column(TaskStatus::InProgress).is_empty());
        assert_eq!(updater.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reorder_sends_nothing() {
        let mut board = Board::from_tasks([task(1, TaskStatus::Todo), task(2, TaskStatus::Todo)]);
        let updater = ScriptedUpdater::new(true);
        let drop = DragDrop {
            from: TaskStatus::Todo,
            from_index: 0,
            to: TaskStatus::Todo,
            to_index: 1,
            task_id: TaskId(1),
        };

        let report = drop_task(&mut board, drop, ProjectId(5), &updater).await.unwrap();

        assert_eq!(report, DropReport::Reordered);
        let order: Vec<_> = board.column(TaskStatus::Todo).iter().map(|t| t.id).collect();
        assert_eq!(order, vec![TaskId(2), TaskId(1)]);
        assert_eq!(updater.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_drop_sends_nothing() {
        let mut board = Board::from_tasks([task(2, TaskStatus::Todo)]);
        let updater = ScriptedUpdater::new(false);
        let err = drop_task(&mut board, todo_to_in_progress(), ProjectId(5), &updater)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::TaskMismatch { .. }));
        assert_eq!(updater.calls.load(Ordering::SeqCst), 0);
    }
}

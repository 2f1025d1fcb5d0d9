//! Property-based tests for kanban board moves.
//!
//! Uses proptest to verify:
//! 1. A same-column reorder only permutes that column, and the dragged task
//!    lands at the (clamped) destination index.
//! 2. A confirmed transfer leaves the task exactly once in the destination
//!    column, carrying the destination status.
//! 3. A rolled-back transfer restores the board exactly.
//! 4. Re-applying the saved task after confirmation never duplicates it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pmt::board::{Board, DragDrop, DropOutcome};
use pmt_proto::task::{Priority, Task, TaskId, TaskStatus};
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

/// A board of up to 12 tasks with distinct ids.
fn arb_board() -> impl Strategy<Value = Board> {
    prop::collection::vec(arb_status(), 1..12).prop_map(|statuses| {
        Board::from_tasks(statuses.into_iter().enumerate().map(|(i, status)| Task {
            id: TaskId(i64::try_from(i).unwrap() + 1),
            name: format!("task {i}"),
            description: "d".to_string(),
            due_date: None,
            end_date: None,
            priority: Priority::Medium,
            status,
            project_id: None,
            editor_id: None,
        }))
    })
}

/// A board plus a valid drag: the source column is non-empty and the
/// descriptor names the task actually there. Indices may overshoot.
fn arb_drag() -> impl Strategy<Value = (Board, DragDrop)> {
    (arb_board(), any::<prop::sample::Index>(), arb_status(), 0usize..16, 0usize..16)
        .prop_map(|(board, pick, to, from_index, to_index)| {
            let non_empty: Vec<TaskStatus> = TaskStatus::ALL
                .into_iter()
                .filter(|s| !board.column(*s).is_empty())
                .collect();
            let from = *pick.get(&non_empty);
            let column = board.column(from);
            let from_index = from_index % column.len();
            let drag = DragDrop {
                from,
                from_index,
                to,
                to_index,
                task_id: column[from_index].id,
            };
            (board, drag)
        })
}

fn ids(board: &Board, status: TaskStatus) -> Vec<TaskId> {
    board.column(status).iter().map(|t| t.id).collect()
}

fn occurrences(board: &Board, id: TaskId) -> usize {
    board.tasks().filter(|t| t.id == id).count()
}

proptest! {
    #[test]
    fn reorder_only_permutes_the_column((board, drag) in arb_drag()) {
        let drag = DragDrop { to: drag.from, ..drag };
        let mut after = board.clone();

        let outcome = after.apply(drag).unwrap();
        prop_assert!(matches!(outcome, DropOutcome::Reordered));

        let mut before_ids = ids(&board, drag.from);
        let mut after_ids = ids(&after, drag.from);
        let landed = drag.to_index.min(before_ids.len() - 1);
        prop_assert_eq!(after_ids[landed], drag.task_id);
        prop_assert_eq!(after.column(drag.from)[landed].status, drag.from);

        before_ids.sort();
        after_ids.sort();
        prop_assert_eq!(before_ids, after_ids);
        for other in TaskStatus::ALL.into_iter().filter(|s| *s != drag.from) {
            prop_assert_eq!(board.column(other), after.column(other));
        }
    }

    #[test]
    fn confirmed_transfer_lands_once((board, drag) in arb_drag(), to in arb_status()) {
        prop_assume!(to != drag.from);
        let drag = DragDrop { to, ..drag };
        let mut after = board.clone();

        let DropOutcome::Transfer(pending) = after.apply(drag).unwrap() else {
            panic!("cross-column drop must be a transfer");
        };
        prop_assert_eq!(pending.original_status(), drag.from);
        after.confirm(pending);

        prop_assert!(!ids(&after, drag.from).contains(&drag.task_id));
        let in_destination = after
            .column(to)
            .iter()
            .filter(|t| t.id == drag.task_id)
            .collect::<Vec<_>>();
        prop_assert_eq!(in_destination.len(), 1);
        prop_assert_eq!(in_destination[0].status, to);
        prop_assert_eq!(after.len(), board.len());
    }

    #[test]
    fn rolled_back_transfer_restores_the_board((board, drag) in arb_drag(), to in arb_status()) {
        prop_assume!(to != drag.from);
        let drag = DragDrop { to, ..drag };
        let mut after = board.clone();

        let DropOutcome::Transfer(pending) = after.apply(drag).unwrap() else {
            panic!("cross-column drop must be a transfer");
        };
        after.rollback(pending).unwrap();

        prop_assert_eq!(&after, &board);
        prop_assert_eq!(after.column(drag.from)[drag.from_index].id, drag.task_id);
        prop_assert_eq!(after.column(drag.from)[drag.from_index].status, drag.from);
    }

    #[test]
    fn replaying_the_saved_task_never_duplicates((board, drag) in arb_drag(), to in arb_status()) {
        prop_assume!(to != drag.from);
        let drag = DragDrop { to, ..drag };
        let mut after = board.clone();

        let DropOutcome::Transfer(pending) = after.apply(drag).unwrap() else {
            panic!("cross-column drop must be a transfer");
        };
        let saved = pending.task().clone();
        after.confirm(pending);
        let confirmed = after.clone();

        after.replace(saved.clone());
        after.replace(saved);

        prop_assert_eq!(occurrences(&after, drag.task_id), 1);
        prop_assert_eq!(&after, &confirmed);
    }
}

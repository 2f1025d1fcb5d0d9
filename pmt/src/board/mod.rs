//! Kanban board state: three ordered task columns keyed by status.
//!
//! A drop inside one column is a plain reorder. A drop into another column
//! is optimistic: the task moves and takes the destination status at once,
//! and the returned [`PendingTransfer`] must later be either confirmed or
//! rolled back, exactly once.
//!
//! Indices are clamped the way list drag-and-drop does it: a source index
//! past the end means the last task, a destination index past the end means
//! "append".

pub mod transfer;

use pmt_proto::project::ProjectId;
use pmt_proto::task::{Task, TaskId, TaskStatus};

pub use transfer::{DropReport, drop_task};

/// Errors raised by board mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The source column has no task to move.
    #[error("column {0} is empty")]
    EmptyColumn(TaskStatus),

    /// The task at the source index is not the one being dragged.
    #[error("expected task {expected} at the source position, found {found}")]
    TaskMismatch {
        /// Task named by the drag descriptor.
        expected: TaskId,
        /// Task actually found at the (clamped) source index.
        found: TaskId,
    },

    /// The task to roll back is no longer on the board.
    #[error("task {0} is not on the board")]
    NotOnBoard(TaskId),
}

/// A drag-and-drop gesture. Indices are positions at drop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragDrop {
    /// Column the task is dragged from.
    pub from: TaskStatus,
    /// Position in the source column.
    pub from_index: usize,
    /// Column the task is dropped into.
    pub to: TaskStatus,
    /// Position in the destination column.
    pub to_index: usize,
    /// Task being dragged.
    pub task_id: TaskId,
}

impl DragDrop {
    /// Whether source and destination are the same column.
    #[must_use]
    pub fn is_reorder(&self) -> bool {
        self.from == self.to
    }
}

/// Result of [`Board::apply`].
#[derive(Debug)]
#[must_use]
pub enum DropOutcome {
    /// Same-column move; nothing to persist.
    Reordered,
    /// Cross-column move applied optimistically.
    Transfer(PendingTransfer),
}

/// An optimistic column transfer awaiting the server's answer.
///
/// Not `Clone`: [`Board::confirm`] and [`Board::rollback`] consume it, so a
/// transfer can be settled only once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending transfer must be confirmed or rolled back"]
pub struct PendingTransfer {
    task: Task,
    original_status: TaskStatus,
    from: TaskStatus,
    from_index: usize,
    to: TaskStatus,
    to_index: usize,
}

impl PendingTransfer {
    /// The moved task, already carrying the destination status.
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Status the task had before the drop.
    pub const fn original_status(&self) -> TaskStatus {
        self.original_status
    }

    /// Destination column.
    pub const fn destination(&self) -> TaskStatus {
        self.to
    }

    /// Body for `PUT /task`: the moved task tagged with its project.
    pub fn payload(&self, project_id: ProjectId) -> Task {
        Task {
            project_id: Some(project_id),
            ..self.task.clone()
        }
    }
}

/// Board partition of one project's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    columns: [Vec<Task>; 3],
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions tasks by status, keeping their relative order.
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut board = Self::new();
        for task in tasks {
            board.columns[task.status.column()].push(task);
        }
        board
    }

    /// Tasks of one column, top to bottom.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        &self.columns[status.column()]
    }

    /// Task at a position, if any.
    #[must_use]
    pub fn get(&self, status: TaskStatus, index: usize) -> Option<&Task> {
        self.column(status).get(index)
    }

    /// Column and position of a task.
    #[must_use]
    pub fn position(&self, task_id: TaskId) -> Option<(TaskStatus, usize)> {
        TaskStatus::ALL.into_iter().find_map(|status| {
            self.column(status)
                .iter()
                .position(|t| t.id == task_id)
                .map(|index| (status, index))
        })
    }

    /// Every task, column by column.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.columns.iter().flatten()
    }

    /// Total number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Whether the board holds no task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    /// Appends a task at the bottom of its status column.
    pub fn insert(&mut self, task: Task) {
        self.columns[task.status.column()].push(task);
    }

    /// Replaces a task in place, moving it if its status changed.
    pub fn replace(&mut self, task: Task) {
        match self.position(task.id) {
            Some((status, index)) if status == task.status => {
                self.columns[status.column()][index] = task;
            }
            Some((status, index)) => {
                self.columns[status.column()].remove(index);
                self.insert(task);
            }
            None => self.insert(task),
        }
    }

    /// Puts an in-flight transfer back where it was dropped, after the
    /// board was rebuilt from fresh data. The drop index is clamped to the
    /// rebuilt destination column.
    pub fn reapply(&mut self, pending: &PendingTransfer) {
        self.remove(pending.task.id);
        let destination = &mut self.columns[pending.to.column()];
        let to_index = pending.to_index.min(destination.len());
        destination.insert(to_index, pending.task.clone());
    }

    /// Removes a task wherever it is.
    pub fn remove(&mut self, task_id: TaskId) -> Option<Task> {
        let (status, index) = self.position(task_id)?;
        Some(self.columns[status.column()].remove(index))
    }

    /// Applies a drop.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::EmptyColumn`] when the source column is empty
    /// and [`BoardError::TaskMismatch`] when the task at the source index is
    /// not the dragged one. The board is unchanged on error.
    pub fn apply(&mut self, drop: DragDrop) -> Result<DropOutcome, BoardError> {
        let source_len = self.column(drop.from).len();
        if source_len == 0 {
            return Err(BoardError::EmptyColumn(drop.from));
        }
        let from_index = drop.from_index.min(source_len - 1);
        let found = self.columns[drop.from.column()][from_index].id;
        if found != drop.task_id {
            return Err(BoardError::TaskMismatch {
                expected: drop.task_id,
                found,
            });
        }

        if drop.is_reorder() {
            let to_index = drop.to_index.min(source_len - 1);
            let column = &mut self.columns[drop.from.column()];
            let task = column.remove(from_index);
            column.insert(to_index, task);
            tracing::debug!(task = %drop.task_id, from_index, to_index, "task reordered");
            return Ok(DropOutcome::Reordered);
        }

        let mut task = self.columns[drop.from.column()].remove(from_index);
        let original_status = task.status;
        task.status = drop.to;
        let destination = &mut self.columns[drop.to.column()];
        let to_index = drop.to_index.min(destination.len());
        destination.insert(to_index, task.clone());
        tracing::debug!(
            task = %drop.task_id,
            from = %drop.from,
            to = %drop.to,
            "task moved optimistically"
        );

        Ok(DropOutcome::Transfer(PendingTransfer {
            task,
            original_status,
            from: drop.from,
            from_index,
            to: drop.to,
            to_index,
        }))
    }

    /// Accepts a transfer the server confirmed. The board already shows
    /// the result; this only settles the token.
    #[allow(clippy::unused_self, clippy::needless_pass_by_value)]
    pub fn confirm(&mut self, pending: PendingTransfer) {
        tracing::debug!(task = %pending.task.id, status = %pending.to, "transfer confirmed");
    }

    /// Reverts a transfer the server rejected: the task leaves the
    /// destination column, gets its original status back, and returns to
    /// its source position.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotOnBoard`] if the task was removed from the
    /// board in the meantime.
    pub fn rollback(&mut self, pending: PendingTransfer) -> Result<(), BoardError> {
        let task_id = pending.task.id;
        let destination = &mut self.columns[pending.to.column()];
        let mut task = if destination
            .get(pending.to_index)
            .is_some_and(|t| t.id == task_id)
        {
            destination.remove(pending.to_index)
        } else {
            self.remove(task_id).ok_or(BoardError::NotOnBoard(task_id))?
        };

        task.status = pending.original_status;
        let source = &mut self.columns[pending.from.column()];
        let from_index = pending.from_index.min(source.len());
        source.insert(from_index, task);
        tracing::info!(
            task = %task_id,
            status = %pending.original_status,
            "transfer rolled back"
        );
        Ok(())
    }
}

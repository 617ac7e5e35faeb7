//! Column layout of a board.

use serde::Serialize;

use taskflow_common::{InvalidTaskRow, Project, Task, TaskStatus};

/// One status column of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

impl ColumnView {
    /// Placeholder shown in a column without tasks.
    pub const EMPTY_LABEL: &'static str = "No tasks";

    pub fn label(&self) -> &'static str {
        self.status.label()
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Split `tasks` into the four status columns, in board order.
///
/// Every task lands in exactly one column and relative order is preserved.
pub fn partition_by_status(tasks: &[Task]) -> Vec<ColumnView> {
    let mut columns: Vec<ColumnView> = TaskStatus::ALL
        .iter()
        .map(|status| ColumnView {
            status: *status,
            tasks: Vec::new(),
        })
        .collect();

    for task in tasks {
        columns[task.status.column_index()].tasks.push(task.clone());
    }
    columns
}

/// Everything needed to draw one project's board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub project: Option<Project>,
    pub columns: Vec<ColumnView>,
    /// Rows that could not be placed because of an unknown tag.
    pub rejected: Vec<InvalidTaskRow>,
}

impl BoardView {
    pub fn column(&self, status: TaskStatus) -> &ColumnView {
        &self.columns[status.column_index()]
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(ColumnView::count).sum()
    }
}

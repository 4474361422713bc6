//! Listing policy: status groups and ordering.

use serde::Serialize;

use crate::document::{Status, TaskRecord};

/// Column a record is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    Planned,
    InProgress,
    Completed,
}

impl StatusGroup {
    /// Paused records stay in the in-progress column.
    #[must_use]
    pub fn of(status: Status) -> Self {
        match status {
            Status::Planned => StatusGroup::Planned,
            Status::InProgress | Status::Paused => StatusGroup::InProgress,
            Status::Completed => StatusGroup::Completed,
        }
    }
}

/// Anything that can be placed on the board.
pub trait Groupable {
    fn status(&self) -> Status;
    fn sort_order(&self) -> i64;
}

impl Groupable for TaskRecord {
    fn status(&self) -> Status {
        self.status
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }
}

/// Split by status field alone, then sort each group by sort order.
///
/// The sort is stable: equal sort orders keep discovery order.
pub fn group_by_status<T, I>(items: I) -> (Vec<T>, Vec<T>, Vec<T>)
where
    T: Groupable,
    I: IntoIterator<Item = T>,
{
    let mut planned = Vec::new();
    let mut in_progress = Vec::new();
    let mut completed = Vec::new();

    for item in items {
        match StatusGroup::of(item.status()) {
            StatusGroup::Planned => planned.push(item),
            StatusGroup::InProgress => in_progress.push(item),
            StatusGroup::Completed => completed.push(item),
        }
    }

    for group in [&mut planned, &mut in_progress, &mut completed] {
        group.sort_by_key(Groupable::sort_order);
    }
    (planned, in_progress, completed)
}

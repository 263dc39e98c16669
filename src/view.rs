//! Derived, read-only views over the task collection.
//!
//! Nothing here is stored: the visible list is recomputed from the
//! collection and the active [`Filter`] on every read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseFilterError;
use crate::task::{Task, TaskId};

/// Which slice of the collection is shown.
///
/// Session-only state: never persisted, `All` on every fresh start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every task that is not in the trash.
    #[default]
    All,
    /// Completed tasks that are not in the trash.
    Checked,
    /// Open tasks that are not in the trash.
    Unchecked,
    /// The trash.
    Removed,
}

impl Filter {
    /// Every filter, in selector order.
    pub const VARIANTS: [Filter; 4] = [
        Filter::All,
        Filter::Checked,
        Filter::Unchecked,
        Filter::Removed,
    ];

    /// Whether `task` is shown under this filter.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => !task.removed,
            Filter::Checked => task.checked && !task.removed,
            Filter::Unchecked => !task.checked && !task.removed,
            Filter::Removed => task.removed,
        }
    }

    /// Whether the new-task form is offered under this filter.
    pub fn accepts_new_tasks(self) -> bool {
        matches!(self, Filter::All | Filter::Unchecked)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Checked => "checked",
            Filter::Unchecked => "unchecked",
            Filter::Removed => "removed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::VARIANTS
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ParseFilterError(s.to_owned()))
    }
}

/// A visible task plus the interactions the front end should allow on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskView<'a> {
    pub task: &'a Task,
    /// The completed checkbox is live (disabled for trashed tasks).
    pub checkable: bool,
    /// The text is editable (disabled once completed or trashed).
    pub editable: bool,
}

impl<'a> TaskView<'a> {
    pub fn new(task: &'a Task) -> Self {
        Self {
            task,
            checkable: !task.removed,
            editable: !task.checked && !task.removed,
        }
    }

    pub fn id(&self) -> TaskId {
        self.task.id
    }
}

/// Tasks shown under `filter`, in collection order.
pub fn visible<'a>(tasks: &'a [Task], filter: Filter) -> impl Iterator<Item = &'a Task> + 'a {
    tasks.iter().filter(move |t| filter.matches(t))
}

/// The rendered list under `filter`.
pub fn render(tasks: &[Task], filter: Filter) -> Vec<TaskView<'_>> {
    visible(tasks, filter).map(TaskView::new).collect()
}

//! Task records and the collection reducer.
//!
//! [`TaskList`] is the collection state. Commands are decided against it by
//! [`TaskList::handle`], which returns zero or more [`TaskEvent`]s, and the
//! events are folded into the next state by [`TaskList::apply`]. An empty
//! event list means the command was a no-op.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::TaskCommand;
use crate::id::IdGenerator;

/// Unique, immutable identifier of a task.
///
/// Serialized as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned at creation, never changed.
    pub id: TaskId,
    /// Text content.
    pub value: String,
    /// Whether the task is completed.
    pub checked: bool,
    /// Whether the task sits in the trash (soft-deleted).
    pub removed: bool,
}

impl Task {
    /// A fresh, unchecked, not-removed task.
    pub fn new(id: TaskId, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            checked: false,
            removed: false,
        }
    }
}

/// One mutable field of a [`Task`] together with its new value.
///
/// Serialized as `{"field": "<name>", "value": <value>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum TaskField {
    /// Replace the text content.
    Value(String),
    /// Set the completed flag.
    Checked(bool),
    /// Set the soft-deleted flag.
    Removed(bool),
}

impl TaskField {
    /// Whether `task` already holds this value.
    pub fn is_set_on(&self, task: &Task) -> bool {
        match self {
            TaskField::Value(v) => task.value == *v,
            TaskField::Checked(c) => task.checked == *c,
            TaskField::Removed(r) => task.removed == *r,
        }
    }

    fn write_to(&self, task: &mut Task) {
        match self {
            TaskField::Value(v) => task.value.clone_from(v),
            TaskField::Checked(c) => task.checked = *c,
            TaskField::Removed(r) => task.removed = *r,
        }
    }
}

/// State changes produced by [`TaskList::handle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskEvent {
    /// A task was created and prepended.
    Added { task: Task },
    /// One field of an existing task changed.
    FieldSet { id: TaskId, field: TaskField },
    /// The listed soft-deleted tasks were erased.
    Purged { ids: Vec<TaskId> },
}

/// The ordered task collection, newest first.
///
/// Serializes as a plain JSON array of task records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap tasks that are already known to carry distinct ids.
    pub(crate) fn from_vec(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// All tasks in display order.
    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Whether any task is in the trash.
    pub fn has_removed(&self) -> bool {
        self.tasks.iter().any(|t| t.removed)
    }

    /// Decide a command against the current state.
    ///
    /// Never fails: empty text, unknown ids, unchanged values and an empty
    /// trash all yield `vec![]`, as does an add once `ids` is exhausted.
    /// Only [`TaskCommand::Add`] draws from `ids`.
    pub fn handle(&self, cmd: TaskCommand, ids: &mut IdGenerator) -> Vec<TaskEvent> {
        match cmd {
            TaskCommand::Add { text } => {
                if text.is_empty() {
                    return vec![];
                }
                let Some(id) = ids.next_id() else {
                    tracing::warn!("task id space exhausted; add ignored");
                    return vec![];
                };
                vec![TaskEvent::Added {
                    task: Task::new(id, text),
                }]
            }
            TaskCommand::SetField { id, field } => match self.get(id) {
                Some(task) if !field.is_set_on(task) => vec![TaskEvent::FieldSet { id, field }],
                _ => vec![],
            },
            TaskCommand::PurgeRemoved => {
                let ids: Vec<TaskId> = self
                    .tasks
                    .iter()
                    .filter(|t| t.removed)
                    .map(|t| t.id)
                    .collect();
                if ids.is_empty() {
                    return vec![];
                }
                vec![TaskEvent::Purged { ids }]
            }
        }
    }

    /// Fold one event into the next state.
    pub fn apply(mut self, event: &TaskEvent) -> Self {
        match event {
            TaskEvent::Added { task } => {
                self.tasks.insert(0, task.clone());
            }
            TaskEvent::FieldSet { id, field } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                    field.write_to(task);
                }
            }
            TaskEvent::Purged { ids } => {
                let purged: HashSet<TaskId> = ids.iter().copied().collect();
                self.tasks.retain(|t| !(t.removed && purged.contains(&t.id)));
            }
        }
        self
    }

    /// Handle a command and fold its events: `(state, command) -> next state`.
    pub fn reduce(self, cmd: TaskCommand, ids: &mut IdGenerator) -> (Self, Vec<TaskEvent>) {
        let events = self.handle(cmd, ids);
        let next = events.iter().fold(self, |state, event| state.apply(event));
        (next, events)
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::{ids, list_of};
    use super::*;

    fn set(id: TaskId, field: TaskField) -> TaskCommand {
        TaskCommand::SetField { id, field }
    }

    #[test]
    fn add_prepends_unchecked_task() {
        let mut ids = ids();
        let list = list_of(&["buy milk"], &mut ids);
        let (list, events) = list.reduce(TaskCommand::add("walk dog"), &mut ids);

        assert_eq!(events.len(), 1);
        assert_eq!(list.len(), 2);
        let first = &list.as_slice()[0];
        assert_eq!(first.value, "walk dog");
        assert!(!first.checked);
        assert!(!first.removed);
        assert_eq!(list.as_slice()[1].value, "buy milk");
    }

    #[test]
    fn add_empty_text_is_noop() {
        let mut ids = ids();
        let list = list_of(&["a"], &mut ids);
        let (next, events) = list.clone().reduce(TaskCommand::add(""), &mut ids);
        assert!(events.is_empty());
        assert_eq!(next, list);
    }

    #[test]
    fn add_assigns_distinct_ids() {
        let mut ids = ids();
        let list = list_of(&["a", "b", "c"], &mut ids);
        let unique: HashSet<TaskId> = list.iter().map(|t| t.id).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn set_field_changes_only_that_field() {
        let mut ids = ids();
        let list = list_of(&["a", "b"], &mut ids);
        let target = list.as_slice()[1].clone();
        let other = list.as_slice()[0].clone();

        let (list, _) = list.reduce(set(target.id, TaskField::Checked(true)), &mut ids);
        let updated = list.get(target.id).unwrap();
        assert!(updated.checked);
        assert_eq!(updated.value, target.value);
        assert_eq!(updated.removed, target.removed);
        assert_eq!(list.get(other.id), Some(&other));

        let (list, _) = list.reduce(set(target.id, TaskField::Value("z".into())), &mut ids);
        let updated = list.get(target.id).unwrap();
        assert_eq!(updated.value, "z");
        assert!(updated.checked);

        let (list, _) = list.reduce(set(target.id, TaskField::Removed(true)), &mut ids);
        assert!(list.get(target.id).unwrap().removed);
        assert_eq!(list.get(other.id), Some(&other));
    }

    #[test]
    fn set_field_unknown_id_is_noop() {
        let mut ids = ids();
        let list = list_of(&["a"], &mut ids);
        let events = list.handle(set(TaskId(-1), TaskField::Checked(true)), &mut ids);
        assert!(events.is_empty());
    }

    #[test]
    fn set_field_same_value_is_noop() {
        let mut ids = ids();
        let list = list_of(&["a"], &mut ids);
        let id = list.as_slice()[0].id;
        assert!(
            list.handle(set(id, TaskField::Checked(false)), &mut ids)
                .is_empty()
        );
        assert!(
            list.handle(set(id, TaskField::Value("a".into())), &mut ids)
                .is_empty()
        );
    }

    #[test]
    fn purge_keeps_survivor_order() {
        let mut ids = ids();
        let list = list_of(&["a", "b", "c", "d"], &mut ids);
        // Order is d, c, b, a; remove c and a.
        let c = list.as_slice()[1].id;
        let a = list.as_slice()[3].id;
        let (list, _) = list.reduce(set(c, TaskField::Removed(true)), &mut ids);
        let (list, _) = list.reduce(set(a, TaskField::Removed(true)), &mut ids);

        let (list, events) = list.reduce(TaskCommand::PurgeRemoved, &mut ids);
        assert_eq!(events, vec![TaskEvent::Purged { ids: vec![c, a] }]);
        let values: Vec<&str> = list.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["d", "b"]);
    }

    #[test]
    fn purge_is_idempotent() {
        let mut ids = ids();
        let list = list_of(&["a", "b"], &mut ids);
        let a = list.as_slice()[1].id;
        let (list, _) = list.reduce(set(a, TaskField::Removed(true)), &mut ids);

        let (once, _) = list.reduce(TaskCommand::PurgeRemoved, &mut ids);
        let (twice, events) = once.clone().reduce(TaskCommand::PurgeRemoved, &mut ids);
        assert_eq!(once, twice);
        assert!(events.is_empty());
    }

    #[test]
    fn purged_event_skips_restored_tasks() {
        // A task restored after the purge was decided must survive replay.
        let mut ids = ids();
        let list = list_of(&["a"], &mut ids);
        let a = list.as_slice()[0].id;
        let event = TaskEvent::Purged { ids: vec![a] };
        let list = list.apply(&event);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn task_list_serializes_as_plain_array() {
        let list = TaskList::from_vec(vec![Task::new(TaskId(7), "x")]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"id": 7, "value": "x", "checked": false, "removed": false}])
        );
    }

    #[test]
    fn task_field_serialized_form() {
        let json = serde_json::to_value(TaskField::Checked(true)).unwrap();
        assert_eq!(json, serde_json::json!({"field": "checked", "value": true}));
    }

    #[test]
    fn event_uses_adjacent_tagging() {
        let event = TaskEvent::FieldSet {
            id: TaskId(3),
            field: TaskField::Removed(true),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FieldSet");
        assert_eq!(json["data"]["id"], 3);
        assert_eq!(json["data"]["field"]["field"], "removed");
    }
}

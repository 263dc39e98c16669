//! Commands accepted by the task collection and events arriving from the UI.

use serde::{Deserialize, Serialize};

use crate::task::{TaskField, TaskId};
use crate::view::Filter;

/// A mutation request against the [`TaskList`](crate::TaskList).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskCommand {
    /// Prepend a new task. Empty text is ignored.
    Add { text: String },
    /// Replace one field of the task with this id. Unknown ids are ignored.
    SetField { id: TaskId, field: TaskField },
    /// Erase every soft-deleted task.
    PurgeRemoved,
}

impl TaskCommand {
    /// Shorthand for [`TaskCommand::Add`].
    pub fn add(text: impl Into<String>) -> Self {
        TaskCommand::Add { text: text.into() }
    }
}

/// Input events emitted by a front end.
///
/// Routed by [`TaskStore::dispatch`](crate::TaskStore::dispatch). The JSON
/// form is adjacently tagged, e.g.
/// `{"type": "ToggleChecked", "data": {"id": 1700000000000}}`.
///
/// # Examples
///
/// ```
/// use taskfold::{Filter, UiEvent};
///
/// let event: UiEvent =
///     serde_json::from_str(r#"{"type": "SelectFilter", "data": {"filter": "removed"}}"#).unwrap();
/// assert_eq!(event, UiEvent::SelectFilter { filter: Filter::Removed });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiEvent {
    /// The new-task input changed. A missing or `null` text clears it.
    TextChanged {
        #[serde(default)]
        text: Option<String>,
    },
    /// The new-task form was submitted.
    Submit,
    /// A filter was picked from the selector.
    SelectFilter { filter: Filter },
    /// The completed checkbox of a task was clicked.
    ToggleChecked { id: TaskId },
    /// The remove / restore button of a task was clicked.
    ToggleRemoved { id: TaskId },
    /// The text of a task was edited in place.
    Edit { id: TaskId, value: String },
    /// The "empty trash" button was clicked.
    EmptyTrash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_shorthand_accepts_owned_and_borrowed() {
        assert_eq!(
            TaskCommand::add("a"),
            TaskCommand::Add { text: "a".into() }
        );
        assert_eq!(
            TaskCommand::add(String::from("b")),
            TaskCommand::Add { text: "b".into() }
        );
    }

    #[test]
    fn command_serde_roundtrip() {
        let cmd = TaskCommand::SetField {
            id: TaskId(42),
            field: TaskField::Value("new".into()),
        };
        let json = serde_json::to_string(&cmd).expect("serialization should succeed");
        let back: TaskCommand = serde_json::from_str(&json).expect("deserialization should succeed");
        assert_eq!(back, cmd);
    }

    #[test]
    fn fieldless_command_has_no_data() {
        let json = serde_json::to_value(TaskCommand::PurgeRemoved).unwrap();
        assert_eq!(json, json!({"type": "PurgeRemoved"}));
    }

    #[test]
    fn text_changed_accepts_null_and_missing_text() {
        let null: UiEvent =
            serde_json::from_value(json!({"type": "TextChanged", "data": {"text": null}})).unwrap();
        assert_eq!(null, UiEvent::TextChanged { text: None });

        let missing: UiEvent =
            serde_json::from_value(json!({"type": "TextChanged", "data": {}})).unwrap();
        assert_eq!(missing, UiEvent::TextChanged { text: None });
    }

    #[test]
    fn edit_event_parses() {
        let event: UiEvent = serde_json::from_value(
            json!({"type": "Edit", "data": {"id": 5, "value": "renamed"}}),
        )
        .unwrap();
        assert_eq!(
            event,
            UiEvent::Edit {
                id: TaskId(5),
                value: "renamed".into()
            }
        );
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let result = serde_json::from_value::<UiEvent>(
            json!({"type": "SelectFilter", "data": {"filter": "archived"}}),
        );
        assert!(result.is_err());
    }
}

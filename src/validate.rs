//! Shape validation for task collections read back from storage.
//!
//! Storage hands back an untyped JSON value. It is accepted as a
//! [`TaskList`] only if it is an array whose every element is an object
//! with an integral `id`, a string `value`, and boolean `checked` and
//! `removed` fields, and no two elements share an id. Extra fields are
//! ignored.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::ShapeError;
use crate::task::{Task, TaskId, TaskList};

/// Validate `value` as a task collection, preserving element order.
///
/// # Errors
///
/// Returns the first [`ShapeError`] encountered, scanning in order.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskfold::validate_tasks;
///
/// let ok = validate_tasks(&json!([{"id": 1, "value": "a", "checked": false, "removed": false}]));
/// assert_eq!(ok.unwrap().len(), 1);
///
/// assert!(validate_tasks(&json!({"id": 1})).is_err());
/// ```
pub fn validate_tasks(value: &Value) -> Result<TaskList, ShapeError> {
    let items = value.as_array().ok_or(ShapeError::NotAnArray {
        found: type_name(value),
    })?;

    let mut seen = HashSet::with_capacity(items.len());
    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let task = validate_task(index, item)?;
        if !seen.insert(task.id) {
            return Err(ShapeError::DuplicateId { id: task.id.0 });
        }
        tasks.push(task);
    }
    Ok(TaskList::from_vec(tasks))
}

fn validate_task(index: usize, item: &Value) -> Result<Task, ShapeError> {
    let obj = item.as_object().ok_or(ShapeError::NotAnObject {
        index,
        found: type_name(item),
    })?;

    let id = field(obj, index, "id")?;
    let id = as_integer(id).ok_or(ShapeError::WrongType {
        index,
        field: "id",
        expected: "an integer",
    })?;

    let value = field(obj, index, "value")?
        .as_str()
        .ok_or(ShapeError::WrongType {
            index,
            field: "value",
            expected: "a string",
        })?;

    let checked = as_bool(obj, index, "checked")?;
    let removed = as_bool(obj, index, "removed")?;

    Ok(Task {
        id: TaskId(id),
        value: value.to_owned(),
        checked,
        removed,
    })
}

fn field<'a>(
    obj: &'a Map<String, Value>,
    index: usize,
    name: &'static str,
) -> Result<&'a Value, ShapeError> {
    obj.get(name)
        .ok_or(ShapeError::MissingField { index, field: name })
}

fn as_bool(obj: &Map<String, Value>, index: usize, name: &'static str) -> Result<bool, ShapeError> {
    field(obj, index, name)?
        .as_bool()
        .ok_or(ShapeError::WrongType {
            index,
            field: name,
            expected: "a boolean",
        })
}

/// Integral JSON numbers, including floats with no fractional part
/// (`1.7e12`), which some writers emit for millisecond timestamps.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    let in_range = f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64;
    in_range.then_some(f as i64)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

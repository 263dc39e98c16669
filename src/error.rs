//! Crate-level error types for storage access, shape validation, and loading.

/// Error returned by a [`KeyValueStore`](crate::KeyValueStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failure.
    ///
    /// An underlying filesystem error occurred while reading or writing
    /// the stored value.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored bytes could not be encoded or decoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key cannot be mapped onto the backend (e.g. it contains a path
    /// separator for a file-backed store).
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Error returned when a stored value is not a well-formed task collection.
///
/// Each variant names the first offending element so a warning can point
/// at it directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// The top-level value is not an array.
    #[error("expected an array of tasks, found {found}")]
    NotAnArray {
        /// JSON type name of the value that was found.
        found: &'static str,
    },

    /// An element of the array is not an object.
    #[error("element {index}: expected an object, found {found}")]
    NotAnObject {
        /// Position of the element in the array.
        index: usize,
        /// JSON type name of the element.
        found: &'static str,
    },

    /// A required field is absent.
    #[error("element {index}: missing field `{field}`")]
    MissingField {
        /// Position of the element in the array.
        index: usize,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present but holds the wrong primitive type.
    #[error("element {index}: field `{field}` should be {expected}")]
    WrongType {
        /// Position of the element in the array.
        index: usize,
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },

    /// Two elements share the same id.
    #[error("duplicate task id {id}")]
    DuplicateId {
        /// The repeated id.
        id: i64,
    },
}

/// Error returned by [`PersistenceBridge::load`](crate::PersistenceBridge::load).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The backend failed to read the value.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A value was stored but it is not a task collection.
    #[error("stored value rejected: {0}")]
    Shape(#[from] ShapeError),
}

/// The background persistence writer has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("persistence writer is no longer running")]
pub struct WriterGone;

/// A filter name outside `all | checked | unchecked | removed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter: {0:?}")]
pub struct ParseFilterError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_io_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from(io_err);
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn shape_error_messages_name_the_element() {
        let err = ShapeError::MissingField {
            index: 2,
            field: "checked",
        };
        assert_eq!(err.to_string(), "element 2: missing field `checked`");

        let err = ShapeError::WrongType {
            index: 0,
            field: "id",
            expected: "an integer",
        };
        assert_eq!(err.to_string(), "element 0: field `id` should be an integer");
    }

    #[test]
    fn load_error_storage_is_transparent() {
        let err = LoadError::from(StorageError::InvalidKey("a/b".into()));
        assert_eq!(err.to_string(), "invalid storage key: \"a/b\"");
    }

    #[test]
    fn load_error_shape_display() {
        let err = LoadError::from(ShapeError::NotAnArray { found: "a string" });
        assert_eq!(
            err.to_string(),
            "stored value rejected: expected an array of tasks, found a string"
        );
    }

    #[test]
    fn writer_gone_display() {
        assert_eq!(
            WriterGone.to_string(),
            "persistence writer is no longer running"
        );
    }

    #[test]
    fn parse_filter_error_display() {
        let err = ParseFilterError("done".into());
        assert_eq!(err.to_string(), "unknown filter: \"done\"");
    }

    // Errors cross the writer task boundary, so they must be `Send + Sync`.
    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<StorageError>();
            assert_send_sync::<ShapeError>();
            assert_send_sync::<LoadError>();
            assert_send_sync::<WriterGone>();
        }
    };
}

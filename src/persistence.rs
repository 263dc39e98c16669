//! Load/save bridge between the task collection and a key-value backend.
//!
//! [`PersistenceBridge`] performs the one-shot validated load at startup and
//! direct saves. For the save-after-every-mutation flow it is turned into a
//! background writer ([`PersistenceBridge::spawn_writer`]) that exclusively
//! owns the backend and processes save requests from an `mpsc` channel one
//! at a time, so writes to the key land in the order they were requested.
//!
//! Public API: [`PersistenceBridge`] and [`SaveHandle`] (cloneable,
//! non-blocking sender of snapshots).

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

use crate::error::{LoadError, StorageError, WriterGone};
use crate::storage::KeyValueStore;
use crate::task::TaskList;
use crate::validate::validate_tasks;

/// Default storage key. Versioned so a future format can move to a new key.
pub const DEFAULT_STORAGE_KEY: &str = "todo-20200101";

/// Reads and writes the whole task collection under a single key.
#[derive(Debug)]
pub struct PersistenceBridge<S> {
    storage: Arc<S>,
    key: String,
}

impl<S> Clone for PersistenceBridge<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            key: self.key.clone(),
        }
    }
}

impl<S: KeyValueStore> PersistenceBridge<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(storage),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read and validate the stored collection.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(list))` if a value is stored and it is a task collection.
    /// - `Ok(None)` if nothing is stored under the key.
    ///
    /// # Errors
    ///
    /// * [`LoadError::Storage`] -- the backend failed to read.
    /// * [`LoadError::Shape`] -- the stored value is not a task collection.
    pub async fn load(&self) -> Result<Option<TaskList>, LoadError> {
        let Some(value) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };
        Ok(Some(validate_tasks(&value)?))
    }

    /// Overwrite the stored value with `tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if encoding or the backend write fails.
    pub async fn save(&self, tasks: &TaskList) -> Result<(), StorageError> {
        let value = serde_json::to_value(tasks)?;
        self.storage.set(&self.key, value).await
    }

    /// Start the background writer on the current tokio runtime.
    ///
    /// The writer runs until every [`SaveHandle`] clone has been dropped,
    /// after draining the requests already queued.
    pub fn spawn_writer(self) -> SaveHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(self, rx));
        SaveHandle { sender: tx }
    }
}

/// Messages sent from [`SaveHandle`] to the writer loop.
pub(crate) enum WriterMessage {
    /// Persist this snapshot.
    Save { snapshot: TaskList },
    /// Reply once every earlier message has been processed.
    Flush { reply: oneshot::Sender<()> },
}

/// Sequentially process save requests until the channel closes.
///
/// A failed write is logged and the loop moves on to the next request:
/// in-memory state is authoritative and the next mutation retries with a
/// fresher snapshot.
async fn run_writer<S: KeyValueStore>(
    bridge: PersistenceBridge<S>,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    let mut written: u64 = 0;
    while let Some(msg) = rx.recv().await {
        match msg {
            WriterMessage::Save { snapshot } => {
                let span = tracing::info_span!("save", key = %bridge.key, tasks = snapshot.len());
                match bridge.save(&snapshot).instrument(span.clone()).await {
                    Ok(()) => {
                        written += 1;
                        span.in_scope(|| tracing::debug!("snapshot saved"));
                    }
                    Err(e) => {
                        span.in_scope(|| {
                            tracing::error!(
                                error = %e,
                                "failed to save snapshot; continuing with in-memory state"
                            )
                        });
                    }
                }
            }
            WriterMessage::Flush { reply } => {
                // The caller may have stopped waiting.
                let _ = reply.send(());
            }
        }
    }
    tracing::debug!(key = %bridge.key, written, "persistence writer stopped");
}

/// Cloneable sender of save requests to the background writer.
#[derive(Debug, Clone)]
pub struct SaveHandle {
    sender: mpsc::UnboundedSender<WriterMessage>,
}

impl SaveHandle {
    /// Queue `snapshot` for writing. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`WriterGone`] if the writer has exited (its runtime shut
    /// down); the snapshot is dropped.
    pub fn request_save(&self, snapshot: TaskList) -> Result<(), WriterGone> {
        self.sender
            .send(WriterMessage::Save { snapshot })
            .map_err(|_| WriterGone)
    }

    /// Wait until every save requested before this call has been attempted.
    ///
    /// # Errors
    ///
    /// Returns [`WriterGone`] if the writer has exited.
    pub async fn flush(&self) -> Result<(), WriterGone> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(WriterMessage::Flush { reply: tx })
            .map_err(|_| WriterGone)?;
        rx.await.map_err(|_| WriterGone)
    }

    /// Whether the writer is still accepting requests.
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl std::fmt::Debug for WriterMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterMessage::Save { snapshot } => f
                .debug_struct("Save")
                .field("tasks", &snapshot.len())
                .finish(),
            WriterMessage::Flush { .. } => f.write_str("Flush"),
        }
    }
}

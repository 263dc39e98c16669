//! Top-level entry point that owns the task collection, the view filter and
//! the draft input, and forwards every committed change to persistence.
//!
//! A persistent store is opened via [`TaskStoreBuilder`], which performs the
//! single startup load before handing the store out; an ephemeral one is
//! created with [`TaskStore::new`].

use crate::command::{TaskCommand, UiEvent};
use crate::id::{Clock, IdGenerator, system_clock};
use crate::persistence::{DEFAULT_STORAGE_KEY, PersistenceBridge, SaveHandle};
use crate::storage::KeyValueStore;
use crate::task::{Task, TaskEvent, TaskField, TaskId, TaskList};
use crate::view::{self, Filter, TaskView};

/// In-memory task list state.
///
/// All operations are synchronous and run to completion; reads always see a
/// settled state. Misuse (empty text, unknown ids) is silently ignored.
///
/// # Examples
///
/// ```
/// use taskfold::{Filter, TaskField, TaskStore};
///
/// let mut store = TaskStore::new();
/// let milk = store.add("buy milk").unwrap();
/// store.add("walk dog");
/// store.set_field(milk, TaskField::Checked(true));
///
/// store.set_filter(Filter::Checked);
/// let shown: Vec<&str> = store.visible_tasks().map(|t| t.value.as_str()).collect();
/// assert_eq!(shown, ["buy milk"]);
/// ```
#[derive(Debug)]
pub struct TaskStore {
    tasks: TaskList,
    filter: Filter,
    draft: String,
    ids: IdGenerator,
    saver: Option<SaveHandle>,
}

impl TaskStore {
    /// An empty store with no persistence.
    pub fn new() -> Self {
        Self::with_clock(system_clock)
    }

    /// An empty store with no persistence, drawing ids from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            tasks: TaskList::new(),
            filter: Filter::default(),
            draft: String::new(),
            ids: IdGenerator::new(clock),
            saver: None,
        }
    }

    /// Start configuring a store persisted in `storage`.
    pub fn builder<S: KeyValueStore>(storage: S) -> TaskStoreBuilder<S> {
        TaskStoreBuilder::new(storage)
    }

    /// Replace the collection with a restored one. Not a mutation: nothing
    /// is saved.
    fn restore(&mut self, tasks: TaskList) {
        for task in &tasks {
            self.ids.observe(task.id);
        }
        self.tasks = tasks;
    }

    /// Run a command through the reducer and persist the result if it
    /// changed anything.
    ///
    /// # Returns
    ///
    /// The events produced; empty for a no-op.
    pub fn execute(&mut self, cmd: TaskCommand) -> Vec<TaskEvent> {
        let current = std::mem::take(&mut self.tasks);
        let (next, events) = current.reduce(cmd, &mut self.ids);
        self.tasks = next;

        if !events.is_empty() {
            self.request_save();
        }
        events
    }

    fn request_save(&self) {
        let Some(saver) = &self.saver else {
            return;
        };
        if let Err(e) = saver.request_save(self.tasks.clone()) {
            tracing::warn!(error = %e, tasks = self.tasks.len(), "snapshot not persisted");
        }
    }

    /// Prepend a task with `text`.
    ///
    /// # Returns
    ///
    /// The new task's id, or `None` if `text` is empty or no id above the
    /// existing ones is left to issue.
    pub fn add(&mut self, text: impl Into<String>) -> Option<TaskId> {
        self.execute(TaskCommand::add(text))
            .into_iter()
            .find_map(|event| match event {
                TaskEvent::Added { task } => Some(task.id),
                _ => None,
            })
    }

    /// Replace one field of the task with `id`.
    ///
    /// # Returns
    ///
    /// `true` if the task exists and the field changed.
    pub fn set_field(&mut self, id: TaskId, field: TaskField) -> bool {
        !self.execute(TaskCommand::SetField { id, field }).is_empty()
    }

    /// Flip the completed flag of the task with `id`.
    pub fn toggle_checked(&mut self, id: TaskId) -> bool {
        match self.tasks.get(id) {
            Some(task) => {
                let checked = !task.checked;
                self.set_field(id, TaskField::Checked(checked))
            }
            None => false,
        }
    }

    /// Move the task with `id` into the trash, or restore it from there.
    pub fn toggle_removed(&mut self, id: TaskId) -> bool {
        match self.tasks.get(id) {
            Some(task) => {
                let removed = !task.removed;
                self.set_field(id, TaskField::Removed(removed))
            }
            None => false,
        }
    }

    /// Replace the text of the task with `id`.
    pub fn edit(&mut self, id: TaskId, value: impl Into<String>) -> bool {
        self.set_field(id, TaskField::Value(value.into()))
    }

    /// Erase every task in the trash.
    ///
    /// # Returns
    ///
    /// How many tasks were erased.
    pub fn purge_removed(&mut self) -> usize {
        self.execute(TaskCommand::PurgeRemoved)
            .iter()
            .map(|event| match event {
                TaskEvent::Purged { ids } => ids.len(),
                _ => 0,
            })
            .sum()
    }

    /// Switch the active filter. Never persisted.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// The full collection, newest first, regardless of filter.
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Tasks shown under the active filter.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> {
        view::visible(self.tasks.as_slice(), self.filter)
    }

    /// The rendered list under the active filter.
    pub fn view(&self) -> Vec<TaskView<'_>> {
        view::render(self.tasks.as_slice(), self.filter)
    }

    /// Whether the "empty trash" action has anything to do.
    pub fn can_purge(&self) -> bool {
        self.tasks.has_removed()
    }

    /// Whether the new-task form is offered under the active filter.
    pub fn accepts_new_tasks(&self) -> bool {
        self.filter.accepts_new_tasks()
    }

    /// Current contents of the new-task input.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Add the draft as a task and clear it. An empty draft is left as is.
    pub fn submit(&mut self) -> Option<TaskId> {
        let id = self.add(self.draft.clone())?;
        self.draft.clear();
        Some(id)
    }

    /// Route a front-end event.
    ///
    /// Interactions the view disables are ignored here as well: checking a
    /// trashed task, editing a completed or trashed task, submitting while
    /// the form is hidden, and emptying the trash outside the trash view.
    pub fn dispatch(&mut self, event: UiEvent) {
        tracing::trace!(?event, "ui event");
        match event {
            UiEvent::TextChanged { text } => self.set_draft(text.unwrap_or_default()),
            UiEvent::Submit => {
                if self.accepts_new_tasks() {
                    self.submit();
                }
            }
            UiEvent::SelectFilter { filter } => self.set_filter(filter),
            UiEvent::ToggleChecked { id } => {
                if self.get(id).is_some_and(|t| TaskView::new(t).checkable) {
                    self.toggle_checked(id);
                }
            }
            UiEvent::ToggleRemoved { id } => {
                self.toggle_removed(id);
            }
            UiEvent::Edit { id, value } => {
                if self.get(id).is_some_and(|t| TaskView::new(t).editable) {
                    self.edit(id, value);
                }
            }
            UiEvent::EmptyTrash => {
                if self.filter == Filter::Removed {
                    self.purge_removed();
                }
            }
        }
    }

    /// The persistence writer, if this store is persisted.
    pub fn save_handle(&self) -> Option<&SaveHandle> {
        self.saver.as_ref()
    }

    /// Wait until every snapshot requested so far has been written (or has
    /// failed and been logged). Returns immediately for an ephemeral store.
    pub async fn flush(&self) {
        if let Some(saver) = &self.saver
            && let Err(e) = saver.flush().await
        {
            tracing::warn!(error = %e, "flush skipped");
        }
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for opening a persisted [`TaskStore`].
///
/// # Examples
///
/// ```
/// use taskfold::{MemoryStore, TaskStore};
///
/// # async fn example() {
/// let store = TaskStore::builder(MemoryStore::new())
///     .key("todo-20200101")
///     .open()
///     .await;
/// assert!(store.tasks().is_empty());
/// # }
/// ```
pub struct TaskStoreBuilder<S> {
    storage: S,
    key: String,
    clock: Clock,
}

impl<S: KeyValueStore> TaskStoreBuilder<S> {
    /// Start with the default key and the system clock.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_STORAGE_KEY.to_owned(),
            clock: system_clock,
        }
    }

    /// Set the storage key. Defaults to [`DEFAULT_STORAGE_KEY`].
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the id clock (milliseconds since the Unix epoch). Defaults to
    /// the system clock.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load the stored collection once and start the persistence writer.
    ///
    /// Never fails: a missing, malformed or unreadable value leaves the
    /// store empty. Must be called from within a tokio runtime.
    pub async fn open(self) -> TaskStore {
        let bridge = PersistenceBridge::new(self.storage, self.key);
        let mut store = TaskStore::with_clock(self.clock);

        match bridge.load().await {
            Ok(Some(tasks)) => {
                tracing::info!(key = bridge.key(), count = tasks.len(), "tasks restored");
                store.restore(tasks);
            }
            Ok(None) => {
                tracing::debug!(key = bridge.key(), "nothing stored; starting empty");
            }
            Err(e) => {
                tracing::warn!(
                    key = bridge.key(),
                    error = %e,
                    "stored tasks unusable; starting empty"
                );
            }
        }

        store.saver = Some(bridge.spawn_writer());
        store
    }
}

impl<S> std::fmt::Debug for TaskStoreBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStoreBuilder")
            .field("key", &self.key)
            .finish()
    }
}

//! Self-contained example: two sessions over the same file-backed store.
//!
//! Run with: `cargo run --example session`
//!
//! Set `RUST_LOG=taskfold=debug` to see load/save logging.

use taskfold::{FileStore, Filter, TaskField, TaskStore, UiEvent};
use tracing_subscriber::EnvFilter;

fn print_view(store: &TaskStore) {
    println!("[{}]", store.filter());
    for view in store.view() {
        let mark = if view.task.checked { "x" } else { " " };
        let lock = if view.editable { "" } else { " (locked)" };
        println!("  [{mark}] {}{lock}", view.task.value);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Use a temporary directory as the on-device storage.
    let tmp = tempfile::tempdir()?;

    // First session: build a small list.
    {
        let mut store = TaskStore::builder(FileStore::new(tmp.path())).open().await;

        let milk = store.add("buy milk").ok_or("add failed")?;
        store.add("walk dog");
        store.dispatch(UiEvent::TextChanged {
            text: Some("file taxes".into()),
        });
        store.dispatch(UiEvent::Submit);

        store.set_field(milk, TaskField::Checked(true));
        print_view(&store);

        store.set_filter(Filter::Checked);
        print_view(&store);

        store.toggle_removed(milk);
        store.set_filter(Filter::Removed);
        print_view(&store);

        store.flush().await;
    }

    // Second session: the list comes back, the filter does not.
    let mut store = TaskStore::builder(FileStore::new(tmp.path())).open().await;
    assert_eq!(store.filter(), Filter::All);
    assert_eq!(store.tasks().len(), 3);
    print_view(&store);

    let purged = store.purge_removed();
    store.flush().await;
    println!("purged {purged} task(s)");

    assert_eq!(purged, 1);
    let remaining: Vec<&str> = store.tasks().iter().map(|t| t.value.as_str()).collect();
    assert_eq!(remaining, ["file taxes", "walk dog"]);

    println!("all assertions passed");

    Ok(())
}

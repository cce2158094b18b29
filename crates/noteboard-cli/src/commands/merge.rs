//! Merge command handler

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use tracing::debug;

use noteboard_core::{BoardStore, ValueChanged};

use crate::output::Output;

/// Merge another replica's board file and show what changed
pub fn merge(store: &mut BoardStore, path: PathBuf, output: &Output) -> Result<()> {
    let received = Rc::new(RefCell::new(Vec::<ValueChanged>::new()));
    let sink = Rc::clone(&received);
    let subscription = store.board_mut().subscribe(Box::new(move |change, local| {
        if !local {
            sink.borrow_mut().push(change.clone());
        }
    }));

    let result = store.merge_file(&path);
    store.board_mut().unsubscribe(subscription);
    let changed = result?;

    debug!(changed, "Merge finished");
    output.print_changes(&received.borrow());
    Ok(())
}

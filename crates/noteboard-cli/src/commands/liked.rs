//! Liked-notes ranking

use anyhow::Result;

use noteboard_core::BoardStore;

use crate::output::Output;

/// Show liked notes, most liked first
pub fn list(store: &BoardStore, output: &Output) -> Result<()> {
    let liked = store.board().liked_notes()?;
    output.print_liked(&liked);
    Ok(())
}

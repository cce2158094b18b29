//! Roster command handlers
//!
//! The roster is the set of users signed in to the board.

use anyhow::Result;

use noteboard_core::BoardStore;

use crate::output::Output;

/// Sign a user in; defaults to the configured user
pub fn join(store: &mut BoardStore, user_id: Option<String>, output: &Output) -> Result<()> {
    let user_id = target_user(store, user_id)?;
    if store.update(|board| board.sign_in(&user_id))? {
        output.success(&format!("{} signed in", user_id));
    } else {
        output.message(&format!("{} is already signed in", user_id));
    }
    Ok(())
}

/// Sign a user out; defaults to the configured user
pub fn leave(store: &mut BoardStore, user_id: Option<String>, output: &Output) -> Result<()> {
    let user_id = target_user(store, user_id)?;
    if store.update(|board| board.sign_out(&user_id))? {
        output.success(&format!("{} signed out", user_id));
    } else {
        output.message(&format!("{} was not signed in", user_id));
    }
    Ok(())
}

pub fn list(store: &BoardStore, output: &Output) -> Result<()> {
    let user_ids = store.board().signed_in_user_ids()?;
    output.print_roster(&user_ids);
    Ok(())
}

fn target_user(store: &BoardStore, user_id: Option<String>) -> Result<String> {
    match user_id {
        Some(id) => Ok(id),
        None => Ok(store.user()?.user_id),
    }
}

//! Presence command handler
//!
//! Evaluates one presence message from the directory service against the
//! board's roster and shows the resulting notification.

use anyhow::{Context, Result};

use noteboard_core::chat::invite_message;
use noteboard_core::{BoardStore, PresenceAction, PresenceNotifier};

use crate::output::Output;

pub fn evaluate(store: &BoardStore, message: String, output: &Output) -> Result<()> {
    let me = store.user()?;
    let roster = store.board().signed_in_user_ids()?;

    let mut notifier = PresenceNotifier::new(me.user_id);
    let action = notifier
        .handle_message(&message, &roster)
        .context("Invalid presence message")?;

    output.print_presence(&action, notifier.toasts().active());

    if let PresenceAction::Invite { ref user_id } = action {
        match store.config().session_url {
            Some(ref url) => output.message(&format!(
                "Invitation for {}: {}",
                user_id,
                invite_message(url)
            )),
            None => output.message(
                "Set session_url to include a link: noteboard config set session_url <url>",
            ),
        }
    }
    Ok(())
}

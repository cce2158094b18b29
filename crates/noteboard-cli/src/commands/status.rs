//! Status command handler

use anyhow::Result;

use noteboard_core::BoardStore;

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &BoardStore, output: &Output) -> Result<()> {
    let config = store.config();
    let board = store.board();
    let notes = board.note_ids()?.len();
    let liked = board.liked_notes()?.len();
    let roster = board.signed_in_user_ids()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "board_id": store.board_id().to_bs58check(),
                    "board_url": store.board_url(),
                    "user_id": config.user_id,
                    "data_dir": config.data_dir,
                    "counts": {
                        "notes": notes,
                        "liked_notes": liked,
                        "signed_in": roster.len()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.board_id());
        }
        OutputFormat::Human => {
            println!("Noteboard Status");
            println!("================");
            println!();
            println!("Board:");
            println!("  ID:  {}", store.board_id());
            println!("  URL: {}", store.board_url());
            println!();
            println!(
                "User: {}",
                config.user_id.as_deref().unwrap_or("(not set)")
            );
            println!("Storage: {}", config.data_dir.display());
            println!();
            println!("Contents:");
            println!("  Notes:       {}", notes);
            println!("  Liked notes: {}", liked);
            println!("  Signed in:   {}", roster.len());
        }
    }

    Ok(())
}

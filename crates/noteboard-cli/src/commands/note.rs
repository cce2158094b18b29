//! Note command handlers

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use noteboard_core::keys;
use noteboard_core::{BoardStore, NoteData, Position, SharedMap};

use crate::output::{short_id, Output};

/// Color of notes added without `--color`
pub const DEFAULT_COLOR: &str = "yellow";

/// Add a note authored by the configured user
pub fn add(
    store: &mut BoardStore,
    text: String,
    x: f64,
    y: f64,
    color: Option<String>,
    output: &Output,
) -> Result<()> {
    let me = store.user()?;
    let color = color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
    let note = NoteData::new(me, Position::new(x, y), color).with_text(text);

    store.update(|board| board.set_note(&note.id, &note))?;

    if output.is_quiet() {
        println!("{}", note.id);
    } else {
        output.success(&format!("Added note {}", short_id(&note.id)));
    }
    Ok(())
}

pub fn move_to(store: &mut BoardStore, id: String, x: f64, y: f64, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    store.update(|board| board.move_note(&note_id, Position::new(x, y)))?;
    output.success(&format!("Moved note {} to ({}, {})", short_id(&note_id), x, y));
    Ok(())
}

pub fn set_text(store: &mut BoardStore, id: String, text: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    store.update(|board| board.set_note_text(&note_id, &text))?;
    output.success(&format!("Updated text of note {}", short_id(&note_id)));
    Ok(())
}

pub fn set_color(store: &mut BoardStore, id: String, color: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    store.update(|board| board.set_note_color(&note_id, &color))?;
    output.success(&format!("Colored note {} {}", short_id(&note_id), color));
    Ok(())
}

pub fn delete(store: &mut BoardStore, id: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    store.update(|board| board.delete_note(&note_id))?;
    output.success(&format!("Deleted note {}", short_id(&note_id)));
    Ok(())
}

/// Bring a deleted note back by writing it again
pub fn restore(store: &mut BoardStore, id: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, true)?;
    let me = store.user()?;

    let board = store.board();
    if !board.is_deleted(&note_id)? {
        bail!("Note {} is not deleted", short_id(&note_id));
    }

    let view = board.note_view(&note_id, &me)?;
    let (Some(position), Some(author)) = (view.position, view.author) else {
        bail!("Note {} is incomplete and cannot be restored", short_id(&note_id));
    };
    let note = NoteData {
        id: note_id.clone(),
        text: view.text,
        position,
        author,
        color: view.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    };

    store.update(|board| board.set_note(&note.id, &note))?;
    output.success(&format!("Restored note {}", short_id(&note_id)));
    Ok(())
}

/// Toggle the configured user's like
pub fn like(store: &mut BoardStore, id: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    let me = store.user()?;

    let liked = store.update(|board| board.like_note(&note_id, &me))?;
    let verb = if liked { "Liked" } else { "Unliked" };
    output.success(&format!("{} note {}", verb, short_id(&note_id)));
    Ok(())
}

pub fn show(store: &BoardStore, id: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    let me = store.user()?;

    let view = store.board().note_view(&note_id, &me)?;
    let likers = store.board().note_liked_users(&note_id)?;
    output.print_note(&view, &likers);
    Ok(())
}

pub fn list(store: &BoardStore, output: &Output) -> Result<()> {
    let me = store.user()?;
    let views = store
        .board()
        .note_views(&me)
        .context("Failed to read notes")?;
    output.print_notes(&views);
    Ok(())
}

/// Show who liked a note
pub fn likes(store: &BoardStore, id: String, output: &Output) -> Result<()> {
    let note_id = resolve_note_id(store, &id, false)?;
    let likers = store.board().note_liked_users(&note_id)?;
    output.print_reactions(&likers);
    Ok(())
}

/// Resolve a note ID (supports full ID or prefix)
///
/// Only listed notes are candidates, plus deleted ones when
/// `include_deleted` is set.
pub fn resolve_note_id(store: &BoardStore, id: &str, include_deleted: bool) -> Result<String> {
    let board = store.board();
    let candidates: Vec<String> = if include_deleted {
        board
            .map()
            .keys()?
            .iter()
            .filter_map(|key| keys::note_id_from_presence(key))
            .map(str::to_string)
            .collect()
    } else {
        board.note_ids()?
    };

    // Full ID first
    let exact = match Uuid::parse_str(id) {
        Ok(uuid) => uuid.to_string(),
        Err(_) => id.to_string(),
    };
    if candidates.contains(&exact) {
        return Ok(exact);
    }

    // Try prefix match
    let matches: Vec<_> = candidates.iter().filter(|c| c.starts_with(id)).collect();
    match matches.len() {
        0 => bail!("No note found matching: {}", id),
        1 => Ok(matches[0].clone()),
        _ => {
            eprintln!("Multiple notes match '{}':", id);
            for note_id in &matches {
                eprintln!("  {}", note_id);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use noteboard_core::keys::BoardKey;
use noteboard_core::presence::Toast;
use noteboard_core::{LikedNote, NoteView, PresenceAction, User, ValueChanged};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single note with its likers
    pub fn print_note(&self, note: &NoteView, likers: &[User]) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", note.id);
                println!("Text:     {}", note.text.as_deref().unwrap_or("(empty)"));
                if let Some(ref author) = note.author {
                    println!("Author:   {}", author.label());
                }
                if let Some(position) = note.position {
                    println!("Position: ({}, {})", position.x, position.y);
                }
                if let Some(ref color) = note.color {
                    println!("Color:    {}", color);
                }
                let mine = if note.did_i_like { " (including you)" } else { "" };
                println!("Likes:    {}{}", note.num_likes, mine);

                if !likers.is_empty() {
                    println!();
                    print_reaction_list(likers);
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({ "note": note, "likedBy": likers }));
            }
            OutputFormat::Quiet => {
                println!("{}", note.id);
            }
        }
    }

    /// Print a list of notes
    pub fn print_notes(&self, notes: &[NoteView]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes on the board.");
                    return;
                }
                for note in notes {
                    let heart = if note.did_i_like { "♥" } else { " " };
                    println!(
                        "{} | {:<40} | {:>3} {} | {}",
                        short_id(&note.id),
                        truncate(note.text.as_deref().unwrap_or(""), 40),
                        note.num_likes,
                        heart,
                        note.author.as_ref().map(User::label).unwrap_or("")
                    );
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => print_json(&notes),
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id);
                }
            }
        }
    }

    /// Print the liked-notes ranking
    pub fn print_liked(&self, liked: &[LikedNote]) {
        match self.format {
            OutputFormat::Human => {
                if liked.is_empty() {
                    println!("No liked notes yet.");
                    return;
                }
                for (rank, note) in liked.iter().enumerate() {
                    println!(
                        "{:>2}. {:<50} {:>3} like(s)",
                        rank + 1,
                        truncate(&note.text, 50),
                        note.num_likes
                    );
                }
            }
            OutputFormat::Json => print_json(&liked),
            OutputFormat::Quiet => {
                for note in liked {
                    println!("{}", note.text);
                }
            }
        }
    }

    /// Print the users who liked a note
    pub fn print_reactions(&self, likers: &[User]) {
        match self.format {
            OutputFormat::Human => {
                if likers.is_empty() {
                    println!("No likes yet.");
                    return;
                }
                print_reaction_list(likers);
            }
            OutputFormat::Json => print_json(&likers),
            OutputFormat::Quiet => {
                for user in likers {
                    println!("{}", user.user_id);
                }
            }
        }
    }

    /// Print the signed-in roster
    pub fn print_roster(&self, user_ids: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if user_ids.is_empty() {
                    println!("Nobody is signed in.");
                    return;
                }
                for id in user_ids {
                    println!("{}", id);
                }
                println!("\n{} user(s) signed in", user_ids.len());
            }
            OutputFormat::Json => print_json(&user_ids),
            OutputFormat::Quiet => {
                for id in user_ids {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print changes received from another replica
    pub fn print_changes(&self, changes: &[ValueChanged]) {
        match self.format {
            OutputFormat::Human => {
                if changes.is_empty() {
                    println!("Already up to date.");
                    return;
                }
                for change in changes {
                    println!("{}", describe_change(change));
                }
                println!("\n{} change(s) merged", changes.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = changes
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "key": c.key,
                            "attribute": BoardKey::parse(&c.key).attribute(),
                            "previousValue": c.previous_value,
                        })
                    })
                    .collect();
                print_json(&json);
            }
            OutputFormat::Quiet => {
                for change in changes {
                    println!("{}", change.key);
                }
            }
        }
    }

    /// Print the outcome of a presence message
    pub fn print_presence(&self, action: &PresenceAction, toasts: &[Toast]) {
        match self.format {
            OutputFormat::Human => {
                match action {
                    PresenceAction::Invite { user_id } => {
                        println!("Invite suggested for {}", user_id)
                    }
                    PresenceAction::StatusChanged {
                        user_id,
                        availability,
                    } => println!("{} is now {}", user_id, availability),
                    PresenceAction::Ignore => println!("Nothing to do."),
                }
                for toast in toasts {
                    let closes = match toast.auto_close {
                        Some(d) => format!("closes after {}s", d.as_secs()),
                        None => "stays until dismissed".to_string(),
                    };
                    println!("  [toast] {} ({})", toast.message, closes);
                }
            }
            OutputFormat::Json => {
                let (kind, user_id) = match action {
                    PresenceAction::Invite { user_id } => ("invite", Some(user_id)),
                    PresenceAction::StatusChanged { user_id, .. } => {
                        ("statusChanged", Some(user_id))
                    }
                    PresenceAction::Ignore => ("ignore", None),
                };
                let toasts: Vec<_> = toasts
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "id": t.id,
                            "message": t.message,
                            "autoCloseMs": t.auto_close.map(|d| d.as_millis() as u64),
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "action": kind,
                    "userId": user_id,
                    "toasts": toasts,
                }));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// The persona list shown under a note
fn print_reaction_list(likers: &[User]) {
    println!("── Like Reactions ({}) ──", likers.len());
    for user in likers {
        println!("  {}", user.label());
    }
}

/// One-line description of a change
fn describe_change(change: &ValueChanged) -> String {
    let key = BoardKey::parse(&change.key);
    match key {
        BoardKey::Presence(id)
        | BoardKey::Position(id)
        | BoardKey::Author(id)
        | BoardKey::Text(id)
        | BoardKey::Color(id) => format!("{:<8} note {}", key.attribute(), short_id(id)),
        BoardKey::Vote(rest) => format!("{:<8} {}", key.attribute(), rest),
        BoardKey::Roster => "roster   signed-in users changed".to_string(),
        BoardKey::Other(raw) => format!("{:<8} {}", key.attribute(), raw),
    }
}

/// First 8 characters of an id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let kept: String = first_line.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

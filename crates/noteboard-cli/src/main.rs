//! Noteboard CLI
//!
//! Command-line interface for Noteboard - a shared brainstorming board.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use noteboard_core::{BoardStore, Config, StorageError};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "noteboard")]
#[command(about = "Noteboard - a shared brainstorming board")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new board
    Init,
    /// Show status (board ID, counts)
    Status,
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Show liked notes, most liked first
    Liked,
    /// Manage the users signed in to the board
    Roster {
        #[command(subcommand)]
        command: RosterCommands,
    },
    /// Evaluate a presence message from the directory service
    Presence {
        /// Message JSON, e.g. '{"id":"u2","availability":"Available"}'
        message: String,
    },
    /// Invite a user into the session through the chat file
    Invite {
        /// Directory id of the user to invite
        user_id: String,
        /// Chat file (defaults to chats.json in the data directory)
        #[arg(long)]
        chats: Option<PathBuf>,
    },
    /// Merge another replica's board file
    Merge {
        /// Path to the other board.automerge
        path: PathBuf,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Add a note
    Add {
        /// Note text
        text: String,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
        /// Note color
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Move a note
    Move {
        /// Note ID (full ID or prefix)
        id: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Replace a note's text
    Text { id: String, text: String },
    /// Change a note's color
    Color { id: String, color: String },
    /// Delete a note
    #[command(alias = "rm")]
    Delete { id: String },
    /// Restore a deleted note
    Restore { id: String },
    /// Like or unlike a note
    Like { id: String },
    /// Show note details
    Show { id: String },
    /// List notes
    #[command(alias = "ls")]
    List,
    /// Show who liked a note
    Likes { id: String },
}

#[derive(Subcommand)]
enum RosterCommands {
    /// Sign in (defaults to the configured user)
    Join { user_id: Option<String> },
    /// Sign out (defaults to the configured user)
    Leave { user_id: Option<String> },
    /// List signed-in users
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, user_id, display_name, session_url, log_level)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        if let Some(suggestion) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<StorageError>())
            .and_then(StorageError::recovery_suggestion)
        {
            eprintln!("Hint: {}", suggestion);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    if let Commands::Init = cli.command {
        return handle_init_command(config, &output);
    }

    let mut store = BoardStore::open_with_config(config)?;

    match cli.command {
        Commands::Init | Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&store, &output),
        Commands::Note { command } => handle_note_command(command, &mut store, &output),
        Commands::Liked => commands::liked::list(&store, &output),
        Commands::Roster { command } => handle_roster_command(command, &mut store, &output),
        Commands::Presence { message } => commands::presence::evaluate(&store, message, &output),
        Commands::Invite { user_id, chats } => {
            commands::invite::invite(&store, user_id, chats, &output)
        }
        Commands::Merge { path } => commands::merge::merge(&mut store, path, &output),
    }
}

/// Log to stderr, filtered by the configured level
fn init_logging(config: &Config) {
    let level = &config.log_level;
    let env_filter = EnvFilter::new(format!("noteboard_core={},noteboard_cli={}", level, level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_note_command(command: NoteCommands, store: &mut BoardStore, output: &Output) -> Result<()> {
    match command {
        NoteCommands::Add { text, x, y, color } => {
            commands::note::add(store, text, x, y, color, output)
        }
        NoteCommands::Move { id, x, y } => commands::note::move_to(store, id, x, y, output),
        NoteCommands::Text { id, text } => commands::note::set_text(store, id, text, output),
        NoteCommands::Color { id, color } => commands::note::set_color(store, id, color, output),
        NoteCommands::Delete { id } => commands::note::delete(store, id, output),
        NoteCommands::Restore { id } => commands::note::restore(store, id, output),
        NoteCommands::Like { id } => commands::note::like(store, id, output),
        NoteCommands::Show { id } => commands::note::show(store, id, output),
        NoteCommands::List => commands::note::list(store, output),
        NoteCommands::Likes { id } => commands::note::likes(store, id, output),
    }
}

fn handle_roster_command(
    command: RosterCommands,
    store: &mut BoardStore,
    output: &Output,
) -> Result<()> {
    match command {
        RosterCommands::Join { user_id } => commands::roster::join(store, user_id, output),
        RosterCommands::Leave { user_id } => commands::roster::leave(store, user_id, output),
        RosterCommands::List => commands::roster::list(store, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

fn handle_init_command(config: Config, output: &Output) -> Result<()> {
    let store = BoardStore::init(config)?;
    let id = store.board_id();

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "board_id": id.to_bs58check(),
                "board_url": store.board_url()
            })
        );
    } else if output.is_quiet() {
        println!("{}", id);
    } else {
        println!();
        println!("Created new board.");
        println!();
        println!("Board ID:      {}", id);
        println!("Automerge URL: {}", store.board_url());
        println!();
        println!("Stored in: {}", store.config().data_dir.display());
        if store.config().user_id.is_none() {
            println!();
            println!("Set your user before adding notes:");
            println!("  noteboard config set user_id <your-id>");
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::{
    app::{init_config, Config, Identity},
    constants::SUPPORTED_MODELS,
    session::{select_session, ChatState},
    store::KeyValueStore,
};

use super::Commands;

/// Handle CLI subcommands.
///
/// Returns `false` when the caller should continue into the chat loop.
pub fn handle_command(
    command: &Commands,
    state: &mut ChatState,
    store: &dyn KeyValueStore,
    config: &Config,
    storage_dir: &Path,
) -> Result<bool> {
    match command {
        Commands::Chat => return Ok(false),
        Commands::Init => {
            println!("Initializing Chatbox configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
        }
        Commands::Models => list_models(&config.chat.default_model),
        Commands::List => list_sessions(state),
        Commands::New { label } => {
            let id = state.new_session(label.as_deref());
            println!("Started {} ({})", state.active_label().green(), id);
        }
        Commands::Switch { id } => {
            if state.registry().contains(id) {
                let count = state.switch_to(id).len();
                println!("Switched to {} ({} messages)", state.active_label().green(), count);
            } else {
                println!("{} No session with id {}", "[WARNING]".yellow(), id);
            }
        }
        Commands::Pick => {
            let active = state.active_id();
            if let Some(id) = select_session(state.sessions(), &active)? {
                state.switch_to(&id);
                println!("Switched to {}", state.active_label().green());
            }
        }
        Commands::Rename { label, id } => {
            let id = id.clone().unwrap_or_else(|| state.active_id());
            if !state.registry().contains(&id) {
                println!("{} No session with id {}", "[WARNING]".yellow(), id);
            } else if state.rename(&id, label) {
                println!("Renamed {} to {}", id, label.trim().green());
            } else {
                println!("{} Label cannot be empty", "[WARNING]".yellow());
            }
        }
        Commands::Delete { id } => {
            let id = id.clone().unwrap_or_else(|| state.active_id());
            if !state.registry().contains(&id) {
                println!("{} No session with id {}", "[WARNING]".yellow(), id);
                return Ok(true);
            }
            let label = state.registry().display_label(&id);
            match state.delete(&id) {
                Some(fresh) => println!(
                    "Deleted {}. Now in {} ({})",
                    label,
                    state.active_label().green(),
                    fresh
                ),
                None => println!("Deleted {}", label),
            }
        }
        Commands::Export { id, dir } => {
            let id = id.clone().unwrap_or_else(|| state.active_id());
            let artifact = state
                .export(&id)
                .with_context(|| format!("No session with id {}", id))?;
            let path = artifact.write_to(dir)?;
            println!("Exported to {}", path.display());
        }
        Commands::Login { name } => {
            let identity = Identity::login(store, name)?;
            println!("Logged in as {}", identity.greeting_name().green());
        }
        Commands::Logout => {
            Identity::logout(store)?;
            println!("Logged out");
        }
        Commands::Status => show_status(state, store, config, storage_dir),
    }

    report_persistence_failures(state);
    Ok(true)
}

/// List the model menu
pub fn list_models(current: &str) {
    println!("Available models:");
    for (id, name) in SUPPORTED_MODELS {
        let marker = if *id == current { "*" } else { " " };
        println!(" {} {} ({})", marker, id.green(), name);
    }
}

/// Print every saved session, marking the active one
pub fn list_sessions(state: &mut ChatState) {
    let active = state.active_id();
    println!("Sessions:");
    for session in state.sessions() {
        let marker = if session.id == active { "*" } else { " " };
        println!(
            " {} {}  {}  ({} messages)",
            marker,
            session.label.green(),
            session.id.dimmed(),
            session.message_count
        );
    }
}

/// Tell the user about writes that did not reach disk
pub fn report_persistence_failures(state: &mut ChatState) {
    for failure in state.take_persistence_failures() {
        eprintln!(
            "{} Not saved to disk: {}. Your session is intact in memory.",
            "[WARNING]".yellow(),
            failure
        );
    }
}

fn show_status(state: &ChatState, store: &dyn KeyValueStore, config: &Config, storage_dir: &Path) {
    println!("Chatbox Status:");
    println!();
    println!("  Backend: {}", config.backend.url);
    if std::env::var(&config.backend.api_key_env).is_ok() {
        println!("    • {}: Set", config.backend.api_key_env);
    }
    println!("  Default model: {}", config.chat.default_model);
    println!("  Storage: {}", storage_dir.display());
    println!("  Sessions: {}", state.registry().len());

    let identity = Identity::load(store);
    if identity.authenticated {
        println!("  [OK] Logged in as {}", identity.greeting_name());
    } else {
        println!("  [WARNING] Not logged in (run `chatbox login --name <name>`)");
    }
    println!();
}

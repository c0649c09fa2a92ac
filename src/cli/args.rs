use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chatbox")]
#[command(version)]
#[command(about = "A local multi-session chat client", long_about = None)]
pub struct Cli {
    /// Model to use (e.g., openai/gpt-4, anthropic/claude-3-haiku)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Send one message to the active session and print the reply
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Write a default configuration file
    Init,
    /// List the models on the menu
    Models,
    /// List saved sessions
    List,
    /// Start a new session and make it active
    New {
        /// Label for the new session
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Make a session active
    Switch {
        /// Session id
        id: String,
    },
    /// Pick the active session interactively
    Pick,
    /// Rename a session (the active one by default)
    Rename {
        /// New label
        label: String,
        /// Session id
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a session (the active one by default)
    Delete {
        /// Session id
        id: Option<String>,
    },
    /// Export a session as pretty-printed JSON
    Export {
        /// Session id (the active one by default)
        id: Option<String>,
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Log in under a display name
    Login {
        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Log out
    Logout,
    /// Show configuration, storage and login status
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt_mode() {
        let cli = Cli::parse_from(["chatbox", "-p", "hello", "--output-format", "json"]);
        assert_eq!(cli.prompt.as_deref(), Some("hello"));
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_output_format_requires_prompt() {
        assert!(Cli::try_parse_from(["chatbox", "--output-format", "json"]).is_err());
    }

    #[test]
    fn test_parse_session_commands() {
        let cli = Cli::parse_from(["chatbox", "rename", "Trip", "--id", "session_1"]);
        assert_eq!(
            cli.command,
            Some(Commands::Rename {
                label: "Trip".to_string(),
                id: Some("session_1".to_string()),
            })
        );

        let cli = Cli::parse_from(["chatbox", "delete"]);
        assert_eq!(cli.command, Some(Commands::Delete { id: None }));
    }

    #[test]
    fn test_version_is_a_flag_not_a_subcommand() {
        assert!(Cli::try_parse_from(["chatbox", "version"]).is_err());
        let err = Cli::try_parse_from(["chatbox", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}

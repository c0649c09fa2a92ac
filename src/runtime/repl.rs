use colored::Colorize;

use crate::session::{Message, Role};

/// One line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    /// Plain text to send
    Say(String),
    New(Option<String>),
    List,
    Switch(String),
    Pick,
    Rename(String),
    Delete(Option<String>),
    Export(Option<String>),
    Retry,
    Model(Option<String>),
    Models,
    Clear,
    Login(String),
    Logout,
    Help,
    Quit,
    /// A slash command we do not know, or one missing its argument
    Invalid(String),
}

/// Parse a line of input. Anything not starting with `/` is a message.
pub fn parse_input(line: &str) -> ReplInput {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplInput::Say(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    match (name, arg) {
        ("new", label) => ReplInput::New(label),
        ("list" | "sessions", _) => ReplInput::List,
        ("switch", Some(id)) => ReplInput::Switch(id),
        ("pick", _) => ReplInput::Pick,
        ("rename", Some(label)) => ReplInput::Rename(label),
        ("delete", id) => ReplInput::Delete(id),
        ("export", dir) => ReplInput::Export(dir),
        ("retry", _) => ReplInput::Retry,
        ("model", model) => ReplInput::Model(model),
        ("models", _) => ReplInput::Models,
        ("clear", _) => ReplInput::Clear,
        ("login", Some(name)) => ReplInput::Login(name),
        ("logout", _) => ReplInput::Logout,
        ("help" | "?", _) => ReplInput::Help,
        ("quit" | "exit" | "q", _) => ReplInput::Quit,
        _ => ReplInput::Invalid(trimmed.to_string()),
    }
}

/// Format a message for the terminal
pub fn render_message(message: &Message) -> String {
    match message.role {
        Role::User => format!(
            "{} {} {}",
            message.time.dimmed(),
            "you:".blue().bold(),
            message.content
        ),
        Role::Bot => format!(
            "{} {} {}",
            message.time.dimmed(),
            "bot:".green().bold(),
            message.content
        ),
    }
}

pub(crate) const HELP: &str = "\
Commands:
  /new [label]      start a new session
  /list             list sessions
  /switch <id>      switch to a session
  /pick             choose a session interactively
  /rename <label>   rename the active session
  /delete [id]      delete a session (the active one by default)
  /export [dir]     export the active session as JSON
  /retry            resend your last message
  /model [id]       show or change the model
  /models           list the model menu
  /clear            start over in a fresh session
  /login <name>     log in
  /logout           log out
  /quit             leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(parse_input("hello /there"), ReplInput::Say("hello /there".to_string()));
        assert_eq!(parse_input("   "), ReplInput::Say("   ".to_string()));
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            parse_input("/rename  Weekend plans "),
            ReplInput::Rename("Weekend plans".to_string())
        );
        assert_eq!(parse_input("/new"), ReplInput::New(None));
        assert_eq!(parse_input("/delete session_1"), ReplInput::Delete(Some("session_1".to_string())));
        assert_eq!(parse_input("/model openai/gpt-4"), ReplInput::Model(Some("openai/gpt-4".to_string())));
    }

    #[test]
    fn test_missing_argument_is_invalid() {
        assert_eq!(parse_input("/switch"), ReplInput::Invalid("/switch".to_string()));
        assert_eq!(parse_input("/rename   "), ReplInput::Invalid("/rename".to_string()));
        assert_eq!(parse_input("/bogus"), ReplInput::Invalid("/bogus".to_string()));
    }

    #[test]
    fn test_render_includes_content() {
        let rendered = render_message(&Message::bot("hi there"));
        assert!(rendered.contains("hi there"));
    }
}

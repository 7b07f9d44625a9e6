//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and drive navigation: new chat, the history
//! panel, opening and deleting sessions, and sending a suggested question.

use console::style;

use super::banner::SUGGESTED_QUESTIONS;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat loop.
    Exit,
    /// Start a new conversation.
    New,
    /// Show the numbered list of stored sessions.
    History,
    /// Open a session by list number or id.
    Open(String),
    /// Delete a session by list number or id (asks for confirmation).
    Delete(String),
    /// Send suggested question `n` (1-based).
    Suggest(usize),
    /// Unknown or malformed command, with a message for the user.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (trimmed.to_lowercase(), None),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/history" | "/ls" => ChatCommand::History,
        "/open" | "/o" => match arg {
            Some(selector) => ChatCommand::Open(selector.to_string()),
            None => ChatCommand::Unknown("/open requires a session number or id".to_string()),
        },
        "/delete" | "/rm" => match arg {
            Some(selector) => ChatCommand::Delete(selector.to_string()),
            None => ChatCommand::Unknown("/delete requires a session number or id".to_string()),
        },
        "/suggest" | "/s" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) => ChatCommand::Suggest(n),
            _ => ChatCommand::Unknown(format!(
                "/suggest requires a number from 1 to {}",
                SUGGESTED_QUESTIONS.len()
            )),
        },
        other => ChatCommand::Unknown(format!("unknown command: {other}")),
    };
    Some(command)
}

/// Help text listing all available commands.
pub fn help_text() -> String {
    let rows = [
        ("/help", "Show this help message"),
        ("/new", "Start a new conversation"),
        ("/history", "List saved conversations"),
        ("/open <n|id>", "Open a saved conversation"),
        ("/delete <n|id>", "Delete a saved conversation"),
        ("/suggest <n>", "Ask one of the suggested questions"),
        ("/clear", "Clear the screen"),
        ("/exit", "Leave the chat"),
    ];

    let mut out = format!("\n  {}\n\n", style("Available commands:").bold());
    for (cmd, desc) in rows {
        out.push_str(&format!("  {:<16} {}\n", style(cmd).cyan(), desc));
    }
    out.push_str(&format!("\n  {}\n", style("Ctrl+D to exit").dim()));
    out
}

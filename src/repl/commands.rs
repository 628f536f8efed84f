//! Built-in chat commands
//!
//! Lines starting with `/` are commands; anything else is a question.

use std::path::PathBuf;

/// Parsed chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Index a new document, replacing the current one
    Load { path: Option<PathBuf> },
    /// Show the chunks behind the last answer
    Sources,
    Status,
    Exit,
    Question(String),
    Unknown { input: String },
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

/// Parse one line of input
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Question(trimmed.to_string());
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "help" | "h" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        "load" | "open" => Command::Load {
            path: (!argument.is_empty()).then(|| PathBuf::from(argument)),
        },
        "sources" | "src" => Command::Sources,
        "status" => Command::Status,
        _ => Command::Unknown {
            input: trimmed.to_string(),
        },
    }
}

/// Help rows: (usage, description)
pub const HELP: &[(&str, &str)] = &[
    ("/load <path>", "Index a document (replaces the current one)"),
    ("/sources", "Show the chunks behind the last answer"),
    ("/status", "Show session state and index size"),
    ("/help, /h", "Show this help message"),
    ("/exit, /quit, /q", "Exit chat"),
];

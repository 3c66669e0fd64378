//! Command parsing for operator input.
//!
//! This module parses input lines into structured [`Command`] values.

/// Parsed command from an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the chat.
    Quit,

    /// Show the local Lamport clock.
    Clock,

    /// List configured peers.
    Peers,

    /// Send a message to every peer.
    Message {
        /// Message text.
        content: String,
    },

    /// Unknown command.
    Unknown {
        /// The original input.
        input: String,
    },
}

/// Parse an input line into a command.
///
/// Commands start with `/`. Anything else is a message.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Message { content: input.to_string() };
    };

    match cmd_str.split_whitespace().next().unwrap_or("") {
        "quit" | "q" | "exit" => Command::Quit,
        "clock" => Command::Clock,
        "peers" => Command::Peers,
        _ => Command::Unknown { input: input.to_string() },
    }
}

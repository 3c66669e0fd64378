//! Operator-facing output.
//!
//! Formatting is pure so it can be tested; [`Console`] is the only place in
//! the workspace that writes to stdout.

use std::io::{self, Write};

use murmur_core::{Delivered, PeerDirectory, SendReport, SessionError};

/// One received message, as shown to the operator
pub fn format_delivered(delivered: &Delivered) -> String {
    format!("{} said: {} (lamport {})", delivered.alias, delivered.text, delivered.clock)
}

/// The peer list for `/peers`
pub fn format_peers(directory: &PeerDirectory) -> String {
    if directory.is_empty() {
        return "no peers configured".to_string();
    }

    directory
        .iter()
        .map(|peer| {
            let key = if peer.public_key().is_some() { " (public key loaded)" } else { "" };
            format!("  {} at {}{key}", peer.alias(), peer.endpoint())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary line for a send that did not reach everyone, if any
pub fn format_partial_send(report: &SendReport) -> Option<String> {
    if report.is_complete() {
        return None;
    }
    Some(format!(
        "lamport {}: delivered to {}, failed for {}",
        report.clock,
        report.delivered.len(),
        report.failed.len()
    ))
}

/// Operator line for the outcome of one send, if there is anything to say.
///
/// A rejected send is reported and the session carries on, whatever the
/// error.
pub fn format_send_result(result: &Result<SendReport, SessionError>) -> Option<String> {
    match result {
        Ok(report) => format_partial_send(report),
        Err(e) => Some(format!("not sent: {e}")),
    }
}

/// Line-oriented stdout writer.
#[derive(Debug, Default)]
pub struct Console;

impl Console {
    /// Write one line and flush.
    ///
    /// A closed stdout is ignored; the session keeps running and logs still
    /// go to stderr.
    pub fn line(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{text}").and_then(|()| stdout.flush());
    }

    /// Write one line to stderr, for failures before logging is up.
    pub fn error(&self, text: &str) {
        let _ = writeln!(io::stderr().lock(), "{text}");
    }
}

//! Chat formatting for assistant output and local feedback messages.
//!
//! Colour codes (`&a`, `&c`, ...) are passed through untouched; rendering
//! them is the host's job.

use mindrelay_types::config::{FeedbackMessage, RelayConfig};
use mindrelay_types::host::Notice;

/// Prefix of every line the assistant sends.
pub const AI_PREFIX: &str = "&d[AI] &f";

/// Sent when a request failed three times.
pub const EXHAUSTED_MESSAGE: &str = "&cCould not execute after 3 attempts.";

/// Split a model message on literal `\n` markers and prefix each line.
pub fn ai_lines(text: &str) -> Vec<String> {
    text.split("\\n")
        .map(|line| format!("{AI_PREFIX}{line}"))
        .collect()
}

/// The single chat line shown when the pipeline fails.
pub fn pipeline_error(error: &dyn std::fmt::Display) -> String {
    format!("&c[AI] &7Error: &f{error}")
}

/// The notice for a feedback message: the configured override, or the
/// built-in chat text. A blank override shows nothing.
pub fn feedback_notice(config: &RelayConfig, message: FeedbackMessage) -> Option<Notice> {
    match config.message(message) {
        Some(template) => template.to_notice(message.key()),
        None => Some(Notice::Chat {
            text: message.default_text().to_string(),
        }),
    }
}

//! Directives parsed out of a model reply.

use serde::{Deserialize, Serialize};

/// One executable instruction from a model response.
///
/// Directives keep the order in which they appeared in the reply and are
/// executed in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Text to show to the requesting actor.
    Message { text: String },
    /// A command to dispatch right away (no leading slash).
    ImmediateCommand { command: String },
    /// A command to dispatch after `delay_secs` seconds (no leading slash).
    DelayedCommand { command: String, delay_secs: u64 },
}

impl Directive {
    pub fn message(text: impl Into<String>) -> Self {
        Directive::Message { text: text.into() }
    }

    pub fn immediate(command: impl Into<String>) -> Self {
        Directive::ImmediateCommand {
            command: command.into(),
        }
    }

    pub fn delayed(command: impl Into<String>, delay_secs: u64) -> Self {
        Directive::DelayedCommand {
            command: command.into(),
            delay_secs,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Directive::Message { .. })
    }
}

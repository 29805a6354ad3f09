//! Learned command feedback.
//!
//! Each base command (the first whitespace-delimited token of a dispatched
//! command) accumulates success and failure counts for the lifetime of the
//! process. The tallies are rendered back into the model context so future
//! replies favour commands that worked.

use serde::{Deserialize, Serialize};

/// Accumulated outcome counters for one base command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFeedback {
    pub success_count: u64,
    pub fail_count: u64,
    /// Detail of the most recent failure.
    pub last_error: Option<String>,
    /// The exact command string of the most recent success.
    pub last_full_command: Option<String>,
}

impl CommandFeedback {
    /// More successes than failures.
    pub fn is_net_positive(&self) -> bool {
        self.success_count > self.fail_count
    }

    /// Has failed at least once and is not net positive.
    pub fn is_net_negative(&self) -> bool {
        self.fail_count > 0 && !self.is_net_positive()
    }
}

/// Extract the base command token used as the ledger key.
///
/// Returns `None` for blank commands. A leading slash is ignored.
pub fn base_command(command: &str) -> Option<String> {
    command
        .trim()
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .map(str::to_string)
}

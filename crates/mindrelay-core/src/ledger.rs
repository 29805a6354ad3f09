//! Learned success/failure ledger keyed by base command.
//!
//! Written by the supervisor after every classified dispatch, read by the
//! context builder. Updates go through `DashMap::entry`, which holds the
//! shard lock for the read-modify-write, so concurrent increments on the
//! same token are never lost.

use dashmap::DashMap;
use mindrelay_types::feedback::{CommandFeedback, base_command};

#[derive(Debug, Default)]
pub struct CommandFeedbackLedger {
    entries: DashMap<String, CommandFeedback>,
}

impl CommandFeedbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a success for the command's base token and remember the
    /// full command line.
    pub fn record_success(&self, command: &str) {
        let Some(base) = base_command(command) else {
            return;
        };
        let mut entry = self.entries.entry(base).or_default();
        entry.success_count += 1;
        entry.last_full_command = Some(command.trim().to_string());
    }

    /// Count a failure for the command's base token.
    pub fn record_failure(&self, command: &str, error: &str) {
        let Some(base) = base_command(command) else {
            return;
        };
        let mut entry = self.entries.entry(base).or_default();
        entry.fail_count += 1;
        entry.last_error = Some(error.to_string());
    }

    pub fn get(&self, base: &str) -> Option<CommandFeedback> {
        self.entries.get(base).map(|r| r.value().clone())
    }

    /// Cloned `(base, feedback)` pairs sorted by base command.
    pub fn snapshot(&self) -> Vec<(String, CommandFeedback)> {
        let mut entries: Vec<(String, CommandFeedback)> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Render the ledger as the "learned commands" context section.
    pub fn render(&self) -> String {
        let mut out = String::from("=== LEARNED COMMANDS ===\n");
        let entries = self.snapshot();
        if entries.is_empty() {
            out.push_str("No commands recorded yet.\n");
            return out;
        }

        out.push_str("Commands that work:\n");
        for (base, fb) in entries.iter().filter(|(_, fb)| fb.is_net_positive()) {
            let example = fb.last_full_command.as_deref().unwrap_or(base);
            out.push_str(&format!(
                "  /{base} ({}x success) e.g. /{example}\n",
                fb.success_count
            ));
        }

        out.push_str("Commands with problems:\n");
        for (base, fb) in entries.iter().filter(|(_, fb)| fb.is_net_negative()) {
            out.push_str(&format!(
                "  /{base} ({}x failed) - {}\n",
                fb.fail_count,
                fb.last_error.as_deref().unwrap_or("unknown error")
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_success_and_failure() {
        let ledger = CommandFeedbackLedger::new();
        ledger.record_success("give Bob diamond 1");
        ledger.record_failure("give Bob diamond_swrod 1", "Unknown item");

        let fb = ledger.get("give").unwrap();
        assert_eq!(fb.success_count, 1);
        assert_eq!(fb.fail_count, 1);
        assert_eq!(fb.last_error.as_deref(), Some("Unknown item"));
        assert_eq!(fb.last_full_command.as_deref(), Some("give Bob diamond 1"));
    }

    #[test]
    fn test_blank_command_is_ignored() {
        let ledger = CommandFeedbackLedger::new();
        ledger.record_success("   ");
        ledger.record_failure("", "nothing");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_render_empty() {
        let ledger = CommandFeedbackLedger::new();
        assert!(ledger.render().contains("No commands recorded yet."));
    }

    #[test]
    fn test_render_buckets() {
        let ledger = CommandFeedbackLedger::new();
        ledger.record_success("time set day");
        ledger.record_success("time set night");
        ledger.record_failure("heal Bob", "Unknown command");

        let rendered = ledger.render();
        assert!(rendered.contains("/time (2x success) e.g. /time set night"));
        assert!(rendered.contains("/heal (1x failed) - Unknown command"));

        let works = rendered.find("Commands that work:").unwrap();
        let problems = rendered.find("Commands with problems:").unwrap();
        assert!(works < rendered.find("/time").unwrap());
        assert!(problems < rendered.find("/heal").unwrap());
    }

    #[test]
    fn test_balanced_command_lands_in_problem_bucket() {
        let ledger = CommandFeedbackLedger::new();
        ledger.record_success("tp Bob 0 64 0");
        ledger.record_failure("tp Bob spawn", "Expected double");
        let rendered = ledger.render();
        assert!(rendered.contains("/tp (1x failed) - Expected double"));
        assert!(!rendered.contains("x success"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let ledger = Arc::new(CommandFeedbackLedger::new());
        let mut handles = Vec::new();
        for task in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                for i in 0..250 {
                    if (task + i) % 2 == 0 {
                        ledger.record_success(&format!("give Bob stone {i}"));
                    } else {
                        ledger.record_failure("give Bob ???", "Unknown item");
                    }
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let fb = ledger.get("give").unwrap();
        assert_eq!(fb.success_count + fb.fail_count, 16 * 250);
        assert_eq!(fb.success_count, 2000);
        assert_eq!(fb.fail_count, 2000);
    }
}

//! Outcome probes: side-channel failure detection for dispatched commands.
//!
//! Many command handlers report failure only by writing to the server log.
//! A probe is armed right before dispatch and collected after the settle
//! delay; whatever it captured becomes the failure detail.
//!
//! Keyword matching on log text is a heuristic. Unrelated lines logged in
//! the same window are picked up too, and handlers that fail silently are
//! missed. Hosts that can report errors explicitly should do so through
//! [`DispatchReport::reported_error`](mindrelay_types::host::DispatchReport).

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Lines kept for a slow probe before older ones are dropped.
const TAP_CAPACITY: usize = 256;

/// Longest failure detail kept from a captured line, in characters.
pub const MAX_DETAIL_CHARS: usize = 200;

/// Lowercase fragments that mark a log line as a command failure.
pub const FAILURE_KEYWORDS: &[&str] = &[
    "error",
    "expected",
    "invalid",
    "unknown",
    "incorrect",
    "failed",
    "cannot",
    "unable",
    "no player",
    "not found",
    "syntax",
    "usage",
    "whitespace",
    "trailing",
    "argument",
    "there is no",
    "does not exist",
    "could not",
    "exception",
];

/// Broadcast feed of host log lines.
///
/// The host calls [`emit`](Self::emit) for every line it logs; probes
/// subscribe while armed.
#[derive(Debug, Clone)]
pub struct LogTap {
    tx: broadcast::Sender<String>,
}

impl LogTap {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(TAP_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, line: impl Into<String>) {
        // No armed probe means nobody is listening.
        let _ = self.tx.send(line.into());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for LogTap {
    fn default() -> Self {
        Self::new()
    }
}

/// Swappable failure signal for a single dispatch.
pub trait OutcomeProbe: Send + Sync {
    /// Start observing. Must be called before the dispatch.
    fn arm(&self) -> Box<dyn ArmedProbe>;
}

/// A probe observing one dispatch.
pub trait ArmedProbe: Send {
    /// Stop observing and return the first failure detail seen, if any.
    fn finish(self: Box<Self>) -> Option<String>;
}

/// Whether `line` contains any failure keyword (case-insensitive).
pub fn is_failure_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    FAILURE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Scans log lines from a [`LogTap`] for [`FAILURE_KEYWORDS`].
#[derive(Debug, Clone)]
pub struct KeywordLogProbe {
    tap: LogTap,
}

impl KeywordLogProbe {
    pub fn new(tap: LogTap) -> Self {
        Self { tap }
    }
}

impl OutcomeProbe for KeywordLogProbe {
    fn arm(&self) -> Box<dyn ArmedProbe> {
        Box::new(ArmedKeywordProbe {
            rx: self.tap.subscribe(),
        })
    }
}

struct ArmedKeywordProbe {
    rx: broadcast::Receiver<String>,
}

impl ArmedProbe for ArmedKeywordProbe {
    fn finish(mut self: Box<Self>) -> Option<String> {
        loop {
            match self.rx.try_recv() {
                Ok(line) if is_failure_line(&line) => {
                    return Some(line.chars().take(MAX_DETAIL_CHARS).collect());
                }
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

/// Probe for hosts that report every failure through the dispatch report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl OutcomeProbe for NullProbe {
    fn arm(&self) -> Box<dyn ArmedProbe> {
        Box::new(NullProbe)
    }
}

impl ArmedProbe for NullProbe {
    fn finish(self: Box<Self>) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        assert!(is_failure_line("Unknown command. Type \"/help\" for help."));
        assert!(is_failure_line("No player was found"));
        assert!(is_failure_line("Expected whitespace to end one argument"));
        assert!(!is_failure_line("Set the time to 1000"));
        assert!(!is_failure_line("Bob joined the game"));
    }

    #[test]
    fn test_probe_captures_first_failure_after_arming() {
        let tap = LogTap::new();
        let probe = KeywordLogProbe::new(tap.clone());

        tap.emit("Unknown command before arming");
        let armed = probe.arm();
        tap.emit("Teleported Bob to 0, 64, 0");
        tap.emit("Invalid item name 'diamond_swrod'");
        tap.emit("Unknown command");

        assert_eq!(
            armed.finish().as_deref(),
            Some("Invalid item name 'diamond_swrod'")
        );
    }

    #[test]
    fn test_probe_without_failures_returns_none() {
        let tap = LogTap::new();
        let armed = KeywordLogProbe::new(tap.clone()).arm();
        tap.emit("Gave 1 [Diamond] to Bob");
        assert_eq!(armed.finish(), None);
    }

    #[test]
    fn test_captured_detail_is_truncated() {
        let tap = LogTap::new();
        let armed = KeywordLogProbe::new(tap.clone()).arm();
        tap.emit(format!("error: {}", "x".repeat(500)));
        let detail = armed.finish().unwrap();
        assert_eq!(detail.chars().count(), MAX_DETAIL_CHARS);
        assert!(detail.starts_with("error: xxx"));
    }

    #[test]
    fn test_lagged_probe_still_sees_recent_lines() {
        let tap = LogTap::new();
        let armed = KeywordLogProbe::new(tap.clone()).arm();
        for i in 0..(TAP_CAPACITY + 10) {
            tap.emit(format!("line {i}"));
        }
        tap.emit("could not find block");
        assert_eq!(armed.finish().as_deref(), Some("could not find block"));
    }

    #[test]
    fn test_null_probe_never_reports() {
        assert_eq!(NullProbe.arm().finish(), None);
    }
}

//! Line-oriented parser for model replies.
//!
//! Recognised line prefixes (case-insensitive, after trimming):
//!
//! ```text
//! MSG: text for the player
//! CMD: /command args
//! DELAY:<seconds>: /command args
//! ```
//!
//! Anything else is ignored. A reply without a `MSG:` line is shown to
//! the player verbatim so there is always visible feedback.

use mindrelay_types::directive::Directive;

/// Colour marker prefixed to a raw reply shown as fallback.
pub const FALLBACK_MARKER: &str = "&7";

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

fn strip_slash(command: &str) -> String {
    let command = command.trim();
    command.strip_prefix('/').unwrap_or(command).to_string()
}

/// `<digits>:<rest>` after a `DELAY:` prefix.
fn parse_delay(rest: &str) -> Option<Directive> {
    let (seconds, command) = rest.split_once(':')?;
    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overflowing digit runs fall back to an immediate fire.
    let delay_secs = seconds.parse().unwrap_or(0);
    Some(Directive::delayed(strip_slash(command), delay_secs))
}

fn parse_line(line: &str) -> Option<Directive> {
    if let Some(rest) = strip_prefix_ci(line, "MSG:") {
        return Some(Directive::message(rest.trim()));
    }
    if let Some(rest) = strip_prefix_ci(line, "CMD:") {
        return Some(Directive::immediate(strip_slash(rest)));
    }
    strip_prefix_ci(line, "DELAY:").and_then(parse_delay)
}

/// Parse `response` into directives in reply order. Never fails.
pub fn parse(response: &str) -> Vec<Directive> {
    let mut directives: Vec<Directive> = response
        .lines()
        .map(str::trim)
        .filter_map(parse_line)
        .collect();

    if !directives.iter().any(Directive::is_message) {
        directives.push(Directive::message(format!("{FALLBACK_MARKER}{response}")));
    }
    directives
}

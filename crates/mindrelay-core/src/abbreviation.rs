//! Abbreviation annotation for incoming requests.
//!
//! Players write "gmc pls" or "tp me to spawn". The expander leaves the
//! request untouched and appends one bracketed hint per recognised token,
//! so the model sees both what was typed and the likely commands.

/// Token → candidate full commands.
const ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("gm", &["gamemode"]),
    ("gmc", &["gamemode creative"]),
    ("gms", &["gamemode survival"]),
    ("gma", &["gamemode adventure"]),
    ("gmsp", &["gamemode spectator"]),
    ("tp", &["tp", "teleport"]),
    ("tph", &["tp <player> <me>"]),
    ("xp", &["xp", "experience"]),
    ("hp", &["effect give instant_health", "heal"]),
    ("inv", &["clear", "invsee"]),
    ("ench", &["enchant"]),
    ("wl", &["whitelist"]),
    ("tempban", &["tempban", "ban"]),
    ("day", &["time set day"]),
    ("night", &["time set night"]),
    ("sun", &["weather clear"]),
    ("rain", &["weather rain"]),
    ("spawn", &["spawn", "tp <player> <world spawn>"]),
];

fn lookup(token: &str) -> Option<&'static [&'static str]> {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, candidates)| *candidates)
}

/// Append an annotation for every known abbreviation in `raw`.
///
/// Tokens are compared lowercased with surrounding punctuation removed.
/// A repeated token is annotated once per occurrence. Text without known
/// tokens is returned unchanged.
pub fn expand(raw: &str) -> String {
    let mut annotated = raw.to_string();
    for token in raw.split_whitespace() {
        let normalized = token
            .trim_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        if let Some(candidates) = lookup(&normalized) {
            annotated.push_str(&format!(" [{normalized} = {}]", candidates.join(" | ")));
        }
    }
    annotated
}

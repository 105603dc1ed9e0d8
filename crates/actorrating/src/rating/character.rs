//! Best-effort "who did this actor play" label.
//!
//! Labels come from three historically inconsistent places: the label stored on
//! the rating row, the role name most raters agreed on for the same
//! (actor, movie) pair, and free-text comments written as
//! `Character: <name>, Director: <name>`. Resolution never fails; the last
//! resort is [`UNKNOWN_CHARACTER`].

use std::collections::BTreeMap;

pub const UNKNOWN_CHARACTER: &str = "Unknown";

const DIRECTOR_MARKER: &str = ", director:";
const CHARACTER_PREFIXES: [&str; 2] = ["character:", "character -"];
const AS_PREFIX: &str = "as ";

pub fn resolve_character_display(
    stored: Option<&str>,
    aggregated_role_name: Option<&str>,
    free_text_comment: Option<&str>,
) -> String {
    if let Some(stored) = stored.map(str::trim).filter(|s| is_known_label(s)) {
        return stored.to_string();
    }

    if let Some(role) = aggregated_role_name.map(str::trim).filter(|s| !s.is_empty()) {
        return role.to_string();
    }

    free_text_comment
        .and_then(parse_character_from_comment)
        .unwrap_or_else(|| UNKNOWN_CHARACTER.to_string())
}

/// True for a non-empty label that is not the "unknown" sentinel.
pub fn is_known_label(label: &str) -> bool {
    let label = label.trim();
    !label.is_empty() && !label.eq_ignore_ascii_case(UNKNOWN_CHARACTER)
}

pub fn parse_character_from_comment(comment: &str) -> Option<String> {
    let mut text = comment;

    if let Some(idx) = find_ignore_ascii_case(text, DIRECTOR_MARKER) {
        text = &text[..idx];
    }
    text = text.trim();

    for prefix in CHARACTER_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_ascii_case(text, prefix) {
            text = rest.trim();
            break;
        }
    }

    if let Some(rest) = strip_prefix_ignore_ascii_case(text, AS_PREFIX) {
        text = rest.trim();
    }

    let text = text.trim_matches('"').trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Most frequent non-empty (trimmed) role name; ties go to the
/// lexicographically smallest name. `None` when no row carries a role name.
pub fn aggregate_role_name<'a, I>(role_names: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in role_names.into_iter().flatten() {
        let name = name.trim();
        if !name.is_empty() {
            *counts.entry(name).or_default() += 1;
        }
    }

    // BTreeMap iterates ascending, so keeping only strictly greater counts
    // leaves the smallest name among ties.
    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((name, count)),
        }
    }

    best.map(|(name, _)| name.to_string())
}

// ASCII lowercasing keeps byte offsets stable, so indices found in the
// lowered copy are valid in the original.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

fn strip_prefix_ignore_ascii_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

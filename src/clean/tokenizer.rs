//! Word splitting for generated DDL.

/// Characters treated as blanks before splitting
const STRIPPABLE: [char; 5] = ['\t', '\n', '\r', '(', ')'];

/// Uppercase the script, blank out layout characters and parentheses, and
/// split on whitespace.
pub fn normalize(text: &str) -> Vec<String> {
    text.to_uppercase()
        .chars()
        .map(|c| if STRIPPABLE.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// A token ending in `;` or `/` closes the statement it belongs to.
pub fn is_terminator(token: &str) -> bool {
    token.ends_with(';') || token.ends_with('/')
}

pub fn strip_terminator(token: &str) -> &str {
    token.trim_end_matches(|c| c == ';' || c == '/')
}

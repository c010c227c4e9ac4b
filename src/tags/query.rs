use std::sync::LazyLock;

use regex::Regex;

use super::{extract::DIRECTIVES, tokenize::words};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Record matches if it shares at least one term with the query.
    #[default]
    Any,
    /// Record matches only if it carries every query term.
    All,
}

static DIRECTIVE_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)@\s*(?:{})\b", DIRECTIVES.join("|")))
        .expect("directive pattern is valid")
});

/// Parses a search message into its boolean mode and lowercase terms.
///
/// `+` or `&` anywhere selects [`QueryMode::All`]. Directives are stripped before the
/// remaining words become terms. An empty term list means there is nothing to search.
pub fn parse_query(message: &str) -> (QueryMode, Vec<String>) {
    let mode = if message.contains(['+', '&']) {
        QueryMode::All
    } else {
        QueryMode::Any
    };

    let stripped = DIRECTIVE_RX.replace_all(message, " ");

    let mut terms: Vec<String> = Vec::new();
    for word in words(&stripped) {
        let term = word.to_lowercase();
        if !terms.contains(&term) {
            terms.push(term);
        }
    }

    (mode, terms)
}

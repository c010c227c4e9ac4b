use std::collections::HashMap;

use tracing::debug;

use super::tokenize::{is_word, tokenize};

pub const TAG_MARKER: &str = "#";
pub const DIRECTIVE_MARKER: &str = "@";

/// Words that, written after `@`, mark a message as not meant for indexing.
pub const DIRECTIVES: &[&str] = &["search", "ignore", "silent", "quiet", "find", "register"];

pub fn is_directive(word: &str) -> bool {
    DIRECTIVES.iter().any(|d| d.eq_ignore_ascii_case(word))
}

/// Index terms pulled out of one message. `tags` and `keywords` never overlap.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.keywords.is_empty()
    }
}

/// Extracts `#tags` from `message` and tops them up with the most frequent words until
/// roughly `density` of the tokens are index terms.
///
/// A directive (`@ignore`, `@search`, ...) anywhere in the message suppresses everything.
/// With `require_tag` set, a message without any explicit tag yields nothing.
pub fn extract(message: &str, density: f64, require_tag: bool) -> Extracted {
    let tokens = tokenize(message);

    let mut tags: Vec<String> = Vec::new();
    let mut prev: Option<&str> = None;
    for &token in &tokens {
        if prev == Some(DIRECTIVE_MARKER) && is_directive(token) {
            debug!(directive = token, "message opted out of indexing");
            return Extracted::default();
        }

        if prev == Some(TAG_MARKER) && is_word(token) {
            let tag = token.to_lowercase();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        prev = Some(token);
    }

    if require_tag && tags.is_empty() {
        return Extracted::default();
    }

    // round half up, same as the tag count being added after rounding
    let target = (density * tokens.len() as f64 + 0.5).floor() as i64;
    let needed = target - tags.len() as i64;
    let keywords = if needed > 0 {
        top_keywords(&tokens, &tags, needed as usize)
    } else {
        Vec::new()
    };

    Extracted { tags, keywords }
}

/// Most frequent words not already tagged; ties keep first-seen order.
fn top_keywords(tokens: &[&str], tags: &[String], n: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for token in tokens.iter().filter(|t| is_word(t)) {
        let word = token.to_lowercase();
        if tags.contains(&word) {
            continue;
        }
        match seen.get(&word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                seen.insert(word.clone(), counts.len());
                counts.push((word, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(word, _)| word).collect()
}

/// Treebank-style tokenizer: words stay whole, every other non-space character
/// (`#`, `@`, punctuation) becomes a token of its own.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();

    for chunk in text.split_whitespace() {
        let mut start = None;
        for (i, c) in chunk.char_indices() {
            if is_word_char(c) {
                start.get_or_insert(i);
                continue;
            }
            if let Some(s) = start.take() {
                push_word(&mut tokens, &chunk[s..i]);
            }
            tokens.push(&chunk[i..i + c.len_utf8()]);
        }
        if let Some(s) = start {
            push_word(&mut tokens, &chunk[s..]);
        }
    }

    tokens
}

/// Quotes only belong to a word in its interior (`don't`); leading and trailing ones are
/// split off as tokens of their own.
fn push_word<'a>(tokens: &mut Vec<&'a str>, word: &'a str) {
    let lead = word.len() - word.trim_start_matches('\'').len();
    let core = word[lead..].trim_end_matches('\'');
    let end = lead + core.len();

    tokens.extend((0..lead).map(|i| &word[i..i + 1]));
    if !core.is_empty() {
        tokens.push(core);
    }
    tokens.extend((end..word.len()).map(|i| &word[i..i + 1]));
}

/// Word-boundary tokenizer: only the words, punctuation is dropped.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    tokenize(text).into_iter().filter(|t| is_word(t))
}

pub fn is_word(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '\''
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_split_from_words() {
        assert_eq!(
            tokenize("deploy failed #incident #prod"),
            vec!["deploy", "failed", "#", "incident", "#", "prod"]
        );
        assert_eq!(tokenize("@search ##x"), vec!["@", "search", "#", "#", "x"]);
    }

    #[test]
    fn punctuation_is_separate() {
        assert_eq!(
            tokenize("timeout (circuit), gocql-driver's fault."),
            vec!["timeout", "(", "circuit", ")", ",", "gocql-driver's", "fault", "."]
        );
    }

    #[test]
    fn outer_quotes_split_off() {
        assert_eq!(
            tokenize("see '#incident' now"),
            vec!["see", "'", "#", "incident", "'", "now"]
        );
        assert_eq!(tokenize("''deploy'"), vec!["'", "'", "deploy", "'"]);
        assert_eq!(tokenize("don't 'driver's'"), vec!["don't", "'", "driver's", "'"]);
        assert_eq!(tokenize("''"), vec!["'", "'"]);
    }

    #[test]
    fn words_skip_punctuation() {
        let w: Vec<_> = words("find #incident + #prod!").collect();
        assert_eq!(w, vec!["find", "incident", "prod"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("   \n\t").is_empty());
    }
}

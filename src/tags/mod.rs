mod extract;
mod query;
mod tokenize;

pub use extract::{extract, is_directive, Extracted, DIRECTIVES, DIRECTIVE_MARKER, TAG_MARKER};
pub use query::{parse_query, QueryMode};
pub use tokenize::{is_word, tokenize, words};

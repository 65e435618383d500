//! Coarse lexical classification of outgoing messages.
//!
//! This is a heuristic, not a parser. Prose containing a semicolon or a
//! parenthesis is classified as code-like and that is accepted; the only
//! requirement is that matching is stable and deterministic.

use lazy_static::lazy_static;
use regex::Regex;

/// Messages at or under this many characters are "short".
pub(crate) const SHORT_MESSAGE_LIMIT: usize = 1200;

lazy_static! {
    static ref CODE_PATTERN: Regex = Regex::new(concat!(
        // code fence
        r"```",
        // keywords, as whole words
        r"|\b(?:function|class|def|const|let|var|import|public|private)\b",
        // opening or self-closing tags, e.g. <div class="x">
        r"|<[A-Za-z][^<>]*>",
        // closing tags
        r"|</[^<>]*>",
        // structural punctuation
        r"|[;{(]",
    ))
    .expect("the code pattern is a valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Classification {
    /// The message likely contains source code.
    pub code_like: bool,
    /// The message is at most [`SHORT_MESSAGE_LIMIT`] characters long.
    pub short: bool,
}

pub(crate) fn is_code_like(message: &str) -> bool {
    CODE_PATTERN.is_match(message)
}

/// Length is measured in characters, not bytes.
pub(crate) fn is_short(message: &str) -> bool {
    message.chars().count() <= SHORT_MESSAGE_LIMIT
}

pub(crate) fn classify(message: &str) -> Classification {
    Classification {
        code_like: is_code_like(message),
        short: is_short(message),
    }
}

//! Chat title derivation from the first user message

use regex::Regex;
use std::sync::OnceLock;

/// Used when the first message contains no words at all
pub const FALLBACK_TITLE: &str = "New Chat";

const TITLE_WORDS: usize = 4;

fn word_pattern() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"\w+").expect("static regex"))
}

/// First four words of `message`, joined by single spaces.
pub fn derive_title(message: &str) -> String {
    let words: Vec<&str> = word_pattern()
        .find_iter(message)
        .take(TITLE_WORDS)
        .map(|m| m.as_str())
        .collect();

    if words.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        words.join(" ")
    }
}

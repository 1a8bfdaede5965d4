//! Input validation performed by every agent before it scans a transcript.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Largest transcript an agent will accept, in characters.
pub const MAX_INPUT_CHARS: usize = 10_000_000;

const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

const INJECTION_PHRASES: [&str; 4] = [
    "ignore previous",
    "disregard above",
    "system prompt",
    "```python",
];

/// Why an agent refused its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    #[error("input too large: {len} characters (limit {MAX_INPUT_CHARS})")]
    TooLarge { len: usize },

    #[error("possible injection attempt: {phrase:?}")]
    InjectionPattern { phrase: String },
}

impl InputRejection {
    /// True for rejections worth recording as a security event.
    pub fn is_security_event(&self) -> bool {
        matches!(self, InputRejection::InjectionPattern { .. })
    }
}

/// Normalize, strip hidden characters and refuse oversized or suspicious input.
///
/// Text is put in NFC form first, so a term typed with combining accents
/// scans the same as its precomposed spelling. Zero-width characters and
/// control characters other than `\n`, `\r` and `\t` are removed before the
/// injection check, so that a phrase split by an invisible character is
/// still caught.
pub fn sanitize_input(text: &str) -> Result<String, InputRejection> {
    let len = text.chars().count();
    if len > MAX_INPUT_CHARS {
        return Err(InputRejection::TooLarge { len });
    }

    let cleaned: String = text
        .nfc()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    let lowered = cleaned.to_lowercase();
    if let Some(phrase) = INJECTION_PHRASES.iter().find(|p| lowered.contains(*p)) {
        return Err(InputRejection::InjectionPattern {
            phrase: phrase.to_string(),
        });
    }

    Ok(cleaned)
}

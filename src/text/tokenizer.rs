/*!
 * Caption text tokenizer.
 *
 * Splits raw caption text into an ordered sequence of classified tokens:
 * whitespace runs, single punctuation marks from a fixed set, and runs of
 * Unicode letters. Characters outside those three classes (digits, emoji,
 * apostrophes, symbols) never match and are dropped from the output, so the
 * concatenated token text reproduces the input only when the input consists
 * of those classes alone.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed punctuation set recognised as standalone tokens
pub const PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

// Alternation order is the classification priority.
static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+|[.,!?;:]|\p{L}+").expect("token pattern is valid"));

/// Classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A maximal run of whitespace
    Space,
    /// One character from [`PUNCTUATION`]
    Punctuation,
    /// A maximal run of Unicode letters
    Word,
}

impl TokenKind {
    /// Whether tokens of this kind are rendered as inert passthrough text
    pub fn is_inert(self) -> bool {
        !matches!(self, TokenKind::Word)
    }
}

/// One classified slice of the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token class
    pub kind: TokenKind,
    /// Surface text, borrowed from the input
    pub text: &'a str,
}

impl<'a> Token<'a> {
    fn classify(text: &'a str) -> Self {
        let kind = if text.chars().all(char::is_whitespace) {
            TokenKind::Space
        } else if text.len() == 1 && text.chars().all(|c| PUNCTUATION.contains(&c)) {
            TokenKind::Punctuation
        } else {
            TokenKind::Word
        };
        Self { kind, text }
    }
}

/// Tokenize caption text, preserving source order.
///
/// Total over any input; the empty string yields an empty sequence.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    TOKEN_REGEX
        .find_iter(text)
        .map(|m| Token::classify(m.as_str()))
        .collect()
}

/// Concatenate token texts back into a string
pub fn reconstruct(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect()
}

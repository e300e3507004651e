/*!
 * Tests for tokenization and normalization
 */

use captionlex::text::tokenizer::reconstruct;
use captionlex::{normalize, tokenize, TokenKind};

const SAMPLES: &[&str] = &[
    "",
    "Hello, world!",
    "  leading and trailing  ",
    "Dónde está la biblioteca?",
    "Привет, мир! Как дела?",
    "東京へ行きます",
    "tabs\tand\nnewlines",
    "wait... what?!",
    "ÉCOLE école École",
];

#[test]
fn test_tokenize_withScenarioA_shouldClassifyEveryToken() {
    let tokens: Vec<(TokenKind, &str)> = tokenize("Hello, world!").iter().map(|t| (t.kind, t.text)).collect();
    assert_eq!(
        tokens,
        vec![
            (TokenKind::Word, "Hello"),
            (TokenKind::Punctuation, ","),
            (TokenKind::Space, " "),
            (TokenKind::Word, "world"),
            (TokenKind::Punctuation, "!"),
        ]
    );
    assert_eq!(normalize("Hello").as_str(), "hello");
}

#[test]
fn test_tokenize_withLettersPunctuationAndSpaces_shouldRoundTrip() {
    for sample in SAMPLES {
        assert_eq!(reconstruct(&tokenize(sample)), *sample, "round trip failed for {:?}", sample);
    }
}

#[test]
fn test_tokenize_withOtherCharacters_shouldDropThem() {
    let text = "It's 5 o'clock 🎉";
    assert_eq!(reconstruct(&tokenize(text)), "Its  oclock ");
}

#[test]
fn test_tokenize_withWhitespaceRun_shouldEmitOneSpaceToken() {
    let tokens = tokenize("a \t\n b");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].kind, TokenKind::Space);
    assert_eq!(tokens[1].text, " \t\n ");
}

#[test]
fn test_normalize_withAnyInput_shouldBeIdempotent() {
    for sample in SAMPLES.iter().chain(["Don't", "ÀÉÎ", "123", "🎉x🎉"].iter()) {
        let once = normalize(sample);
        assert_eq!(normalize(once.as_str()), once, "not idempotent for {:?}", sample);
    }
}

#[test]
fn test_normalize_withApostropheVariants_shouldShareKey() {
    assert_eq!(normalize("Don't"), normalize("dont"));
    assert_eq!(normalize("ÉCOLE"), normalize("école"));
}

#[test]
fn test_normalize_withNoLetters_shouldBeNonActionable() {
    let word = normalize("42!");
    assert_eq!(word.as_str(), "");
    assert!(!word.is_actionable());
}

/*!
 * Text processing for caption annotation.
 *
 * - `tokenizer`: caption text to classified tokens
 * - `normalizer`: word surface text to canonical lookup key
 */

pub mod normalizer;
pub mod tokenizer;

pub use self::normalizer::{normalize, CanonicalWord};
pub use self::tokenizer::{tokenize, Token, TokenKind};

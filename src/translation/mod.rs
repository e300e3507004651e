/*!
 * Translation lookups for hovered and clicked words.
 *
 * - `core`: the service the interaction controller calls
 * - `cache`: per-language-pair cache of successful lookups
 */

pub use self::core::{Lookup, TranslationService, ERROR_SENTINEL, INVALID_CONTEXT_SENTINEL};

pub mod cache;
pub mod core;

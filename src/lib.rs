/*!
 * # captionlex - vocabulary overlay for streaming captions
 *
 * A Rust library that annotates live subtitle text word by word with the
 * reader's vocabulary state, and keeps that annotation consistent while new
 * captions stream in and words are learned or forgotten.
 *
 * ## Features
 *
 * - Unicode-aware caption tokenization with stable canonical word keys
 * - Mutation-driven annotation that claims every caption node exactly once
 * - Known/unknown synchronization across every visible occurrence of a word
 * - Hover lookups with playback pause/resume and stale-response protection
 * - Click to learn (translate + save) or forget (remove) a word
 * - SQLite-backed vocabulary with Anki CSV export
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `text`: tokenizer and normalizer
 * - `dictionary`: gateway over the vocabulary store:
 *   - `dictionary::memory`: in-process store
 *   - `dictionary::sqlite`: persistent store
 * - `surface`: the DOM-like caption surface:
 *   - `surface::selector`: CSS selector subset
 *   - `surface::dom`: in-memory document
 *   - `surface::mount`: waiting for mount points
 * - `caption`: locator, annotation pipeline, mutation watcher, synchronizer
 * - `interaction`: hover and click handling
 * - `translation`: translation service and cache
 * - `providers`: translation backends
 * - `app_controller`: lifecycle and wiring
 * - `app_config`: configuration management
 * - `context`: execution context validity
 * - `language_utils`: ISO language code utilities
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod caption;
pub mod context;
pub mod dictionary;
pub mod errors;
pub mod interaction;
pub mod language_utils;
pub mod providers;
pub mod surface;
pub mod text;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, ControllerState};
pub use caption::{AnnotationPipeline, KnownState, WordStateSynchronizer};
pub use context::ExecutionContext;
pub use dictionary::{DictionaryGateway, DictionaryRecord, DictionarySnapshot, DictionaryStore};
pub use errors::{AnnotationError, AppError, ProviderError, StoreError, SurfaceError};
pub use interaction::{HoverController, PointerEvent};
pub use language_utils::get_language_name;
pub use text::{normalize, tokenize, CanonicalWord, Token, TokenKind};
pub use translation::TranslationService;

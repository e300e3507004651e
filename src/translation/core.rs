/*!
 * Translation service used by the interaction controller.
 *
 * Wraps a provider with the context check, the cache and the error
 * sentinel mapping. A failed lookup is a normal result carrying the text to
 * display in place of a translation.
 */

use std::fmt;
use std::sync::Arc;

use log::{debug, error, warn};

use super::cache::TranslationCache;
use crate::app_config::TranslationConfig;
use crate::context::ExecutionContext;
use crate::providers::Translator;

/// Placeholder shown when a lookup fails
pub const ERROR_SENTINEL: &str = "Error";

/// Placeholder shown when the hosting context is gone
pub const INVALID_CONTEXT_SENTINEL: &str = "Error: extension invalid";

/// Outcome of one lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The provider answered
    Translated(String),
    /// The lookup failed; carries the placeholder to display
    Failed(&'static str),
}

impl Lookup {
    /// Text to display or persist
    pub fn text(&self) -> &str {
        match self {
            Lookup::Translated(text) => text,
            Lookup::Failed(sentinel) => sentinel,
        }
    }

    /// Whether the provider failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Lookup::Failed(_))
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Translation service for single words and short texts
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Provider doing the actual work
    translator: Arc<dyn Translator>,
    /// Host liveness
    context: ExecutionContext,
    /// Successful lookups
    cache: TranslationCache,
    /// Source language code or `auto`
    source_language: String,
    /// Target language code
    target_language: String,
}

impl TranslationService {
    /// Create a new service around a provider
    pub fn new(
        translator: Arc<dyn Translator>,
        context: ExecutionContext,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        config: &TranslationConfig,
    ) -> Self {
        Self {
            translator,
            context,
            cache: TranslationCache::new(config.cache_enabled),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// Translate `text`; never fails, see [`Lookup`]
    pub async fn translate(&self, text: &str) -> Lookup {
        if !self.context.is_valid() {
            warn!("Context invalid, cannot translate");
            return Lookup::Failed(INVALID_CONTEXT_SENTINEL);
        }

        if let Some(cached) = self.cache.get(text, &self.source_language, &self.target_language) {
            return Lookup::Translated(cached);
        }

        match self.translator.translate(text).await {
            Ok(translation) if !translation.is_empty() => {
                debug!("Translated '{}' via {}", text, self.translator.name());
                self.cache
                    .store(text, &self.source_language, &self.target_language, &translation);
                Lookup::Translated(translation)
            }
            Ok(_) => {
                error!("Translation error: empty response for '{}'", text);
                Lookup::Failed(ERROR_SENTINEL)
            }
            Err(e) => {
                error!("Translation error: {}", e);
                Lookup::Failed(ERROR_SENTINEL)
            }
        }
    }

    /// Access the cache (stats, clearing)
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Configured target language
    pub fn target_language(&self) -> &str {
        &self.target_language
    }
}

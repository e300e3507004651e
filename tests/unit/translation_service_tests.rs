/*!
 * Tests for the translation service and its cache
 */

use std::sync::Arc;

use captionlex::app_config::TranslationConfig;
use captionlex::providers::mock::MockTranslator;
use captionlex::translation::cache::TranslationCache;
use captionlex::translation::{Lookup, ERROR_SENTINEL};
use captionlex::{ExecutionContext, TranslationService};

fn service(translator: &MockTranslator, cache_enabled: bool) -> TranslationService {
    let config = TranslationConfig {
        cache_enabled,
        ..TranslationConfig::default()
    };
    TranslationService::new(Arc::new(translator.clone()), ExecutionContext::new(), "auto", "es", &config)
}

#[tokio::test]
async fn test_translate_withRepeatedWord_shouldHitCache() {
    let translator = MockTranslator::working().with_answer("casa", "house");
    let service = service(&translator, true);

    for _ in 0..3 {
        assert_eq!(service.translate("casa").await, Lookup::Translated("house".to_string()));
    }
    assert_eq!(translator.request_count(), 1);

    let (hits, misses, rate) = service.cache().stats();
    assert_eq!((hits, misses), (2, 1));
    assert!((rate - 2.0 / 3.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_translate_withCacheDisabled_shouldAlwaysAskProvider() {
    let translator = MockTranslator::working();
    let service = service(&translator, false);

    service.translate("casa").await;
    service.translate("casa").await;
    assert_eq!(translator.request_count(), 2);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn test_translate_withIntermittentProvider_shouldRecoverOnRetry() {
    let translator = MockTranslator::intermittent(2);
    let service = service(&translator, true);

    assert!(!service.translate("uno").await.is_failure());
    let failed = service.translate("dos").await;
    assert_eq!(failed.text(), ERROR_SENTINEL);
    assert!(!service.translate("dos").await.is_failure());
    assert_eq!(translator.requests(), vec!["uno", "dos", "dos"]);
}

#[test]
fn test_lookup_display_shouldShowPlaceholderOnFailure() {
    assert_eq!(Lookup::Failed(ERROR_SENTINEL).to_string(), "Error");
    assert_eq!(Lookup::Translated("hola".to_string()).to_string(), "hola");
}

#[test]
fn test_cache_withDifferentLanguages_shouldKeepEntriesApart() {
    let cache = TranslationCache::new(true);
    cache.store("hello", "en", "fr", "bonjour");

    assert_eq!(cache.get("hello", "en", "fr"), Some("bonjour".to_string()));
    assert!(cache.get("hello", "en", "es").is_none());
    assert!(cache.get("hello", "de", "fr").is_none());

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().0, 0);
}

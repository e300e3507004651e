/*!
 * Tests for translation provider implementations
 */

use std::time::Duration;

use serde_json::json;

use captionlex::errors::ProviderError;
use captionlex::providers::google::GoogleTranslate;
use captionlex::providers::mock::MockTranslator;
use captionlex::providers::Translator;

#[test]
fn test_googleRequestUrl_withCustomEndpoint_shouldKeepPathAndLanguages() {
    let client = GoogleTranslate::new("http://localhost:8080/translate_a/single", "en", "fr", Duration::from_secs(1)).unwrap();
    let url = client.request_url("ça va?").unwrap();

    assert_eq!(url.host_str(), Some("localhost"));
    assert_eq!(url.path(), "/translate_a/single");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(
        pairs,
        vec![
            ("client".to_string(), "gtx".to_string()),
            ("sl".to_string(), "en".to_string()),
            ("tl".to_string(), "fr".to_string()),
            ("dt".to_string(), "t".to_string()),
            ("q".to_string(), "ça va?".to_string()),
        ]
    );
}

#[test]
fn test_googleNew_withInvalidEndpoint_shouldFail() {
    let result = GoogleTranslate::new("not a url", "auto", "es", Duration::from_secs(1));
    assert!(matches!(result, Err(ProviderError::RequestFailed(ref message)) if message.contains("not a url")));
}

#[test]
fn test_googleExtract_withSingleSegment_shouldReturnIt() {
    let body = json!([[["casa", "house", null, null, 10]], null, "en"]);
    assert_eq!(GoogleTranslate::extract_translation(&body).unwrap(), "casa");
}

#[test]
fn test_googleExtract_withNullSegmentText_shouldTreatItAsEmpty() {
    let body = json!([[["Buenos ", "Good "], [null, null, "dias"], ["días", "morning"]], null, "en"]);
    assert_eq!(GoogleTranslate::extract_translation(&body).unwrap(), "Buenos días");
}

#[test]
fn test_googleExtract_withNonStringSegment_shouldFail() {
    let body = json!([[[42, "house"]]]);
    assert!(GoogleTranslate::extract_translation(&body).is_err());
}

#[tokio::test]
async fn test_mockTranslator_withFailingBehavior_shouldFailConnectionTest() {
    let translator = MockTranslator::failing();
    assert!(matches!(
        translator.test_connection().await,
        Err(ProviderError::ConnectionError(_))
    ));
    assert_eq!(translator.name(), "mock");
}

#[tokio::test]
async fn test_mockTranslator_withDelays_shouldCompleteOutOfOrder() {
    let translator = MockTranslator::working()
        .with_answer("lento", "slow")
        .with_delay("lento", Duration::from_millis(50));

    let slow = translator.clone();
    let handle = tokio::spawn(async move { slow.translate("lento").await });
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(translator.translate("rapido").await.unwrap(), "[TRANSLATED] rapido");
    assert!(!handle.is_finished());
    assert_eq!(handle.await.unwrap().unwrap(), "slow");
    assert_eq!(translator.requests(), vec!["lento", "rapido"]);
}

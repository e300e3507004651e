/*!
 * Annotation pipeline tests against a player-shaped surface
 */

use std::sync::Arc;
use std::time::Duration;

use captionlex::app_config::CaptionConfig;
use captionlex::caption::units::CLAIM_FLAG;
use captionlex::caption::{AnnotationPipeline, CaptionLocator, ObservationGate, WatchState};
use captionlex::dictionary::{DictionaryGateway, DictionaryStore, MemoryStore};
use captionlex::surface::Surface;
use captionlex::ExecutionContext;

use crate::common::{InvalidatingStore, Player};

fn pipeline_over(player: &Player, store: Arc<dyn DictionaryStore>, context: ExecutionContext) -> AnnotationPipeline {
    AnnotationPipeline::new(
        player.surface(),
        Arc::new(CaptionLocator::from_config(&CaptionConfig::default()).unwrap()),
        DictionaryGateway::new(store, context.clone()),
        context,
        ObservationGate::new(),
    )
}

fn unit(text: &str, key: &str, state: &str) -> (String, String, String) {
    (text.to_string(), key.to_string(), state.to_string())
}

#[tokio::test]
async fn test_run_withEmptyDictionary_shouldMarkEveryWordUnknown() {
    let player = Player::new();
    let caption = player.add_caption("Hello, brave new world!");
    let pipeline = pipeline_over(&player, Arc::new(MemoryStore::new()), ExecutionContext::new());

    let report = pipeline.run().await;

    assert_eq!((report.words, report.known), (4, 0));
    assert!(player.units(caption).iter().all(|(_, _, state)| state == "unknown"));
    assert_eq!(player.document.text_content(caption).as_deref(), Some("Hello, brave new world!"));
}

#[tokio::test]
async fn test_run_withSavedWord_shouldMarkOnlyThatWordKnown() {
    let player = Player::new();
    let caption = player.add_caption("Hello world");
    let store = MemoryStore::new();
    store.insert("hello", "hola");
    let pipeline = pipeline_over(&player, Arc::new(store), ExecutionContext::new());

    pipeline.run().await;

    assert_eq!(
        player.units(caption),
        vec![unit("Hello", "hello", "known"), unit("world", "world", "unknown")]
    );
}

#[tokio::test]
async fn test_run_withContextInvalidatedMidPass_shouldCompleteWithUnknownWords() {
    let player = Player::new();
    let caption = player.add_caption("Hello world");
    let context = ExecutionContext::new();
    let inner = MemoryStore::new();
    inner.insert("hello", "hola");
    let store = Arc::new(InvalidatingStore { inner, context: context.clone() });
    let pipeline = pipeline_over(&player, store, context.clone());

    let report = pipeline.run().await;

    assert!(!context.is_valid());
    assert!(!report.aborted);
    assert_eq!((report.claimed, report.known), (1, 0));
    assert_eq!(
        player.units(caption),
        vec![unit("Hello", "hello", "unknown"), unit("world", "world", "unknown")]
    );
}

#[tokio::test]
async fn test_run_twice_shouldProcessEachNodeOnce() {
    let player = Player::new();
    let caption = player.add_caption("uno dos");
    let pipeline = pipeline_over(&player, Arc::new(MemoryStore::new()), ExecutionContext::new());

    let first = pipeline.run().await;
    let units_after_first = player.unit_nodes(caption);
    let second = pipeline.run().await;

    assert_eq!(first.claimed, 1);
    assert_eq!((second.located, second.claimed, second.rewritten), (1, 0, 0));
    assert_eq!(player.unit_nodes(caption), units_after_first);
}

#[tokio::test]
async fn test_run_withNewCaptionAfterPass_shouldOnlyProcessNewNode() {
    let player = Player::new();
    let old = player.add_caption("uno");
    let pipeline = pipeline_over(&player, Arc::new(MemoryStore::new()), ExecutionContext::new());
    pipeline.run().await;
    let old_units = player.unit_nodes(old);

    let new = player.add_caption("dos");
    let report = pipeline.run().await;

    assert_eq!((report.located, report.claimed), (2, 1));
    assert_eq!(player.unit_nodes(old), old_units);
    assert_eq!(player.units(new), vec![unit("dos", "dos", "unknown")]);
}

#[tokio::test]
async fn test_run_concurrently_shouldNotDoubleProcess() {
    let player = Player::new();
    let captions: Vec<_> = (0..5).map(|i| player.add_caption(&format!("linea numero {}", i))).collect();
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(10)));
    let pipeline = Arc::new(pipeline_over(&player, store, ExecutionContext::new()));

    let runs: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.run().await })
        })
        .collect();
    let mut claimed = 0;
    for run in runs {
        claimed += run.await.unwrap().claimed;
    }

    assert_eq!(claimed, captions.len());
    for caption in captions {
        assert_eq!(player.unit_nodes(caption).len(), 2);
        assert_eq!(player.document.attribute(caption, CLAIM_FLAG).as_deref(), Some("true"));
    }
}

#[tokio::test]
async fn test_run_withShadowCaptions_shouldAnnotateThem() {
    let player = Player::with_shadow_captions();
    let caption = player.add_caption("Hola amigo");
    let pipeline = pipeline_over(&player, Arc::new(MemoryStore::new()), ExecutionContext::new());

    assert_eq!(pipeline.run().await.claimed, 1);
    assert_eq!(player.units(caption).len(), 2);
}

#[tokio::test]
async fn test_run_withPlayback_shouldCaptureCurrentTime() {
    let player = Player::new();
    player.media.set_current_time(12.5);
    let caption = player.add_caption("tiempo");
    let pipeline = pipeline_over(&player, Arc::new(MemoryStore::new()), ExecutionContext::new());

    pipeline.run().await;

    let span = player.unit_nodes(caption)[0];
    assert_eq!(player.document.attribute(span, "data-time").as_deref(), Some("12.5"));
}

#[tokio::test]
async fn test_run_withNoCaptions_shouldReturnEmptyReport() {
    let player = Player::new();
    let store = Arc::new(MemoryStore::new());
    store.fail_reads(true);
    let pipeline = pipeline_over(&player, store, ExecutionContext::new());

    let report = pipeline.run().await;
    assert_eq!(report.located, 0);
    assert!(!report.aborted);
}

#[tokio::test]
async fn test_run_withFailingStore_shouldStillAnnotateAsUnknown() {
    let player = Player::new();
    let caption = player.add_caption("Hello");
    let store = Arc::new(MemoryStore::new());
    store.insert("hello", "hola");
    store.fail_reads(true);
    let pipeline = pipeline_over(&player, store, ExecutionContext::new());

    pipeline.run().await;
    assert_eq!(player.units(caption), vec![unit("Hello", "hello", "unknown")]);
}

#[tokio::test]
async fn test_run_shouldSuspendObservationDuringPass() {
    let player = Player::new();
    player.add_caption("uno");
    let gate = ObservationGate::new();
    let subscription = player.document.subscribe();
    let connection = subscription.connection.clone();
    gate.attach(connection.clone());
    gate.enable();

    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(30)));
    let pipeline = Arc::new(AnnotationPipeline::new(
        player.surface(),
        Arc::new(CaptionLocator::from_config(&CaptionConfig::default()).unwrap()),
        DictionaryGateway::new(store, ExecutionContext::new()),
        ExecutionContext::new(),
        gate.clone(),
    ));

    let running = pipeline.clone();
    let pass = tokio::spawn(async move { running.run().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(gate.state(), WatchState::Suspended);
    assert!(!connection.is_connected());

    pass.await.unwrap();
    assert_eq!(gate.state(), WatchState::Observing);
    assert!(connection.is_connected());
}

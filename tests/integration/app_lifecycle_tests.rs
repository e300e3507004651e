/*!
 * Controller lifecycle: mounting, watching, enable/disable and teardown
 */

use std::sync::Arc;
use std::time::Duration;

use captionlex::app_config::Config;
use captionlex::app_controller::Lifecycle;
use captionlex::dictionary::{DictionaryStore, MemoryStore};
use captionlex::errors::{AppError, SurfaceError};
use captionlex::providers::mock::MockTranslator;
use captionlex::surface::{Document, ElementSpec, MutationKind, NodeId, Surface};
use captionlex::{Controller, ExecutionContext};

use crate::common::{Harness, Player, init_logging};

/// Poll until `check` holds, giving up after one second
async fn eventually(check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

fn annotated(player: &Player, caption: NodeId) -> bool {
    !player.unit_nodes(caption).is_empty()
}

async fn disabled_harness() -> Harness {
    let store = MemoryStore::new();
    store.set_enabled(false).await.unwrap();
    Harness::with_store(MockTranslator::working(), store)
}

#[tokio::test]
async fn test_start_withExistingCaptions_shouldAnnotateImmediately() {
    let harness = Harness::new(MockTranslator::working());
    let caption = harness.player.add_caption("hola mundo");

    harness.controller.start().await.unwrap();

    let state = harness.controller.state();
    assert_eq!(state.lifecycle, Lifecycle::Running);
    assert!(state.enabled);
    assert_eq!(harness.player.unit_nodes(caption).len(), 2);
}

#[tokio::test]
async fn test_watcher_withNewCaption_shouldAnnotateIt() {
    let harness = Harness::new(MockTranslator::working());
    harness.store.insert("mundo", "world");
    harness.controller.start().await.unwrap();

    let caption = harness.player.add_caption("hola mundo");

    assert!(eventually(|| annotated(&harness.player, caption)).await);
    let states: Vec<String> =
        harness.player.units(caption).into_iter().map(|(_, _, state)| state).collect();
    assert_eq!(states, vec!["unknown", "known"]);
}

#[tokio::test]
async fn test_watcher_afterAnnotating_shouldNotRetriggerItself() {
    let harness = Harness::new(MockTranslator::working());
    harness.controller.start().await.unwrap();
    let caption = harness.player.add_caption("uno dos tres");
    assert!(eventually(|| annotated(&harness.player, caption)).await);
    let html = harness.player.document.inner_html(caption);

    let mut observer = harness.player.document.subscribe();
    let quiet = tokio::time::timeout(Duration::from_millis(100), observer.receiver.recv()).await;

    assert!(quiet.is_err(), "surface kept changing: {:?}", quiet);
    assert_eq!(harness.player.document.inner_html(caption), html);
}

#[tokio::test]
async fn test_watcher_withManyCaptions_shouldAnnotateEachOnce() {
    let harness = Harness::new(MockTranslator::working());
    harness.controller.start().await.unwrap();

    let captions: Vec<NodeId> =
        (0..10).map(|i| harness.player.add_caption(&format!("linea {}", i))).collect();

    for caption in &captions {
        assert!(eventually(|| annotated(&harness.player, *caption)).await);
        assert_eq!(harness.player.units(*caption)[0].0, "linea");
        assert_eq!(harness.player.unit_nodes(*caption).len(), 1);
    }
}

#[tokio::test]
async fn test_watcher_withCaptionAddedDuringPass_shouldAnnotateIt() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(30));
    let harness = Harness::with_store(MockTranslator::working(), store);
    harness.controller.start().await.unwrap();

    let first = harness.player.add_caption("primera linea");
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = harness.player.add_caption("segunda linea");

    assert!(eventually(|| annotated(&harness.player, first)).await);
    assert!(eventually(|| annotated(&harness.player, second)).await);
    assert_eq!(harness.player.unit_nodes(second).len(), 2);
}

#[tokio::test]
async fn test_start_whileDisabled_shouldLeaveCaptionsUntouched() {
    let harness = disabled_harness().await;
    let before = harness.player.add_caption("hola");
    harness.controller.start().await.unwrap();
    let after = harness.player.add_caption("adios");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!harness.controller.state().enabled);
    assert!(!annotated(&harness.player, before));
    assert!(!annotated(&harness.player, after));
}

#[tokio::test]
async fn test_set_enabled_true_shouldPersistAndAnnotateVisibleCaptions() {
    let harness = disabled_harness().await;
    let caption = harness.player.add_caption("hola");
    harness.controller.start().await.unwrap();

    assert!(harness.controller.set_enabled(true).await);

    assert!(harness.store.get_enabled().await.unwrap());
    assert!(harness.controller.state().is_observing());
    assert!(annotated(&harness.player, caption));
}

#[tokio::test]
async fn test_enabled_changedInStore_shouldBeFollowed() {
    let harness = disabled_harness().await;
    let caption = harness.player.add_caption("hola");
    harness.controller.start().await.unwrap();

    harness.store.set_enabled(true).await.unwrap();
    assert!(eventually(|| annotated(&harness.player, caption)).await);

    harness.store.set_enabled(false).await.unwrap();
    assert!(eventually(|| !harness.controller.state().enabled).await);
    let late = harness.player.add_caption("tarde");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!annotated(&harness.player, late));
}

#[tokio::test]
async fn test_teardown_shouldStopWatchingForGood() {
    let harness = Harness::new(MockTranslator::working());
    harness.controller.start().await.unwrap();

    harness.controller.teardown().await;
    assert_eq!(harness.controller.state().lifecycle, Lifecycle::TornDown);
    assert!(!harness.controller.state().enabled);

    harness.controller.set_enabled(true).await;
    let caption = harness.player.add_caption("hola");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(harness.controller.state().lifecycle, Lifecycle::TornDown);
    assert!(!annotated(&harness.player, caption));
}

#[tokio::test]
async fn test_start_twice_shouldBeNoop() {
    let harness = Harness::new(MockTranslator::working());
    harness.controller.start().await.unwrap();
    harness.controller.start().await.unwrap();
    assert_eq!(harness.controller.state().lifecycle, Lifecycle::Running);
}

#[tokio::test]
async fn test_invalidated_context_shouldStopAnnotating() {
    let harness = Harness::new(MockTranslator::working());
    harness.controller.start().await.unwrap();
    harness.context.invalidate();

    let caption = harness.player.add_caption("hola");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!annotated(&harness.player, caption));
    assert_eq!(harness.controller.annotate_now().await.claimed, 0);
}

fn controller_over(document: Arc<Document>, config: Config) -> Controller {
    init_logging();
    Controller::new(
        config,
        document,
        Arc::new(MemoryStore::new()),
        Arc::new(MockTranslator::working()),
        ExecutionContext::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_start_withoutObserveRoot_shouldTimeOut() {
    let mut config = Config::default();
    config.captions.mount_timeout_ms = 30;
    let controller = controller_over(Arc::new(Document::new()), config);

    let result = controller.start().await;

    assert!(matches!(
        result,
        Err(AppError::Surface(SurfaceError::MountTimeout(ref selector))) if selector == "body"
    ));
    assert_eq!(controller.state().lifecycle, Lifecycle::Created);
}

#[tokio::test]
async fn test_start_withLateMount_shouldWaitForObserveRoot() {
    let document = Arc::new(Document::new());
    let controller = controller_over(document.clone(), Config::default());

    let mounter = {
        let document = document.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            document.append(document.root(), ElementSpec::new("body")).unwrap();
        })
    };

    controller.start().await.unwrap();
    mounter.await.unwrap();
    assert_eq!(controller.state().lifecycle, Lifecycle::Running);
}

#[tokio::test]
async fn test_subscribe_onPlayer_shouldReportCaptionInsertions() {
    let player = Player::new();
    let mut observer = player.document.subscribe();
    let caption = player.add_caption("hola");

    let record = observer.receiver.recv().await.unwrap();
    assert_eq!(record.kind, MutationKind::ChildList);
    assert_eq!(record.target, player.window);
    assert!(player.document.is_attached(caption));
}

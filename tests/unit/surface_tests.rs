/*!
 * Tests for the in-memory surface, selectors and mount waiting
 */

use std::sync::Arc;
use std::time::Duration;

use captionlex::errors::SurfaceError;
use captionlex::surface::mount::wait_for_element;
use captionlex::surface::{Document, ElementSpec, MutationKind, NodeSpec, Selector, Surface};

use crate::common::Player;

#[test]
fn test_querySelectorAll_withDefaultCaptionSelectors_shouldMatchPlayerSegments() {
    let player = Player::new();
    let first = player.add_caption("uno");
    let second = player.add_caption("dos");

    for source in [".ytp-caption-segment", ".caption-window > span", r#"span[class*="caption"]"#] {
        let selector = Selector::parse(source).unwrap();
        assert_eq!(
            player.document.query_selector_all(player.document.root(), &selector),
            vec![first, second],
            "selector {}",
            source
        );
    }
}

#[test]
fn test_selector_withIdList_shouldMatchEitherPlayer() {
    let doc = Document::new();
    let container = doc
        .append(doc.root(), ElementSpec::new("div").id("player-container"))
        .unwrap();
    let selector: Selector = "#movie_player, #player-container".parse().unwrap();
    assert_eq!(doc.query_selector(doc.root(), &selector), Some(container));
}

#[test]
fn test_selector_withGarbage_shouldReportInvalidSelector() {
    let error = Selector::parse("span[").unwrap_err();
    assert!(matches!(error, SurfaceError::InvalidSelector { ref selector, .. } if selector == "span["));
}

#[test]
fn test_replaceChildren_onDetachedNode_shouldFail() {
    let player = Player::new();
    let caption = player.add_caption("hola");
    player.document.remove(caption).unwrap();

    let result = player
        .document
        .replace_children(caption, vec![NodeSpec::Text("x".to_string())]);
    assert_eq!(result, Err(SurfaceError::Detached(caption)));
    let segments = Selector::parse(".ytp-caption-segment").unwrap();
    assert!(player.document.query_selector_all(player.document.root(), &segments).is_empty());
}

#[test]
fn test_claim_onTextNode_shouldFail() {
    let player = Player::new();
    let caption = player.add_caption("hola");
    let text = player.document.children(caption)[0];
    assert_eq!(player.document.claim(text, "data-x"), Err(SurfaceError::NotAnElement(text)));
}

#[tokio::test]
async fn test_subscribe_withHostChanges_shouldReportChildListRecords() {
    let player = Player::new();
    let mut subscription = player.document.subscribe();

    let caption = player.add_caption("hola");
    player.document.set_text(caption, "adios").unwrap();

    let first = subscription.receiver.recv().await.unwrap();
    assert_eq!((first.kind, first.target), (MutationKind::ChildList, player.window));
    let second = subscription.receiver.recv().await.unwrap();
    assert_eq!((second.kind, second.target), (MutationKind::ChildList, caption));
    assert_eq!(player.document.text_content(caption).as_deref(), Some("adios"));
}

#[tokio::test]
async fn test_waitForElement_withLateMount_shouldResolve() {
    let doc = Arc::new(Document::new());
    let host = doc.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let wrapper = host.append(host.root(), ElementSpec::new("html")).unwrap();
        host.append(wrapper, ElementSpec::new("body")).unwrap();
    });

    let body = Selector::parse("body").unwrap();
    let found = wait_for_element(doc.as_ref(), &body, Duration::from_secs(2)).await.unwrap();
    assert_eq!(doc.query_selector(doc.root(), &body), Some(found));
}

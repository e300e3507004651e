/*!
 * Waiting for a mount point to appear.
 *
 * Subscribes before the first lookup so an insertion between the check and
 * the subscription cannot be missed, then re-checks on every child-list
 * record until the deadline.
 */

use std::time::Duration;

use log::debug;
use tokio::time::{Instant, timeout_at};

use super::{MutationKind, NodeId, Selector, Surface};
use crate::errors::SurfaceError;

/// Resolve the first node matching `selector`, waiting up to `timeout`
pub async fn wait_for_element(
    surface: &dyn Surface,
    selector: &Selector,
    timeout: Duration,
) -> Result<NodeId, SurfaceError> {
    let mut subscription = surface.subscribe();
    let root = surface.root();

    if let Some(node) = surface.query_selector(root, selector) {
        return Ok(node);
    }

    debug!("Waiting up to {:?} for '{}' to mount", timeout, selector);
    let deadline = Instant::now() + timeout;
    loop {
        match timeout_at(deadline, subscription.receiver.recv()).await {
            Ok(Some(record)) if record.kind == MutationKind::ChildList => {
                if let Some(node) = surface.query_selector(root, selector) {
                    return Ok(node);
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => {
                return Err(SurfaceError::MountTimeout(selector.to_string()));
            }
        }
    }
}

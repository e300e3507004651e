/*!
 * Mutation watcher and its observation gate.
 *
 * The gate owns the watcher state machine:
 *
 * ```text
 * Disabled -> Observing -> Suspended (pass running) -> Observing
 *     ^           |
 *     +-----------+            any -> TornDown (terminal)
 * ```
 *
 * The mutation subscription is connected exactly while the state is
 * `Observing`. A pass holds a [`SuspendGuard`]; the last guard to drop
 * reconnects, so cleanup happens on every exit path.
 */

use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::pipeline::AnnotationPipeline;
use crate::surface::{MutationKind, MutationSubscription, ObserverConnection};

/// Observable state of the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Disabled,
    Observing,
    Suspended,
    TornDown,
}

#[derive(Debug, Default)]
struct GateInner {
    enabled: bool,
    torn_down: bool,
    depth: usize,
    connection: Option<ObserverConnection>,
}

impl GateInner {
    fn state(&self) -> WatchState {
        if self.torn_down {
            WatchState::TornDown
        } else if !self.enabled {
            WatchState::Disabled
        } else if self.depth > 0 {
            WatchState::Suspended
        } else {
            WatchState::Observing
        }
    }

    fn apply(&self) {
        let Some(connection) = &self.connection else {
            return;
        };
        if self.state() == WatchState::Observing {
            connection.connect();
        } else {
            connection.disconnect();
        }
    }
}

/// Shared switch deciding whether structural changes are observed
#[derive(Debug, Clone, Default)]
pub struct ObservationGate {
    inner: Arc<Mutex<GateInner>>,
}

impl ObservationGate {
    /// A gate in the `Disabled` state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatchState {
        self.inner.lock().state()
    }

    /// Register the subscription the gate controls
    pub fn attach(&self, connection: ObserverConnection) {
        let mut inner = self.inner.lock();
        inner.connection = Some(connection);
        inner.apply();
    }

    /// `Disabled -> Observing`
    pub fn enable(&self) {
        self.transition(|inner| inner.enabled = true);
    }

    /// Any live state `-> Disabled`
    pub fn disable(&self) {
        self.transition(|inner| inner.enabled = false);
    }

    /// Terminal; the subscription is never reconnected
    pub fn teardown(&self) {
        self.transition(|inner| inner.torn_down = true);
    }

    /// Stop observing until the returned guard drops
    pub fn suspend(&self) -> SuspendGuard {
        self.transition(|inner| inner.depth += 1);
        SuspendGuard { gate: self.clone() }
    }

    fn transition(&self, change: impl FnOnce(&mut GateInner)) {
        let mut inner = self.inner.lock();
        let before = inner.state();
        change(&mut inner);
        let after = inner.state();
        inner.apply();
        if before != after {
            trace!("Watcher {:?} -> {:?}", before, after);
        }
    }
}

/// Keeps the gate suspended while alive
#[derive(Debug)]
pub struct SuspendGuard {
    gate: ObservationGate,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.gate
            .transition(|inner| inner.depth = inner.depth.saturating_sub(1));
    }
}

/// Runs the pipeline whenever the surface's children change
#[derive(Debug)]
pub struct MutationWatcher {
    pipeline: Arc<AnnotationPipeline>,
    gate: ObservationGate,
}

/// Handle to a spawned watcher task
#[derive(Debug)]
pub struct WatcherHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

impl MutationWatcher {
    pub fn new(pipeline: Arc<AnnotationPipeline>, gate: ObservationGate) -> Self {
        Self { pipeline, gate }
    }

    /// Attach `subscription` to the gate and start reacting to it
    pub fn spawn(self, subscription: MutationSubscription) -> WatcherHandle {
        self.gate.attach(subscription.connection.clone());
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();
        let task = tokio::spawn(async move { self.run(subscription, signal).await });
        WatcherHandle { shutdown, task }
    }

    async fn run(self, mut subscription: MutationSubscription, shutdown: Arc<Notify>) {
        debug!("Mutation watcher started");
        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                record = subscription.receiver.recv() => {
                    let Some(record) = record else { break };
                    if record.kind != MutationKind::ChildList {
                        continue;
                    }
                    // One pass covers the whole burst
                    while subscription.receiver.try_recv().is_ok() {}
                    if self.gate.state() == WatchState::Observing {
                        self.pipeline.run().await;
                    }
                }
            }
        }
        subscription.connection.disconnect();
        debug!("Mutation watcher stopped");
    }
}

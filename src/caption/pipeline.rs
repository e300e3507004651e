/*!
 * Annotation pipeline.
 *
 * One pass: suspend the watcher, locate caption nodes, load a single
 * dictionary snapshot, then claim and rewrite every unclaimed node. The
 * claim is an atomic test-and-set taken after the only suspension point, so
 * overlapping passes never rewrite the same node twice. A node claimed by a
 * failing pass stays claimed.
 */

use std::sync::Arc;

use log::{debug, error, warn};

use super::locator::CaptionLocator;
use super::units::{annotate, render, AnnotatedUnit, KnownState, CLAIM_FLAG};
use super::watcher::{ObservationGate, WatchState};
use crate::context::ExecutionContext;
use crate::dictionary::DictionaryGateway;
use crate::errors::{AnnotationError, SurfaceError};
use crate::surface::{NodeId, Surface};

/// Counters describing one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Candidates returned by the locator
    pub located: usize,
    /// Nodes this pass claimed
    pub claimed: usize,
    /// Nodes claimed and rewritten
    pub rewritten: usize,
    /// Interactive units built
    pub words: usize,
    /// Interactive units resolved as known
    pub known: usize,
    /// Whether the pass stopped on an error
    pub aborted: bool,
}

impl PassReport {
    /// Fold a follow-up pass into this report
    fn absorb(&mut self, next: PassReport) {
        self.located = next.located;
        self.claimed += next.claimed;
        self.rewritten += next.rewritten;
        self.words += next.words;
        self.known += next.known;
        self.aborted |= next.aborted;
    }
}

/// Rewrites caption nodes into annotated units
#[derive(Debug)]
pub struct AnnotationPipeline {
    surface: Arc<dyn Surface>,
    locator: Arc<CaptionLocator>,
    gateway: DictionaryGateway,
    context: ExecutionContext,
    gate: ObservationGate,
}

impl AnnotationPipeline {
    pub fn new(
        surface: Arc<dyn Surface>,
        locator: Arc<CaptionLocator>,
        gateway: DictionaryGateway,
        context: ExecutionContext,
        gate: ObservationGate,
    ) -> Self {
        Self {
            surface,
            locator,
            gateway,
            context,
            gate,
        }
    }

    /// Run one pass. Never fails; errors are logged and reported as
    /// `aborted`.
    ///
    /// Captions the host added while observation was suspended produce no
    /// mutation record, so once observation is back on any unclaimed caption
    /// gets another pass.
    pub async fn run(&self) -> PassReport {
        let mut report = self.pass().await;
        while !report.aborted && self.missed_captions() {
            debug!("Captions appeared during a suspended pass, running again");
            report.absorb(self.pass().await);
        }
        report
    }

    async fn pass(&self) -> PassReport {
        let _suspended = self.gate.suspend();
        let mut report = PassReport::default();

        if !self.context.is_valid() {
            warn!("Context invalid, skipping caption pass");
            return report;
        }

        if let Err(e) = self.process(&mut report).await {
            error!("Error processing captions: {}", e);
            report.aborted = true;
        }

        if report.claimed > 0 {
            debug!(
                "Caption pass: {} located, {} claimed, {} words ({} known)",
                report.located, report.claimed, report.words, report.known
            );
        }
        report
    }

    /// Whether unclaimed captions are visible while nothing suspends
    /// observation
    fn missed_captions(&self) -> bool {
        self.gate.state() == WatchState::Observing
            && self.context.is_valid()
            && self
                .locator
                .locate(self.surface.as_ref())
                .into_iter()
                .any(|node| self.surface.attribute(node, CLAIM_FLAG).is_none())
    }

    async fn process(&self, report: &mut PassReport) -> Result<(), AnnotationError> {
        let nodes = self.locator.locate(self.surface.as_ref());
        report.located = nodes.len();
        if nodes.is_empty() {
            return Ok(());
        }

        let snapshot = self.gateway.load_snapshot().await;
        let capture_time = self.surface.playback().map_or(0.0, |p| p.current_time());

        for node in nodes {
            match self.surface.claim(node, CLAIM_FLAG) {
                Ok(true) => report.claimed += 1,
                Ok(false) => continue,
                // Evicted by the host since it was located
                Err(SurfaceError::Detached(_)) => continue,
                Err(e) => return Err(e.into()),
            }

            let Some(text) = self.surface.text_content(node) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let units = annotate(&text, &snapshot, capture_time);
            self.rewrite(node, &units, report)?;
        }
        Ok(())
    }

    fn rewrite(&self, node: NodeId, units: &[AnnotatedUnit], report: &mut PassReport) -> Result<(), SurfaceError> {
        match self.surface.replace_children(node, render(units)) {
            Ok(()) => {}
            Err(SurfaceError::Detached(_)) => return Ok(()),
            Err(e) => return Err(e),
        }
        report.rewritten += 1;
        for unit in units {
            if let AnnotatedUnit::Interactive(unit) = unit {
                report.words += 1;
                if unit.known_state == KnownState::Known {
                    report.known += 1;
                }
            }
        }
        Ok(())
    }
}

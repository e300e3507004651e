/*!
 * Word state synchronizer.
 *
 * Updates the known/unknown class of every rendered unit sharing one
 * canonical key, across all scopes the locator knows about. Text and other
 * words are never touched.
 */

use std::sync::Arc;

use log::{debug, warn};

use super::locator::CaptionLocator;
use super::units::{KnownState, NORMALIZED_ATTR, WORD_UNIT};
use crate::surface::Surface;
use crate::text::CanonicalWord;

#[derive(Debug, Clone)]
pub struct WordStateSynchronizer {
    surface: Arc<dyn Surface>,
    locator: Arc<CaptionLocator>,
}

impl WordStateSynchronizer {
    pub fn new(surface: Arc<dyn Surface>, locator: Arc<CaptionLocator>) -> Self {
        Self { surface, locator }
    }

    /// Set the state of every occurrence of `word`; returns how many units
    /// matched
    pub fn set_known(&self, word: &CanonicalWord, known: bool) -> usize {
        let target = KnownState::from_known(known);
        let previous = target.opposite();
        let mut matched = 0;

        for scope in self.locator.scopes(self.surface.as_ref()) {
            for node in self.surface.query_selector_all(scope, &WORD_UNIT) {
                if self.surface.attribute(node, NORMALIZED_ATTR).as_deref() != Some(word.as_str()) {
                    continue;
                }
                matched += 1;
                if self.surface.has_class(node, target.class_name())
                    && !self.surface.has_class(node, previous.class_name())
                {
                    continue;
                }
                if let Err(e) = self
                    .surface
                    .replace_class(node, previous.class_name(), target.class_name())
                {
                    warn!("Could not update unit {} for '{}': {}", node, word, e);
                }
            }
        }

        debug!("Marked {} occurrence(s) of '{}' as {}", matched, word, target);
        matched
    }
}

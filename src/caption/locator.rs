/*!
 * Caption node locator.
 *
 * Tries every caption selector against the document and against the
 * shadow root of the player element, when the player has one, and returns
 * the matches in lookup order without duplicates.
 */

use std::collections::HashSet;

use log::trace;

use crate::app_config::CaptionConfig;
use crate::errors::SurfaceError;
use crate::surface::{NodeId, Selector, Surface};

/// Finds candidate caption nodes on a surface
#[derive(Debug, Clone)]
pub struct CaptionLocator {
    selectors: Vec<Selector>,
    player: Selector,
}

impl CaptionLocator {
    pub fn new(selectors: Vec<Selector>, player: Selector) -> Self {
        Self { selectors, player }
    }

    /// Build from the caption section of the configuration
    pub fn from_config(config: &CaptionConfig) -> Result<Self, SurfaceError> {
        let selectors = config
            .selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(selectors, Selector::parse(&config.player_selectors)?))
    }

    /// Document root followed by the player's shadow root, if present
    pub fn scopes(&self, surface: &dyn Surface) -> Vec<NodeId> {
        let root = surface.root();
        let mut scopes = vec![root];
        if let Some(shadow) = surface
            .query_selector(root, &self.player)
            .and_then(|player| surface.shadow_root(player))
        {
            scopes.push(shadow);
        }
        scopes
    }

    /// Deduplicated caption candidates; empty when nothing matches
    pub fn locate(&self, surface: &dyn Surface) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for scope in self.scopes(surface) {
            for selector in &self.selectors {
                for node in surface.query_selector_all(scope, selector) {
                    if seen.insert(node) {
                        nodes.push(node);
                    }
                }
            }
        }
        trace!("Located {} caption node(s)", nodes.len());
        nodes
    }
}

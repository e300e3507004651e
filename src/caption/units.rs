/*!
 * Annotated units and their rendering.
 *
 * A claimed caption node is rewritten as a flat sequence of text nodes
 * (spaces, punctuation) and `span.word` elements. Each word span carries its
 * canonical key in `data-normalized`, the playback offset in `data-time`, and
 * exactly one of the `known` / `unknown` classes.
 */

use std::fmt;

use once_cell::sync::Lazy;

use crate::dictionary::DictionarySnapshot;
use crate::surface::{ElementSpec, NodeId, NodeSpec, Selector, Surface};
use crate::text::{normalize, tokenize, CanonicalWord, TokenKind};

/// Attribute marking a caption node as claimed
pub const CLAIM_FLAG: &str = "data-processed-by-lr";

/// Class shared by every interactive unit
pub const WORD_CLASS: &str = "word";

/// Attribute holding the canonical key
pub const NORMALIZED_ATTR: &str = "data-normalized";

/// Attribute holding the capture time offset
pub const TIME_ATTR: &str = "data-time";

/// Matches every rendered interactive unit
pub static WORD_UNIT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.word").expect("word unit selector is valid"));

/// Vocabulary membership of a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownState {
    Known,
    Unknown,
}

impl KnownState {
    pub fn from_known(known: bool) -> Self {
        if known { KnownState::Known } else { KnownState::Unknown }
    }

    /// Resolve against a snapshot; absence is always `Unknown`
    pub fn resolve(word: &CanonicalWord, snapshot: &DictionarySnapshot) -> Self {
        Self::from_known(snapshot.contains(word.as_str()))
    }

    /// CSS class carried by units in this state
    pub fn class_name(self) -> &'static str {
        match self {
            KnownState::Known => "known",
            KnownState::Unknown => "unknown",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            KnownState::Known => KnownState::Unknown,
            KnownState::Unknown => KnownState::Known,
        }
    }
}

impl fmt::Display for KnownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Hoverable, clickable rendering of one word token
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveUnit {
    pub surface_text: String,
    pub canonical_word: CanonicalWord,
    pub known_state: KnownState,
    /// Playback position in seconds when the unit was built
    pub capture_time: f64,
}

/// One piece of a rewritten caption node
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotatedUnit {
    /// Space or punctuation passed through as text
    Inert(String),
    Interactive(InteractiveUnit),
}

impl AnnotatedUnit {
    /// Text the unit displays
    pub fn surface_text(&self) -> &str {
        match self {
            AnnotatedUnit::Inert(text) => text,
            AnnotatedUnit::Interactive(unit) => &unit.surface_text,
        }
    }

    /// Node to insert for this unit
    pub fn to_node(&self) -> NodeSpec {
        match self {
            AnnotatedUnit::Inert(text) => NodeSpec::Text(text.clone()),
            AnnotatedUnit::Interactive(unit) => ElementSpec::new("span")
                .class(WORD_CLASS)
                .class(unit.known_state.class_name())
                .attr(NORMALIZED_ATTR, unit.canonical_word.as_str())
                .attr(TIME_ATTR, unit.capture_time.to_string())
                .text(&unit.surface_text)
                .into(),
        }
    }
}

/// Build the unit sequence for one caption's text
pub fn annotate(text: &str, snapshot: &DictionarySnapshot, capture_time: f64) -> Vec<AnnotatedUnit> {
    tokenize(text)
        .into_iter()
        .map(|token| match token.kind {
            TokenKind::Word => {
                let canonical_word = normalize(token.text);
                AnnotatedUnit::Interactive(InteractiveUnit {
                    surface_text: token.text.to_string(),
                    known_state: KnownState::resolve(&canonical_word, snapshot),
                    canonical_word,
                    capture_time,
                })
            }
            TokenKind::Space | TokenKind::Punctuation => AnnotatedUnit::Inert(token.text.to_string()),
        })
        .collect()
}

/// Nodes replacing a caption's content
pub fn render(units: &[AnnotatedUnit]) -> Vec<NodeSpec> {
    units.iter().map(AnnotatedUnit::to_node).collect()
}

/// A rendered unit found on the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitHandle {
    pub node: NodeId,
    pub canonical_word: CanonicalWord,
    pub known_state: KnownState,
}

impl UnitHandle {
    /// Resolve the unit containing `target` (the unit itself, a text node in
    /// it, or any descendant)
    pub fn from_target(surface: &dyn Surface, target: NodeId) -> Option<Self> {
        let node = surface.closest(target, &WORD_UNIT)?;
        Some(Self::read(surface, node))
    }

    /// Read a unit's stored key and state; falls back to normalizing the
    /// displayed text when the key attribute is missing
    pub fn read(surface: &dyn Surface, node: NodeId) -> Self {
        let canonical_word = match surface.attribute(node, NORMALIZED_ATTR) {
            Some(key) if !key.is_empty() => CanonicalWord::from_canonical(key),
            _ => normalize(&surface.text_content(node).unwrap_or_default()),
        };
        let known_state = KnownState::from_known(surface.has_class(node, KnownState::Known.class_name()));
        Self {
            node,
            canonical_word,
            known_state,
        }
    }
}

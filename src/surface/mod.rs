/*!
 * The caption surface: a DOM-like tree owned by the host player.
 *
 * The engine never holds on to nodes between passes; it queries the
 * surface, rewrites what it claims and lets go. Structural changes are
 * reported through mutation subscriptions that can be disconnected and
 * reconnected, the same way a page-level mutation observer can.
 *
 * - `selector`: the CSS subset used to find captions and units
 * - `dom`: in-memory implementation (tests, CLI)
 * - `mount`: waiting for a node to appear without polling
 */

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::errors::SurfaceError;

pub mod dom;
pub mod mount;
pub mod selector;

pub use self::dom::{Document, MediaElement};
pub use self::selector::Selector;

/// Handle to a node on a surface.
///
/// Slots may be reused after a node leaves the tree; the generation keeps a
/// stale handle from resolving to the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot position
    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}.{}", self.index, self.generation)
        }
    }
}

/// Description of an element to create
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<NodeSpec>,
}

impl ElementSpec {
    /// Start an element with the given tag
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push((name.to_lowercase(), value.into()));
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(NodeSpec::Text(text.to_string()))
    }
}

/// Description of a node to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    Text(String),
    Element(ElementSpec),
}

impl From<ElementSpec> for NodeSpec {
    fn from(element: ElementSpec) -> Self {
        NodeSpec::Element(element)
    }
}

/// What kind of change a mutation record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Children added or removed
    ChildList,
    /// An attribute, class or data flag changed
    Attributes,
    /// A text node's content changed
    CharacterData,
}

/// One structural change on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
}

/// Switch controlling whether a subscription receives records
#[derive(Debug, Clone)]
pub struct ObserverConnection {
    active: Arc<AtomicBool>,
}

impl ObserverConnection {
    pub(crate) fn new(active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
        }
    }

    /// Start delivering records
    pub fn connect(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    /// Stop delivering records; changes made meanwhile are never reported
    pub fn disconnect(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Whether records are being delivered
    pub fn is_connected(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Receiving end of a mutation subscription
#[derive(Debug)]
pub struct MutationSubscription {
    pub receiver: mpsc::UnboundedReceiver<MutationRecord>,
    pub connection: ObserverConnection,
}

/// Playback handle of the player's video element
pub trait Playback: Send + Sync + Debug {
    fn is_paused(&self) -> bool;
    fn play(&self);
    fn pause(&self);
    /// Current position in seconds
    fn current_time(&self) -> f64;
}

/// The host surface the engine reads captions from and writes units to
pub trait Surface: Send + Sync + Debug {
    /// Document root
    fn root(&self) -> NodeId;

    /// Attached descendants of `scope` matching `selector`, in tree order
    fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId>;

    /// First match under `scope`
    fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.query_selector_all(scope, selector).into_iter().next()
    }

    /// Open shadow root attached to `host`, if any
    fn shadow_root(&self, host: NodeId) -> Option<NodeId>;

    /// Nearest inclusive ancestor element matching `selector`; text nodes
    /// start from their parent
    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId>;

    /// Concatenated text of the subtree; `None` for unknown or detached nodes
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Attribute value (`class` and `id` included)
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Whether the element carries `class`
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Set attribute `flag` to `"true"` unless it already is.
    ///
    /// Returns `Ok(true)` if this call set it. The check and the write are
    /// one atomic step.
    fn claim(&self, node: NodeId, flag: &str) -> Result<bool, SurfaceError>;

    /// Replace all children of an element
    fn replace_children(&self, node: NodeId, children: Vec<NodeSpec>) -> Result<(), SurfaceError>;

    /// Swap one class for another on an element
    fn replace_class(&self, node: NodeId, from: &str, to: &str) -> Result<(), SurfaceError>;

    /// The player's playback handle, if a video element exists
    fn playback(&self) -> Option<Arc<dyn Playback>>;

    /// Subscribe to mutation records, initially connected
    fn subscribe(&self) -> MutationSubscription;
}

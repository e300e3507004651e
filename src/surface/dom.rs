/*!
 * In-memory document implementing [`Surface`].
 *
 * An arena of nodes with one document root, optional open shadow roots on
 * elements, and mutation subscribers. Host-side methods (`append`,
 * `set_text`, `remove`, `attach_shadow`) stand in for the page changing
 * underneath the engine; they emit the same mutation records the engine's
 * own writes do.
 *
 * A node leaving the tree frees its slot (and its whole subtree's) for
 * reuse. Each slot carries a generation, so a handle to a removed node
 * keeps reporting `Detached` after the slot has been handed out again.
 */

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::trace;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::selector::{Selector, SelectorTree};
use super::{
    ElementSpec, MutationKind, MutationRecord, MutationSubscription, NodeId, NodeSpec,
    ObserverConnection, Playback, Surface,
};
use crate::errors::SurfaceError;

#[derive(Debug)]
struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    shadow_root: Option<NodeId>,
}

#[derive(Debug)]
enum NodeKind {
    Document,
    ShadowRoot,
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// Every live node is reachable from the root or from a live host's shadow
/// root; anything else has been released.
#[derive(Debug)]
struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Tree {
    fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(NodeData {
                    kind: NodeKind::Document,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, SurfaceError> {
        let slot = self.slots.get(id.index()).ok_or(SurfaceError::NodeNotFound(id))?;
        if slot.generation != id.generation() {
            return Err(SurfaceError::Detached(id));
        }
        slot.node.as_ref().ok_or(SurfaceError::Detached(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, SurfaceError> {
        let slot = self.slots.get_mut(id.index()).ok_or(SurfaceError::NodeNotFound(id))?;
        if slot.generation != id.generation() {
            return Err(SurfaceError::Detached(id));
        }
        slot.node.as_mut().ok_or(SurfaceError::Detached(id))
    }

    fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).ok()
    }

    fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.get(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, SurfaceError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            _ => Err(SurfaceError::NotAnElement(id)),
        }
    }

    /// Parent node usable as a container (document, shadow root or element)
    fn check_container(&self, id: NodeId) -> Result<(), SurfaceError> {
        match self.node(id)?.kind {
            NodeKind::Text(_) => Err(SurfaceError::NotAnElement(id)),
            _ => Ok(()),
        }
    }

    fn allocate(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(data);
                NodeId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(data),
                });
                NodeId::new(self.slots.len() - 1, 0)
            }
        }
    }

    fn build(&mut self, spec: NodeSpec, parent: NodeId) -> NodeId {
        match spec {
            NodeSpec::Text(text) => self.allocate(NodeData {
                kind: NodeKind::Text(text),
                parent: Some(parent),
                children: Vec::new(),
            }),
            NodeSpec::Element(element) => {
                let ElementSpec { tag, id: element_id, classes, attributes, children } = element;
                let id = self.allocate(NodeData {
                    kind: NodeKind::Element(Element {
                        tag,
                        id: element_id,
                        classes,
                        attributes: attributes.into_iter().collect(),
                        shadow_root: None,
                    }),
                    parent: Some(parent),
                    children: Vec::new(),
                });
                let children: Vec<NodeId> =
                    children.into_iter().map(|child| self.build(child, id)).collect();
                if let Ok(node) = self.node_mut(id) {
                    node.children = children;
                }
                id
            }
        }
    }

    /// Free `id`, its descendants and any shadow tree hosted below it
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.take(current) else {
                continue;
            };
            stack.extend(node.children);
            if let NodeKind::Element(Element { shadow_root: Some(shadow), .. }) = node.kind {
                stack.push(shadow);
            }
        }
    }

    fn take(&mut self, id: NodeId) -> Option<NodeData> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(node)
    }

    /// Light-tree descendants of `scope` in pre-order
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(scope).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).iter().rev().copied());
        }
        out
    }

    fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|node| &node.kind) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|d| match self.get(d).map(|node| &node.kind) {
                    Some(NodeKind::Text(text)) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                if let Some(id) = &element.id {
                    out.push_str(&format!(" id=\"{}\"", escape(id)));
                }
                if !element.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", escape(&element.classes.join(" "))));
                }
                for (name, value) in &element.attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
                }
                out.push('>');
                for child in &node.children {
                    self.serialize(*child, out);
                }
                out.push_str(&format!("</{}>", element.tag));
            }
            NodeKind::Document | NodeKind::ShadowRoot => {
                for child in &node.children {
                    self.serialize(*child, out);
                }
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

impl SelectorTree for Tree {
    type Node = NodeId;

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.get(node)?.parent?;
        self.element(parent).map(|_| parent)
    }

    fn local_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<Cow<'_, str>> {
        let element = self.element(node)?;
        match name {
            "id" => element.id.as_deref().map(Cow::Borrowed),
            "class" if element.classes.is_empty() => None,
            "class" => Some(Cow::Owned(element.classes.join(" "))),
            _ => element.attributes.get(name).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

#[derive(Debug)]
struct Observer {
    connection: ObserverConnection,
    sender: mpsc::UnboundedSender<MutationRecord>,
}

/// In-memory document
#[derive(Debug)]
pub struct Document {
    tree: RwLock<Tree>,
    observers: Mutex<Vec<Observer>>,
    media: RwLock<Option<Arc<MediaElement>>>,
}

impl Document {
    /// Empty document containing only the root
    pub fn new() -> Self {
        Self {
            tree: RwLock::new(Tree::new()),
            observers: Mutex::new(Vec::new()),
            media: RwLock::new(None),
        }
    }

    /// Append a node under `parent`
    pub fn append(&self, parent: NodeId, spec: impl Into<NodeSpec>) -> Result<NodeId, SurfaceError> {
        let id = {
            let mut tree = self.tree.write();
            tree.check_container(parent)?;
            let id = tree.build(spec.into(), parent);
            tree.node_mut(parent)?.children.push(id);
            id
        };
        self.notify(MutationKind::ChildList, parent);
        Ok(id)
    }

    /// Attach an open shadow root to an element
    pub fn attach_shadow(&self, host: NodeId) -> Result<NodeId, SurfaceError> {
        let mut tree = self.tree.write();
        if let Some(existing) = tree.element_mut(host)?.shadow_root {
            return Ok(existing);
        }
        let id = tree.allocate(NodeData {
            kind: NodeKind::ShadowRoot,
            parent: None,
            children: Vec::new(),
        });
        tree.element_mut(host)?.shadow_root = Some(id);
        Ok(id)
    }

    /// Replace the children of `node` with a single text node
    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), SurfaceError> {
        self.replace_children(node, vec![NodeSpec::Text(text.to_string())])
    }

    /// Remove a node and its subtree from the document
    pub fn remove(&self, node: NodeId) -> Result<(), SurfaceError> {
        let parent = {
            let mut tree = self.tree.write();
            let parent = tree.node(node)?.parent.ok_or(SurfaceError::NotAnElement(node))?;
            tree.node_mut(parent)?.children.retain(|c| *c != node);
            tree.release(node);
            parent
        };
        self.notify(MutationKind::ChildList, parent);
        Ok(())
    }

    /// Install the player's video element
    pub fn set_media(&self, media: Arc<MediaElement>) {
        *self.media.write() = Some(media);
    }

    /// Children of a node
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.read().children_of(node).to_vec()
    }

    /// Whether the node is a text node
    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.tree.read().get(node).map(|n| &n.kind), Some(NodeKind::Text(_)))
    }

    /// Whether the node is still part of the document
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.tree.read().get(node).is_some()
    }

    /// Number of node slots allocated, live or free
    pub fn allocated_slots(&self) -> usize {
        self.tree.read().slots.len()
    }

    /// Serialized children of a node
    pub fn inner_html(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        let mut out = String::new();
        for child in tree.children_of(node) {
            tree.serialize(*child, &mut out);
        }
        out
    }

    fn notify(&self, kind: MutationKind, target: NodeId) {
        let record = MutationRecord { kind, target };
        trace!("Mutation {:?} on {}", kind, target);
        self.observers.lock().retain(|observer| {
            if observer.connection.is_connected() {
                observer.sender.send(record).is_ok()
            } else {
                !observer.sender.is_closed()
            }
        });
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for Document {
    fn root(&self) -> NodeId {
        NodeId::new(0, 0)
    }

    fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let tree = self.tree.read();
        if tree.node(scope).is_err() {
            return Vec::new();
        }
        tree.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(&*tree, *id))
            .collect()
    }

    fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.tree.read().element(host)?.shadow_root
    }

    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let tree = self.tree.read();
        let mut current = match tree.get(node)?.kind {
            NodeKind::Text(_) => tree.parent_element(node),
            NodeKind::Element(_) => Some(node),
            _ => None,
        };
        while let Some(candidate) = current {
            if selector.matches(&*tree, candidate) {
                return Some(candidate);
            }
            current = tree.parent_element(candidate);
        }
        None
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let tree = self.tree.read();
        tree.get(node)?;
        Some(tree.text_content(node))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let tree = self.tree.read();
        SelectorTree::attribute(&*tree, node, name).map(Cow::into_owned)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        SelectorTree::has_class(&*self.tree.read(), node, class)
    }

    fn claim(&self, node: NodeId, flag: &str) -> Result<bool, SurfaceError> {
        {
            let mut tree = self.tree.write();
            let element = tree.element_mut(node)?;
            if element.attributes.get(flag).is_some_and(|v| v == "true") {
                return Ok(false);
            }
            element.attributes.insert(flag.to_string(), "true".to_string());
        }
        self.notify(MutationKind::Attributes, node);
        Ok(true)
    }

    fn replace_children(&self, node: NodeId, children: Vec<NodeSpec>) -> Result<(), SurfaceError> {
        {
            let mut tree = self.tree.write();
            tree.element_mut(node)?;
            let old = std::mem::take(&mut tree.node_mut(node)?.children);
            for child in old {
                tree.release(child);
            }
            let built: Vec<NodeId> = children.into_iter().map(|child| tree.build(child, node)).collect();
            tree.node_mut(node)?.children = built;
        }
        self.notify(MutationKind::ChildList, node);
        Ok(())
    }

    fn replace_class(&self, node: NodeId, from: &str, to: &str) -> Result<(), SurfaceError> {
        {
            let mut tree = self.tree.write();
            let element = tree.element_mut(node)?;
            element.classes.retain(|c| c != from);
            if !element.classes.iter().any(|c| c == to) {
                element.classes.push(to.to_string());
            }
        }
        self.notify(MutationKind::Attributes, node);
        Ok(())
    }

    fn playback(&self) -> Option<Arc<dyn Playback>> {
        self.media.read().clone().map(|media| media as Arc<dyn Playback>)
    }

    fn subscribe(&self) -> MutationSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = ObserverConnection::new(true);
        self.observers.lock().push(Observer {
            connection: connection.clone(),
            sender,
        });
        MutationSubscription { receiver, connection }
    }
}

/// Video element with a play/pause state and a clock
#[derive(Debug)]
pub struct MediaElement {
    paused: AtomicBool,
    current_time: Mutex<f64>,
    play_calls: AtomicUsize,
    pause_calls: AtomicUsize,
}

impl MediaElement {
    pub fn new(paused: bool) -> Self {
        Self {
            paused: AtomicBool::new(paused),
            current_time: Mutex::new(0.0),
            play_calls: AtomicUsize::new(0),
            pause_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_current_time(&self, seconds: f64) {
        *self.current_time.lock() = seconds;
    }

    /// Number of `play` calls received
    pub fn play_count(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    /// Number of `pause` calls received
    pub fn pause_count(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }
}

impl Playback for MediaElement {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn play(&self) {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(true, Ordering::SeqCst);
    }

    fn current_time(&self) -> f64 {
        *self.current_time.lock()
    }
}

//! In-memory HTML document: parsing, queries, mutation, and events.
//!
//! [`Document`] is a cheaply cloneable handle to shared tree state. All
//! mutation goes through `&self` methods with interior mutability, so
//! selections holding the same document handle observe each other's
//! changes immediately.
//!
//! Mutation methods are tolerant: operating on a missing node, a
//! non-element node, or an otherwise inapplicable target is a silent no-op.
//! The only fallible operation is selector parsing.

mod arena;
mod element_ref;
mod events;
pub(crate) mod query;
mod serializer;
mod style;
mod tree_sink;

pub use arena::NodeId;
pub use events::{Event, EventHandler, EventPhase};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use html5ever::{LocalName, QualName, ns};
use tracing::{debug, trace};

use crate::error::Result;
use arena::Tree;
use events::ListenerStore;

/// Handle to an in-memory HTML document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    tree: Tree,
    listeners: ListenerStore,
}

impl Document {
    /// Create an empty document (root only, no elements).
    pub fn new() -> Self {
        Self::from_tree(Tree::new())
    }

    /// Parse an HTML document. Never fails; the parser recovers from
    /// malformed markup the way browsers do.
    pub fn parse(html: &str) -> Self {
        let tree = tree_sink::parse_document_tree(html);
        debug!(nodes = tree.len(), "parsed document");
        Self::from_tree(tree)
    }

    fn from_tree(tree: Tree) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                tree,
                listeners: ListenerStore::default(),
            })),
        }
    }

    /// Whether two handles refer to the same document. Node ids are only
    /// comparable between handles for which this is true.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Find every element matching a selector group, in document order.
    pub(crate) fn query(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selectors = query::compile(selector)?;
        let inner = self.inner.borrow();
        let matched = query::match_all(&inner.tree, &selectors);
        trace!(selector, matched = matched.len(), "query");
        Ok(matched)
    }

    /// Create a detached element with the given tag name.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        self.inner.borrow_mut().tree.create_element(name, Vec::new())
    }

    /// The document root node. Not an element; it parents the doctype and
    /// the `html` element.
    pub fn root(&self) -> NodeId {
        self.inner.borrow().tree.document()
    }

    /// The `html` element, if present.
    pub fn document_element(&self) -> Option<NodeId> {
        self.inner.borrow().tree.find_by_tag("html")
    }

    /// The `body` element, if present.
    pub fn body(&self) -> Option<NodeId> {
        self.inner.borrow().tree.find_by_tag("body")
    }

    /// Number of nodes ever allocated, detached ones included.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().tree.len()
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        serializer::serialize_document(&self.inner.borrow().tree)
    }
}

/// Node introspection.
impl Document {
    /// Element tag name, lowercased by the parser.
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner
            .borrow()
            .tree
            .element_name(node)
            .map(|n| n.to_string())
    }

    /// Element id attribute.
    pub fn id(&self, node: NodeId) -> Option<String> {
        self.inner
            .borrow()
            .tree
            .element_id(node)
            .map(|s| s.to_string())
    }

    /// Element class tokens, in insertion order.
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.inner.borrow().tree.element_classes(node).to_vec()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.inner.borrow().tree.has_class(node, class)
    }

    /// Attribute value. `id`, `class`, and `style` are synthesized from
    /// element state and reflect prior mutations.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner.borrow().tree.attr(node, name)
    }

    /// One inline style property value.
    pub fn style_value(&self, node: NodeId, property: &str) -> Option<String> {
        self.inner.borrow().tree.style_value(node, property)
    }

    /// Parent node, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().tree.parent_of(node)
    }

    /// Child nodes, snapshot at call time.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.borrow().tree.children(node).collect()
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let inner = self.inner.borrow();
        node == inner.tree.document() || inner.tree.is_ancestor(inner.tree.document(), node)
    }

    /// Concatenated text of the subtree, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        self.inner.borrow().tree.text_content(node)
    }

    /// Markup of the node's children.
    pub fn inner_html(&self, node: NodeId) -> String {
        serializer::serialize_inner(&self.inner.borrow().tree, node)
    }

    /// Markup of the node including its own tags.
    pub fn outer_html(&self, node: NodeId) -> String {
        serializer::serialize_outer(&self.inner.borrow().tree, node)
    }
}

/// Node mutation. Silent no-ops on inapplicable targets throughout.
impl Document {
    /// Add a class token. Duplicates and empty tokens are ignored.
    pub fn add_class(&self, node: NodeId, class: &str) {
        self.inner.borrow_mut().tree.add_class(node, class);
    }

    /// Remove every occurrence of a class token.
    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.inner.borrow_mut().tree.remove_class(node, class);
    }

    /// Set the id attribute.
    pub fn set_id(&self, node: NodeId, id: &str) {
        self.inner.borrow_mut().tree.set_id(node, id);
    }

    /// Set one inline style property, replacing an existing declaration
    /// for it in place.
    pub fn set_style_property(&self, node: NodeId, property: &str, value: &str) {
        self.inner
            .borrow_mut()
            .tree
            .set_style_property(node, property, value);
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current parent first. Appending a node into its own subtree (or the
    /// document root anywhere) is ignored.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut inner = self.inner.borrow_mut();
        let tree = &mut inner.tree;
        if !tree.is_container(parent) || tree.get(child).is_none() {
            return;
        }
        if child == tree.document() || child == parent || tree.is_ancestor(child, parent) {
            trace!(?parent, ?child, "append would create a cycle, ignored");
            return;
        }
        tree.append(parent, child);
    }

    /// Adopt nodes from another document into this one, detached and in
    /// order. Within one document the ids pass through unchanged. A
    /// foreign node is deep-copied here and its original detached from the
    /// old tree; one sitting inside an earlier node's subtree resolves to
    /// its copy there instead of adopting twice. The foreign document root
    /// and missing nodes are dropped. Listeners registered on the
    /// originals stay behind.
    pub fn adopt_nodes(&self, source: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        if self.ptr_eq(source) {
            return nodes.to_vec();
        }
        let mut map = HashMap::new();
        let mut out = Vec::with_capacity(nodes.len());
        let mut moved = Vec::new();
        {
            let source_inner = source.inner.borrow();
            let mut inner = self.inner.borrow_mut();
            for &node in nodes {
                if let Some(&copy) = map.get(&node) {
                    out.push(copy);
                    continue;
                }
                if node == source_inner.tree.document() {
                    continue;
                }
                if let Some(copy) = inner.tree.adopt_mapped(&source_inner.tree, node, &mut map) {
                    out.push(copy);
                    moved.push(node);
                }
            }
        }
        let mut source_inner = source.inner.borrow_mut();
        for node in moved {
            source_inner.tree.detach(node);
        }
        out
    }

    /// Replace the node's children with parsed markup.
    pub fn set_inner_html(&self, node: NodeId, markup: &str) {
        let (fragment, roots) = tree_sink::parse_fragment_tree(markup);
        let mut inner = self.inner.borrow_mut();
        let tree = &mut inner.tree;
        if !tree.is_container(node) {
            return;
        }
        for child in tree.children(node).collect::<Vec<_>>() {
            tree.detach(child);
        }
        for root in roots {
            if let Some(adopted) = tree.adopt(&fragment, root) {
                tree.append(node, adopted);
            }
        }
    }

    /// Replace the node itself with parsed markup, splicing the new nodes
    /// into its position. No-op for detached nodes, which have no position
    /// to splice into.
    pub fn set_outer_html(&self, node: NodeId, markup: &str) {
        let (fragment, roots) = tree_sink::parse_fragment_tree(markup);
        let mut inner = self.inner.borrow_mut();
        let tree = &mut inner.tree;
        if tree.parent_of(node).is_none() {
            trace!(?node, "outer markup on detached node ignored");
            return;
        }
        for root in roots {
            if let Some(adopted) = tree.adopt(&fragment, root) {
                tree.insert_before(node, adopted);
            }
        }
        tree.detach(node);
    }

    /// Replace the node's children with a single text node. Markup in the
    /// text is not parsed; it will serialize escaped.
    pub fn set_text(&self, node: NodeId, text: &str) {
        let mut inner = self.inner.borrow_mut();
        let tree = &mut inner.tree;
        if !tree.is_container(node) {
            return;
        }
        for child in tree.children(node).collect::<Vec<_>>() {
            tree.detach(child);
        }
        if !text.is_empty() {
            let text_node = tree.create_text(text.to_string());
            tree.append(node, text_node);
        }
    }
}

/// Event listeners and dispatch.
impl Document {
    /// Register a listener on a node for one event type and phase.
    /// Re-registering the same handler for the same type and phase is
    /// ignored.
    pub fn add_listener(
        &self,
        node: NodeId,
        event_type: &str,
        handler: EventHandler,
        capture: bool,
    ) {
        let mut inner = self.inner.borrow_mut();
        if inner.tree.get(node).is_none() {
            return;
        }
        inner.listeners.add(node, event_type, handler, capture);
    }

    /// Remove a listener matching handler identity and capture flag.
    /// Returns whether anything was removed.
    pub fn remove_listener(
        &self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> bool {
        self.inner
            .borrow_mut()
            .listeners
            .remove(node, event_type, handler, capture)
    }

    /// Dispatch an event at a node: capture from the root down, then the
    /// target (capture listeners before bubble listeners), then bubble back
    /// up. `Event::stop_propagation` halts before the next node.
    pub fn dispatch(&self, target: NodeId, event_type: &str) {
        // The propagation path is fixed before any handler runs, so
        // handlers that move nodes don't change the route.
        let path: Vec<NodeId> = {
            let inner = self.inner.borrow();
            if inner.tree.get(target).is_none() {
                return;
            }
            let mut path = vec![target];
            let mut current = target;
            while let Some(parent) = inner.tree.parent_of(current) {
                path.push(parent);
                current = parent;
            }
            path.reverse();
            path
        };

        trace!(event_type, depth = path.len(), "dispatch");
        let event = Event::new(event_type, target);
        let Some((&target_node, ancestors)) = path.split_last() else {
            return;
        };

        for &node in ancestors {
            event.begin_phase(EventPhase::Capturing, node);
            self.run_handlers(node, &event, true);
            if event.propagation_stopped() {
                return;
            }
        }

        event.begin_phase(EventPhase::AtTarget, target_node);
        self.run_handlers(target_node, &event, true);
        if event.propagation_stopped() {
            return;
        }
        self.run_handlers(target_node, &event, false);
        if event.propagation_stopped() {
            return;
        }

        for &node in ancestors.iter().rev() {
            event.begin_phase(EventPhase::Bubbling, node);
            self.run_handlers(node, &event, false);
            if event.propagation_stopped() {
                return;
            }
        }
    }

    fn run_handlers(&self, node: NodeId, event: &Event, capture: bool) {
        // Collect first so the borrow is released before handlers run;
        // handlers may call back into this document.
        let handlers = self
            .inner
            .borrow()
            .listeners
            .handlers(node, event.event_type(), capture);
        for handler in handlers {
            handler.call(event);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.node_count())
            .finish()
    }
}

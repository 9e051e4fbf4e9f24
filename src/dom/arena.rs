//! Arena-based DOM tree.
//!
//! All nodes live in a contiguous vector and link to each other through
//! indices, which keeps traversal cache-friendly and lets node handles be
//! small `Copy` values. Unlike a parse-only arena, this tree supports
//! mutation: nodes can be detached, re-appended elsewhere (move semantics),
//! and whole subtrees can be adopted from another tree.

use std::collections::HashMap;

use html5ever::{LocalName, Namespace, QualName};

use crate::dom::style::{self, Declaration};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel value for no node.
    pub(crate) const NONE: NodeId = NodeId(u32::MAX);

    pub(crate) fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub(crate) fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// Element payload.
///
/// The `id`, `class`, and `style` attributes are pulled out of the attribute
/// list at creation time: `id` and `classes` feed selector matching directly,
/// and `style` holds parsed declarations so property updates can replace
/// values in place. `attrs` keeps everything else in source order.
#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub name: QualName,
    pub attrs: Vec<Attribute>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub style: Vec<Declaration>,
}

/// Node type in the arena DOM.
#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    /// Document root.
    Document,
    /// Element with name, attributes, and extracted id/class/style state.
    Element(ElementData),
    /// Text content.
    Text(String),
    /// Comment (preserved for serialization).
    Comment(String),
    /// Document type declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// A node in the arena DOM.
#[derive(Debug)]
pub(crate) struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based DOM tree.
///
/// Detached subtrees stay allocated in the arena; they are simply no longer
/// reachable from the document root. Handles to them remain valid, so a
/// detached node can be re-appended later.
pub(crate) struct Tree {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Tree {
    /// Create a new empty tree with a document root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        tree.document = tree.alloc(Node::new(NodeData::Document));
        tree
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    ///
    /// The `id`, `class`, and `style` attributes are consumed into dedicated
    /// element state; remaining attributes keep their source order.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let mut id = None;
        let mut classes = Vec::new();
        let mut style_decls = Vec::new();
        let mut rest = Vec::with_capacity(attrs.len());

        for attr in attrs {
            match attr.name.local.as_ref() {
                "id" => id = Some(attr.value),
                "class" => {
                    classes = attr
                        .value
                        .split_whitespace()
                        .map(|s| s.to_string())
                        .collect();
                }
                "style" => style_decls = style::parse_style_attribute(&attr.value),
                _ => rest.push(attr),
            }
        }

        self.alloc(Node::new(NodeData::Element(ElementData {
            name,
            attrs: rest,
            id,
            classes,
            style: style_decls,
        })))
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Detach a node from its parent, leaving it (and its subtree) free to
    /// be inserted elsewhere. No-op for nodes that have no parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let parent = node.parent;
        let prev = node.prev_sibling;
        let next = node.next_sibling;

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = next;
        }
        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = prev;
        }
        if let Some(par) = self.get_mut(parent) {
            if par.first_child == id {
                par.first_child = next;
            }
            if par.last_child == id {
                par.last_child = prev;
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append a child to a parent node, detaching it from its current
    /// parent first (move semantics).
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);

        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling, detaching it from its current parent
    /// first. No-op if the sibling itself is detached.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let Some(parent) = self.get(sibling).map(|n| n.parent).filter(|p| p.is_some()) else {
            return;
        };
        self.detach(new_node);
        let prev = self.get(sibling).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = new_node;
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text to an existing text node, or create new if last child
    /// isn't text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Deep-copy a subtree from another tree into this one.
    ///
    /// Returns the root of the adopted copy, detached and ready to insert.
    pub fn adopt(&mut self, src: &Tree, node: NodeId) -> Option<NodeId> {
        self.adopt_mapped(src, node, &mut HashMap::new())
    }

    /// As [`adopt`](Self::adopt), recording every src-to-copy id pair in
    /// `map` so callers adopting several nodes can resolve one that sits
    /// inside an earlier node's subtree to its existing copy.
    pub fn adopt_mapped(
        &mut self,
        src: &Tree,
        node: NodeId,
        map: &mut HashMap<NodeId, NodeId>,
    ) -> Option<NodeId> {
        let data = src.get(node)?.data.clone();
        let copy = self.alloc(Node::new(data));
        map.insert(node, copy);
        for child in src.children(node).collect::<Vec<_>>() {
            if let Some(adopted) = self.adopt_mapped(src, child, map) {
                self.append(copy, adopted);
            }
        }
        Some(copy)
    }

    /// Get the number of nodes ever allocated, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        ChildrenIter {
            tree: self,
            current: first,
        }
    }

    /// Iterate over a subtree in document order, starting at (and including)
    /// `root`.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            next: if self.get(root).is_some() { root } else { NodeId::NONE },
        }
    }

    /// Find the first element matching a predicate (document order).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(|node| predicate(node)))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| {
            if let NodeData::Element(data) = &node.data {
                data.name.local.as_ref() == tag
            } else {
                false
            }
        })
    }

    /// Check whether `ancestor` is on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).map(|n| n.parent).unwrap_or(NodeId::NONE);
        while let Some(n) = self.get(current) {
            if current == ancestor {
                return true;
            }
            current = n.parent;
        }
        false
    }

    /// Parent of a node, if attached.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_some())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub(crate) struct ChildrenIter<'a> {
    tree: &'a Tree,
    current: NodeId,
}

impl<'a> Iterator for ChildrenIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .tree
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order traversal of a subtree.
pub(crate) struct Descendants<'a> {
    tree: &'a Tree,
    root: NodeId,
    next: NodeId,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_none() {
            return None;
        }
        let current = self.next;

        // Successor: first child, else next sibling, else climb until a
        // sibling exists or the subtree root is reached.
        let mut successor = self
            .tree
            .get(current)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        if successor.is_none() {
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break;
                }
                let Some(node) = self.tree.get(cursor) else { break };
                if node.next_sibling.is_some() {
                    successor = node.next_sibling;
                    break;
                }
                if node.parent.is_none() {
                    break;
                }
                cursor = node.parent;
            }
        }

        self.next = successor;
        Some(current)
    }
}

/// Accessors and mutation helpers for element nodes.
///
/// Mutators silently ignore missing nodes and non-element nodes; selections
/// route every per-node operation through these, so tolerance lives here.
impl Tree {
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        })
    }

    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.as_element(id).map(|data| &data.name.local)
    }

    /// Get element's namespace.
    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.as_element(id).map(|data| &data.name.ns)
    }

    /// Get an attribute value. `id`, `class`, and `style` are synthesized
    /// back from their extracted state.
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<String> {
        let data = self.as_element(id)?;
        match attr_name {
            "id" => data.id.clone(),
            "class" => {
                if data.classes.is_empty() {
                    None
                } else {
                    Some(data.classes.join(" "))
                }
            }
            "style" => {
                if data.style.is_empty() {
                    None
                } else {
                    Some(style::style_to_attr(&data.style))
                }
            }
            _ => data
                .attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.clone()),
        }
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).and_then(|data| data.id.as_deref())
    }

    /// Get element's classes.
    pub fn element_classes(&self, id: NodeId) -> &[String] {
        self.as_element(id)
            .map(|data| data.classes.as_slice())
            .unwrap_or(&[])
    }

    /// Add a class token. Duplicates, empty tokens, and tokens containing
    /// whitespace are ignored.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        // A token with whitespace would split into several on reparse.
        if class.is_empty() || class.contains(char::is_whitespace) {
            return;
        }
        if let Some(data) = self.as_element_mut(id)
            && !data.classes.iter().any(|c| c == class)
        {
            data.classes.push(class.to_string());
        }
    }

    /// Remove every occurrence of a class token. Absent and empty tokens
    /// are ignored.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() {
            return;
        }
        if let Some(data) = self.as_element_mut(id) {
            data.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element_classes(id).iter().any(|c| c == class)
    }

    /// Set the id attribute.
    pub fn set_id(&mut self, id: NodeId, value: &str) {
        if let Some(data) = self.as_element_mut(id) {
            data.id = Some(value.to_string());
        }
    }

    /// Set one inline style property, replacing an existing declaration for
    /// the same property in place.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(data) = self.as_element_mut(id) {
            style::set_property(&mut data.style, property, value);
        }
    }

    /// Get one inline style property value.
    pub fn style_value(&self, id: NodeId, property: &str) -> Option<String> {
        self.as_element(id)
            .and_then(|data| style::get_property(&data.style, property))
            .map(|v| v.to_string())
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.as_element(id).is_some()
    }

    /// Check if node can hold children (document root or element).
    pub fn is_container(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Document | NodeData::Element(_)))
    }

    /// Get text content of a text node.
    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of a whole subtree, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text_of(node) {
                out.push_str(text);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use html5ever::ns;

    use super::*;

    fn make_qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    fn make_attr(local: &str, value: &str) -> Attribute {
        Attribute {
            name: make_qname(local),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_create_elements() {
        let mut tree = Tree::new();

        let div = tree.create_element(
            make_qname("div"),
            vec![make_attr("id", "main"), make_attr("class", "card wide")],
        );

        tree.append(tree.document(), div);

        assert_eq!(tree.element_name(div).unwrap().as_ref(), "div");
        assert_eq!(tree.element_id(div), Some("main"));
        assert_eq!(tree.element_classes(div), ["card", "wide"]);
        assert_eq!(tree.attr(div, "class").as_deref(), Some("card wide"));
    }

    #[test]
    fn test_append_children() {
        let mut tree = Tree::new();

        let parent = tree.create_element(make_qname("div"), vec![]);
        let child1 = tree.create_element(make_qname("p"), vec![]);
        let child2 = tree.create_element(make_qname("p"), vec![]);

        tree.append(tree.document(), parent);
        tree.append(parent, child1);
        tree.append(parent, child2);

        let children: Vec<_> = tree.children(parent).collect();
        assert_eq!(children, [child1, child2]);
    }

    #[test]
    fn test_append_moves_between_parents() {
        let mut tree = Tree::new();

        let first = tree.create_element(make_qname("ul"), vec![]);
        let second = tree.create_element(make_qname("ul"), vec![]);
        let item = tree.create_element(make_qname("li"), vec![]);

        tree.append(tree.document(), first);
        tree.append(tree.document(), second);
        tree.append(first, item);
        tree.append(second, item);

        assert_eq!(tree.children(first).count(), 0);
        let children: Vec<_> = tree.children(second).collect();
        assert_eq!(children, [item]);
        assert_eq!(tree.parent_of(item), Some(second));
    }

    #[test]
    fn test_detach_middle_child() {
        let mut tree = Tree::new();

        let parent = tree.create_element(make_qname("div"), vec![]);
        let a = tree.create_element(make_qname("i"), vec![]);
        let b = tree.create_element(make_qname("b"), vec![]);
        let c = tree.create_element(make_qname("u"), vec![]);

        tree.append(tree.document(), parent);
        tree.append(parent, a);
        tree.append(parent, b);
        tree.append(parent, c);

        tree.detach(b);

        let children: Vec<_> = tree.children(parent).collect();
        assert_eq!(children, [a, c]);
        assert_eq!(tree.parent_of(b), None);
    }

    #[test]
    fn test_insert_before() {
        let mut tree = Tree::new();

        let parent = tree.create_element(make_qname("div"), vec![]);
        let a = tree.create_element(make_qname("i"), vec![]);
        let b = tree.create_element(make_qname("b"), vec![]);

        tree.append(tree.document(), parent);
        tree.append(parent, b);
        tree.insert_before(b, a);

        let children: Vec<_> = tree.children(parent).collect();
        assert_eq!(children, [a, b]);
        assert_eq!(tree.get(parent).unwrap().first_child, a);
    }

    #[test]
    fn test_text_merging() {
        let mut tree = Tree::new();

        let p = tree.create_element(make_qname("p"), vec![]);
        tree.append(tree.document(), p);

        tree.append_text(p, "Hello, ");
        tree.append_text(p, "World!");

        let children: Vec<_> = tree.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(tree.text_of(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_class_mutation() {
        let mut tree = Tree::new();
        let div = tree.create_element(make_qname("div"), vec![]);
        tree.append(tree.document(), div);

        tree.add_class(div, "note");
        tree.add_class(div, "note");
        tree.add_class(div, "");
        assert_eq!(tree.element_classes(div), ["note"]);

        tree.remove_class(div, "missing");
        tree.remove_class(div, "");
        assert_eq!(tree.element_classes(div), ["note"]);

        tree.remove_class(div, "note");
        assert!(tree.element_classes(div).is_empty());
    }

    #[test]
    fn test_mutation_tolerates_non_elements() {
        let mut tree = Tree::new();
        let text = tree.create_text("hi".to_string());
        tree.append(tree.document(), text);

        tree.add_class(text, "x");
        tree.set_id(text, "y");
        tree.set_style_property(text, "color", "red");

        assert!(tree.element_classes(text).is_empty());
        assert_eq!(tree.attr(text, "id"), None);
    }

    #[test]
    fn test_descendants_order() {
        let mut tree = Tree::new();
        let a = tree.create_element(make_qname("a"), vec![]);
        let b = tree.create_element(make_qname("b"), vec![]);
        let c = tree.create_element(make_qname("c"), vec![]);
        let d = tree.create_element(make_qname("d"), vec![]);

        // <a><b><c/></b><d/></a>
        tree.append(tree.document(), a);
        tree.append(a, b);
        tree.append(b, c);
        tree.append(a, d);

        let order: Vec<_> = tree.descendants(a).collect();
        assert_eq!(order, [a, b, c, d]);

        // Traversal stays inside the subtree root.
        let order: Vec<_> = tree.descendants(b).collect();
        assert_eq!(order, [b, c]);
    }

    #[test]
    fn test_adopt_copies_subtree() {
        let mut src = Tree::new();
        let ul = src.create_element(make_qname("ul"), vec![make_attr("id", "menu")]);
        let li = src.create_element(make_qname("li"), vec![]);
        src.append(src.document(), ul);
        src.append(ul, li);
        src.append_text(li, "Home");

        let mut dst = Tree::new();
        let adopted = dst.adopt(&src, ul).unwrap();
        dst.append(dst.document(), adopted);

        assert_eq!(dst.element_id(adopted), Some("menu"));
        assert_eq!(dst.text_content(adopted), "Home");
        // Source is untouched.
        assert_eq!(src.text_content(ul), "Home");
    }

    #[test]
    fn test_adopt_mapped_records_every_copy() {
        let mut src = Tree::new();
        let ul = src.create_element(make_qname("ul"), vec![]);
        let li = src.create_element(make_qname("li"), vec![]);
        src.append(src.document(), ul);
        src.append(ul, li);

        let mut dst = Tree::new();
        let mut map = HashMap::new();
        let copy = dst.adopt_mapped(&src, ul, &mut map).unwrap();

        assert_eq!(map[&ul], copy);
        assert_eq!(dst.parent_of(map[&li]), Some(copy));
    }

    #[test]
    fn test_is_ancestor() {
        let mut tree = Tree::new();
        let outer = tree.create_element(make_qname("div"), vec![]);
        let inner = tree.create_element(make_qname("span"), vec![]);
        tree.append(tree.document(), outer);
        tree.append(outer, inner);

        assert!(tree.is_ancestor(outer, inner));
        assert!(tree.is_ancestor(tree.document(), inner));
        assert!(!tree.is_ancestor(inner, outer));
        assert!(!tree.is_ancestor(inner, inner));
    }
}

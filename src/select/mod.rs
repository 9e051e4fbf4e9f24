//! Chainable selections over document nodes.
//!
//! [`Document::select`] resolves a CSS selector group to a [`Selection`],
//! a snapshot of matching nodes in document order. Every mutation method
//! returns `&Self`, so calls chain; effects land in the shared document
//! rather than in the selection, which stays immutable after construction.
//!
//! Mutations are expressed as [`Op`] values and funneled through
//! [`Selection::apply`]; see the [`op`] module for the vocabulary.

mod op;

pub use op::{Method, Op, Slot};

use tracing::trace;

use crate::dom::{Document, EventHandler, NodeId};
use crate::error::Result;

impl Document {
    /// Select every element matching a CSS selector group, in document
    /// order. The only failure is malformed selector syntax.
    pub fn select(&self, selector: &str) -> Result<Selection> {
        let nodes = self.query(selector)?;
        Ok(Selection {
            selector: selector.to_string(),
            context: self.clone(),
            nodes,
        })
    }
}

/// A snapshot of matched nodes with chainable mutation methods.
///
/// The node list is fixed at construction; nodes mutated or even detached
/// afterwards stay in the list. All methods that mutate take `&self` and
/// return `&Self` for chaining.
#[derive(Debug, Clone)]
pub struct Selection {
    selector: String,
    context: Document,
    nodes: Vec<NodeId>,
}

impl Selection {
    /// Wrap a single node.
    pub fn from_node(context: &Document, node: NodeId) -> Self {
        Self {
            selector: String::new(),
            context: context.clone(),
            nodes: vec![node],
        }
    }

    /// An empty selection bound to a document. Chained calls on it are
    /// no-ops.
    pub fn empty(context: &Document) -> Self {
        Self {
            selector: String::new(),
            context: context.clone(),
            nodes: Vec::new(),
        }
    }

    /// The selector this selection was built from. Empty for selections
    /// built around explicit nodes.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The document this selection operates on.
    pub fn document(&self) -> &Document {
        &self.context
    }

    /// The matched nodes, in document order at selection time.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.nodes.iter()
    }

    /// The first matched node, unwrapped.
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// The last matched node, unwrapped.
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Apply one operation to every node, front to back. All built-in
    /// methods route through here.
    pub fn apply(&self, op: Op) -> &Self {
        trace!(op = op.label(), nodes = self.nodes.len(), "apply");
        for &node in &self.nodes {
            op.run(&self.context, node);
        }
        self
    }

    /// Add class tokens to every node.
    ///
    /// A single string splits on whitespace and periods, so `"alpha beta"`
    /// and `".alpha.beta"` both add two classes. Token lists are used as
    /// given. Empty tokens are ignored.
    pub fn add_class(&self, classes: impl Into<Classes>) -> &Self {
        self.apply(Op::Invoke(Method::AddClass(classes.into().into_tokens())))
    }

    /// Remove class tokens from every node. Accepts the same token
    /// spellings as [`add_class`](Self::add_class).
    pub fn remove_class(&self, classes: impl Into<Classes>) -> &Self {
        self.apply(Op::Invoke(Method::RemoveClass(
            classes.into().into_tokens(),
        )))
    }

    /// Listen for an event on every node, in the bubble phase.
    ///
    /// Keep a clone of the [`EventHandler`] if you intend to remove it
    /// later; removal matches handler identity.
    pub fn on(&self, event: &str, handler: impl Into<EventHandler>) -> &Self {
        self.apply(Op::Invoke(Method::AddListener {
            event: event.to_string(),
            handler: handler.into(),
        }))
    }

    /// Remove a previously registered handler from every node. A handler
    /// registered via [`on`](Self::on) listens in the bubble phase, so
    /// `use_capture` should be `false` to match it.
    pub fn off(&self, event: &str, handler: &EventHandler, use_capture: bool) -> &Self {
        self.apply(Op::Invoke(Method::RemoveListener {
            event: event.to_string(),
            handler: handler.clone(),
            capture: use_capture,
        }))
    }

    /// Append a child to every node: either a fresh element created from a
    /// tag name, or the nodes of another selection.
    ///
    /// One child instance is appended everywhere, and children move rather
    /// than copy, so with several receivers the child ends up under the
    /// last one. A selection over another document has its nodes adopted
    /// into this one first; an empty receiver adopts nothing.
    pub fn add_child<'a>(&self, child: impl Into<Child<'a>>) -> &Self {
        match child.into() {
            Child::Tag(tag) => {
                let node = self.context.create_element(tag);
                self.apply(Op::Invoke(Method::AppendChildren(vec![node])))
            }
            Child::Nodes(other) => {
                if self.nodes.is_empty() {
                    return self;
                }
                let nodes = self.context.adopt_nodes(&other.context, &other.nodes);
                self.apply(Op::Invoke(Method::AppendChildren(nodes)))
            }
        }
    }

    /// Replace every node in place with markup, or with the serialized
    /// first node of another selection. An empty source selection leaves
    /// the receiver untouched.
    pub fn replace<'a>(&self, replacement: impl Into<Replacement<'a>>) -> &Self {
        let markup = match replacement.into() {
            Replacement::Markup(markup) => markup.to_string(),
            Replacement::Nodes(other) => match other.first() {
                Some(node) => other.context.outer_html(node),
                None => return self,
            },
        };
        self.apply(Op::Assign {
            slot: Slot::OuterHtml,
            value: markup,
        })
    }

    /// Append markup to every node's content.
    ///
    /// The new content is computed once, from the first node's markup at
    /// call time, then assigned to all nodes. Nodes after the first lose
    /// their own content in favor of the first node's.
    pub fn append(&self, markup: &str) -> &Self {
        let Some(first) = self.first() else {
            return self;
        };
        let merged = format!("{}{}", self.context.inner_html(first), markup);
        self.apply(Op::Assign {
            slot: Slot::InnerHtml,
            value: merged,
        })
    }

    /// Replace every node's content with markup.
    pub fn html(&self, markup: &str) -> &Self {
        self.apply(Op::Assign {
            slot: Slot::InnerHtml,
            value: markup.to_string(),
        })
    }

    /// Replace every node's content with literal text. Markup characters
    /// are preserved as text, never parsed.
    pub fn text(&self, text: &str) -> &Self {
        self.apply(Op::Assign {
            slot: Slot::Text,
            value: text.to_string(),
        })
    }

    /// Remove all content from every node.
    pub fn clear(&self) -> &Self {
        self.html("")
    }

    /// Set inline style properties on every node. Each pair is applied
    /// across the whole selection before the next.
    pub fn style<K, V>(&self, properties: &[(K, V)]) -> &Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (property, value) in properties {
            self.apply(Op::Assign {
                slot: Slot::Style(property.as_ref().to_string()),
                value: value.as_ref().to_string(),
            });
        }
        self
    }

    /// Create a detached element wrapped in a fresh selection.
    ///
    /// An empty tag creates a `div`. A leading `#` or `.` on this
    /// selection's selector seeds the new element's id or classes. The
    /// returned selection wraps the element directly, so its own selector
    /// is empty and seeding does not cascade down a chain of `n` calls.
    pub fn n(&self, tag: &str) -> Selection {
        let tag = if tag.is_empty() { "div" } else { tag };
        let node = self.context.create_element(tag);
        let created = Selection::from_node(&self.context, node);
        if let Some(id) = self.selector.strip_prefix('#') {
            self.context.set_id(node, id);
        } else if let Some(classes) = self.selector.strip_prefix('.') {
            created.add_class(classes);
        }
        created
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}

/// Class tokens accepted by [`Selection::add_class`] and
/// [`Selection::remove_class`].
///
/// Strings split into tokens on whitespace and periods; lists pass their
/// items through untouched. Empty tokens survive splitting and are
/// discarded by the document, so `".a..b"` still names two classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classes(Vec<String>);

impl Classes {
    fn into_tokens(self) -> Vec<String> {
        self.0
    }
}

fn split_class_tokens(spec: &str) -> Vec<String> {
    spec.split(|c: char| c.is_whitespace() || c == '.')
        .map(|token| token.to_string())
        .collect()
}

impl From<&str> for Classes {
    fn from(spec: &str) -> Self {
        Self(split_class_tokens(spec))
    }
}

impl From<String> for Classes {
    fn from(spec: String) -> Self {
        Self::from(spec.as_str())
    }
}

impl From<Vec<String>> for Classes {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl From<Vec<&str>> for Classes {
    fn from(tokens: Vec<&str>) -> Self {
        Self(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Classes {
    fn from(tokens: &[&str]) -> Self {
        Self(tokens.iter().map(|token| token.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Classes {
    fn from(tokens: [&str; N]) -> Self {
        Self(tokens.iter().map(|token| token.to_string()).collect())
    }
}

/// Argument to [`Selection::add_child`].
pub enum Child<'a> {
    /// Create one element with this tag name and append it.
    Tag(&'a str),
    /// Append the nodes of another selection.
    Nodes(&'a Selection),
}

impl<'a> From<&'a str> for Child<'a> {
    fn from(tag: &'a str) -> Self {
        Child::Tag(tag)
    }
}

impl<'a> From<&'a Selection> for Child<'a> {
    fn from(selection: &'a Selection) -> Self {
        Child::Nodes(selection)
    }
}

/// Argument to [`Selection::replace`].
pub enum Replacement<'a> {
    /// Markup each node is replaced with.
    Markup(&'a str),
    /// Another selection; its first node is serialized and used as the
    /// markup.
    Nodes(&'a Selection),
}

impl<'a> From<&'a str> for Replacement<'a> {
    fn from(markup: &'a str) -> Self {
        Replacement::Markup(markup)
    }
}

impl<'a> From<&'a Selection> for Replacement<'a> {
    fn from(selection: &'a Selection) -> Self {
        Replacement::Nodes(selection)
    }
}

//! Typed operations applied across a selection.
//!
//! Every mutation a selection performs is a value in a closed vocabulary:
//! invoke a known method, or assign to a known slot. Selection methods
//! build these values and [`Selection::apply`](crate::Selection::apply)
//! interprets them per node, so the whole mutation surface is auditable in
//! one place and new operations extend an enum instead of a string path.

use crate::dom::{Document, EventHandler, NodeId};

/// One operation, applied to each node of a selection in turn.
#[derive(Debug, Clone)]
pub enum Op {
    /// Call a method-like mutation.
    Invoke(Method),
    /// Assign a value to a content or style slot.
    Assign { slot: Slot, value: String },
}

/// Method-like mutations a selection can invoke.
#[derive(Debug, Clone)]
pub enum Method {
    /// Add class tokens.
    AddClass(Vec<String>),
    /// Remove class tokens.
    RemoveClass(Vec<String>),
    /// Register an event listener for the bubble phase.
    AddListener { event: String, handler: EventHandler },
    /// Remove a listener by handler identity and phase.
    RemoveListener {
        event: String,
        handler: EventHandler,
        capture: bool,
    },
    /// Append nodes as children, in order. The ids must belong to the
    /// document the operation runs against. Nodes move; appending the
    /// same node under several parents leaves it under the last one.
    AppendChildren(Vec<NodeId>),
}

/// Slots a selection can assign to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The node itself; the value is markup that replaces it in place.
    OuterHtml,
    /// The node's children; the value is markup.
    InnerHtml,
    /// The node's children; the value is plain text, never parsed.
    Text,
    /// One inline style property.
    Style(String),
}

impl Op {
    /// Run this operation against one node.
    pub(crate) fn run(&self, doc: &Document, node: NodeId) {
        match self {
            Op::Invoke(method) => method.run(doc, node),
            Op::Assign { slot, value } => match slot {
                Slot::OuterHtml => doc.set_outer_html(node, value),
                Slot::InnerHtml => doc.set_inner_html(node, value),
                Slot::Text => doc.set_text(node, value),
                Slot::Style(property) => doc.set_style_property(node, property, value),
            },
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Op::Invoke(Method::AddClass(_)) => "add-class",
            Op::Invoke(Method::RemoveClass(_)) => "remove-class",
            Op::Invoke(Method::AddListener { .. }) => "add-listener",
            Op::Invoke(Method::RemoveListener { .. }) => "remove-listener",
            Op::Invoke(Method::AppendChildren(_)) => "append-children",
            Op::Assign {
                slot: Slot::OuterHtml,
                ..
            } => "assign-outer",
            Op::Assign {
                slot: Slot::InnerHtml,
                ..
            } => "assign-inner",
            Op::Assign {
                slot: Slot::Text, ..
            } => "assign-text",
            Op::Assign {
                slot: Slot::Style(_),
                ..
            } => "assign-style",
        }
    }
}

impl Method {
    fn run(&self, doc: &Document, node: NodeId) {
        match self {
            Method::AddClass(tokens) => {
                for token in tokens {
                    doc.add_class(node, token);
                }
            }
            Method::RemoveClass(tokens) => {
                for token in tokens {
                    doc.remove_class(node, token);
                }
            }
            Method::AddListener { event, handler } => {
                doc.add_listener(node, event, handler.clone(), false);
            }
            Method::RemoveListener {
                event,
                handler,
                capture,
            } => {
                doc.remove_listener(node, event, handler, *capture);
            }
            Method::AppendChildren(children) => {
                for &child in children {
                    doc.append_child(node, child);
                }
            }
        }
    }
}

//! html5ever TreeSink implementation for the arena tree.

use std::cell::RefCell;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};
use tracing::debug;

use super::arena::{Attribute, NodeData, NodeId, Tree};

/// Parse a complete HTML document into a tree.
///
/// Parsing is lenient: html5ever recovers from malformed markup the same
/// way browsers do, so this never fails.
pub(crate) fn parse_document_tree(html: &str) -> Tree {
    let sink = DomSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_tree()
}

/// Parse an HTML fragment in body context.
///
/// The fragment is wrapped in a minimal document so the tree builder applies
/// normal body insertion rules, then the body's children are handed back
/// along with the tree that owns them.
pub(crate) fn parse_fragment_tree(markup: &str) -> (Tree, Vec<NodeId>) {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{}</body></html>", markup);
    let tree = parse_document_tree(&wrapped);
    let roots: Vec<NodeId> = tree
        .find_by_tag("body")
        .map(|body| tree.children(body).collect())
        .unwrap_or_default();
    debug!(roots = roots.len(), "parsed fragment");
    (tree, roots)
}

/// Handle used by TreeSink to reference nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeHandle(pub NodeId);

impl Default for NodeHandle {
    fn default() -> Self {
        NodeHandle(NodeId::NONE)
    }
}

/// TreeSink implementation that builds a Tree.
///
/// Uses interior mutability (RefCell) because html5ever's TreeSink trait
/// requires methods to take `&self` but we need to mutate the tree.
pub(crate) struct DomSink {
    tree: RefCell<Tree>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for DomSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSink {
    pub fn new() -> Self {
        Self {
            tree: RefCell::new(Tree::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    /// Consume the sink and return the tree.
    pub fn into_tree(self) -> Tree {
        self.tree.into_inner()
    }
}

impl TreeSink for DomSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Ignore parse errors - be lenient like browsers
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle(self.tree.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let tree = self.tree.borrow();
        let node = tree.get(target.0);
        match node {
            Some(n) => match &n.data {
                NodeData::Element(data) => {
                    // SAFETY: The QualName is stored in the arena, which lives
                    // as long as self; nodes are never deallocated while the
                    // sink exists. The borrow checker can't see through the
                    // RefCell, so the lifetime is extended manually.
                    unsafe { std::mem::transmute::<&QualName, &'a QualName>(&data.name) }
                }
                _ => &EMPTY,
            },
            None => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let converted_attrs: Vec<Attribute> = attrs
            .into_iter()
            .map(|a| Attribute {
                name: a.name,
                value: a.value.to_string(),
            })
            .collect();

        let id = self.tree.borrow_mut().create_element(name, converted_attrs);
        NodeHandle(id)
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        let id = self.tree.borrow_mut().create_comment(text.to_string());
        NodeHandle(id)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions - create as comment
        NodeHandle(self.tree.borrow_mut().create_comment(String::new()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                tree.append(parent.0, node.0);
            }
            NodeOrText::AppendText(text) => {
                tree.append_text(parent.0, &text);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        // If element has parent, append there; otherwise use prev_element
        let parent = self.tree.borrow().get(element.0).map(|n| n.parent);
        if let Some(parent) = parent
            && parent.is_some()
        {
            let mut tree = self.tree.borrow_mut();
            match child {
                NodeOrText::AppendNode(node) => {
                    tree.append(parent, node.0);
                }
                NodeOrText::AppendText(text) => {
                    tree.append_text(parent, &text);
                }
            }
            return;
        }
        self.append(prev_element, child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut tree = self.tree.borrow_mut();
        let doc = tree.document();
        let doctype = tree.create_doctype(
            name.to_string(),
            public_id.to_string(),
            system_id.to_string(),
        );
        tree.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // For templates, just return the target itself
        // A full implementation would track template contents separately
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                tree.insert_before(sibling.0, node.0);
            }
            NodeOrText::AppendText(text) => {
                let text_node = tree.create_text(text.to_string());
                tree.insert_before(sibling.0, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut tree = self.tree.borrow_mut();
        if let Some(data) = tree.as_element_mut(target.0) {
            for attr in attrs {
                if !data.attrs.iter().any(|a| a.name == attr.name) {
                    data.attrs.push(Attribute {
                        name: attr.name,
                        value: attr.value.to_string(),
                    });
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.tree.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        // Collect children first to avoid borrow issues
        let children: Vec<_> = self.tree.borrow().children(node.0).collect();

        let mut tree = self.tree.borrow_mut();
        for child in children {
            tree.append(new_parent.0, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let tree = parse_document_tree("<html><body><p>Hello</p></body></html>");

        // Should have document + html + head + body + p + text
        assert!(tree.len() > 3);

        let p = tree.find_by_tag("p").expect("should find p");
        assert_eq!(tree.element_name(p).unwrap().as_ref(), "p");

        let text_id = tree.children(p).next().expect("p should have child");
        assert_eq!(tree.text_of(text_id), Some("Hello"));
    }

    #[test]
    fn test_attributes() {
        let tree = parse_document_tree(
            r#"<div id="main" class="container header" style="color: red" data-k="v">Content</div>"#,
        );

        let div = tree.find_by_tag("div").expect("should find div");
        assert_eq!(tree.element_id(div), Some("main"));

        let classes = tree.element_classes(div);
        assert!(classes.contains(&"container".to_string()));
        assert!(classes.contains(&"header".to_string()));

        assert_eq!(tree.style_value(div, "color").as_deref(), Some("red"));
        assert_eq!(tree.attr(div, "data-k").as_deref(), Some("v"));
    }

    #[test]
    fn test_nested_structure() {
        let tree = parse_document_tree(
            r#"
            <div>
                <p>First</p>
                <p>Second</p>
            </div>
        "#,
        );

        let div = tree.find_by_tag("div").expect("should find div");
        let p_children: Vec<_> = tree
            .children(div)
            .filter(|&c| tree.element_name(c).is_some_and(|n| n.as_ref() == "p"))
            .collect();
        assert_eq!(p_children.len(), 2);
    }

    #[test]
    fn test_fragment_parse() {
        let (tree, roots) = parse_fragment_tree("<li>one</li><li>two</li>");

        assert_eq!(roots.len(), 2);
        for root in &roots {
            assert_eq!(tree.element_name(*root).unwrap().as_ref(), "li");
        }
        assert_eq!(tree.text_content(roots[0]), "one");
        assert_eq!(tree.text_content(roots[1]), "two");
    }

    #[test]
    fn test_fragment_parse_bare_text() {
        let (tree, roots) = parse_fragment_tree("just text");

        assert_eq!(roots.len(), 1);
        assert_eq!(tree.text_of(roots[0]), Some("just text"));
    }

    #[test]
    fn test_fragment_parse_empty() {
        let (_, roots) = parse_fragment_tree("");
        assert!(roots.is_empty());
    }
}

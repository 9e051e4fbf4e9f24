//! selectors crate Element implementation for the arena tree.
//!
//! This enables CSS selector matching against our DOM.

use std::fmt;

use html5ever::{LocalName, Namespace, ns};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::MatchingContext;
use selectors::matching::ElementSelectorFlags;
use selectors::parser::SelectorParseErrorKind;
use selectors::{OpaqueElement, SelectorImpl};

use super::arena::{NodeData, NodeId, Tree};

/// Our selector implementation for the selectors crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItsySelectors;

/// Identifier string type for attribute values, ids, and prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub(crate) struct CssString(pub String);

impl precomputed_hash::PrecomputedHash for CssString {
    fn precomputed_hash(&self) -> u32 {
        // Simple hash based on string content
        let mut h: u32 = 0;
        for byte in self.0.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        h
    }
}

impl AsRef<str> for CssString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CssString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for CssString {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for CssString {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// Wrapper type for LocalName that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Wrapper type for Namespace that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'a> From<&'a str> for CssNamespace {
    fn from(s: &'a str) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'i> selectors::parser::Parser<'i> for ItsySelectors {
    type Impl = ItsySelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// Pseudo-element type (not used but required by trait).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = ItsySelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// Non-TS pseudo-class type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum NonTSPseudoClass {
    Link,
    Visited,
    Hover,
    Active,
    Focus,
}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = ItsySelectors;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Hover | Self::Active)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, Self::Hover | Self::Active | Self::Focus)
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        match self {
            Self::Link => dest.write_str(":link"),
            Self::Visited => dest.write_str(":visited"),
            Self::Hover => dest.write_str(":hover"),
            Self::Active => dest.write_str(":active"),
            Self::Focus => dest.write_str(":focus"),
        }
    }
}

impl SelectorImpl for ItsySelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = CssString;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Reference to an element in the tree for selector matching.
#[derive(Clone, Copy)]
pub(crate) struct ElementRef<'a> {
    pub tree: &'a Tree,
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(tree: &'a Tree, id: NodeId) -> Self {
        Self { tree, id }
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.tree.element_name(self.id))
            .finish()
    }
}

impl<'a> selectors::Element for ElementRef<'a> {
    type Impl = ItsySelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        let node = self.tree.get(self.id)?;
        if node.parent.is_none() {
            return None;
        }
        // Only return if parent is an element
        if self.tree.is_element(node.parent) {
            Some(Self::new(self.tree, node.parent))
        } else {
            None
        }
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let node = self.tree.get(self.id)?;
        let mut current = node.prev_sibling;
        while current.is_some() {
            if self.tree.is_element(current) {
                return Some(Self::new(self.tree, current));
            }
            current = self.tree.get(current)?.prev_sibling;
        }
        None
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let node = self.tree.get(self.id)?;
        let mut current = node.next_sibling;
        while current.is_some() {
            if self.tree.is_element(current) {
                return Some(Self::new(self.tree, current));
            }
            current = self.tree.get(current)?.next_sibling;
        }
        None
    }

    fn first_element_child(&self) -> Option<Self> {
        for child in self.tree.children(self.id) {
            if self.tree.is_element(child) {
                return Some(Self::new(self.tree, child));
            }
        }
        None
    }

    fn is_html_element_in_html_document(&self) -> bool {
        // Assume HTML document
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.tree
            .element_name(self.id)
            .is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        self.tree
            .element_namespace(self.id)
            .is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        let self_name = self.tree.element_name(self.id);
        let other_name = other.tree.element_name(other.id);
        self_name == other_name
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        let Some(data) = self.tree.as_element(self.id) else {
            return false;
        };

        let ns_matches = |attr_ns: &Namespace| match ns {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Specific(url) => *attr_ns == url.0,
        };

        // id, class, and style live in extracted element state rather than
        // the attribute list, so synthesize their values for matching.
        match local_name.0.as_ref() {
            "id" | "class" | "style" => {
                if !ns_matches(&ns!()) {
                    return false;
                }
                match self.tree.attr(self.id, local_name.0.as_ref()) {
                    Some(value) => operation.eval_str(&value),
                    None => false,
                }
            }
            _ => {
                for attr in &data.attrs {
                    if !ns_matches(&attr.name.ns) || attr.name.local != local_name.0 {
                        continue;
                    }
                    return operation.eval_str(&attr.value);
                }
                false
            }
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            NonTSPseudoClass::Link => self.is_link(),
            // Other pseudo-classes don't apply in static context
            _ => false,
        }
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        let is_anchor = self
            .tree
            .element_name(self.id)
            .is_some_and(|n| n.as_ref() == "a");
        is_anchor && self.tree.attr(self.id, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        let Some(elem_id) = self.tree.element_id(self.id) else {
            return false;
        };
        case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes())
    }

    fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.tree
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        for child in self.tree.children(self.id) {
            let Some(node) = self.tree.get(child) else {
                continue;
            };
            match &node.data {
                NodeData::Element(_) => return false,
                NodeData::Text(t) if !t.trim().is_empty() => return false,
                _ => {}
            }
        }
        true
    }

    fn is_root(&self) -> bool {
        // Root is the html element (child of document)
        let parent = self.tree.get(self.id).map(|n| n.parent);
        if let Some(parent) = parent
            && let Some(parent_node) = self.tree.get(parent)
        {
            return matches!(parent_node.data, NodeData::Document);
        }
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {
        // We don't need to track selector flags for our use case
    }

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        // No bloom filter support needed
        false
    }

    fn has_custom_state(&self, _name: &CssString) -> bool {
        false
    }
}

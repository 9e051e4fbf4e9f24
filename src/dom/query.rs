//! CSS selector queries over the tree.

use cssparser::{Parser, ParserInput};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::parser::Selector;

use super::arena::{NodeId, Tree};
use super::element_ref::{ElementRef, ItsySelectors};
use crate::error::{Error, Result};

/// Compile a selector group ("div, .card") into matchable selectors.
///
/// Malformed selector syntax is the one error this crate surfaces; a query
/// that merely matches nothing is not an error.
pub(crate) fn compile(selector: &str) -> Result<Vec<Selector<ItsySelectors>>> {
    let mut parser_input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut parser_input);
    let list = selectors::parser::SelectorList::parse(
        &ItsySelectors,
        &mut parser,
        selectors::parser::ParseRelative::No,
    )
    .map_err(|e| Error::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e.kind),
    })?;

    Ok(list.slice().to_vec())
}

/// All elements under the document root matching any of the selectors, in
/// document order.
pub(crate) fn match_all(tree: &Tree, selectors: &[Selector<ItsySelectors>]) -> Vec<NodeId> {
    let mut caches = SelectorCaches::default();
    let mut context = MatchingContext::new(
        selectors::matching::MatchingMode::Normal,
        None,
        &mut caches,
        selectors::context::QuirksMode::NoQuirks,
        selectors::matching::NeedsSelectorFlags::No,
        selectors::matching::MatchingForInvalidation::No,
    );

    tree.descendants(tree.document())
        .filter(|&id| tree.is_element(id))
        .filter(|&id| {
            let elem = ElementRef::new(tree, id);
            selectors.iter().any(|selector| {
                selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tree_sink::parse_document_tree;

    fn query(tree: &Tree, selector: &str) -> Vec<NodeId> {
        let selectors = compile(selector).unwrap();
        match_all(tree, &selectors)
    }

    #[test]
    fn test_document_order() {
        let tree = parse_document_tree(
            r#"<div class="a"><span class="a">1</span></div><p class="a">2</p>"#,
        );
        let found = query(&tree, ".a");
        assert_eq!(found.len(), 3);

        let tags: Vec<_> = found
            .iter()
            .map(|&id| tree.element_name(id).unwrap().to_string())
            .collect();
        assert_eq!(tags, ["div", "span", "p"]);
    }

    #[test]
    fn test_selector_group() {
        let tree = parse_document_tree("<h1>t</h1><p>a</p><p>b</p>");
        assert_eq!(query(&tree, "h1, p").len(), 3);
        assert_eq!(query(&tree, "h1, missing").len(), 1);
    }

    #[test]
    fn test_no_match_is_empty() {
        let tree = parse_document_tree("<p>only</p>");
        assert!(query(&tree, ".nope").is_empty());
        assert!(query(&tree, "#nope").is_empty());
    }

    #[test]
    fn test_invalid_selector_is_error() {
        for bad in ["??", "", "p..", "[unclosed"] {
            let err = compile(bad).unwrap_err();
            let Error::Selector { selector, .. } = err;
            assert_eq!(selector, bad);
        }
    }

    #[test]
    fn test_detached_subtrees_not_matched() {
        let mut tree = parse_document_tree(r#"<div id="a"></div><div id="b"></div>"#);
        let b = tree
            .find(|node| matches!(&node.data,
                crate::dom::arena::NodeData::Element(data) if data.id.as_deref() == Some("b")))
            .unwrap();
        tree.detach(b);

        let found = query(&tree, "div");
        assert_eq!(found.len(), 1);
        assert_eq!(tree.element_id(found[0]), Some("a"));
    }
}

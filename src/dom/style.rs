//! Inline style declarations.
//!
//! Element `style` attributes are parsed into a declaration list so that
//! individual properties can be read and replaced without disturbing the
//! rest. Values are kept as the author wrote them; this layer manages
//! declarations, it does not interpret CSS values.

use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser,
};

/// A CSS declaration (property: value) with the value text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
    pub property: String,
    pub value: String,
}

/// Parse the contents of a `style` attribute into declarations.
///
/// Parsing is lenient: malformed declarations are skipped, valid ones around
/// them survive.
pub(crate) fn parse_style_attribute(css: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    let mut decl_parser = InlineDeclarationParser {
        declarations: &mut declarations,
    };

    for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
        // Ignore errors - lenient parsing
        let _ = result;
    }

    declarations
}

/// Serialize declarations back to `style` attribute text.
pub(crate) fn style_to_attr(declarations: &[Declaration]) -> String {
    let mut out = String::new();
    for decl in declarations {
        if !out.is_empty() {
            out.push_str("; ");
        }
        out.push_str(&decl.property);
        out.push_str(": ");
        out.push_str(&decl.value);
    }
    out
}

/// Set a property, replacing an existing declaration for the same property
/// in place so declaration order is stable. Property names compare
/// case-insensitively.
pub(crate) fn set_property(declarations: &mut Vec<Declaration>, property: &str, value: &str) {
    if let Some(existing) = declarations
        .iter_mut()
        .find(|d| d.property.eq_ignore_ascii_case(property))
    {
        existing.value = value.to_string();
    } else {
        declarations.push(Declaration {
            property: property.to_string(),
            value: value.to_string(),
        });
    }
}

/// Look up a property value.
pub(crate) fn get_property<'a>(declarations: &'a [Declaration], property: &str) -> Option<&'a str> {
    declarations
        .iter()
        .find(|d| d.property.eq_ignore_ascii_case(property))
        .map(|d| d.value.as_str())
}

struct InlineDeclarationParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for InlineDeclarationParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        _input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(_input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        _input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(_input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for InlineDeclarationParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(_input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        _input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(_input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for InlineDeclarationParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        // Capture the raw value text rather than interpreting tokens, so
        // arbitrary values round-trip unchanged.
        let start = input.position();
        while input.next().is_ok() {}
        let value = input.slice_from(start).trim().to_string();

        self.declarations.push(Declaration {
            property: name.to_string(),
            value,
        });

        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for InlineDeclarationParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(property: &str, value: &str) -> Declaration {
        Declaration {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_style_attribute() {
        let decls = parse_style_attribute("color: red; font-size: 12px");
        assert_eq!(decls, [decl("color", "red"), decl("font-size", "12px")]);
    }

    #[test]
    fn test_parse_tolerates_noise() {
        let decls = parse_style_attribute("color: red;; ; border: 1px solid black;");
        assert_eq!(
            decls,
            [decl("color", "red"), decl("border", "1px solid black")]
        );
    }

    #[test]
    fn test_parse_keeps_quoted_semicolons() {
        let decls = parse_style_attribute("background: url('a;b.png'); color: blue");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "background");
        assert_eq!(decls[0].value, "url('a;b.png')");
        assert_eq!(decls[1], decl("color", "blue"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_style_attribute("").is_empty());
        assert!(parse_style_attribute("   ").is_empty());
    }

    #[test]
    fn test_set_property_replaces_in_place() {
        let mut decls = vec![decl("color", "red"), decl("margin", "4px")];

        set_property(&mut decls, "color", "blue");
        assert_eq!(decls, [decl("color", "blue"), decl("margin", "4px")]);

        set_property(&mut decls, "padding", "2px");
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[2], decl("padding", "2px"));
    }

    #[test]
    fn test_property_names_case_insensitive() {
        let mut decls = vec![decl("Color", "red")];
        assert_eq!(get_property(&decls, "color"), Some("red"));

        set_property(&mut decls, "COLOR", "green");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].value, "green");
    }

    #[test]
    fn test_style_to_attr() {
        let decls = vec![decl("color", "red"), decl("font-size", "12px")];
        assert_eq!(style_to_attr(&decls), "color: red; font-size: 12px");
        assert_eq!(style_to_attr(&[]), "");
    }
}

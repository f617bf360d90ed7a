//! Generic accessors over the labeling XML vocabulary
//!
//! The pipeline consumes subtrees through "get child element" and "get
//! attribute value" helpers; it does not validate the document against a
//! schema. Element and attribute names follow the fixed external vocabulary
//! (`code`, `value`, `displayName`, `effectiveTime`, nested wrappers).

use chrono::NaiveDate;
use roxmltree::Node;

/// A `code`/`codeSystem`/`displayName` attribute triple read from a coded
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedValue {
    pub code: String,
    pub code_system: Option<String>,
    pub display_name: Option<String>,
}

/// First child element with the given tag name, ignoring namespaces.
pub fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// All child elements with the given tag name, in document order.
pub fn child_elements<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .collect()
}

/// Walk a chain of single child elements, e.g.
/// `descend(section, &["subject2", "substanceAdministration"])`.
pub fn descend<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for name in path {
        current = child_element(current, name)?;
    }
    Some(current)
}

/// Attribute value on the element itself.
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

/// Attribute value on a named child element, e.g. the `value` of a
/// `<sequenceNumber value="2"/>` child.
pub fn child_attr<'a>(node: Node<'a, '_>, child: &str, name: &str) -> Option<&'a str> {
    child_element(node, child).and_then(|n| n.attribute(name))
}

/// Read the `code` child of an element as a `CodedValue`.
///
/// Returns None when the `code` child or its `code` attribute is missing;
/// callers treat that as a data error on the specific entity, not a
/// structural failure.
pub fn coded_value(node: Node) -> Option<CodedValue> {
    let code_el = child_element(node, "code")?;
    let code = code_el.attribute("code")?.to_string();
    Some(CodedValue {
        code,
        code_system: code_el.attribute("codeSystem").map(str::to_string),
        display_name: code_el.attribute("displayName").map(str::to_string),
    })
}

/// Concatenated text content of an element and its descendants, trimmed.
pub fn element_text(node: Node) -> Option<String> {
    let mut text = String::new();
    for n in node.descendants() {
        if n.is_text() {
            if let Some(t) = n.text() {
                text.push_str(t);
            }
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse an SPL `effectiveTime` value in YYYYMMDD form.
///
/// Malformed values degrade to None rather than failing the subtree.
pub fn parse_spl_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

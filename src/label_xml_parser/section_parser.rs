//! Polymorphic section-parser contract and dispatch
//!
//! One conforming type exists per semantic section kind; the dispatcher
//! selects the variant through a section-code lookup table. A section whose
//! code has no registered parser yields an empty successful result.

use std::collections::HashMap;

use lazy_static::lazy_static;
use roxmltree::Node;

use crate::label_xml_parser::context::ParseContext;
use crate::label_xml_parser::protocol_parser::ProtocolSectionParser;
use crate::label_xml_parser::relationship_parser::RelationshipSectionParser;
use crate::label_xml_parser::xml_helpers;
use crate::types::ParseResult;

/// REMS summary section carrying protocol/requirement/material subtrees.
pub const REMS_SECTION_CODE: &str = "82345-7";
/// Listing data elements section carrying the organization hierarchy.
pub const DATA_ELEMENTS_SECTION_CODE: &str = "48780-1";

/// One section parser variant. Implementations must tolerate missing
/// optional subtrees (returning an empty successful result), record data
/// errors rather than propagating them, and short-circuit only on missing
/// structural context.
pub trait SectionParser: Send + Sync {
    fn section_name(&self) -> &'static str;

    fn parse(&self, node: Node<'_, '_>, ctx: &mut ParseContext<'_>) -> ParseResult;
}

lazy_static! {
    static ref SECTION_PARSERS: HashMap<&'static str, Box<dyn SectionParser>> = {
        let mut m: HashMap<&'static str, Box<dyn SectionParser>> = HashMap::new();
        m.insert(REMS_SECTION_CODE, Box::new(ProtocolSectionParser));
        m.insert(DATA_ELEMENTS_SECTION_CODE, Box::new(RelationshipSectionParser));
        m
    };
}

pub fn parser_for_section_code(code: &str) -> Option<&'static dyn SectionParser> {
    SECTION_PARSERS.get(code).map(|p| p.as_ref())
}

/// Route a section subtree to its parser by the section's `code` child.
pub fn parse_section(node: Node<'_, '_>, ctx: &mut ParseContext<'_>) -> ParseResult {
    let code = xml_helpers::coded_value(node).map(|cv| cv.code);

    match code.as_deref().and_then(parser_for_section_code) {
        Some(parser) => {
            ctx.report_progress(&format!("Parsing section with {}", parser.section_name()));
            parser.parse(node, ctx)
        }
        None => {
            tracing::debug!(
                "{}: no parser registered for section code {:?}, skipping",
                ctx.file_name,
                code
            );
            ParseResult::new()
        }
    }
}

// Module exports for the labeling XML import pipeline

pub mod context;
pub mod protocol_parser;
pub mod ref_marker;
pub mod relationship_parser;
pub mod resolver;
pub mod section_parser;
pub mod validate;
pub mod xml_helpers;

pub use context::{ParseContext, ProductCursor, ProgressFn, SectionCursor};
pub use section_parser::{SectionParser, parse_section, parser_for_section_code};

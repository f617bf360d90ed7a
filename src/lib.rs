//! Import pipeline for structured product labeling documents.
//!
//! Converts HL7 SPL-style labeling XML into a normalized relational graph
//! in SQLite. Section subtrees are routed to polymorphic section parsers;
//! entities are deduplicated through get-or-create resolvers keyed by their
//! business keys; validation failures are recorded but never block
//! persistence, so a malformed element does not abort the rest of the
//! document.

pub mod types;
pub mod logger;

pub mod db;
pub mod label_xml_parser;

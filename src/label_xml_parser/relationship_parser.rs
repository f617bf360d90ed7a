//! Organization hierarchy parser
//!
//! Walks the nested labeler/registrant/establishment chains of the listing
//! data elements section and records one typed, leveled
//! `DocumentRelationship` edge per parent/child organization pair within the
//! current document.
//!
//! Expected subtree shape:
//!
//! ```xml
//! <section>
//!   <code code="48780-1" .../>
//!   <author>
//!     <assignedEntity>
//!       <representedOrganization>
//!         <id extension="111" root="1.3.6.1.4.1.519.1"/>
//!         <name>Labeler</name>
//!         <assignedEntity>
//!           <assignedOrganization>
//!             <id extension="222" root="1.3.6.1.4.1.519.1"/>
//!             <name>Registrant</name>
//!             ...
//!           </assignedOrganization>
//!         </assignedEntity>
//!       </representedOrganization>
//!     </assignedEntity>
//!   </author>
//! </section>
//! ```

use roxmltree::Node;

use crate::db::models::{NewDocumentRelationship, NewOrganization, Organization};
use crate::label_xml_parser::context::ParseContext;
use crate::label_xml_parser::resolver;
use crate::label_xml_parser::section_parser::SectionParser;
use crate::label_xml_parser::xml_helpers::{child_element, child_elements, element_text};
use crate::types::{ImportError, ParseResult};

pub struct RelationshipSectionParser;

impl SectionParser for RelationshipSectionParser {
    fn section_name(&self) -> &'static str {
        "organizationHierarchy"
    }

    fn parse(&self, node: Node<'_, '_>, ctx: &mut ParseContext<'_>) -> ParseResult {
        let mut result = ParseResult::new();

        if let Err(e) = ctx.require_section() {
            tracing::error!("{}: {}", ctx.file_name, e);
            result.fail(e.to_string());
            return result;
        }

        ctx.report_progress("Parsing organization hierarchy");

        for author in child_elements(node, "author") {
            for assigned in child_elements(author, "assignedEntity") {
                for org_node in child_elements(assigned, "representedOrganization") {
                    let Some(root_org) = self.resolve_organization(org_node, ctx, &mut result)
                    else {
                        continue;
                    };
                    self.walk_children(org_node, &root_org, 1, ctx, &mut result);
                }
            }
        }

        result
    }
}

impl RelationshipSectionParser {
    /// Recurse through `assignedEntity/assignedOrganization` wrappers,
    /// creating one edge per parent/child pair, depth-first in document
    /// order.
    fn walk_children(
        &self,
        parent_node: Node<'_, '_>,
        parent_org: &Organization,
        level: i32,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        for assigned in child_elements(parent_node, "assignedEntity") {
            for child_node in child_elements(assigned, "assignedOrganization") {
                let Some(child_org) = self.resolve_organization(child_node, ctx, result) else {
                    continue;
                };

                let candidate = NewDocumentRelationship {
                    document_id: ctx.document_id,
                    parent_organization_id: parent_org.id,
                    child_organization_id: child_org.id,
                    relationship_type: relationship_type_for_level(level),
                    relationship_level: level,
                };

                match resolver::get_or_create_relationship(ctx.conn, candidate) {
                    Ok((resolved, messages)) => {
                        if resolved.was_created() {
                            result.created.relationships += 1;
                        }
                        result.errors.extend(messages);
                    }
                    Err(e) => self.record_persistence_error(ctx, result, e),
                }

                self.walk_children(child_node, &child_org, level + 1, ctx, result);
            }
        }
    }

    fn resolve_organization(
        &self,
        org_node: Node<'_, '_>,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) -> Option<Organization> {
        let id_node = child_element(org_node, "id");
        let Some(identifier_value) = id_node.and_then(|n| n.attribute("extension")) else {
            result.push_error("organization (): missing id extension, skipped".to_string());
            return None;
        };
        let identifier_root = id_node.and_then(|n| n.attribute("root")).unwrap_or("");

        let name = child_element(org_node, "name")
            .and_then(element_text)
            .unwrap_or_default();

        let candidate = NewOrganization {
            organization_name: &name,
            identifier_value,
            identifier_root,
        };

        match resolver::get_or_create_organization(ctx.conn, candidate) {
            Ok((resolved, messages)) => {
                if resolved.was_created() {
                    result.created.organizations += 1;
                }
                result.errors.extend(messages);
                Some(resolved.into_inner())
            }
            Err(e) => {
                self.record_persistence_error(ctx, result, e);
                None
            }
        }
    }

    fn record_persistence_error(
        &self,
        ctx: &ParseContext<'_>,
        result: &mut ParseResult,
        e: ImportError,
    ) {
        tracing::error!("{}: {}", ctx.file_name, e);
        result.push_error(e.to_string());
    }
}

fn relationship_type_for_level(level: i32) -> &'static str {
    match level {
        1 => "LabelerToRegistrant",
        2 => "RegistrantToEstablishment",
        _ => "EstablishmentToEstablishment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_type_for_level() {
        assert_eq!(relationship_type_for_level(1), "LabelerToRegistrant");
        assert_eq!(relationship_type_for_level(2), "RegistrantToEstablishment");
        assert_eq!(relationship_type_for_level(3), "EstablishmentToEstablishment");
        assert_eq!(relationship_type_for_level(7), "EstablishmentToEstablishment");
    }
}

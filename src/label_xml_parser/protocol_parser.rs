//! Protocol section parser
//!
//! The most involved section variant. Within one section subtree it
//! processes, in order: protocol definitions, a first-occurrence approval
//! per protocol, requirement / monitoring-observation components, the
//! stakeholder participations nested under them, then attached materials
//! and electronic resources found elsewhere in the section. The stages are
//! independent; a failure in one records its message and does not block the
//! next.
//!
//! Expected subtree shape:
//!
//! ```xml
//! <section>
//!   <code code="82345-7" .../>
//!   <subject2>
//!     <substanceAdministration>
//!       <componentOf>
//!         <protocol>
//!           <code code="P1" displayName="..."/>
//!           <subjectOf><approval>...</approval></subjectOf>
//!           <component>
//!             <sequenceNumber value="1"/>
//!             <requirement>
//!               <code code="R-ENROLL" .../>
//!               <pauseQuantity value="24" unit="h"/>
//!               <effectiveTime><period value="30" unit="d"/></effectiveTime>
//!               <participation><role><code code="patient" .../></role></participation>
//!             </requirement>
//!           </component>
//!         </protocol>
//!       </componentOf>
//!     </substanceAdministration>
//!   </subject2>
//!   <subjectOf>
//!     <document>
//!       <id root="..."/>
//!       <title>... &lt;ref&gt;MAT-1&lt;/ref&gt;</title>
//!       <text><reference value="patient-guide.pdf"/></text>
//!     </document>
//!   </subjectOf>
//! </section>
//! ```

use std::collections::HashSet;

use roxmltree::Node;

use crate::db::models::{
    NewElectronicResource, NewProtocol, NewProtocolApproval, NewRequirement, NewSectionMaterial,
    NewStakeholder,
};
use crate::label_xml_parser::context::{ParseContext, SectionCursor};
use crate::label_xml_parser::ref_marker::extract_reference_marker;
use crate::label_xml_parser::resolver;
use crate::label_xml_parser::section_parser::SectionParser;
use crate::label_xml_parser::xml_helpers::{
    child_attr, child_element, child_elements, coded_value, descend, element_text, parse_spl_date,
};
use crate::types::{ImportError, ParseResult};

pub struct ProtocolSectionParser;

impl SectionParser for ProtocolSectionParser {
    fn section_name(&self) -> &'static str {
        "remsProtocolSection"
    }

    fn parse(&self, node: Node<'_, '_>, ctx: &mut ParseContext<'_>) -> ParseResult {
        let mut result = ParseResult::new();

        let section = match ctx.require_section() {
            Ok(section) => section,
            Err(e) => {
                tracing::error!("{}: {}", ctx.file_name, e);
                result.fail(e.to_string());
                return result;
            }
        };

        if let Some(product) = &ctx.current_product {
            ctx.report_progress(&format!(
                "Parsing protocol section {} for product {}",
                section.section_guid, product.item_code
            ));
        } else {
            ctx.report_progress(&format!("Parsing protocol section {}", section.section_guid));
        }

        self.parse_protocols(node, &section, ctx, &mut result);
        self.parse_materials(node, &section, ctx, &mut result);
        self.parse_electronic_resources(node, &section, ctx, &mut result);

        tracing::info!(
            "{}: section {} done, {} entities created, {} messages",
            ctx.file_name,
            section.section_guid,
            result.created.total(),
            result.errors.len()
        );

        result
    }
}

impl ProtocolSectionParser {
    /// Stages 1-4: protocols, first-occurrence approvals, requirement
    /// components and their stakeholder participations.
    fn parse_protocols(
        &self,
        section_node: Node<'_, '_>,
        section: &SectionCursor,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        let mut seen_protocol_codes: HashSet<String> = HashSet::new();

        for subject in child_elements(section_node, "subject2") {
            let Some(administration) = child_element(subject, "substanceAdministration") else {
                continue;
            };

            for component_of in child_elements(administration, "componentOf") {
                for protocol_node in child_elements(component_of, "protocol") {
                    let Some(cv) = coded_value(protocol_node) else {
                        result.push_error("protocol (): missing code element, skipped");
                        continue;
                    };

                    let candidate = NewProtocol {
                        section_id: section.section_id,
                        protocol_code: &cv.code,
                        code_system: cv.code_system.as_deref(),
                        display_name: cv.display_name.as_deref(),
                    };

                    let protocol = match resolver::get_or_create_protocol(ctx.conn, candidate) {
                        Ok((resolved, messages)) => {
                            if resolved.was_created() {
                                result.created.protocols += 1;
                            }
                            result.errors.extend(messages);
                            resolved.into_inner()
                        }
                        Err(e) => {
                            self.record_persistence_error(ctx, result, e);
                            continue;
                        }
                    };

                    ctx.report_progress(&format!("Protocol {}", protocol.protocol_code));

                    if seen_protocol_codes.insert(protocol.protocol_code.clone()) {
                        self.parse_approval(protocol_node, protocol.id, ctx, result);
                    }

                    self.parse_requirements(protocol_node, protocol.id, ctx, result);
                }
            }
        }
    }

    /// Stage 2: one approval record per protocol, taken from the first
    /// occurrence of the protocol in the section.
    fn parse_approval(
        &self,
        protocol_node: Node<'_, '_>,
        protocol_id: i32,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        let Some(approval_node) =
            child_element(protocol_node, "subjectOf").and_then(|n| child_element(n, "approval"))
        else {
            return;
        };

        let Some(cv) = coded_value(approval_node) else {
            result.push_error(format!(
                "approval (protocol id {}): missing code element, skipped",
                protocol_id
            ));
            return;
        };

        let effective_date = descend(approval_node, &["effectiveTime", "low"])
            .and_then(|n| n.attribute("value"))
            .and_then(parse_spl_date);

        let territory_code = descend(
            approval_node,
            &["author", "territorialAuthority", "territory"],
        )
        .and_then(|n| child_attr(n, "code", "code"));

        let candidate = NewProtocolApproval {
            protocol_id,
            approval_code: &cv.code,
            display_name: cv.display_name.as_deref(),
            territory_code,
            effective_date,
        };

        match resolver::get_or_create_approval(ctx.conn, candidate) {
            Ok((resolved, messages)) => {
                if resolved.was_created() {
                    result.created.approvals += 1;
                }
                result.errors.extend(messages);
            }
            Err(e) => self.record_persistence_error(ctx, result, e),
        }
    }

    /// Stages 3-4: requirement / monitoring-observation components and the
    /// stakeholder participations nested under them.
    fn parse_requirements(
        &self,
        protocol_node: Node<'_, '_>,
        protocol_id: i32,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        for component in child_elements(protocol_node, "component") {
            let (requirement_node, is_monitoring) =
                match child_element(component, "requirement") {
                    Some(n) => (n, false),
                    None => match child_element(component, "monitoringObservation") {
                        Some(n) => (n, true),
                        None => continue,
                    },
                };

            let Some(cv) = coded_value(requirement_node) else {
                result.push_error(format!(
                    "requirement (protocol id {}): missing code element, skipped",
                    protocol_id
                ));
                continue;
            };

            let Some(sequence_str) = child_attr(component, "sequenceNumber", "value") else {
                result.push_error(format!(
                    "requirement ({}): missing sequence number, skipped",
                    cv.code
                ));
                continue;
            };

            let sequence_number: i32 = match sequence_str.parse() {
                Ok(n) => n,
                Err(_) => {
                    result.push_error(format!(
                        "requirement ({}): invalid sequence number '{}', skipped",
                        cv.code, sequence_str
                    ));
                    continue;
                }
            };

            let pause_node = child_element(requirement_node, "pauseQuantity");
            let pause_quantity_value = pause_node
                .and_then(|n| n.attribute("value"))
                .and_then(|v| v.parse::<f64>().ok());
            let pause_quantity_unit = pause_node.and_then(|n| n.attribute("unit"));

            let period_node = descend(requirement_node, &["effectiveTime", "period"]);
            let period_value = period_node
                .and_then(|n| n.attribute("value"))
                .and_then(|v| v.parse::<f64>().ok());
            let period_unit = period_node.and_then(|n| n.attribute("unit"));

            let candidate = NewRequirement {
                protocol_id,
                requirement_code: &cv.code,
                display_name: cv.display_name.as_deref(),
                sequence_number,
                is_monitoring_observation: is_monitoring,
                pause_quantity_value,
                pause_quantity_unit,
                period_value,
                period_unit,
                stakeholder_id: None,
            };

            let requirement = match resolver::get_or_create_requirement(ctx.conn, candidate) {
                Ok((resolved, messages)) => {
                    if resolved.was_created() {
                        result.created.requirements += 1;
                    }
                    result.errors.extend(messages);
                    resolved.into_inner()
                }
                Err(e) => {
                    self.record_persistence_error(ctx, result, e);
                    continue;
                }
            };

            self.parse_participation(
                requirement_node,
                requirement.id,
                requirement.stakeholder_id,
                ctx,
                result,
            );
        }
    }

    /// Stage 4: a stakeholder participation under a requirement, followed by
    /// the link-back onto the requirement row.
    fn parse_participation(
        &self,
        requirement_node: Node<'_, '_>,
        requirement_id: i32,
        existing_stakeholder_id: Option<i32>,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        let Some(role_node) =
            child_element(requirement_node, "participation").and_then(|n| child_element(n, "role"))
        else {
            return;
        };

        let Some(cv) = coded_value(role_node) else {
            result.push_error(format!(
                "stakeholder (requirement id {}): missing role code element, skipped",
                requirement_id
            ));
            return;
        };

        let candidate = NewStakeholder {
            stakeholder_code: &cv.code,
            display_name: cv.display_name.as_deref(),
        };

        let stakeholder = match resolver::get_or_create_stakeholder(ctx.conn, candidate) {
            Ok((resolved, messages)) => {
                if resolved.was_created() {
                    result.created.stakeholders += 1;
                }
                result.errors.extend(messages);
                resolved.into_inner()
            }
            Err(e) => {
                self.record_persistence_error(ctx, result, e);
                return;
            }
        };

        if existing_stakeholder_id.is_some() {
            return;
        }

        match resolver::link_requirement_stakeholder(ctx.conn, requirement_id, stakeholder.id) {
            Ok(linked) => {
                if linked {
                    tracing::debug!(
                        "{}: linked stakeholder {} onto requirement id {}",
                        ctx.file_name,
                        stakeholder.stakeholder_code,
                        requirement_id
                    );
                }
            }
            Err(e) => self.record_persistence_error(ctx, result, e),
        }
    }

    /// Stage 5: attached materials, i.e. `subjectOf/document` subtrees whose
    /// reference is not URI-addressable.
    fn parse_materials(
        &self,
        section_node: Node<'_, '_>,
        section: &SectionCursor,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        for document_node in attached_documents(section_node) {
            let reference = document_reference(document_node);
            if reference.map_or(false, is_uri_reference) {
                continue;
            }

            let Some(guid) = child_attr(document_node, "id", "root") else {
                result.push_error("material (): missing document id root, skipped".to_string());
                continue;
            };

            let title = child_element(document_node, "title").and_then(element_text);
            let (ref_marker, cleaned_title) = match &title {
                Some(t) => {
                    let (marker, cleaned) = extract_reference_marker(t);
                    (marker, Some(cleaned))
                }
                None => (None, None),
            };

            let candidate = NewSectionMaterial {
                section_id: section.section_id,
                document_guid: guid,
                title: title.as_deref(),
                cleaned_title: cleaned_title.as_deref(),
                ref_marker: ref_marker.as_deref(),
                attachment_name: reference,
            };

            match resolver::get_or_create_material(ctx.conn, candidate) {
                Ok((resolved, messages)) => {
                    if resolved.was_created() {
                        result.created.materials += 1;
                    }
                    result.errors.extend(messages);
                }
                Err(e) => self.record_persistence_error(ctx, result, e),
            }
        }
    }

    /// Stage 6: URI-addressable electronic resources, same scoping as
    /// materials.
    fn parse_electronic_resources(
        &self,
        section_node: Node<'_, '_>,
        section: &SectionCursor,
        ctx: &mut ParseContext<'_>,
        result: &mut ParseResult,
    ) {
        for document_node in attached_documents(section_node) {
            let Some(url) = document_reference(document_node).filter(|r| is_uri_reference(r))
            else {
                continue;
            };

            let Some(guid) = child_attr(document_node, "id", "root") else {
                result.push_error(
                    "electronic resource (): missing document id root, skipped".to_string(),
                );
                continue;
            };

            let title = child_element(document_node, "title").and_then(element_text);
            let (ref_marker, cleaned_title) = match &title {
                Some(t) => {
                    let (marker, cleaned) = extract_reference_marker(t);
                    (marker, Some(cleaned))
                }
                None => (None, None),
            };

            let candidate = NewElectronicResource {
                section_id: section.section_id,
                document_guid: guid,
                title: title.as_deref(),
                cleaned_title: cleaned_title.as_deref(),
                ref_marker: ref_marker.as_deref(),
                resource_url: url,
            };

            match resolver::get_or_create_electronic_resource(ctx.conn, candidate) {
                Ok((resolved, messages)) => {
                    if resolved.was_created() {
                        result.created.electronic_resources += 1;
                    }
                    result.errors.extend(messages);
                }
                Err(e) => self.record_persistence_error(ctx, result, e),
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

/// All `subjectOf/document` subtrees directly under the section.
fn attached_documents<'a, 'input>(section_node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    child_elements(section_node, "subjectOf")
        .into_iter()
        .filter_map(|n| child_element(n, "document"))
        .collect()
}

fn document_reference<'a>(document_node: Node<'a, '_>) -> Option<&'a str> {
    descend(document_node, &["text", "reference"]).and_then(|n| n.attribute("value"))
}

fn is_uri_reference(reference: &str) -> bool {
    reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("mailto:")
}

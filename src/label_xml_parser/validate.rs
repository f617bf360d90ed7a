//! Entity validation
//!
//! Pure rule evaluation producing human-readable messages. Validation output
//! never prevents persistence; the resolver persists the entity either way
//! and surfaces the messages through the `ParseResult`.
//!
//! Field constraints (non-empty codes, numeric ranges) produce violations;
//! business-rule checks such as the monitoring-observation sequence rule
//! produce warning-class messages that leave `is_valid` untouched.

use crate::db::models::{
    NewDocument, NewDocumentRelationship, NewElectronicResource, NewOrganization, NewProtocol,
    NewProtocolApproval, NewRequirement, NewSection, NewSectionMaterial, NewStakeholder,
};

/// A monitoring observation is expected, but not required, at this sequence
/// number within its protocol.
pub const MONITORING_EXPECTED_SEQUENCE: i32 = 2;

#[derive(Debug, Clone)]
pub struct Validation {
    pub is_valid: bool,
    pub messages: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Validation { is_valid: true, messages: Vec::new() }
    }

    fn violation(&mut self, msg: String) {
        self.is_valid = false;
        self.messages.push(msg);
    }

    fn warning(&mut self, msg: String) {
        self.messages.push(msg);
    }
}

pub fn validate_document(doc: &NewDocument) -> Validation {
    let mut v = Validation::ok();
    if doc.document_guid.trim().is_empty() {
        v.violation(format!(
            "document ({}): document GUID must not be empty",
            doc.document_guid
        ));
    }
    v
}

pub fn validate_organization(org: &NewOrganization) -> Validation {
    let mut v = Validation::ok();
    if org.organization_name.trim().is_empty() {
        v.violation(format!(
            "organization ({}): organization name must not be empty",
            org.identifier_value
        ));
    }
    if org.identifier_value.trim().is_empty() {
        v.violation(format!(
            "organization ({}): identifier must not be empty",
            org.organization_name
        ));
    }
    v
}

pub fn validate_section(section: &NewSection) -> Validation {
    let mut v = Validation::ok();
    if section.section_guid.trim().is_empty() {
        v.violation(format!(
            "section ({}): section GUID must not be empty",
            section.section_code
        ));
    }
    if section.section_code.trim().is_empty() {
        v.violation(format!(
            "section ({}): section code must not be empty",
            section.section_guid
        ));
    }
    v
}

pub fn validate_protocol(protocol: &NewProtocol) -> Validation {
    let mut v = Validation::ok();
    if protocol.protocol_code.trim().is_empty() {
        v.violation("protocol (): protocol code must not be empty".to_string());
    }
    v
}

pub fn validate_requirement(req: &NewRequirement) -> Validation {
    let mut v = Validation::ok();
    if req.requirement_code.trim().is_empty() {
        v.violation(format!(
            "requirement (seq {}): requirement code must not be empty",
            req.sequence_number
        ));
    }
    if req.sequence_number < 1 {
        v.violation(format!(
            "requirement ({}): sequence number must be 1 or greater, got {}",
            req.requirement_code, req.sequence_number
        ));
    }
    if let Some(pause) = req.pause_quantity_value {
        if pause < 0.0 {
            v.violation(format!(
                "requirement ({}): pause quantity must not be negative, got {}",
                req.requirement_code, pause
            ));
        }
    }
    if req.is_monitoring_observation && req.sequence_number != MONITORING_EXPECTED_SEQUENCE {
        v.warning(format!(
            "requirement ({}): monitoring observation expected at sequence number {}, got {}",
            req.requirement_code, MONITORING_EXPECTED_SEQUENCE, req.sequence_number
        ));
    }
    v
}

pub fn validate_stakeholder(stakeholder: &NewStakeholder) -> Validation {
    let mut v = Validation::ok();
    if stakeholder.stakeholder_code.trim().is_empty() {
        v.violation(format!(
            "stakeholder ({}): stakeholder code must not be empty",
            stakeholder.stakeholder_code
        ));
    }
    v
}

pub fn validate_approval(approval: &NewProtocolApproval) -> Validation {
    let mut v = Validation::ok();
    if approval.approval_code.trim().is_empty() {
        v.violation(format!(
            "approval (protocol {}): approval code must not be empty",
            approval.protocol_id
        ));
    }
    v
}

pub fn validate_material(material: &NewSectionMaterial) -> Validation {
    let mut v = Validation::ok();
    if material.document_guid.trim().is_empty() {
        v.violation("material (): document GUID must not be empty".to_string());
    }
    if material.title.map_or(true, |t| t.trim().is_empty()) {
        v.warning(format!(
            "material ({}): title is empty",
            material.document_guid
        ));
    }
    v
}

pub fn validate_electronic_resource(resource: &NewElectronicResource) -> Validation {
    let mut v = Validation::ok();
    if resource.document_guid.trim().is_empty() {
        v.violation("electronic resource (): document GUID must not be empty".to_string());
    }
    if resource.resource_url.trim().is_empty() {
        v.violation(format!(
            "electronic resource ({}): resource URL must not be empty",
            resource.document_guid
        ));
    }
    v
}

pub fn validate_relationship(rel: &NewDocumentRelationship) -> Validation {
    let mut v = Validation::ok();
    if rel.relationship_type.trim().is_empty() {
        v.violation(format!(
            "document relationship ({} -> {}): relationship type must not be empty",
            rel.parent_organization_id, rel.child_organization_id
        ));
    }
    if rel.relationship_level < 1 {
        v.violation(format!(
            "document relationship ({} -> {}): relationship level must be 1 or greater, got {}",
            rel.parent_organization_id, rel.child_organization_id, rel.relationship_level
        ));
    }
    v
}

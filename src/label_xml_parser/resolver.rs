//! Get-or-create entity resolution
//!
//! Each resolver queries the store for an existing record matching the
//! candidate's business key within its parent scope. A match is returned
//! unchanged, with no re-validation and no re-write. Otherwise the candidate
//! is validated and persisted regardless of the validation outcome; the
//! validation messages travel back with the created record so the caller can
//! fold them into the parse result.
//!
//! Key matching is exact and case-sensitive. Concurrent creation of the same
//! key is not guarded here; the UNIQUE constraints in the schema are the
//! backstop, and a unique-violation on insert is treated as "Found" via a
//! retry-read.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

use crate::db::models::*;
use crate::db::schema::*;
use crate::label_xml_parser::validate;
use crate::types::{ImportError, Resolved};

pub type ResolveOutcome<T> = Result<(Resolved<T>, Vec<String>), ImportError>;

fn persistence(entity: &'static str, key: impl Into<String>, source: DieselError) -> ImportError {
    ImportError::Persistence { entity, key: key.into(), source }
}

fn is_unique_violation(e: &DieselError) -> bool {
    matches!(e, DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
}

pub fn get_or_create_document(
    conn: &mut SqliteConnection,
    candidate: NewDocument<'_>,
) -> ResolveOutcome<Document> {
    let key = candidate.document_guid.to_string();

    let existing = documents::table
        .filter(documents::document_guid.eq(candidate.document_guid))
        .select(Document::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("document", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_document(&candidate);

    match diesel::insert_into(documents::table)
        .values(&candidate)
        .returning(Document::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = documents::table
                .filter(documents::document_guid.eq(candidate.document_guid))
                .select(Document::as_select())
                .first(conn)
                .map_err(|e| persistence("document", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("document", key, e)),
    }
}

pub fn get_or_create_organization(
    conn: &mut SqliteConnection,
    candidate: NewOrganization<'_>,
) -> ResolveOutcome<Organization> {
    let key = format!("{}@{}", candidate.identifier_value, candidate.identifier_root);

    let existing = organizations::table
        .filter(organizations::identifier_value.eq(candidate.identifier_value))
        .filter(organizations::identifier_root.eq(candidate.identifier_root))
        .select(Organization::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("organization", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_organization(&candidate);

    match diesel::insert_into(organizations::table)
        .values(&candidate)
        .returning(Organization::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = organizations::table
                .filter(organizations::identifier_value.eq(candidate.identifier_value))
                .filter(organizations::identifier_root.eq(candidate.identifier_root))
                .select(Organization::as_select())
                .first(conn)
                .map_err(|e| persistence("organization", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("organization", key, e)),
    }
}

pub fn get_or_create_section(
    conn: &mut SqliteConnection,
    candidate: NewSection<'_>,
) -> ResolveOutcome<Section> {
    let key = format!("doc {} / {}", candidate.document_id, candidate.section_guid);

    let existing = sections::table
        .filter(sections::document_id.eq(candidate.document_id))
        .filter(sections::section_guid.eq(candidate.section_guid))
        .select(Section::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("section", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_section(&candidate);

    match diesel::insert_into(sections::table)
        .values(&candidate)
        .returning(Section::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = sections::table
                .filter(sections::document_id.eq(candidate.document_id))
                .filter(sections::section_guid.eq(candidate.section_guid))
                .select(Section::as_select())
                .first(conn)
                .map_err(|e| persistence("section", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("section", key, e)),
    }
}

pub fn get_or_create_protocol(
    conn: &mut SqliteConnection,
    candidate: NewProtocol<'_>,
) -> ResolveOutcome<Protocol> {
    let key = format!("section {} / {}", candidate.section_id, candidate.protocol_code);

    let existing = protocols::table
        .filter(protocols::section_id.eq(candidate.section_id))
        .filter(protocols::protocol_code.eq(candidate.protocol_code))
        .select(Protocol::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("protocol", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_protocol(&candidate);

    match diesel::insert_into(protocols::table)
        .values(&candidate)
        .returning(Protocol::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = protocols::table
                .filter(protocols::section_id.eq(candidate.section_id))
                .filter(protocols::protocol_code.eq(candidate.protocol_code))
                .select(Protocol::as_select())
                .first(conn)
                .map_err(|e| persistence("protocol", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("protocol", key, e)),
    }
}

/// Stakeholders are deduplicated globally by code, not scoped to a parent,
/// because the same role codes are shared across documents.
pub fn get_or_create_stakeholder(
    conn: &mut SqliteConnection,
    candidate: NewStakeholder<'_>,
) -> ResolveOutcome<Stakeholder> {
    let key = candidate.stakeholder_code.to_string();

    let existing = stakeholders::table
        .filter(stakeholders::stakeholder_code.eq(candidate.stakeholder_code))
        .select(Stakeholder::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("stakeholder", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_stakeholder(&candidate);

    match diesel::insert_into(stakeholders::table)
        .values(&candidate)
        .returning(Stakeholder::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = stakeholders::table
                .filter(stakeholders::stakeholder_code.eq(candidate.stakeholder_code))
                .select(Stakeholder::as_select())
                .first(conn)
                .map_err(|e| persistence("stakeholder", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("stakeholder", key, e)),
    }
}

pub fn get_or_create_requirement(
    conn: &mut SqliteConnection,
    candidate: NewRequirement<'_>,
) -> ResolveOutcome<Requirement> {
    let key = format!(
        "protocol {} / {} seq {}",
        candidate.protocol_id, candidate.requirement_code, candidate.sequence_number
    );

    let existing = requirements::table
        .filter(requirements::protocol_id.eq(candidate.protocol_id))
        .filter(requirements::requirement_code.eq(candidate.requirement_code))
        .filter(requirements::sequence_number.eq(candidate.sequence_number))
        .select(Requirement::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("requirement", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_requirement(&candidate);

    match diesel::insert_into(requirements::table)
        .values(&candidate)
        .returning(Requirement::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = requirements::table
                .filter(requirements::protocol_id.eq(candidate.protocol_id))
                .filter(requirements::requirement_code.eq(candidate.requirement_code))
                .filter(requirements::sequence_number.eq(candidate.sequence_number))
                .select(Requirement::as_select())
                .first(conn)
                .map_err(|e| persistence("requirement", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("requirement", key, e)),
    }
}

/// Approvals attach 1:1 to a protocol; the protocol id is the whole key, so
/// an approval is created at most once per protocol, on first encounter.
pub fn get_or_create_approval(
    conn: &mut SqliteConnection,
    candidate: NewProtocolApproval<'_>,
) -> ResolveOutcome<ProtocolApproval> {
    let key = format!("protocol {}", candidate.protocol_id);

    let existing = protocol_approvals::table
        .filter(protocol_approvals::protocol_id.eq(candidate.protocol_id))
        .select(ProtocolApproval::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("approval", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_approval(&candidate);

    match diesel::insert_into(protocol_approvals::table)
        .values(&candidate)
        .returning(ProtocolApproval::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = protocol_approvals::table
                .filter(protocol_approvals::protocol_id.eq(candidate.protocol_id))
                .select(ProtocolApproval::as_select())
                .first(conn)
                .map_err(|e| persistence("approval", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("approval", key, e)),
    }
}

pub fn get_or_create_material(
    conn: &mut SqliteConnection,
    candidate: NewSectionMaterial<'_>,
) -> ResolveOutcome<SectionMaterial> {
    let key = format!("section {} / {}", candidate.section_id, candidate.document_guid);

    let existing = section_materials::table
        .filter(section_materials::section_id.eq(candidate.section_id))
        .filter(section_materials::document_guid.eq(candidate.document_guid))
        .select(SectionMaterial::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("material", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_material(&candidate);

    match diesel::insert_into(section_materials::table)
        .values(&candidate)
        .returning(SectionMaterial::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = section_materials::table
                .filter(section_materials::section_id.eq(candidate.section_id))
                .filter(section_materials::document_guid.eq(candidate.document_guid))
                .select(SectionMaterial::as_select())
                .first(conn)
                .map_err(|e| persistence("material", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("material", key, e)),
    }
}

pub fn get_or_create_electronic_resource(
    conn: &mut SqliteConnection,
    candidate: NewElectronicResource<'_>,
) -> ResolveOutcome<ElectronicResource> {
    let key = format!("section {} / {}", candidate.section_id, candidate.document_guid);

    let existing = electronic_resources::table
        .filter(electronic_resources::section_id.eq(candidate.section_id))
        .filter(electronic_resources::document_guid.eq(candidate.document_guid))
        .select(ElectronicResource::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("electronic resource", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_electronic_resource(&candidate);

    match diesel::insert_into(electronic_resources::table)
        .values(&candidate)
        .returning(ElectronicResource::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = electronic_resources::table
                .filter(electronic_resources::section_id.eq(candidate.section_id))
                .filter(electronic_resources::document_guid.eq(candidate.document_guid))
                .select(ElectronicResource::as_select())
                .first(conn)
                .map_err(|e| persistence("electronic resource", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("electronic resource", key, e)),
    }
}

pub fn get_or_create_relationship(
    conn: &mut SqliteConnection,
    candidate: NewDocumentRelationship<'_>,
) -> ResolveOutcome<DocumentRelationship> {
    let key = format!(
        "doc {} / {} -> {} ({})",
        candidate.document_id,
        candidate.parent_organization_id,
        candidate.child_organization_id,
        candidate.relationship_type
    );

    let existing = document_relationships::table
        .filter(document_relationships::document_id.eq(candidate.document_id))
        .filter(document_relationships::parent_organization_id.eq(candidate.parent_organization_id))
        .filter(document_relationships::child_organization_id.eq(candidate.child_organization_id))
        .filter(document_relationships::relationship_type.eq(candidate.relationship_type))
        .select(DocumentRelationship::as_select())
        .first(conn)
        .optional()
        .map_err(|e| persistence("document relationship", key.clone(), e))?;

    if let Some(found) = existing {
        return Ok((Resolved::Found(found), Vec::new()));
    }

    let validation = validate::validate_relationship(&candidate);

    match diesel::insert_into(document_relationships::table)
        .values(&candidate)
        .returning(DocumentRelationship::as_returning())
        .get_result(conn)
    {
        Ok(created) => Ok((Resolved::Created(created), validation.messages)),
        Err(e) if is_unique_violation(&e) => {
            let found = document_relationships::table
                .filter(document_relationships::document_id.eq(candidate.document_id))
                .filter(
                    document_relationships::parent_organization_id
                        .eq(candidate.parent_organization_id),
                )
                .filter(
                    document_relationships::child_organization_id
                        .eq(candidate.child_organization_id),
                )
                .filter(document_relationships::relationship_type.eq(candidate.relationship_type))
                .select(DocumentRelationship::as_select())
                .first(conn)
                .map_err(|e| persistence("document relationship", key.clone(), e))?;
            Ok((Resolved::Found(found), Vec::new()))
        }
        Err(e) => Err(persistence("document relationship", key, e)),
    }
}

/// The single post-create mutation the pipeline performs: linking a
/// stakeholder onto an already-created requirement. Only a requirement with
/// no stakeholder yet is updated.
pub fn link_requirement_stakeholder(
    conn: &mut SqliteConnection,
    requirement_id: i32,
    stakeholder_id: i32,
) -> Result<bool, ImportError> {
    let updated = diesel::update(
        requirements::table
            .filter(requirements::id.eq(requirement_id))
            .filter(requirements::stakeholder_id.is_null()),
    )
    .set(requirements::stakeholder_id.eq(Some(stakeholder_id)))
    .execute(conn)
    .map_err(|e| persistence("requirement", format!("id {}", requirement_id), e))?;

    Ok(updated > 0)
}

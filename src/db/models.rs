use diesel::prelude::*;
use chrono::NaiveDate;

use crate::db::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Document {
    pub id: i32,
    pub document_guid: String,
    pub set_guid: Option<String>,
    pub version_number: Option<i32>,
    pub title: Option<String>,
    pub effective_date: Option<NaiveDate>,
}

#[derive(Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocument<'a> {
    pub document_guid: &'a str,
    pub set_guid: Option<&'a str>,
    pub version_number: Option<i32>,
    pub title: Option<&'a str>,
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Organization {
    pub id: i32,
    pub organization_name: String,
    pub identifier_value: String,
    pub identifier_root: String,
}

#[derive(Insertable)]
#[diesel(table_name = organizations)]
pub struct NewOrganization<'a> {
    pub organization_name: &'a str,
    pub identifier_value: &'a str,
    pub identifier_root: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Document, foreign_key = document_id))]
#[diesel(table_name = sections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Section {
    pub id: i32,
    pub document_id: i32,
    pub section_guid: String,
    pub section_code: String,
    pub display_name: Option<String>,
    pub title: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = sections)]
pub struct NewSection<'a> {
    pub document_id: i32,
    pub section_guid: &'a str,
    pub section_code: &'a str,
    pub display_name: Option<&'a str>,
    pub title: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Section, foreign_key = section_id))]
#[diesel(table_name = protocols)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Protocol {
    pub id: i32,
    pub section_id: i32,
    pub protocol_code: String,
    pub code_system: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = protocols)]
pub struct NewProtocol<'a> {
    pub section_id: i32,
    pub protocol_code: &'a str,
    pub code_system: Option<&'a str>,
    pub display_name: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = stakeholders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Stakeholder {
    pub id: i32,
    pub stakeholder_code: String,
    pub display_name: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = stakeholders)]
pub struct NewStakeholder<'a> {
    pub stakeholder_code: &'a str,
    pub display_name: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Protocol, foreign_key = protocol_id))]
#[diesel(table_name = requirements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Requirement {
    pub id: i32,
    pub protocol_id: i32,
    pub requirement_code: String,
    pub display_name: Option<String>,
    pub sequence_number: i32,
    pub is_monitoring_observation: bool,
    pub pause_quantity_value: Option<f64>,
    pub pause_quantity_unit: Option<String>,
    pub period_value: Option<f64>,
    pub period_unit: Option<String>,
    pub stakeholder_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = requirements)]
pub struct NewRequirement<'a> {
    pub protocol_id: i32,
    pub requirement_code: &'a str,
    pub display_name: Option<&'a str>,
    pub sequence_number: i32,
    pub is_monitoring_observation: bool,
    pub pause_quantity_value: Option<f64>,
    pub pause_quantity_unit: Option<&'a str>,
    pub period_value: Option<f64>,
    pub period_unit: Option<&'a str>,
    pub stakeholder_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Protocol, foreign_key = protocol_id))]
#[diesel(table_name = protocol_approvals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProtocolApproval {
    pub id: i32,
    pub protocol_id: i32,
    pub approval_code: String,
    pub display_name: Option<String>,
    pub territory_code: Option<String>,
    pub effective_date: Option<NaiveDate>,
}

#[derive(Insertable)]
#[diesel(table_name = protocol_approvals)]
pub struct NewProtocolApproval<'a> {
    pub protocol_id: i32,
    pub approval_code: &'a str,
    pub display_name: Option<&'a str>,
    pub territory_code: Option<&'a str>,
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Section, foreign_key = section_id))]
#[diesel(table_name = section_materials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SectionMaterial {
    pub id: i32,
    pub section_id: i32,
    pub document_guid: String,
    pub title: Option<String>,
    pub cleaned_title: Option<String>,
    pub ref_marker: Option<String>,
    pub attachment_name: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = section_materials)]
pub struct NewSectionMaterial<'a> {
    pub section_id: i32,
    pub document_guid: &'a str,
    pub title: Option<&'a str>,
    pub cleaned_title: Option<&'a str>,
    pub ref_marker: Option<&'a str>,
    pub attachment_name: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Section, foreign_key = section_id))]
#[diesel(table_name = electronic_resources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ElectronicResource {
    pub id: i32,
    pub section_id: i32,
    pub document_guid: String,
    pub title: Option<String>,
    pub cleaned_title: Option<String>,
    pub ref_marker: Option<String>,
    pub resource_url: String,
}

#[derive(Insertable)]
#[diesel(table_name = electronic_resources)]
pub struct NewElectronicResource<'a> {
    pub section_id: i32,
    pub document_guid: &'a str,
    pub title: Option<&'a str>,
    pub cleaned_title: Option<&'a str>,
    pub ref_marker: Option<&'a str>,
    pub resource_url: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Document, foreign_key = document_id))]
#[diesel(table_name = document_relationships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRelationship {
    pub id: i32,
    pub document_id: i32,
    pub parent_organization_id: i32,
    pub child_organization_id: i32,
    pub relationship_type: String,
    pub relationship_level: i32,
}

#[derive(Insertable)]
#[diesel(table_name = document_relationships)]
pub struct NewDocumentRelationship<'a> {
    pub document_id: i32,
    pub parent_organization_id: i32,
    pub child_organization_id: i32,
    pub relationship_type: &'a str,
    pub relationship_level: i32,
}

//! Shared types for the import pipeline
//!
//! The `ParseResult` accumulator and the error taxonomy are used by every
//! section parser; `Resolved` tags the outcome of the get-or-create
//! resolvers.

use serde::Serialize;
use thiserror::Error;

/// Per-entity-type creation counters for one parsing operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub documents: u32,
    pub organizations: u32,
    pub sections: u32,
    pub protocols: u32,
    pub requirements: u32,
    pub stakeholders: u32,
    pub approvals: u32,
    pub materials: u32,
    pub electronic_resources: u32,
    pub relationships: u32,
}

impl EntityCounts {
    pub fn add(&mut self, other: &EntityCounts) {
        self.documents += other.documents;
        self.organizations += other.organizations;
        self.sections += other.sections;
        self.protocols += other.protocols;
        self.requirements += other.requirements;
        self.stakeholders += other.stakeholders;
        self.approvals += other.approvals;
        self.materials += other.materials;
        self.electronic_resources += other.electronic_resources;
        self.relationships += other.relationships;
    }

    pub fn total(&self) -> u32 {
        self.documents
            + self.organizations
            + self.sections
            + self.protocols
            + self.requirements
            + self.stakeholders
            + self.approvals
            + self.materials
            + self.electronic_resources
            + self.relationships
    }
}

/// Accumulated outcome of one parsing operation.
///
/// Merging results ANDs the success flags, concatenates the message lists
/// and sums the counters, so nested sub-parses roll up into section- and
/// file-level summaries.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub created: EntityCounts,
}

impl Default for ParseResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseResult {
    pub fn new() -> Self {
        ParseResult {
            success: true,
            errors: Vec::new(),
            created: EntityCounts::default(),
        }
    }

    /// Record a warning-class message without failing the result.
    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Record a message and mark the result failed.
    pub fn fail(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.success = false;
    }

    pub fn merge(&mut self, other: ParseResult) {
        self.success = self.success && other.success;
        self.errors.extend(other.errors);
        self.created.add(&other.created);
    }
}

/// Outcome of a get-or-create resolution.
///
/// `Found` means an existing record matched the business key and was
/// returned unchanged; `Created` means a new record was persisted.
#[derive(Debug, Clone)]
pub enum Resolved<T> {
    Found(T),
    Created(T),
}

impl<T> Resolved<T> {
    pub fn record(&self) -> &T {
        match self {
            Resolved::Found(t) => t,
            Resolved::Created(t) => t,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Resolved::Found(t) => t,
            Resolved::Created(t) => t,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolved::Created(_))
    }
}

/// Error taxonomy of the import pipeline.
///
/// `MissingContext` is structural and fatal for the affected subtree; the
/// parser records it and returns without attempting entity creation.
/// `Persistence` errors are caught at the element where they occur, recorded,
/// and processing continues with the next sibling.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing {0} in parse context")]
    MissingContext(&'static str),

    #[error("{entity} ({key}): database error: {source}")]
    Persistence {
        entity: &'static str,
        key: String,
        #[source]
        source: diesel::result::Error,
    },
}

impl ImportError {
    pub fn is_structural(&self) -> bool {
        matches!(self, ImportError::MissingContext(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_successful_and_empty() {
        let r = ParseResult::new();
        assert!(r.success);
        assert!(r.errors.is_empty());
        assert_eq!(r.created.total(), 0);
    }

    #[test]
    fn test_merge_sums_counts_and_ands_success() {
        let mut a = ParseResult::new();
        a.created.protocols = 1;
        a.created.requirements = 2;

        let mut b = ParseResult::new();
        b.created.requirements = 3;
        b.fail("requirement (R2): bad sequence");

        a.merge(b);

        assert!(!a.success);
        assert_eq!(a.created.protocols, 1);
        assert_eq!(a.created.requirements, 5);
        assert_eq!(a.errors.len(), 1);
    }

    #[test]
    fn test_merge_preserves_message_order() {
        let mut a = ParseResult::new();
        a.push_error("first");
        let mut b = ParseResult::new();
        b.push_error("second");
        a.merge(b);
        assert_eq!(a.errors, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_push_error_does_not_fail_result() {
        let mut r = ParseResult::new();
        r.push_error("stakeholder (): code must not be empty");
        assert!(r.success);
        assert_eq!(r.errors.len(), 1);
    }

    #[test]
    fn test_result_serializes_for_reporting() {
        let mut r = ParseResult::new();
        r.created.protocols = 1;
        r.push_error("requirement (R-LAB): got 5");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["created"]["protocols"], 1);
        assert_eq!(json["errors"][0], "requirement (R-LAB): got 5");
    }

    #[test]
    fn test_resolved_tags() {
        let found: Resolved<i32> = Resolved::Found(1);
        let created: Resolved<i32> = Resolved::Created(2);
        assert!(!found.was_created());
        assert!(created.was_created());
        assert_eq!(*created.record(), 2);
        assert_eq!(found.into_inner(), 1);
    }
}

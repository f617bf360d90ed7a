use diesel::prelude::*;

mod helpers;
use helpers as h;

use spl_import::db::models::{Requirement, Stakeholder};
use spl_import::db::schema::{
    electronic_resources, protocol_approvals, protocols, requirements, section_materials,
    stakeholders,
};
use spl_import::label_xml_parser::{ParseContext, ProductCursor, parse_section};

#[test]
fn test_protocol_section_happy_path() {
    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);
    let section_id = cursor.section_id;

    let doc = roxmltree::Document::parse(h::protocol_section_xml()).unwrap();
    let result = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert!(result.success, "unexpected errors: {:?}", result.errors);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.created.protocols, 1);
    assert_eq!(result.created.requirements, 2);
    assert_eq!(result.created.stakeholders, 1);
    assert_eq!(result.created.approvals, 1);
    assert_eq!(result.created.materials, 1);
    assert_eq!(result.created.electronic_resources, 1);

    // Requirement at sequence 2 is the monitoring observation and carries
    // the stakeholder link.
    let reqs: Vec<Requirement> = requirements::table
        .order(requirements::sequence_number.asc())
        .select(Requirement::as_select())
        .load(&mut conn)
        .unwrap();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].requirement_code, "R-ENROLL");
    assert!(!reqs[0].is_monitoring_observation);
    assert_eq!(reqs[0].pause_quantity_value, Some(24.0));
    assert_eq!(reqs[0].pause_quantity_unit.as_deref(), Some("h"));
    assert!(reqs[0].stakeholder_id.is_none());

    assert_eq!(reqs[1].requirement_code, "R-LAB");
    assert!(reqs[1].is_monitoring_observation);
    assert_eq!(reqs[1].period_value, Some(30.0));
    assert_eq!(reqs[1].period_unit.as_deref(), Some("d"));

    let patient: Stakeholder = stakeholders::table
        .filter(stakeholders::stakeholder_code.eq("patient"))
        .select(Stakeholder::as_select())
        .first(&mut conn)
        .unwrap();
    assert_eq!(reqs[1].stakeholder_id, Some(patient.id));

    // All requirements reference the protocol that was created in this run.
    let protocol_id: i32 = protocols::table
        .filter(protocols::section_id.eq(section_id))
        .filter(protocols::protocol_code.eq("P1"))
        .select(protocols::id)
        .first(&mut conn)
        .unwrap();
    assert!(reqs.iter().all(|r| r.protocol_id == protocol_id));

    let approval_count: i64 = protocol_approvals::table
        .filter(protocol_approvals::protocol_id.eq(protocol_id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(approval_count, 1);
}

#[test]
fn test_reimport_is_idempotent() {
    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(h::protocol_section_xml()).unwrap();

    let first = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor.clone());
        parse_section(doc.root_element(), &mut ctx)
    };
    assert!(first.success);
    assert!(first.created.total() > 0);

    let second = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert!(second.success);
    assert!(second.errors.is_empty(), "unexpected errors: {:?}", second.errors);
    assert_eq!(second.created.total(), 0, "re-import created entities: {:?}", second.created);

    let req_count: i64 = requirements::table.count().get_result(&mut conn).unwrap();
    assert_eq!(req_count, 2);
    let stakeholder_count: i64 = stakeholders::table.count().get_result(&mut conn).unwrap();
    assert_eq!(stakeholder_count, 1);
}

#[test]
fn test_each_protocol_gets_its_own_approval() {
    let xml = r#"<section>
        <code code="82345-7"/>
        <subject2>
            <substanceAdministration>
                <componentOf>
                    <protocol>
                        <code code="P1"/>
                        <subjectOf>
                            <approval><code code="C1" displayName="First approval"/></approval>
                        </subjectOf>
                        <component>
                            <sequenceNumber value="1"/>
                            <requirement><code code="R-A"/></requirement>
                        </component>
                    </protocol>
                </componentOf>
                <componentOf>
                    <protocol>
                        <code code="P2"/>
                        <subjectOf>
                            <approval><code code="C2" displayName="Second approval"/></approval>
                        </subjectOf>
                    </protocol>
                </componentOf>
            </substanceAdministration>
        </subject2>
        <subject2>
            <substanceAdministration>
                <componentOf>
                    <protocol>
                        <code code="P1"/>
                        <subjectOf>
                            <approval><code code="C9" displayName="Stray repeat approval"/></approval>
                        </subjectOf>
                        <component>
                            <sequenceNumber value="2"/>
                            <requirement><code code="R-B"/></requirement>
                        </component>
                    </protocol>
                </componentOf>
            </substanceAdministration>
        </subject2>
    </section>"#;

    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(xml).unwrap();
    let result = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert!(result.success, "unexpected errors: {:?}", result.errors);
    assert_eq!(result.created.protocols, 2);
    assert_eq!(result.created.approvals, 2);
    assert_eq!(result.created.requirements, 2);

    // The repeat occurrence of P1 still attaches its requirements, but its
    // approval is ignored; P1 keeps the approval from its first occurrence.
    let rows: Vec<(String, String)> = protocols::table
        .inner_join(protocol_approvals::table)
        .order(protocols::protocol_code.asc())
        .select((protocols::protocol_code, protocol_approvals::approval_code))
        .load(&mut conn)
        .unwrap();
    assert_eq!(
        rows,
        vec![
            ("P1".to_string(), "C1".to_string()),
            ("P2".to_string(), "C2".to_string()),
        ]
    );
}

#[test]
fn test_malformed_sequence_number_does_not_block_siblings() {
    let xml = r#"<section>
        <code code="82345-7"/>
        <subject2>
            <substanceAdministration>
                <componentOf>
                    <protocol>
                        <code code="P1"/>
                        <component>
                            <sequenceNumber value="abc"/>
                            <requirement><code code="R-BAD"/></requirement>
                        </component>
                        <component>
                            <sequenceNumber value="1"/>
                            <requirement><code code="R-GOOD"/></requirement>
                        </component>
                    </protocol>
                </componentOf>
            </substanceAdministration>
        </subject2>
    </section>"#;

    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(xml).unwrap();
    let result = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert_eq!(result.created.requirements, 1);
    assert_eq!(result.errors.len(), 1, "messages: {:?}", result.errors);
    assert!(result.errors[0].contains("R-BAD"));
    assert!(result.errors[0].contains("invalid sequence number"));

    let codes: Vec<String> = requirements::table
        .select(requirements::requirement_code)
        .load(&mut conn)
        .unwrap();
    assert_eq!(codes, vec!["R-GOOD".to_string()]);
}

#[test]
fn test_empty_stakeholder_code_is_persisted_with_message() {
    let xml = r#"<section>
        <code code="82345-7"/>
        <subject2>
            <substanceAdministration>
                <componentOf>
                    <protocol>
                        <code code="P1"/>
                        <component>
                            <sequenceNumber value="1"/>
                            <requirement>
                                <code code="R-ENROLL"/>
                                <participation>
                                    <role><code code=""/></role>
                                </participation>
                            </requirement>
                        </component>
                    </protocol>
                </componentOf>
            </substanceAdministration>
        </subject2>
    </section>"#;

    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(xml).unwrap();
    let result = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    // Soft-fail: the entity is persisted, the violation is surfaced.
    assert_eq!(result.created.stakeholders, 1);
    assert!(
        result
            .errors
            .iter()
            .any(|m| m.contains("stakeholder") && m.contains("code must not be empty")),
        "messages: {:?}",
        result.errors
    );

    let count: i64 = stakeholders::table
        .filter(stakeholders::stakeholder_code.eq(""))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_monitoring_observation_at_unexpected_sequence_warns() {
    let xml = r#"<section>
        <code code="82345-7"/>
        <subject2>
            <substanceAdministration>
                <componentOf>
                    <protocol>
                        <code code="P1"/>
                        <component>
                            <sequenceNumber value="5"/>
                            <monitoringObservation><code code="R-LAB"/></monitoringObservation>
                        </component>
                    </protocol>
                </componentOf>
            </substanceAdministration>
        </subject2>
    </section>"#;

    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(xml).unwrap();
    let result = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert_eq!(result.created.requirements, 1);
    assert!(result.success);
    assert_eq!(result.errors.len(), 1, "messages: {:?}", result.errors);
    assert!(result.errors[0].contains("monitoring observation expected at sequence number 2"));
    assert!(result.errors[0].contains("got 5"));
}

#[test]
fn test_missing_section_context_is_fatal_for_subtree() {
    let mut conn = h::setup_db();
    let (document_id, _cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(h::protocol_section_xml()).unwrap();
    let result = {
        // No section cursor: structural error, nothing may be created.
        let mut ctx = ParseContext::new(&mut conn, "test.xml", document_id);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert!(!result.success);
    assert_eq!(result.created.total(), 0);
    assert!(
        result.errors.iter().any(|m| m.contains("current section")),
        "messages: {:?}",
        result.errors
    );

    let protocol_count: i64 = protocols::table.count().get_result(&mut conn).unwrap();
    assert_eq!(protocol_count, 0);
}

#[test]
fn test_unknown_section_code_is_skipped_successfully() {
    let xml = r#"<section><code code="00000-0"/><subject2/></section>"#;

    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let doc = roxmltree::Document::parse(xml).unwrap();
    let result = {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx)
    };

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.created.total(), 0);
}

#[test]
fn test_materials_and_resources_carry_reference_markers() {
    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);
    let section_id = cursor.section_id;

    let doc = roxmltree::Document::parse(h::protocol_section_xml()).unwrap();
    {
        let mut ctx =
            ParseContext::new(&mut conn, "test.xml", document_id).with_section(cursor);
        parse_section(doc.root_element(), &mut ctx);
    }

    let (title, cleaned, marker, attachment): (
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
    ) = section_materials::table
        .filter(section_materials::section_id.eq(section_id))
        .select((
            section_materials::title,
            section_materials::cleaned_title,
            section_materials::ref_marker,
            section_materials::attachment_name,
        ))
        .first(&mut conn)
        .unwrap();
    assert_eq!(title.as_deref(), Some("Patient Guide <ref>MAT-1</ref>"));
    assert_eq!(cleaned.as_deref(), Some("Patient Guide"));
    assert_eq!(marker.as_deref(), Some("MAT-1"));
    assert_eq!(attachment.as_deref(), Some("patient-guide.pdf"));

    let (res_title, res_marker, url): (Option<String>, Option<String>, String) =
        electronic_resources::table
            .filter(electronic_resources::section_id.eq(section_id))
            .select((
                electronic_resources::cleaned_title,
                electronic_resources::ref_marker,
                electronic_resources::resource_url,
            ))
            .first(&mut conn)
            .unwrap();
    assert_eq!(res_title.as_deref(), Some("REMS Website"));
    assert!(res_marker.is_none());
    assert_eq!(url, "https://rems.example.com/program");
}

#[test]
fn test_progress_callback_receives_status_strings() {
    use std::sync::Mutex;

    let mut conn = h::setup_db();
    let (document_id, cursor) = h::setup_document_scope(&mut conn);

    let messages: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let callback = |msg: &str| messages.lock().unwrap().push(msg.to_string());

    let doc = roxmltree::Document::parse(h::protocol_section_xml()).unwrap();
    {
        let mut ctx = ParseContext::new(&mut conn, "test.xml", document_id)
            .with_section(cursor)
            .with_product(ProductCursor {
                item_code: "0002-1234-56".to_string(),
                product_name: Some("Examplinib 10mg Tablets".to_string()),
            })
            .with_progress(&callback);
        parse_section(doc.root_element(), &mut ctx);
    }

    let messages = messages.into_inner().unwrap();
    assert!(!messages.is_empty());
    assert!(messages.iter().any(|m| m.contains("Protocol P1")));
    // The section-level status names the product being processed.
    assert!(
        messages.iter().any(|m| m.contains("0002-1234-56")),
        "messages: {:?}",
        messages
    );
}

use diesel::sqlite::SqliteConnection;

use spl_import::db::models::{NewDocument, NewSection};
use spl_import::db::{establish_connection, run_migrations};
use spl_import::label_xml_parser::SectionCursor;
use spl_import::label_xml_parser::resolver;
use spl_import::label_xml_parser::section_parser::REMS_SECTION_CODE;
use spl_import::logger;

/// Fresh in-memory database with the schema applied.
#[allow(dead_code)]
pub fn setup_db() -> SqliteConnection {
    logger::init_tracing();
    let mut conn = establish_connection(":memory:").expect("in-memory connection");
    run_migrations(&mut conn).expect("migrations");
    conn
}

/// Create the document and section rows that scope a section parse, and
/// return the document id and the section cursor for the context.
#[allow(dead_code)]
pub fn setup_document_scope(conn: &mut SqliteConnection) -> (i32, SectionCursor) {
    let (document, _) = resolver::get_or_create_document(
        conn,
        NewDocument {
            document_guid: "doc-guid-1",
            set_guid: Some("set-guid-1"),
            version_number: Some(1),
            title: Some("Test Labeling Document"),
            effective_date: None,
        },
    )
    .expect("document");
    let document_id = document.record().id;

    let (section, _) = resolver::get_or_create_section(
        conn,
        NewSection {
            document_id,
            section_guid: "section-guid-1",
            section_code: REMS_SECTION_CODE,
            display_name: Some("REMS Summary"),
            title: None,
        },
    )
    .expect("section");
    let section = section.record().clone();

    (
        document_id,
        SectionCursor {
            section_id: section.id,
            section_guid: section.section_guid,
            section_code: section.section_code,
        },
    )
}

/// A complete protocol section subtree: protocol P1 with an approval, a
/// plain requirement at sequence 1, a monitoring observation at sequence 2
/// with a patient stakeholder, one attached material and one electronic
/// resource.
#[allow(dead_code)]
pub fn protocol_section_xml() -> &'static str {
    r#"<section>
        <id root="section-guid-1"/>
        <code code="82345-7" codeSystem="2.16.840.1.113883.6.1" displayName="REMS Summary"/>
        <subject2>
            <substanceAdministration>
                <componentOf>
                    <protocol>
                        <code code="P1" codeSystem="2.16.840.1.113883.3.26.1.1" displayName="Prescriber training"/>
                        <subjectOf>
                            <approval>
                                <code code="C128899" displayName="REMS approval"/>
                                <effectiveTime><low value="20240115"/></effectiveTime>
                                <author>
                                    <territorialAuthority>
                                        <territory><code code="USA"/></territory>
                                    </territorialAuthority>
                                </author>
                            </approval>
                        </subjectOf>
                        <component>
                            <sequenceNumber value="1"/>
                            <requirement>
                                <code code="R-ENROLL" displayName="Enroll the patient"/>
                                <pauseQuantity value="24" unit="h"/>
                            </requirement>
                        </component>
                        <component>
                            <sequenceNumber value="2"/>
                            <monitoringObservation>
                                <code code="R-LAB" displayName="Monitor liver enzymes"/>
                                <effectiveTime><period value="30" unit="d"/></effectiveTime>
                                <participation>
                                    <role><code code="patient" displayName="Patient"/></role>
                                </participation>
                            </monitoringObservation>
                        </component>
                    </protocol>
                </componentOf>
            </substanceAdministration>
        </subject2>
        <subjectOf>
            <document>
                <id root="mat-guid-1"/>
                <title>Patient Guide &lt;ref&gt;MAT-1&lt;/ref&gt;</title>
                <text><reference value="patient-guide.pdf"/></text>
            </document>
        </subjectOf>
        <subjectOf>
            <document>
                <id root="res-guid-1"/>
                <title>REMS Website</title>
                <text><reference value="https://rems.example.com/program"/></text>
            </document>
        </subjectOf>
    </section>"#
}

diesel::table! {
    documents (id) {
        id -> Integer,
        document_guid -> Text,
        set_guid -> Nullable<Text>,
        version_number -> Nullable<Integer>,
        title -> Nullable<Text>,
        effective_date -> Nullable<Date>,
    }
}

diesel::table! {
    organizations (id) {
        id -> Integer,
        organization_name -> Text,
        identifier_value -> Text,
        identifier_root -> Text,
    }
}

diesel::table! {
    sections (id) {
        id -> Integer,
        document_id -> Integer,
        section_guid -> Text,
        section_code -> Text,
        display_name -> Nullable<Text>,
        title -> Nullable<Text>,
    }
}

diesel::table! {
    protocols (id) {
        id -> Integer,
        section_id -> Integer,
        protocol_code -> Text,
        code_system -> Nullable<Text>,
        display_name -> Nullable<Text>,
    }
}

diesel::table! {
    stakeholders (id) {
        id -> Integer,
        stakeholder_code -> Text,
        display_name -> Nullable<Text>,
    }
}

diesel::table! {
    requirements (id) {
        id -> Integer,
        protocol_id -> Integer,
        requirement_code -> Text,
        display_name -> Nullable<Text>,
        sequence_number -> Integer,
        is_monitoring_observation -> Bool,
        pause_quantity_value -> Nullable<Double>,
        pause_quantity_unit -> Nullable<Text>,
        period_value -> Nullable<Double>,
        period_unit -> Nullable<Text>,
        stakeholder_id -> Nullable<Integer>,
    }
}

diesel::table! {
    protocol_approvals (id) {
        id -> Integer,
        protocol_id -> Integer,
        approval_code -> Text,
        display_name -> Nullable<Text>,
        territory_code -> Nullable<Text>,
        effective_date -> Nullable<Date>,
    }
}

diesel::table! {
    section_materials (id) {
        id -> Integer,
        section_id -> Integer,
        document_guid -> Text,
        title -> Nullable<Text>,
        cleaned_title -> Nullable<Text>,
        ref_marker -> Nullable<Text>,
        attachment_name -> Nullable<Text>,
    }
}

diesel::table! {
    electronic_resources (id) {
        id -> Integer,
        section_id -> Integer,
        document_guid -> Text,
        title -> Nullable<Text>,
        cleaned_title -> Nullable<Text>,
        ref_marker -> Nullable<Text>,
        resource_url -> Text,
    }
}

diesel::table! {
    document_relationships (id) {
        id -> Integer,
        document_id -> Integer,
        parent_organization_id -> Integer,
        child_organization_id -> Integer,
        relationship_type -> Text,
        relationship_level -> Integer,
    }
}

diesel::joinable!(sections -> documents (document_id));
diesel::joinable!(protocols -> sections (section_id));
diesel::joinable!(requirements -> protocols (protocol_id));
diesel::joinable!(requirements -> stakeholders (stakeholder_id));
diesel::joinable!(protocol_approvals -> protocols (protocol_id));
diesel::joinable!(section_materials -> sections (section_id));
diesel::joinable!(electronic_resources -> sections (section_id));
diesel::joinable!(document_relationships -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(
    documents,
    organizations,
    sections,
    protocols,
    stakeholders,
    requirements,
    protocol_approvals,
    section_materials,
    electronic_resources,
    document_relationships,
);

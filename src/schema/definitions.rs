//! Static schema definitions, one per record type served by the tap.
//!
//! These are the bit-exact output contracts surfaced to downstream consumers;
//! changing a field here changes the shape every sink sees.

use super::{EventKind, FieldDef, FieldSpec, ScalarKind, Schema};

const fn string_field(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        spec: FieldSpec::Scalar(ScalarKind::String),
    }
}

const fn timestamp_field(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        spec: FieldSpec::Timestamp,
    }
}

const fn event_list_field(name: &'static str, kind: EventKind) -> FieldDef {
    FieldDef {
        name,
        spec: FieldSpec::EventList(kind),
    }
}

pub fn contacts() -> Schema {
    Schema {
        stream: "contacts",
        key_properties: &["contact_id"],
        fields: vec![
            string_field("contact_id"),
            timestamp_field("created_at"),
            timestamp_field("updated_at"),
            timestamp_field("first_visit_at"),
            string_field("name"),
            string_field("first_name"),
            string_field("last_name"),
            string_field("email"),
            string_field("phone"),
            string_field("mailing_country"),
            string_field("mailing_state"),
            string_field("company"),
            string_field("company_priority"),
            string_field("status"),
            string_field("lead_source"),
            FieldDef {
                name: "lists",
                spec: FieldSpec::RawList,
            },
            string_field("twitter"),
            string_field("salutation"),
            event_list_field("anywhere_page_visits", EventKind::UrlFlag),
            event_list_field("anywhere_utm", EventKind::UrlFlag),
            event_list_field("anywhere_form_submits", EventKind::UrlFlag),
            event_list_field("mail_opened", EventKind::IdTimestamp),
            event_list_field("mail_received", EventKind::IdTimestamp),
            event_list_field("mail_bounced", EventKind::IdTimestamp),
            event_list_field("mail_hardbounced", EventKind::IdTimestamp),
            event_list_field("mail_clicked", EventKind::IdTimestamp),
            event_list_field("mail_complained", EventKind::IdTimestamp),
            event_list_field("mail_unsubscribed", EventKind::IdTimestamp),
        ],
    }
}

pub fn lists() -> Schema {
    Schema {
        stream: "lists",
        key_properties: &["list_id"],
        fields: vec![string_field("list_id"), string_field("title")],
    }
}

pub fn lists_contacts() -> Schema {
    Schema {
        stream: "lists_contacts",
        key_properties: &["list_id", "contact_id"],
        fields: vec![string_field("list_id"), string_field("contact_id")],
    }
}

pub fn smart_segments() -> Schema {
    Schema {
        stream: "smart_segments",
        key_properties: &["segment_id"],
        fields: vec![string_field("segment_id"), string_field("title")],
    }
}

pub fn smart_segments_contacts() -> Schema {
    Schema {
        stream: "smart_segments_contacts",
        key_properties: &["segment_id", "contact_id"],
        fields: vec![string_field("segment_id"), string_field("contact_id")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contacts_declares_full_contract() {
        let schema = contacts();
        assert_eq!(schema.fields.len(), 28);
        assert_eq!(schema.key_properties, &["contact_id"]);
        assert_eq!(
            schema.field("mail_opened").unwrap().spec,
            FieldSpec::EventList(EventKind::IdTimestamp)
        );
        assert_eq!(
            schema.field("anywhere_page_visits").unwrap().spec,
            FieldSpec::EventList(EventKind::UrlFlag)
        );
        assert_eq!(schema.field("lists").unwrap().spec, FieldSpec::RawList);
        assert_eq!(schema.field("created_at").unwrap().spec, FieldSpec::Timestamp);
    }
}

use listsync_model::{EditorMode, FieldValue, Record, RecordId, RecordKind};
use listsync_schemas::{RecordSchema, SchemaCatalog, payload, validate_draft};
use serde_json::{Value, json};

fn schema(name: &str) -> RecordSchema {
    SchemaCatalog::builtin()
        .expect("builtin catalog")
        .get(&RecordKind::new(name).expect("kind"))
        .cloned()
        .expect("schema present")
}

#[test]
fn blank_draft_is_total_and_empty() {
    let account = schema("account");
    let draft = account.blank_draft();
    assert!(draft.is_new);
    assert_eq!(draft.fields.len(), account.fields.len());
    assert!(draft.fields.values().all(|v| *v == FieldValue::empty_text()));
}

#[test]
fn record_normalization_fills_missing_fields() {
    let contact = schema("contact");
    let record = Record::new(RecordId::new("003A").expect("id"))
        .with_field("LastName", "Lovelace")
        .with_field("Phone", Value::Null)
        .with_field("Unrelated__c", "dropped");
    let draft = contact.draft_from_record(&record);
    assert!(!draft.is_new);
    assert_eq!(draft.get("LastName"), Some(&FieldValue::from("Lovelace")));
    assert_eq!(draft.get("Phone"), Some(&FieldValue::empty_text()));
    assert_eq!(draft.get("MobilePhone"), Some(&FieldValue::empty_text()));
    assert!(draft.get("Unrelated__c").is_none());
}

#[test]
fn first_failure_follows_schema_order() {
    let opportunity = schema("opportunity");
    let draft = opportunity.blank_draft();
    let result = validate_draft(&opportunity, &draft, EditorMode::Create);
    assert!(!result.ok);
    let fields: Vec<&str> = result.failed_fields().collect();
    assert_eq!(fields, vec!["Name", "CloseDate", "StageName"]);
    assert_eq!(
        result.first_failure().map(|f| f.message.as_str()),
        Some("Opportunity Name is required")
    );
}

#[test]
fn custom_messages_override_default() {
    let account = schema("account");
    let result = validate_draft(&account, &account.blank_draft(), EditorMode::Edit);
    assert_eq!(
        result.first_failure().map(|f| f.message.as_str()),
        Some("Name is required")
    );
}

#[test]
fn on_create_rules_do_not_apply_to_edit() {
    let lead = schema("lead");
    let mut draft = lead.blank_draft();
    draft.set("LastName", "Hopper".into());
    draft.set("Company", "Navy".into());
    assert!(validate_draft(&lead, &draft, EditorMode::Edit).ok);
    let create = validate_draft(&lead, &draft, EditorMode::Create);
    assert_eq!(
        create.failed_fields().collect::<Vec<_>>(),
        vec!["Channel__c", "Geography__c", "Business_Type__c"]
    );
}

#[test]
fn format_rules_reject_bad_values() {
    let opportunity = schema("opportunity");
    let mut draft = opportunity.blank_draft();
    draft.set("Name", "Renewal".into());
    draft.set("CloseDate", "31/12/2025".into());
    draft.set("StageName", "Won-ish".into());
    draft.set("Amount", "lots".into());
    let result = validate_draft(&opportunity, &draft, EditorMode::Create);
    assert_eq!(
        result.failed_fields().collect::<Vec<_>>(),
        vec!["Amount", "CloseDate", "StageName"]
    );
    assert_eq!(result.failures[0].message, "Amount must be a number");
}

#[test]
fn view_mode_never_fails() {
    let opportunity = schema("opportunity");
    assert!(validate_draft(&opportunity, &opportunity.blank_draft(), EditorMode::View).ok);
}

#[test]
fn payload_is_typed() {
    let opportunity = schema("opportunity");
    let mut draft = opportunity.blank_draft();
    draft.set("Name", "Renewal".into());
    draft.set("CloseDate", "2025-12-31".into());
    draft.set("StageName", "Prospecting".into());
    draft.set("Amount", "1500".into());
    let fields = payload(&opportunity, &draft);
    assert_eq!(fields["Name"], json!("Renewal"));
    assert_eq!(fields["Amount"], json!(1500));
    assert_eq!(fields["Probability"], Value::Null);
    assert_eq!(fields["AccountId"], Value::Null);
    assert_eq!(fields["NextStep"], json!(""));
    assert_eq!(fields.len(), opportunity.fields.len());
}

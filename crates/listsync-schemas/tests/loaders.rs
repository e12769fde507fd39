use std::fs;
use std::path::Path;

use listsync_model::{EditorMode, RecordKind};
use listsync_schemas::{
    FieldKind, RequiredWhen, SchemaCatalog, SchemaError, load_schema_dir, parse_schema,
};

fn kind(name: &str) -> RecordKind {
    RecordKind::new(name).expect("valid kind")
}

#[test]
fn builtin_catalog_has_four_kinds() {
    let catalog = SchemaCatalog::builtin().expect("builtin catalog");
    let kinds: Vec<&str> = catalog.kinds().map(RecordKind::as_str).collect();
    assert_eq!(kinds, vec!["account", "contact", "lead", "opportunity"]);
}

#[test]
fn every_builtin_schema_requires_a_name_like_field() {
    let catalog = SchemaCatalog::builtin().expect("builtin catalog");
    for schema in catalog.iter() {
        assert!(
            schema.required_fields(EditorMode::Edit).next().is_some(),
            "{} has no always-required field",
            schema.kind
        );
    }
}

#[test]
fn lead_requires_more_on_create() {
    let catalog = SchemaCatalog::builtin().expect("builtin catalog");
    let lead = catalog.get(&kind("lead")).expect("lead schema");
    let on_create: Vec<&str> = lead
        .required_fields(EditorMode::Create)
        .map(|f| f.name.as_str())
        .collect();
    let on_edit: Vec<&str> = lead
        .required_fields(EditorMode::Edit)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(
        on_create,
        vec![
            "LastName",
            "Company",
            "Channel__c",
            "Geography__c",
            "Business_Type__c"
        ]
    );
    assert_eq!(on_edit, vec!["LastName", "Company"]);
    assert!(lead.required_fields(EditorMode::View).next().is_none());
}

#[test]
fn opportunity_columns_use_relationship_paths() {
    let catalog = SchemaCatalog::builtin().expect("builtin catalog");
    let opportunity = catalog.get(&kind("opportunity")).expect("opportunity");
    let account_column = opportunity
        .list_columns()
        .into_iter()
        .find(|c| c.label == "Account Name")
        .expect("account column");
    assert_eq!(account_column.path, "Account.Name");
    assert_eq!(
        opportunity.field("StageName").map(|f| f.kind),
        Some(FieldKind::Picklist)
    );
}

#[test]
fn columns_default_to_fields() {
    let schema = parse_schema(
        r#"
kind = "Note"
label = "Note"

[[field]]
name = "Title"
label = "Title"
kind = "text"
required = "always"

[[field]]
name = "Body"
label = "Body"
kind = "text_area"
"#,
        Path::new("note.toml"),
    )
    .expect("parse note schema");
    assert_eq!(schema.kind.as_str(), "note");
    let labels: Vec<String> = schema.list_columns().into_iter().map(|c| c.label).collect();
    assert_eq!(labels, vec!["Title", "Body"]);
    assert_eq!(schema.fields[1].required, RequiredWhen::Never);
}

#[test]
fn rejects_schema_without_always_required_field() {
    let err = parse_schema(
        r#"
kind = "note"
label = "Note"

[[field]]
name = "Title"
label = "Title"
kind = "text"
required = "on_create"
"#,
        Path::new("note.toml"),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::NoAlwaysRequiredField { .. }));
}

#[test]
fn rejects_picklist_without_options_and_duplicates() {
    let picklist = parse_schema(
        r#"
kind = "note"
label = "Note"

[[field]]
name = "Title"
label = "Title"
kind = "picklist"
required = "always"
"#,
        Path::new("note.toml"),
    )
    .unwrap_err();
    assert!(matches!(picklist, SchemaError::MissingOptions { .. }));

    let duplicate = parse_schema(
        r#"
kind = "note"
label = "Note"

[[field]]
name = "Title"
label = "Title"
kind = "text"
required = "always"

[[field]]
name = "Title"
label = "Title again"
kind = "text"
"#,
        Path::new("note.toml"),
    )
    .unwrap_err();
    assert!(matches!(duplicate, SchemaError::DuplicateField { .. }));
}

#[test]
fn reports_toml_errors_with_path() {
    let err = parse_schema("kind = ", Path::new("broken.toml")).unwrap_err();
    match err {
        SchemaError::Toml { path, .. } => assert_eq!(path, Path::new("broken.toml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn loads_directory_in_file_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("b_task.toml"),
        "kind = \"task\"\nlabel = \"Task\"\n\n[[field]]\nname = \"Subject\"\nlabel = \"Subject\"\nkind = \"text\"\nrequired = \"always\"\n",
    )
    .expect("write task");
    fs::write(
        dir.path().join("a_case.toml"),
        "kind = \"case\"\nlabel = \"Case\"\n\n[[field]]\nname = \"Subject\"\nlabel = \"Subject\"\nkind = \"text\"\nrequired = \"always\"\n",
    )
    .expect("write case");
    fs::write(dir.path().join("README.md"), "ignored").expect("write readme");

    let schemas = load_schema_dir(dir.path()).expect("load dir");
    let kinds: Vec<&str> = schemas.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["case", "task"]);

    let catalog = SchemaCatalog::resolve(Some(dir.path())).expect("resolve");
    assert_eq!(catalog.len(), 2);
}

#[test]
fn duplicate_kinds_are_rejected() {
    let mut schemas = listsync_schemas::builtin_schemas().expect("builtin");
    schemas.push(schemas[0].clone());
    let err = SchemaCatalog::from_schemas(schemas).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateKind { kind } if kind == "account"));
}

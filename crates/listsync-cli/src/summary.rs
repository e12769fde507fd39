use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use listsync_core::{FetchStatus, ResultSet};
use listsync_model::{DraftRecord, FieldValue};
use listsync_schemas::{RecordSchema, SchemaCatalog};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn kinds_table(catalog: &SchemaCatalog) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Label"),
        header_cell("Fields"),
        header_cell("Required"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for schema in catalog.iter() {
        let required: Vec<&str> = schema
            .required_fields(listsync_model::EditorMode::Edit)
            .map(|field| field.name.as_str())
            .collect();
        table.add_row(vec![
            Cell::new(schema.kind.as_str()).add_attribute(Attribute::Bold),
            Cell::new(&schema.label),
            Cell::new(schema.fields.len()),
            Cell::new(required.join(", ")),
        ]);
    }
    table
}

/// The list view: one row per record, one column per schema column.
pub fn records_table(schema: &RecordSchema, set: &ResultSet) -> Table {
    let columns = schema.list_columns();
    let mut table = Table::new();
    table.set_header(
        columns
            .iter()
            .map(|column| header_cell(&column.label))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for record in set.records.iter() {
        table.add_row(
            columns
                .iter()
                .map(|column| value_cell(record.display(&column.path)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// The editor view: one row per schema field.
pub fn draft_table(schema: &RecordSchema, draft: &DraftRecord) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Value"),
    ]);
    apply_table_style(&mut table);
    for field in &schema.fields {
        let value = draft
            .get(&field.name)
            .map(FieldValue::to_string)
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(&field.label),
            value_cell(value),
        ]);
    }
    table
}

pub fn print_records(schema: &RecordSchema, set: &ResultSet) {
    println!("{}", records_table(schema, set));
    let noun = if set.len() == 1 { "record" } else { "records" };
    match set.status {
        FetchStatus::Error => println!("{} {noun} (stale)", set.len()),
        _ => println!("{} {noun}", set.len()),
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: String) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

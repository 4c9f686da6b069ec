//! Terminal rendering of query results.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use sdtm_model::{CellValue, QueryModule};
use sdtm_query::{CategoryFilterOutcome, NO_DATA_FOUND, QueryResult};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value)
        .fg(Color::DarkGrey)
        .add_attribute(Attribute::Dim)
}

fn value_cell(value: &CellValue) -> Cell {
    match value {
        CellValue::Null => dim_cell("-"),
        CellValue::Integer(_) | CellValue::Number(_) => {
            Cell::new(value.as_text()).set_alignment(CellAlignment::Right)
        }
        CellValue::Text(text) => Cell::new(text),
    }
}

/// The result rows as a table, or the no-data text.
pub fn result_table(result: &QueryResult) -> String {
    if result.result.is_no_data() {
        return NO_DATA_FOUND.to_string();
    }
    let mut table = Table::new();
    table.set_header(result.columns.iter().map(|label| header_cell(label)));
    apply_table_style(&mut table);
    for row in result.result.rows() {
        table.add_row(row.values.iter().map(|(_, value)| value_cell(value)));
    }
    table.to_string()
}

/// Retrieval expression followed by the rows.
pub fn render_result_text(result: &QueryResult) -> String {
    format!(
        "{}\n\n{}",
        result.retrieval_expression,
        result_table(result)
    )
}

pub fn render_result_json(result: &QueryResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Module catalog: id, domain, name and modes.
pub fn modules_table() -> String {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Domain"),
        header_cell("Module"),
        header_cell("Modes"),
    ]);
    apply_table_style(&mut table);
    for module in QueryModule::ALL {
        table.add_row(vec![
            Cell::new(module.id()).set_alignment(CellAlignment::Right),
            Cell::new(module.domain_code()),
            Cell::new(module.as_str()),
            Cell::new(module.mode_names().join(", ")),
        ]);
    }
    table.to_string()
}

/// One value per line; a sentinel is printed dimmed in a table so it reads
/// differently from recorded values.
pub fn values_text(outcome: &CategoryFilterOutcome) -> String {
    match outcome {
        CategoryFilterOutcome::Values(values) => values.join("\n"),
        CategoryFilterOutcome::Sentinel(sentinel) => {
            let mut table = Table::new();
            apply_table_style(&mut table);
            table.add_row(vec![dim_cell(sentinel)]);
            table.to_string()
        }
    }
}

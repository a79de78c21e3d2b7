//! Terminal rendering for import reports, classifications and records.
//!
//! Records are rendered from their Arrow form as vertical cards grouped by
//! schema section, with type-aware formatting for scalars and lists.

use arrow::array::{Array, Float64Array, ListArray, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::ArrayFormatter;
use nestlog_core::{BatchReport, CategoryMatch, ExtractedQuantity};

const MAX_WARNINGS: usize = 10;

// ── Schema section groupings ──

const ACTIVITY: &[&str] = &["category", "subtype", "sender", "source"];

const QUANTITY: &[&str] = &[
    "quantity_kind",
    "quantity_value",
    "quantity_unit",
    "quantity_raw",
];

const DETAIL: &[&str] = &["note", "tags"];

const IDENTITY: &[&str] = &["record_id", "subject_id"];

// ── Public API ──

/// Print every row of a record batch as a card.
pub fn print_record_cards(batch: &RecordBatch) {
    for row in 0..batch.num_rows() {
        print_record_card(batch, row);
    }
}

/// Print the summary of one transcript run.
pub fn print_report(report: &BatchReport, dry_run: bool) {
    println!("=== Import{} ===", if dry_run { " (dry run)" } else { "" });
    println!("  {:<22} {}", "lines", report.total_lines);
    println!("  {:<22} {}", "messages", report.messages_parsed);
    println!("  {:<22} {}", "continuation lines", report.continuation_lines);
    println!("  {:<22} {}", "skipped lines", report.skipped_lines);
    println!("  {:<22} {}", "records", report.records_emitted);
    println!("  {:<22} {}", "uncategorized", report.skipped_uncategorized);
    println!("  {:<22} {}", "duplicates", report.duplicates_skipped);
    if !dry_run {
        println!("  {:<22} {}", "saved", report.persisted);
        if report.storage_failures > 0 {
            println!("  {:<22} {}", "save failures", report.storage_failures);
        }
    }
    if let (Some(first), Some(last)) = (report.first_activity, report.last_activity) {
        println!("  {:<22} {first} .. {last}", "activity range");
    }
    println!();

    if !report.per_category_counts.is_empty() {
        println!("By category");
        for (category, count) in &report.per_category_counts {
            println!("  {:<22} {}", category.as_str(), count);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({})", report.warnings.len());
        for warning in report.warnings.iter().take(MAX_WARNINGS) {
            println!("  {warning}");
        }
        if report.warnings.len() > MAX_WARNINGS {
            println!("  ... and {} more", report.warnings.len() - MAX_WARNINGS);
        }
    }
}

/// Print a classification and the quantities found in the same text.
pub fn print_match(matched: &CategoryMatch, quantities: &[ExtractedQuantity]) {
    println!("  {:<22} {}", "category", matched.category.as_str());
    if let Some(subtype) = &matched.subtype {
        println!("  {:<22} {}", "subtype", subtype);
    }
    println!("  {:<22} {}", "score", matched.score);
    if !matched.matched_keywords.is_empty() {
        println!("  {:<22} {}", "keywords", matched.matched_keywords.join(", "));
    }
    for q in quantities {
        println!("  {:<22} {} ({:?})", q.kind.as_str(), q, q.raw_span);
    }
}

// ── Card rendering ──

fn print_record_card(batch: &RecordBatch, row: usize) {
    let category = get_utf8(batch, "category", row).unwrap_or("?");
    let when = formatted(batch, "occurred_at", row).unwrap_or_default();
    println!("=== {category} @ {when} ===");

    print_section(batch, row, "Activity", ACTIVITY);
    print_section(batch, row, "Quantity", QUANTITY);
    print_section(batch, row, "Detail", DETAIL);
    print_section(batch, row, "Identity", IDENTITY);
}

fn print_section(batch: &RecordBatch, row: usize, header: &str, cols: &[&str]) {
    let has_data = cols.iter().any(|&col| {
        batch
            .schema()
            .index_of(col)
            .ok()
            .is_some_and(|i| !batch.column(i).is_null(row))
    });
    if !has_data {
        return;
    }

    println!("{header}");
    for &col_name in cols {
        let Ok(idx) = batch.schema().index_of(col_name) else {
            continue;
        };
        let col = batch.column(idx);
        if col.is_null(row) {
            continue;
        }

        match col.data_type() {
            DataType::Utf8 => {
                if let Some(value) = get_utf8(batch, col_name, row)
                    && !value.is_empty()
                {
                    println!("  {:<22} {}", col_name, value);
                }
            }
            DataType::Float64 => {
                if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
                    println!("  {:<22} {:.3}", col_name, arr.value(row));
                }
            }
            DataType::List(inner) if inner.data_type() == &DataType::Utf8 => {
                print_list_utf8(col.as_ref(), row, col_name);
            }
            _ => match formatted(batch, col_name, row) {
                Some(value) => println!("  {:<22} {}", col_name, value),
                None => println!("  {:<22} ({})", col_name, col.data_type()),
            },
        }
    }
    println!();
}

// ── List<Utf8> ──

fn print_list_utf8(col: &dyn Array, row: usize, col_name: &str) {
    let Some(list) = col.as_any().downcast_ref::<ListArray>() else {
        return;
    };
    let values = list.value(row);
    let Some(strings) = values.as_any().downcast_ref::<StringArray>() else {
        return;
    };
    let items: Vec<&str> = (0..strings.len())
        .filter(|&i| !strings.is_null(i))
        .map(|i| strings.value(i))
        .collect();
    if items.is_empty() {
        return;
    }
    println!("  {:<22} {}", col_name, items.join(", "));
}

// ── Helpers ──

fn get_utf8<'a>(batch: &'a RecordBatch, col_name: &str, row: usize) -> Option<&'a str> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row))
}

/// Arrow's own display formatting, used for timestamps.
fn formatted(batch: &RecordBatch, col_name: &str, row: usize) -> Option<String> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_null(row) {
        return None;
    }
    let fmt = ArrayFormatter::try_new(col.as_ref(), &Default::default()).ok()?;
    Some(fmt.value(row).to_string())
}

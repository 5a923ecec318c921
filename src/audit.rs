//! Append-only audit trail export and delivery.
//!
//! Serializes audit entries to CSV and hands the result to the object
//! storage capability. The column set is the union of fields across all
//! entries, fixed before any row is written — entries produced by older code
//! paths may lack newer fields, and every row must still carry every column
//! (blank, never omitted).
//!
//! Delivery is day-granular: exports on the same calendar day overwrite the
//! same destination key, keeping one daily snapshot. The serialized text is
//! always returned to the caller; a persistence failure degrades to a
//! warning so the reviewer can still download the export locally.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::models::AuditEntry;
use crate::storage::ObjectStore;

/// Storage key for an export performed on `date`.
pub fn audit_export_key(date: NaiveDate) -> String {
    format!(
        "audit/audit_trails/{}/audit_trail.csv",
        date.format("%Y-%m-%d")
    )
}

/// Serialize audit entries to CSV text. Empty input yields an empty string.
pub fn export_audit_trail(entries: &[AuditEntry]) -> String {
    let rows: Vec<Map<String, Value>> = entries.iter().map(AuditEntry::to_row).collect();
    export_rows(&rows)
}

/// Serialize raw field maps to CSV.
///
/// The header is the union of keys across all rows in first-seen order,
/// computed up front; rows missing a column render it blank. No ragged rows.
pub fn export_rows(rows: &[Map<String, Value>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .map(|c| csv_field(&field_text(row.get(c))))
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Export and deliver to object storage.
///
/// Returns the serialized text regardless of the persistence outcome; an
/// empty trail skips the write entirely so no empty object is created.
pub async fn export_and_persist(
    store: &dyn ObjectStore,
    entries: &[AuditEntry],
    date: NaiveDate,
) -> String {
    let csv = export_audit_trail(entries);
    if csv.is_empty() {
        return csv;
    }

    let key = audit_export_key(date);
    match store.write_blob(&key, csv.as_bytes()).await {
        Ok(()) => tracing::info!(%key, entries = entries.len(), "audit trail persisted"),
        Err(err) => {
            tracing::warn!(%key, error = %err, "audit trail persistence failed; returning text only");
        }
    }
    csv
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ============ CSV writing (minimal, no extra deps) ============

/// Quote a field when it embeds a delimiter, quote, or line break; doubled
/// quotes escape embedded quotes.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

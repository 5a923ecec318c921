//! Catalog loading and expansion.
//!
//! Reads the upstream batch table — one row per uploaded batch version with
//! the fixed header `Batch,batch_count,portal_status,reason` — and expands
//! each row into two [`DocumentRecord`]s, one per document type. CI and PL
//! files are versioned in lockstep with the same counter, so a single row
//! always yields exactly two records sharing the row's status metadata.
//!
//! Storage keys are synthesized deterministically as
//! `{type}/{batch}/{batch}_{version}.pdf`.
//!
//! A missing table falls back to a small built-in seed fixture so the panel
//! can be exercised without upstream data. The fallback is a trial/test aid
//! only and can be disabled via `catalog.seed_fallback`.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{DocType, DocumentRecord};

/// Fixed column names of the batch table, in canonical order.
pub const CATALOG_COLUMNS: [&str; 4] = ["Batch", "batch_count", "portal_status", "reason"];

/// One parsed row of the batch table before expansion.
#[derive(Debug, Clone)]
struct BatchRow {
    batch: String,
    version: u32,
    portal_status: String,
    reason: String,
}

/// Load and expand the document catalog.
///
/// Fails with [`Error::DataSource`] when the table exists but cannot be read
/// or parsed; no partial catalog is ever returned. A missing table uses the
/// seed fixture when `catalog.seed_fallback` is enabled.
pub fn load_catalog(config: &Config) -> Result<Vec<DocumentRecord>> {
    let path = &config.catalog.path;
    let display = path.display().to_string();

    let rows = if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|e| Error::DataSource {
            path: display.clone(),
            message: e.to_string(),
        })?;
        parse_batch_table(&text).map_err(|message| Error::DataSource {
            path: display,
            message,
        })?
    } else if config.catalog.seed_fallback {
        tracing::warn!(path = %path.display(), "catalog file missing; using built-in seed fixture");
        seed_rows()
    } else {
        return Err(Error::DataSource {
            path: display,
            message: "catalog file not found".to_string(),
        });
    };

    Ok(expand_rows(&rows))
}

/// Expand each batch row into one record per document type.
fn expand_rows(rows: &[BatchRow]) -> Vec<DocumentRecord> {
    let mut records = Vec::with_capacity(rows.len() * DocType::ALL.len());
    for row in rows {
        for doc_type in DocType::ALL {
            records.push(DocumentRecord {
                batch: row.batch.clone(),
                doc_type,
                version: row.version,
                storage_key: format!(
                    "{}/{}/{}_{}.pdf",
                    doc_type, row.batch, row.batch, row.version
                ),
                filename: format!("{}_{}.pdf", row.batch, row.version),
                portal_status: row.portal_status.clone(),
                reason: row.reason.clone(),
            });
        }
    }
    records
}

/// Seed fixture used when no catalog file is present. Mirrors the sample
/// table shipped for local trials; not a production data source.
fn seed_rows() -> Vec<BatchRow> {
    let rows = [
        ("B001", 1, "Pending", ""),
        ("B001", 2, "Accepted", "Approved by agent"),
        ("B002", 1, "Rejected", "Missing information"),
        ("B002", 2, "Pending", ""),
        ("B003", 1, "Accepted", "Complete documentation"),
    ];
    rows.iter()
        .map(|(batch, version, status, reason)| BatchRow {
            batch: batch.to_string(),
            version: *version,
            portal_status: status.to_string(),
            reason: reason.to_string(),
        })
        .collect()
}

// ============ CSV parsing (minimal, no extra deps) ============

/// Parse the batch table CSV into rows.
///
/// The header must contain all four fixed column names; extra columns are
/// tolerated and ignored. Blank `portal_status` defaults to `"Unknown"`.
fn parse_batch_table(text: &str) -> std::result::Result<Vec<BatchRow>, String> {
    let mut records = parse_csv(text).into_iter();

    let header = records.next().ok_or("catalog table is empty")?;
    let mut indices = [0usize; 4];
    for (i, name) in CATALOG_COLUMNS.iter().enumerate() {
        indices[i] = header
            .iter()
            .position(|h| h.trim() == *name)
            .ok_or_else(|| format!("missing column '{}' in catalog header", name))?;
    }
    let [batch_ix, count_ix, status_ix, reason_ix] = indices;

    let mut rows = Vec::new();
    for (line, record) in records.enumerate() {
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let field = |ix: usize| record.get(ix).map(String::as_str).unwrap_or("").trim();

        let batch = field(batch_ix);
        if batch.is_empty() {
            return Err(format!("row {}: empty batch identifier", line + 2));
        }
        let version: u32 = field(count_ix)
            .parse()
            .map_err(|_| format!("row {}: invalid batch_count '{}'", line + 2, field(count_ix)))?;
        if version == 0 {
            return Err(format!("row {}: batch_count must be positive", line + 2));
        }
        let portal_status = match field(status_ix) {
            "" => "Unknown".to_string(),
            s => s.to_string(),
        };

        rows.push(BatchRow {
            batch: batch.to_string(),
            version,
            portal_status,
            reason: field(reason_ix).to_string(),
        });
    }

    Ok(rows)
}

/// Split CSV text into records of fields, honoring quoted fields with
/// escaped (doubled) quotes and CRLF line endings.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    record.push(std::mem::take(&mut field));
                }
                '\r' => {}
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_one_row_expands_to_two_records() {
        let rows = parse_batch_table("Batch,batch_count,portal_status,reason\nB001,1,Accepted,\n")
            .unwrap();
        let records = expand_rows(&rows);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].batch, "B001");
        assert_eq!(records[0].doc_type, DocType::CI);
        assert_eq!(records[0].version, 1);
        assert_eq!(records[0].storage_key, "CI/B001/B001_1.pdf");
        assert_eq!(records[0].portal_status, "Accepted");

        assert_eq!(records[1].doc_type, DocType::PL);
        assert_eq!(records[1].storage_key, "PL/B001/B001_1.pdf");
        assert_eq!(records[1].portal_status, "Accepted");
        assert_eq!(records[1].filename, "B001_1.pdf");
    }

    #[test]
    fn test_quoted_reason_with_comma() {
        let rows = parse_batch_table(
            "Batch,batch_count,portal_status,reason\nB002,1,Rejected,\"Missing pages, resubmit\"\n",
        )
        .unwrap();
        assert_eq!(rows[0].reason, "Missing pages, resubmit");
    }

    #[test]
    fn test_blank_portal_status_defaults_to_unknown() {
        let rows =
            parse_batch_table("Batch,batch_count,portal_status,reason\nB001,1,,\n").unwrap();
        assert_eq!(rows[0].portal_status, "Unknown");
    }

    #[test]
    fn test_missing_header_column_rejected() {
        let err = parse_batch_table("Batch,portal_status,reason\nB001,Pending,\n").unwrap_err();
        assert!(err.contains("batch_count"));
    }

    #[test]
    fn test_non_numeric_count_rejected() {
        let err = parse_batch_table("Batch,batch_count,portal_status,reason\nB001,two,Pending,\n")
            .unwrap_err();
        assert!(err.contains("batch_count"));
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(
            parse_batch_table("Batch,batch_count,portal_status,reason\nB001,0,Pending,\n")
                .is_err()
        );
    }

    #[test]
    fn test_crlf_and_trailing_blank_lines() {
        let rows = parse_batch_table(
            "Batch,batch_count,portal_status,reason\r\nB001,1,Pending,\r\n\r\n",
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].batch, "B001");
    }

    #[test]
    fn test_escaped_quotes() {
        let rows = parse_batch_table(
            "Batch,batch_count,portal_status,reason\nB001,1,Pending,\"needs \"\"wet\"\" signature\"\n",
        )
        .unwrap();
        assert_eq!(rows[0].reason, "needs \"wet\" signature");
    }

    #[test]
    fn test_seed_fallback_when_file_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.catalog.path = dir.path().join("absent.csv");

        let records = load_catalog(&config).unwrap();
        // 5 seed rows, two records each.
        assert_eq!(records.len(), 10);
    }

    #[test]
    fn test_missing_file_without_fallback_is_data_source_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.catalog.path = dir.path().join("absent.csv");
        config.catalog.seed_fallback = false;

        assert!(matches!(
            load_catalog(&config),
            Err(crate::error::Error::DataSource { .. })
        ));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Manual_Review.csv");
        std::fs::write(
            &path,
            "Batch,batch_count,portal_status,reason\nB001,1,Pending,\nB001,2,Accepted,Approved by agent\n",
        )
        .unwrap();
        let mut config = Config::minimal();
        config.catalog.path = path;

        let records = load_catalog(&config).unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().any(|r| r.storage_key == "PL/B001/B001_2.pdf"));
    }

    #[test]
    fn test_malformed_file_is_data_source_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Manual_Review.csv");
        std::fs::write(&path, "wrong,header\nB001,1\n").unwrap();
        let mut config = Config::minimal();
        config.catalog.path = path;

        assert!(matches!(
            load_catalog(&config),
            Err(crate::error::Error::DataSource { .. })
        ));
    }
}

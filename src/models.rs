//! Core data models for the review panel.
//!
//! These types flow between the catalog loader, the session state machine,
//! and the audit trail. Catalog records are immutable once loaded; audit
//! entries are immutable once appended.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// The two document categories tracked per batch.
///
/// CI and PL documents are physically distinct files but are versioned in
/// lockstep with the same per-batch counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    CI,
    PL,
}

impl DocType {
    pub const ALL: [DocType; 2] = [DocType::CI, DocType::PL];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::CI => "CI",
            DocType::PL => "PL",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "CI" => Ok(DocType::CI),
            "PL" => Ok(DocType::PL),
            other => Err(Error::Validation(format!(
                "unknown document type: '{}' (expected CI or PL)",
                other
            ))),
        }
    }
}

/// One reviewable unit: a single version of one document type in a batch.
///
/// Constructed only by the catalog loader and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub batch: String,
    pub doc_type: DocType,
    /// Positive, unique within (batch, type), assigned in upload order.
    pub version: u32,
    /// Locates the underlying binary in the external object store.
    pub storage_key: String,
    pub filename: String,
    /// Upstream status label. Not authoritative for review state.
    pub portal_status: String,
    /// Free-text explanation for `portal_status`; may be empty.
    pub reason: String,
}

/// The reviewer's currently chosen pair of versions.
///
/// Replaced wholesale on every change of selection, never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonSelection {
    pub batch: String,
    pub doc_type: DocType,
    pub version_a: u32,
    pub version_b: u32,
}

impl ComparisonSelection {
    /// Label form used in audit entries, e.g. `"1-3"`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.version_a, self.version_b)
    }
}

/// Per (batch, type) review completion state.
///
/// Starts `NotReviewed`; set `Reviewed` only by the save operation and never
/// automatically reverted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    #[default]
    NotReviewed,
    Reviewed,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::NotReviewed => f.write_str("not-reviewed"),
            ReviewStatus::Reviewed => f.write_str("reviewed"),
        }
    }
}

/// The reviewer's verdict on a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    #[default]
    Accept,
    Reject,
    RequestMoreInformation,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => f.write_str("Accept"),
            Decision::Reject => f.write_str("Reject"),
            Decision::RequestMoreInformation => f.write_str("Request More Information"),
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Accept" => Ok(Decision::Accept),
            "Reject" => Ok(Decision::Reject),
            "Request More Information" => Ok(Decision::RequestMoreInformation),
            other => Err(Error::Validation(format!(
                "unknown decision: '{}' (expected Accept, Reject, or Request More Information)",
                other
            ))),
        }
    }
}

/// Immutable record of one save action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Creation instant, second precision, UTC.
    pub timestamp: String,
    pub batch: String,
    pub doc_type: String,
    /// Version pair label, e.g. `"1-3"`.
    pub versions: String,
    /// Fixed value `"reviewed"` at creation.
    pub status: String,
    /// Free text; may be empty. Not validated.
    pub notes: String,
    pub decision: String,
}

impl AuditEntry {
    /// Flatten to a field map for tabular export.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("timestamp".to_string(), Value::String(self.timestamp.clone()));
        row.insert("batch".to_string(), Value::String(self.batch.clone()));
        row.insert("doc_type".to_string(), Value::String(self.doc_type.clone()));
        row.insert("versions".to_string(), Value::String(self.versions.clone()));
        row.insert("status".to_string(), Value::String(self.status.clone()));
        row.insert("notes".to_string(), Value::String(self.notes.clone()));
        row.insert("decision".to_string(), Value::String(self.decision.clone()));
        row
    }
}

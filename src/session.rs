//! Review session state.
//!
//! [`ReviewSession`] is the single source of truth for one reviewer's
//! interactive session: the active batch and document type, the chosen
//! comparison pair, the per-key reviewed map, and the append-only audit
//! list. It is an explicit state object handed to each handler rather than
//! ambient storage; every mutation goes through an operation below, and each
//! operation either completes or leaves the state untouched.
//!
//! The session is a synchronous, single-actor state machine. Callers that
//! share it across tasks (the HTTP server) serialize access externally.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::{
    AuditEntry, ComparisonSelection, Decision, DocType, DocumentRecord, ReviewStatus,
};
use crate::pairing;

pub struct ReviewSession {
    catalog: Vec<DocumentRecord>,
    batch: Option<String>,
    doc_type: DocType,
    selection: Option<ComparisonSelection>,
    statuses: HashMap<(String, DocType), ReviewStatus>,
    audit: Vec<AuditEntry>,
}

impl ReviewSession {
    /// Build a session over a catalog snapshot, activating the first sorted
    /// batch (when any exists), the CI document type, and the default pair.
    pub fn new(catalog: Vec<DocumentRecord>) -> Self {
        let mut session = Self {
            catalog,
            batch: None,
            doc_type: DocType::CI,
            selection: None,
            statuses: HashMap::new(),
            audit: Vec::new(),
        };
        session.batch = session.batches().into_iter().next();
        session.reset_selection();
        session
    }

    /// Sorted distinct batch identifiers present in the catalog.
    pub fn batches(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.catalog.iter().map(|r| r.batch.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn active_batch(&self) -> Option<&str> {
        self.batch.as_deref()
    }

    pub fn active_doc_type(&self) -> DocType {
        self.doc_type
    }

    pub fn selection(&self) -> Option<&ComparisonSelection> {
        self.selection.as_ref()
    }

    pub fn catalog(&self) -> &[DocumentRecord] {
        &self.catalog
    }

    /// Audit entries in append order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.audit
    }

    /// Sorted distinct versions available for the active (batch, type) key.
    pub fn available_versions(&self) -> Vec<u32> {
        let Some(batch) = &self.batch else {
            return Vec::new();
        };
        let set: BTreeSet<u32> = self
            .catalog
            .iter()
            .filter(|r| &r.batch == batch && r.doc_type == self.doc_type)
            .map(|r| r.version)
            .collect();
        set.into_iter().collect()
    }

    /// Candidate comparison pairs for the active key.
    pub fn comparison_pairs(&self) -> Vec<(u32, u32)> {
        pairing::generate_pairs(&self.available_versions())
    }

    /// Look up the catalog record for a specific version under any key.
    pub fn find_record(&self, batch: &str, doc_type: DocType, version: u32) -> Option<&DocumentRecord> {
        self.catalog
            .iter()
            .find(|r| r.batch == batch && r.doc_type == doc_type && r.version == version)
    }

    /// Activate a batch. Unknown identifiers are rejected without touching
    /// the current selection.
    pub fn select_batch(&mut self, batch: &str) -> Result<()> {
        if !self.catalog.iter().any(|r| r.batch == batch) {
            return Err(Error::Validation(format!("unknown batch: '{}'", batch)));
        }
        self.batch = Some(batch.to_string());
        self.revalidate_selection();
        Ok(())
    }

    /// Switch the active document type.
    pub fn select_doc_type(&mut self, doc_type: DocType) {
        self.doc_type = doc_type;
        self.revalidate_selection();
    }

    /// Choose a comparison pair from the available version set.
    ///
    /// Both versions must be present and distinct; on rejection the prior
    /// selection stands. Re-selecting the current pair is a no-op.
    pub fn select_comparison(&mut self, version_a: u32, version_b: u32) -> Result<()> {
        let Some(batch) = self.batch.clone() else {
            return Err(Error::Validation("no batch selected".to_string()));
        };
        if version_a == version_b {
            return Err(Error::Validation(format!(
                "comparison versions must differ (got {} twice)",
                version_a
            )));
        }
        let available = self.available_versions();
        for version in [version_a, version_b] {
            if !available.contains(&version) {
                return Err(Error::Validation(format!(
                    "version {} is not available for {}/{}",
                    version, batch, self.doc_type
                )));
            }
        }
        self.selection = Some(ComparisonSelection {
            batch,
            doc_type: self.doc_type,
            version_a,
            version_b,
        });
        Ok(())
    }

    /// Save a review decision for the current selection.
    ///
    /// Appends an [`AuditEntry`] snapshot and marks the active key reviewed.
    /// Requires an active comparable selection; notes are stored verbatim.
    pub fn record_decision(&mut self, decision: Decision, notes: &str) -> Result<&AuditEntry> {
        let selection = self
            .selection
            .clone()
            .ok_or_else(|| Error::Validation("no comparison selected".to_string()))?;

        let entry = AuditEntry {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            batch: selection.batch.clone(),
            doc_type: selection.doc_type.to_string(),
            versions: selection.label(),
            status: ReviewStatus::Reviewed.to_string(),
            notes: notes.to_string(),
            decision: decision.to_string(),
        };
        self.statuses
            .insert((selection.batch, selection.doc_type), ReviewStatus::Reviewed);
        self.audit.push(entry);
        Ok(self.audit.last().expect("entry just appended"))
    }

    /// Review completion state for a key; unseen keys are `NotReviewed`.
    pub fn status(&self, batch: &str, doc_type: DocType) -> ReviewStatus {
        self.statuses
            .get(&(batch.to_string(), doc_type))
            .copied()
            .unwrap_or_default()
    }

    /// Fired on every key change: a selection whose versions are both still
    /// available is re-keyed and kept; anything else resets to the default
    /// pair for the new key.
    fn revalidate_selection(&mut self) {
        let available = self.available_versions();
        let carried = match (&self.batch, &self.selection) {
            (Some(batch), Some(sel))
                if available.contains(&sel.version_a) && available.contains(&sel.version_b) =>
            {
                Some((batch.clone(), sel.version_a, sel.version_b))
            }
            _ => None,
        };
        match carried {
            Some((batch, version_a, version_b)) => {
                self.selection = Some(ComparisonSelection {
                    batch,
                    doc_type: self.doc_type,
                    version_a,
                    version_b,
                });
            }
            None => self.reset_selection(),
        }
    }

    /// Deterministic reset: first two sorted versions, or no selection when
    /// the group is not comparable.
    fn reset_selection(&mut self) {
        let available = self.available_versions();
        self.selection = match (&self.batch, pairing::default_pair(&available)) {
            (Some(batch), Some((a, b))) => Some(ComparisonSelection {
                batch: batch.clone(),
                doc_type: self.doc_type,
                version_a: a,
                version_b: b,
            }),
            _ => None,
        };
    }
}

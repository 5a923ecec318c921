//! # Review Harness
//!
//! A review panel backend for paired document versions with an auditable
//! decision trail.
//!
//! Review Harness loads a catalog of batches whose CI and PL documents are
//! versioned in lockstep, offers a reviewer side-by-side comparison pairs,
//! records accept/reject/more-info decisions into an append-only audit
//! trail, and exports that trail as CSV to S3-compatible object storage.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Catalog CSV  │──▶│ ReviewSession │──▶│ Audit Trail │
//! │ (batch table)│   │ select/decide │   │ CSV export  │
//! └──────────────┘   └──────┬────────┘   └──────┬──────┘
//!                           │                   │
//!                    ┌──────▼──────┐     ┌──────▼──────┐
//!                    │ HTTP panel  │     │  S3 (SigV4) │
//!                    │   (axum)    │     │ ObjectStore │
//!                    └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rvw catalog                   # print the expanded document catalog
//! rvw pairs B001 --doc-type CI  # candidate comparison pairs for a batch
//! rvw sources                   # data source health
//! rvw serve                     # start the review panel server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`catalog`] | Batch table loading and record expansion |
//! | [`pairing`] | Candidate comparison pair generation |
//! | [`session`] | Per-reviewer session state machine |
//! | [`audit`] | Audit trail CSV export and delivery |
//! | [`storage`] | Object store trait, S3 SigV4 client, memory store |
//! | [`viewer`] | Blob-to-viewable embedding strategies with fallback |
//! | [`server`] | Review panel HTTP server |
//! | [`sources`] | Data source health listing |

pub mod audit;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod pairing;
pub mod server;
pub mod session;
pub mod sources;
pub mod storage;
pub mod viewer;

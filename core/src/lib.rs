//! admetrics-core — the metrics engine behind the agency dashboard.
//!
//! Flow: upload bytes → intake guard → CSV normalizer → report persisted
//! with its raw rows → aggregator derives the summary → reporting rollups
//! read the completed reports.

pub mod aggregator;
pub mod config;
pub mod entities;
pub mod error;
pub mod files;
pub mod ingest;
pub mod intake;
pub mod normalizer;
pub mod report;
pub mod reporting;
pub mod store;
pub mod types;

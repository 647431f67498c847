//! Upload pipeline: intake guard → vault → normalizer → report row →
//! summary.
//!
//! A failed upload leaves nothing behind — the stored file is removed
//! again when parsing rejects it, and no report row exists until the CSV
//! produced at least one valid row.

use crate::{
    aggregator::MetricsAggregator,
    config::IngestConfig,
    error::{DashError, DashResult},
    files::CsvVault,
    intake::{self, UploadMeta},
    normalizer,
    report::{MetricReport, ReportStatus},
    store::DashStore,
    types::EntityId,
};
use chrono::NaiveDate;
use uuid::Uuid;

/// Caller-supplied report fields accompanying the upload.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub client_id: EntityId,
    pub strategy_id: Option<EntityId>,
    pub period_label: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

pub struct MetricsIngest<'a> {
    store: &'a DashStore,
    vault: &'a CsvVault,
    config: &'a IngestConfig,
}

impl<'a> MetricsIngest<'a> {
    pub fn new(store: &'a DashStore, vault: &'a CsvVault, config: &'a IngestConfig) -> Self {
        Self {
            store,
            vault,
            config,
        }
    }

    /// Run the full pipeline for one upload and return the completed
    /// report.
    pub fn upload(
        &self,
        meta: &UploadMeta,
        bytes: &[u8],
        request: &NewReport,
    ) -> DashResult<MetricReport> {
        intake::validate(meta, self.config)?;
        validate_request(request)?;

        // Weak references, but they must resolve before we accept data.
        self.store.get_client(&request.client_id)?;
        if let Some(strategy_id) = request.strategy_id.as_deref() {
            self.store.get_strategy(strategy_id)?;
        }

        let stored_file = self
            .vault
            .save(&request.client_id, &meta.filename, bytes)?;

        let parsed = match normalizer::parse(bytes, self.config) {
            Ok(parsed) => parsed,
            Err(e) => {
                // No orphaned file for a rejected upload.
                if let Err(cleanup) = self.vault.delete(&stored_file) {
                    log::warn!("could not remove rejected upload {stored_file}: {cleanup}");
                }
                return Err(e);
            }
        };
        if parsed.skipped > 0 {
            log::info!(
                "upload {}: {} malformed row(s) skipped, {} kept",
                meta.filename,
                parsed.skipped,
                parsed.rows.len()
            );
        }

        let report = MetricReport {
            report_id: Uuid::new_v4().to_string(),
            client_id: request.client_id.clone(),
            strategy_id: request.strategy_id.clone(),
            period_label: request.period_label.clone(),
            period_start: request.period_start,
            period_end: request.period_end,
            stored_file,
            original_filename: meta.filename.clone(),
            file_size: meta.size_bytes,
            rows: parsed.rows,
            summary: None,
            status: ReportStatus::Processing,
            uploaded_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.store.insert_report(&report)?;

        MetricsAggregator::new(self.store).recalculate(&report.report_id)
    }

    /// Explicit recompute over the stored rows. Idempotent.
    pub fn recalculate(&self, report_id: &str) -> DashResult<MetricReport> {
        MetricsAggregator::new(self.store).recalculate(report_id)
    }

    /// Delete a report and its backing file.
    pub fn delete(&self, report_id: &str) -> DashResult<()> {
        let report = self.store.get_report(report_id)?;
        self.vault.delete(&report.stored_file)?;
        self.store.delete_report(report_id)
    }
}

fn validate_request(request: &NewReport) -> DashResult<()> {
    if request.client_id.is_empty() {
        return Err(DashError::Validation("a client is required".into()));
    }
    if request.period_start > request.period_end {
        return Err(DashError::Validation(
            "period start must not be after period end".into(),
        ));
    }
    Ok(())
}

//! Metrics aggregator — derives a report's summary from its stored rows.
//!
//! The computation is a pure function of the rows, so recomputing against
//! unchanged rows yields bit-identical output and concurrent recomputes
//! are last-writer-wins safe. The status flip to `completed` happens in a
//! single store update, after the summary exists.

use crate::{
    error::{DashError, DashResult},
    normalizer::MetricRow,
    report::{MetricReport, MetricSummary, ReportStatus},
    store::DashStore,
};

/// Round to 4 decimal places for storage.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Sum the five totals across all rows and derive the ratio metrics.
/// Every ratio is exactly 0 when its denominator is 0.
pub fn compute_summary(rows: &[MetricRow]) -> MetricSummary {
    let mut impressions = 0u64;
    let mut clicks = 0u64;
    let mut conversions = 0u64;
    let mut spend = 0f64;
    let mut revenue = 0f64;

    for row in rows {
        // Count sums saturate: absurd vendor exports must never wrap.
        impressions = impressions.saturating_add(row.impresiones);
        clicks = clicks.saturating_add(row.clicks);
        conversions = conversions.saturating_add(row.conversiones);
        spend += row.costo;
        revenue += row.ingresos;
    }

    let ctr = if impressions > 0 {
        clicks as f64 / impressions as f64 * 100.0
    } else {
        0.0
    };
    let cpm = if impressions > 0 {
        spend / impressions as f64 * 1000.0
    } else {
        0.0
    };
    let cpc = if clicks > 0 { spend / clicks as f64 } else { 0.0 };
    let roas = if spend > 0.0 { revenue / spend } else { 0.0 };
    let conversion_rate = if clicks > 0 {
        conversions as f64 / clicks as f64 * 100.0
    } else {
        0.0
    };

    MetricSummary {
        impressions,
        clicks,
        conversions,
        spend,
        revenue,
        ctr: round4(ctr),
        cpm: round4(cpm),
        cpc: round4(cpc),
        roas: round4(roas),
        conversion_rate: round4(conversion_rate),
    }
}

pub struct MetricsAggregator<'a> {
    store: &'a DashStore,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(store: &'a DashStore) -> Self {
        Self { store }
    }

    /// Recompute a report's summary from its stored rows and mark it
    /// completed. Idempotent. On failure the report keeps its prior
    /// status and last-known-good summary.
    pub fn recalculate(&self, report_id: &str) -> DashResult<MetricReport> {
        // NotFound when the report is missing; Compute when its rows are.
        let rows_json = self.store.report_rows_json(report_id)?.ok_or_else(|| {
            DashError::Compute(format!("report '{report_id}' has no stored rows"))
        })?;
        let rows: Vec<MetricRow> = serde_json::from_str(&rows_json)
            .map_err(|e| DashError::Compute(format!("stored rows are corrupt: {e}")))?;
        if rows.is_empty() {
            return Err(DashError::Compute(format!(
                "report '{report_id}' has no stored rows"
            )));
        }

        let summary = compute_summary(&rows);
        // Totals, ratios and the status flip land in one UPDATE; a
        // failure before this point leaves the row untouched.
        self.store
            .complete_report(report_id, &summary, ReportStatus::Completed)?;

        log::debug!("report {report_id} recomputed: {summary}");
        self.store.get_report(report_id)
    }
}

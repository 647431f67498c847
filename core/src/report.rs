//! Metric report record: one uploaded CSV with its normalized rows and
//! derived summary.

use crate::{normalizer::MetricRow, types::EntityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing lifecycle of a report. Summary fields stay zero until the
/// report reaches `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReportStatus::Pending),
            "processing" => Some(ReportStatus::Processing),
            "completed" => Some(ReportStatus::Completed),
            "error" => Some(ReportStatus::Error),
            _ => None,
        }
    }
}

/// Totals and derived ratios over a report's rows. Ratios are stored
/// rounded to 4 decimals and are zero when their denominator is zero —
/// never NaN or infinite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricSummary {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
    pub ctr: f64,
    pub cpm: f64,
    pub cpc: f64,
    pub roas: f64,
    pub conversion_rate: f64,
}

/// Display formatting rounds ratios to 2 decimals; storage keeps 4.
impl fmt::Display for MetricSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "impressions {} | clicks {} | conversions {} | spend {:.2} | revenue {:.2} \
             | CTR {:.2}% | CPM {:.2} | CPC {:.2} | ROAS {:.2} | conv rate {:.2}%",
            self.impressions,
            self.clicks,
            self.conversions,
            self.spend,
            self.revenue,
            self.ctr,
            self.cpm,
            self.cpc,
            self.roas,
            self.conversion_rate,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    pub report_id: EntityId,
    pub client_id: EntityId,
    pub strategy_id: Option<EntityId>,
    pub period_label: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Name of the backing file in the vault.
    pub stored_file: String,
    pub original_filename: String,
    pub file_size: u64,
    /// Normalized rows, in file order. Owned exclusively by this report.
    pub rows: Vec<MetricRow>,
    /// None until status is Completed.
    pub summary: Option<MetricSummary>,
    pub status: ReportStatus,
    pub uploaded_at: String,
}

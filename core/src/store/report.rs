//! Metric report database queries.

use super::DashStore;
use crate::{
    error::{DashError, DashResult},
    normalizer::MetricRow,
    report::{MetricReport, MetricSummary, ReportStatus},
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

/// Narrowing filter for completed-report listings. Empty filter = all.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub client_id: Option<String>,
    pub strategy_id: Option<String>,
}

const REPORT_COLUMNS: &str = "report_id, client_id, strategy_id, period_label,
        period_start, period_end, stored_file, original_filename, file_size,
        rows_json, summary_json, status, uploaded_at";

impl DashStore {
    pub fn insert_report(&self, r: &MetricReport) -> DashResult<()> {
        let rows_json = serde_json::to_string(&r.rows)?;
        let summary_json = r
            .summary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn.execute(
            "INSERT INTO metric_report (report_id, client_id, strategy_id, period_label,
                 period_start, period_end, stored_file, original_filename, file_size,
                 rows_json, summary_json, status, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                r.report_id,
                r.client_id,
                r.strategy_id,
                r.period_label,
                r.period_start.to_string(),
                r.period_end.to_string(),
                r.stored_file,
                r.original_filename,
                r.file_size as i64,
                rows_json,
                summary_json,
                r.status.as_str(),
                r.uploaded_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_report(&self, report_id: &str) -> DashResult<MetricReport> {
        self.conn
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM metric_report WHERE report_id = ?1"),
                params![report_id],
                report_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DashError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            })
    }

    /// The raw stored rows payload, or None when the column is NULL.
    /// NotFound when the report itself is missing. Used by the recompute
    /// path, which wants to classify corruption itself.
    pub fn report_rows_json(&self, report_id: &str) -> DashResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT rows_json FROM metric_report WHERE report_id = ?1",
                params![report_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .ok_or_else(|| DashError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            })
    }

    /// Write totals, derived ratios, summary JSON and the status in one
    /// UPDATE. The status flip is the last observable effect of a
    /// (re)computation: either everything lands or nothing does.
    pub fn complete_report(
        &self,
        report_id: &str,
        summary: &MetricSummary,
        status: ReportStatus,
    ) -> DashResult<()> {
        let summary_json = serde_json::to_string(summary)?;
        let updated = self.conn.execute(
            "UPDATE metric_report SET
                 total_impressions = ?1, total_clicks = ?2, total_conversions = ?3,
                 total_spend = ?4, total_revenue = ?5,
                 ctr = ?6, cpm = ?7, cpc = ?8, roas = ?9, conversion_rate = ?10,
                 summary_json = ?11, status = ?12
             WHERE report_id = ?13",
            params![
                summary.impressions as i64,
                summary.clicks as i64,
                summary.conversions as i64,
                summary.spend,
                summary.revenue,
                summary.ctr,
                summary.cpm,
                summary.cpc,
                summary.roas,
                summary.conversion_rate,
                summary_json,
                status.as_str(),
                report_id,
            ],
        )?;
        if updated == 0 {
            return Err(DashError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_report_status(&self, report_id: &str, status: ReportStatus) -> DashResult<()> {
        self.conn.execute(
            "UPDATE metric_report SET status = ?1 WHERE report_id = ?2",
            params![status.as_str(), report_id],
        )?;
        Ok(())
    }

    /// All of a client's reports, newest upload first.
    pub fn reports_by_client(&self, client_id: &str) -> DashResult<Vec<MetricReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM metric_report
             WHERE client_id = ?1
             ORDER BY uploaded_at DESC, report_id ASC"
        ))?;
        let rows = stmt.query_map(params![client_id], report_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Completed reports matching the filter, newest period first.
    pub fn completed_reports(&self, filter: &ReportFilter) -> DashResult<Vec<MetricReport>> {
        let mut sql = format!(
            "SELECT {REPORT_COLUMNS} FROM metric_report WHERE status = 'completed'"
        );
        let mut bind: Vec<&str> = Vec::new();
        if let Some(client_id) = filter.client_id.as_deref() {
            sql.push_str(&format!(" AND client_id = ?{}", bind.len() + 1));
            bind.push(client_id);
        }
        if let Some(strategy_id) = filter.strategy_id.as_deref() {
            sql.push_str(&format!(" AND strategy_id = ?{}", bind.len() + 1));
            bind.push(strategy_id);
        }
        sql.push_str(" ORDER BY period_start DESC, report_id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(bind), report_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Remove the report row. The caller is responsible for the backing
    /// file (see `MetricsIngest::delete`).
    pub fn delete_report(&self, report_id: &str) -> DashResult<()> {
        let deleted = self.conn.execute(
            "DELETE FROM metric_report WHERE report_id = ?1",
            params![report_id],
        )?;
        if deleted == 0 {
            return Err(DashError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn report_count(&self, status: Option<ReportStatus>) -> DashResult<i64> {
        let count = match status {
            Some(s) => self.conn.query_row(
                "SELECT COUNT(*) FROM metric_report WHERE status = ?1",
                params![s.as_str()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM metric_report", [], |row| row.get(0))?,
        };
        Ok(count)
    }
}

fn report_row_mapper(row: &Row<'_>) -> rusqlite::Result<MetricReport> {
    let rows_json: Option<String> = row.get(9)?;
    // Reads stay lenient about a corrupt payload so report metadata is
    // still visible; recompute classifies the corruption properly.
    let rows: Vec<MetricRow> = match rows_json.as_deref() {
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("unreadable rows_json for a stored report: {e}");
            Vec::new()
        }),
        None => Vec::new(),
    };
    let summary_json: Option<String> = row.get(10)?;
    let summary = summary_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok());
    let status_text: String = row.get(11)?;

    Ok(MetricReport {
        report_id: row.get(0)?,
        client_id: row.get(1)?,
        strategy_id: row.get(2)?,
        period_label: row.get(3)?,
        period_start: parse_date_column(row, 4)?,
        period_end: parse_date_column(row, 5)?,
        stored_file: row.get(6)?,
        original_filename: row.get(7)?,
        file_size: row.get::<_, i64>(8)? as u64,
        rows,
        summary,
        status: ReportStatus::parse(&status_text).unwrap_or(ReportStatus::Error),
        uploaded_at: row.get(12)?,
    })
}

fn parse_date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

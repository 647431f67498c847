//! Reporting aggregator — read-only rollups over completed reports.
//!
//! Every query here is a pure read; summary fields are written once per
//! (re)computation, so no locking is needed. Client and strategy display
//! data is attached by explicit joins/lookups in this module — never by
//! lazy loading hidden inside the record types.

use crate::{
    entities::{ClientRecord, OptimizationRecord, StrategyRecord},
    error::DashResult,
    report::MetricReport,
    store::{DashStore, ReportFilter},
};
use chrono::{Months, NaiveDate};
use serde::Serialize;

/// How many clients the ranking panel shows by default.
pub const TOP_CLIENTS_LIMIT: usize = 5;
/// Dashboard side panels (active strategies, pending optimizations).
pub const PANEL_LIMIT: usize = 5;
/// Trend series look back this many calendar months.
pub const TREND_MONTHS: u32 = 6;

// ── Rollup result types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DashboardTotals {
    pub active_clients: i64,
    pub total_strategies: i64,
    pub active_strategies: i64,
    pub completed_reports: i64,
    pub pending_optimizations: i64,
}

/// Portfolio-wide aggregates over completed reports.
///
/// `avg_roas`/`avg_ctr` are unweighted means of per-report ratios, not
/// sum(revenue)/sum(spend) recomputed globally. That matches the numbers
/// the dashboard has always shown; treat them as an approximation.
#[derive(Debug, Clone, Serialize)]
pub struct GeneralPerformance {
    pub total_spend: f64,
    pub total_revenue: f64,
    pub total_conversions: i64,
    pub avg_roas: f64,
    pub avg_ctr: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopClient {
    pub client_id: String,
    pub name: String,
    pub company: String,
    pub total_revenue: f64,
    pub avg_roas: f64,
    pub report_count: i64,
}

/// One month's bucket in a trend series. Months with no completed
/// reports are omitted entirely — callers must handle gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Calendar month of the report period start, `YYYY-MM`.
    pub month: String,
    pub spend: f64,
    pub revenue: f64,
    pub avg_roas: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub total_strategies: i64,
    pub total_reports: i64,
    pub total_optimizations: i64,
    pub total_spend: f64,
    pub total_revenue: f64,
    pub avg_roas: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyPerformance {
    pub planned_budget: f64,
    pub actual_spend: f64,
    pub revenue: f64,
    pub avg_roas: f64,
    pub avg_ctr: f64,
    pub report_count: i64,
    pub optimization_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyWithPerformance {
    pub strategy: StrategyRecord,
    pub performance: StrategyPerformance,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct OptimizationsByStatus {
    pub proposed: Vec<OptimizationRecord>,
    pub in_progress: Vec<OptimizationRecord>,
    pub implemented: Vec<OptimizationRecord>,
    pub discarded: Vec<OptimizationRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub performance: GeneralPerformance,
    pub top_clients: Vec<TopClient>,
    pub active_strategies: Vec<StrategyRecord>,
    pub pending_optimizations: Vec<OptimizationRecord>,
    pub trends: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientReport {
    pub client: ClientRecord,
    pub stats: ClientStats,
    pub strategies: Vec<StrategyWithPerformance>,
    pub optimizations: OptimizationsByStatus,
    pub trends: Vec<TrendPoint>,
}

/// A report listing entry with the owning client's display names joined
/// on.
#[derive(Debug, Clone, Serialize)]
pub struct ReportWithClient {
    pub report: MetricReport,
    pub client_name: String,
    pub client_company: String,
}

// ── Aggregator ───────────────────────────────────────────────────────────────

pub struct ReportingAggregator<'a> {
    store: &'a DashStore,
}

impl<'a> ReportingAggregator<'a> {
    pub fn new(store: &'a DashStore) -> Self {
        Self { store }
    }

    /// The full dashboard payload. `today` anchors the trailing trend
    /// window so callers (and tests) control the clock.
    pub fn dashboard(&self, today: NaiveDate) -> DashResult<Dashboard> {
        let since = trend_window_start(today);
        Ok(Dashboard {
            totals: self.store.dashboard_totals()?,
            performance: self.store.general_performance()?,
            top_clients: self.store.top_clients(TOP_CLIENTS_LIMIT)?,
            active_strategies: self.store.active_strategies(PANEL_LIMIT)?,
            pending_optimizations: self.store.pending_optimizations(PANEL_LIMIT)?,
            trends: self.store.monthly_trends(since, None)?,
        })
    }

    /// Everything the per-client report page needs: profile, lifetime
    /// stats, strategies with performance, optimizations grouped by
    /// status, and the client's own trend series.
    pub fn client_report(&self, client_id: &str, today: NaiveDate) -> DashResult<ClientReport> {
        let client = self.store.get_client(client_id)?;
        let stats = self.store.client_stats(client_id)?;

        let mut strategies = Vec::new();
        for strategy in self.store.strategies_by_client(client_id)? {
            let performance = self.store.strategy_performance(&strategy.strategy_id)?;
            strategies.push(StrategyWithPerformance {
                strategy,
                performance,
            });
        }

        let mut optimizations = OptimizationsByStatus::default();
        for opt in self.store.optimizations_by_client(client_id)? {
            match opt.status.as_str() {
                "in_progress" => optimizations.in_progress.push(opt),
                "implemented" => optimizations.implemented.push(opt),
                "discarded" => optimizations.discarded.push(opt),
                _ => optimizations.proposed.push(opt),
            }
        }

        let since = trend_window_start(today);
        let trends = self.store.monthly_trends(since, Some(client_id))?;

        Ok(ClientReport {
            client,
            stats,
            strategies,
            optimizations,
            trends,
        })
    }

    /// Completed reports matching the filter, each enriched with the
    /// owning client's display names.
    pub fn completed_with_clients(
        &self,
        filter: &ReportFilter,
    ) -> DashResult<Vec<ReportWithClient>> {
        let mut enriched = Vec::new();
        for report in self.store.completed_reports(filter)? {
            let client = self.store.get_client(&report.client_id)?;
            enriched.push(ReportWithClient {
                report,
                client_name: client.name,
                client_company: client.company,
            });
        }
        Ok(enriched)
    }
}

/// The date `TREND_MONTHS` calendar months before `today` (day clamped
/// to the shorter month when needed).
fn trend_window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(TREND_MONTHS))
        .unwrap_or(today)
}

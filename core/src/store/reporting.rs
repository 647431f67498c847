//! Dashboard and per-client rollup queries.

use super::DashStore;
use crate::{
    error::{DashError, DashResult},
    reporting::{
        ClientStats, DashboardTotals, GeneralPerformance, StrategyPerformance, TopClient,
        TrendPoint,
    },
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

impl DashStore {
    pub fn dashboard_totals(&self) -> DashResult<DashboardTotals> {
        let count = |sql: &str| -> DashResult<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(DashboardTotals {
            active_clients: count("SELECT COUNT(*) FROM client WHERE active = 1")?,
            total_strategies: count("SELECT COUNT(*) FROM strategy")?,
            active_strategies: count("SELECT COUNT(*) FROM strategy WHERE status = 'active'")?,
            completed_reports: count(
                "SELECT COUNT(*) FROM metric_report WHERE status = 'completed'",
            )?,
            pending_optimizations: count(
                "SELECT COUNT(*) FROM optimization WHERE status = 'proposed'",
            )?,
        })
    }

    /// Portfolio totals plus unweighted per-report ratio averages.
    pub fn general_performance(&self) -> DashResult<GeneralPerformance> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(total_spend), 0.0),
                    COALESCE(SUM(total_revenue), 0.0),
                    COALESCE(SUM(total_conversions), 0),
                    COALESCE(AVG(roas), 0.0),
                    COALESCE(AVG(ctr), 0.0)
             FROM metric_report WHERE status = 'completed'",
            [],
            |row| {
                Ok(GeneralPerformance {
                    total_spend: row.get(0)?,
                    total_revenue: row.get(1)?,
                    total_conversions: row.get(2)?,
                    avg_roas: row.get(3)?,
                    avg_ctr: row.get(4)?,
                })
            },
        )?)
    }

    /// Active clients ranked by completed-report revenue, revenue ties
    /// broken by ascending client id so the ordering is stable.
    pub fn top_clients(&self, limit: usize) -> DashResult<Vec<TopClient>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.client_id, c.name, c.company,
                    COALESCE(SUM(m.total_revenue), 0.0) AS revenue_total,
                    COALESCE(AVG(m.roas), 0.0),
                    COUNT(m.report_id)
             FROM client c
             JOIN metric_report m ON m.client_id = c.client_id AND m.status = 'completed'
             WHERE c.active = 1
             GROUP BY c.client_id, c.name, c.company
             ORDER BY revenue_total DESC, c.client_id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(TopClient {
                client_id: row.get(0)?,
                name: row.get(1)?,
                company: row.get(2)?,
                total_revenue: row.get(3)?,
                avg_roas: row.get(4)?,
                report_count: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Completed reports bucketed by calendar month of their period
    /// start, from `since` onward. Sparse: empty months are absent.
    pub fn monthly_trends(
        &self,
        since: NaiveDate,
        client_id: Option<&str>,
    ) -> DashResult<Vec<TrendPoint>> {
        let mapper = |row: &rusqlite::Row<'_>| {
            Ok(TrendPoint {
                month: row.get(0)?,
                spend: row.get(1)?,
                revenue: row.get(2)?,
                avg_roas: row.get(3)?,
            })
        };
        let since = since.to_string();

        let points = match client_id {
            Some(client) => {
                let mut stmt = self.conn.prepare(
                    "SELECT strftime('%Y-%m', period_start) AS month,
                            COALESCE(SUM(total_spend), 0.0),
                            COALESCE(SUM(total_revenue), 0.0),
                            COALESCE(AVG(roas), 0.0)
                     FROM metric_report
                     WHERE status = 'completed' AND period_start >= ?1 AND client_id = ?2
                     GROUP BY month
                     ORDER BY month ASC",
                )?;
                let rows = stmt.query_map(params![since, client], mapper)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT strftime('%Y-%m', period_start) AS month,
                            COALESCE(SUM(total_spend), 0.0),
                            COALESCE(SUM(total_revenue), 0.0),
                            COALESCE(AVG(roas), 0.0)
                     FROM metric_report
                     WHERE status = 'completed' AND period_start >= ?1
                     GROUP BY month
                     ORDER BY month ASC",
                )?;
                let rows = stmt.query_map(params![since], mapper)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(points)
    }

    /// Lifetime aggregates for one client. Counts cover every record;
    /// money and ROAS only completed reports.
    pub fn client_stats(&self, client_id: &str) -> DashResult<ClientStats> {
        Ok(self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM strategy WHERE client_id = ?1),
                (SELECT COUNT(*) FROM metric_report WHERE client_id = ?1),
                (SELECT COUNT(*) FROM optimization WHERE client_id = ?1),
                (SELECT COALESCE(SUM(total_spend), 0.0) FROM metric_report
                  WHERE client_id = ?1 AND status = 'completed'),
                (SELECT COALESCE(SUM(total_revenue), 0.0) FROM metric_report
                  WHERE client_id = ?1 AND status = 'completed'),
                (SELECT COALESCE(AVG(roas), 0.0) FROM metric_report
                  WHERE client_id = ?1 AND status = 'completed')",
            params![client_id],
            |row| {
                Ok(ClientStats {
                    total_strategies: row.get(0)?,
                    total_reports: row.get(1)?,
                    total_optimizations: row.get(2)?,
                    total_spend: row.get(3)?,
                    total_revenue: row.get(4)?,
                    avg_roas: row.get(5)?,
                })
            },
        )?)
    }

    /// Planned budget vs. what the completed reports actually recorded.
    pub fn strategy_performance(&self, strategy_id: &str) -> DashResult<StrategyPerformance> {
        self.conn
            .query_row(
                "SELECT s.budget,
                        COALESCE(SUM(m.total_spend), 0.0),
                        COALESCE(SUM(m.total_revenue), 0.0),
                        COALESCE(AVG(m.roas), 0.0),
                        COALESCE(AVG(m.ctr), 0.0),
                        COUNT(m.report_id),
                        (SELECT COUNT(*) FROM optimization o
                          WHERE o.strategy_id = s.strategy_id)
                 FROM strategy s
                 LEFT JOIN metric_report m
                   ON m.strategy_id = s.strategy_id AND m.status = 'completed'
                 WHERE s.strategy_id = ?1
                 GROUP BY s.strategy_id, s.budget",
                params![strategy_id],
                |row| {
                    Ok(StrategyPerformance {
                        planned_budget: row.get(0)?,
                        actual_spend: row.get(1)?,
                        revenue: row.get(2)?,
                        avg_roas: row.get(3)?,
                        avg_ctr: row.get(4)?,
                        report_count: row.get(5)?,
                        optimization_count: row.get(6)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DashError::NotFound {
                entity: "strategy",
                id: strategy_id.to_string(),
            })
    }
}

//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. The ingest pipeline,
//! aggregator and reporting rollups call store methods — they never
//! execute SQL directly.

use crate::{
    entities::{ClientRecord, OptimizationRecord, StrategyRecord},
    error::{DashError, DashResult},
};
use rusqlite::{params, Connection, OptionalExtension, Row};

mod report;
mod reporting;

pub use report::ReportFilter;

pub struct DashStore {
    conn: Connection,
}

impl DashStore {
    /// Open (or create) the dashboard database at `path`.
    pub fn open(path: &str) -> DashResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DashResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DashResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Client ─────────────────────────────────────────────────

    pub fn insert_client(&self, c: &ClientRecord) -> DashResult<()> {
        self.conn.execute(
            "INSERT INTO client (client_id, name, company, email, segment, industry,
                                 monthly_budget, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                c.client_id,
                c.name,
                c.company,
                c.email,
                c.segment,
                c.industry,
                c.monthly_budget,
                if c.active { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    pub fn get_client(&self, client_id: &str) -> DashResult<ClientRecord> {
        self.conn
            .query_row(
                "SELECT client_id, name, company, email, segment, industry,
                        monthly_budget, active
                 FROM client WHERE client_id = ?1",
                params![client_id],
                client_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DashError::NotFound {
                entity: "client",
                id: client_id.to_string(),
            })
    }

    pub fn set_client_active(&self, client_id: &str, active: bool) -> DashResult<()> {
        self.conn.execute(
            "UPDATE client SET active = ?1 WHERE client_id = ?2",
            params![if active { 1 } else { 0 }, client_id],
        )?;
        Ok(())
    }

    // ── Strategy ───────────────────────────────────────────────

    pub fn insert_strategy(&self, s: &StrategyRecord) -> DashResult<()> {
        self.conn.execute(
            "INSERT INTO strategy (strategy_id, client_id, name, objectives, budget,
                                   start_date, end_date, platforms, campaign_type,
                                   status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                s.strategy_id,
                s.client_id,
                s.name,
                s.objectives,
                s.budget,
                s.start_date,
                s.end_date,
                s.platforms,
                s.campaign_type,
                s.status,
                s.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_strategy(&self, strategy_id: &str) -> DashResult<StrategyRecord> {
        self.conn
            .query_row(
                "SELECT strategy_id, client_id, name, objectives, budget, start_date,
                        end_date, platforms, campaign_type, status, created_at
                 FROM strategy WHERE strategy_id = ?1",
                params![strategy_id],
                strategy_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DashError::NotFound {
                entity: "strategy",
                id: strategy_id.to_string(),
            })
    }

    pub fn strategies_by_client(&self, client_id: &str) -> DashResult<Vec<StrategyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT strategy_id, client_id, name, objectives, budget, start_date,
                    end_date, platforms, campaign_type, status, created_at
             FROM strategy WHERE client_id = ?1
             ORDER BY created_at DESC, strategy_id ASC",
        )?;
        let rows = stmt.query_map(params![client_id], strategy_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Most recently created active strategies, for the dashboard panel.
    pub fn active_strategies(&self, limit: usize) -> DashResult<Vec<StrategyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT strategy_id, client_id, name, objectives, budget, start_date,
                    end_date, platforms, campaign_type, status, created_at
             FROM strategy WHERE status = 'active'
             ORDER BY created_at DESC, strategy_id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], strategy_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Optimization ───────────────────────────────────────────

    pub fn insert_optimization(&self, o: &OptimizationRecord) -> DashResult<()> {
        self.conn.execute(
            "INSERT INTO optimization (optimization_id, client_id, strategy_id, report_id,
                                       title, proposed_improvements, expected_impact,
                                       priority, status, analyzed_at, implemented_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                o.optimization_id,
                o.client_id,
                o.strategy_id,
                o.report_id,
                o.title,
                o.proposed_improvements,
                o.expected_impact,
                o.priority,
                o.status,
                o.analyzed_at,
                o.implemented_at,
            ],
        )?;
        Ok(())
    }

    pub fn optimizations_by_client(&self, client_id: &str) -> DashResult<Vec<OptimizationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT optimization_id, client_id, strategy_id, report_id, title,
                    proposed_improvements, expected_impact, priority, status,
                    analyzed_at, implemented_at
             FROM optimization WHERE client_id = ?1
             ORDER BY {PRIORITY_RANK} DESC, analyzed_at DESC, optimization_id ASC"
        ))?;
        let rows = stmt.query_map(params![client_id], optimization_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Proposed optimizations awaiting a decision, highest priority first.
    pub fn pending_optimizations(&self, limit: usize) -> DashResult<Vec<OptimizationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT optimization_id, client_id, strategy_id, report_id, title,
                    proposed_improvements, expected_impact, priority, status,
                    analyzed_at, implemented_at
             FROM optimization WHERE status = 'proposed'
             ORDER BY {PRIORITY_RANK} DESC, analyzed_at DESC, optimization_id ASC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], optimization_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn set_optimization_status(&self, optimization_id: &str, status: &str) -> DashResult<()> {
        self.conn.execute(
            "UPDATE optimization SET status = ?1 WHERE optimization_id = ?2",
            params![status, optimization_id],
        )?;
        Ok(())
    }
}

/// Priority is stored as text; rank it explicitly so ORDER BY means what
/// the reader expects.
const PRIORITY_RANK: &str = "CASE priority
        WHEN 'critical' THEN 3
        WHEN 'high' THEN 2
        WHEN 'medium' THEN 1
        ELSE 0 END";

fn client_row_mapper(row: &Row<'_>) -> rusqlite::Result<ClientRecord> {
    Ok(ClientRecord {
        client_id: row.get(0)?,
        name: row.get(1)?,
        company: row.get(2)?,
        email: row.get(3)?,
        segment: row.get(4)?,
        industry: row.get(5)?,
        monthly_budget: row.get(6)?,
        active: row.get::<_, i32>(7)? != 0,
    })
}

fn strategy_row_mapper(row: &Row<'_>) -> rusqlite::Result<StrategyRecord> {
    Ok(StrategyRecord {
        strategy_id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        objectives: row.get(3)?,
        budget: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        platforms: row.get(7)?,
        campaign_type: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn optimization_row_mapper(row: &Row<'_>) -> rusqlite::Result<OptimizationRecord> {
    Ok(OptimizationRecord {
        optimization_id: row.get(0)?,
        client_id: row.get(1)?,
        strategy_id: row.get(2)?,
        report_id: row.get(3)?,
        title: row.get(4)?,
        proposed_improvements: row.get(5)?,
        expected_impact: row.get(6)?,
        priority: row.get(7)?,
        status: row.get(8)?,
        analyzed_at: row.get(9)?,
        implemented_at: row.get(10)?,
    })
}

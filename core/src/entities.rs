//! Client, strategy and optimization records.
//!
//! Their full lifecycle lives elsewhere; the core reads them for joins
//! and display-name enrichment, and inserts them from tooling and tests.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub client_id: EntityId,
    pub name: String,
    pub company: String,
    pub email: String,
    pub segment: String,
    pub industry: String,
    pub monthly_budget: f64,
    pub active: bool,
}

/// Strategy status: planned | active | paused | finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub strategy_id: EntityId,
    pub client_id: EntityId,
    pub name: String,
    pub objectives: String,
    pub budget: f64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub platforms: String,
    pub campaign_type: String,
    pub status: String,
    pub created_at: String,
}

/// Optimization status: proposed | in_progress | implemented | discarded.
/// Priority: low | medium | high | critical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub optimization_id: EntityId,
    pub client_id: EntityId,
    pub strategy_id: Option<EntityId>,
    pub report_id: Option<EntityId>,
    pub title: String,
    pub proposed_improvements: String,
    pub expected_impact: String,
    pub priority: String,
    pub status: String,
    pub analyzed_at: String,
    pub implemented_at: Option<String>,
}

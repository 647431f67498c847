//! Ingestion configuration: upload limits, the header synonym table and
//! the accepted date formats.
//!
//! All of this is process-wide, read-only data built once at startup.
//! Ad platforms export the same metric under different column names, so
//! the synonym table maps every known alias onto one canonical field.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical field names rows are normalized to. These match the export
/// contract the rest of the pipeline is written against.
pub mod canonical {
    pub const IMPRESSIONS: &str = "impresiones";
    pub const CLICKS: &str = "clicks";
    pub const CONVERSIONS: &str = "conversiones";
    pub const COST: &str = "costo";
    pub const REVENUE: &str = "ingresos";
    pub const DATE: &str = "fecha";
    pub const CAMPAIGN: &str = "campana";
    pub const CTR: &str = "ctr";
    pub const CPM: &str = "cpm";
    pub const CPC: &str = "cpc";
    pub const ROAS: &str = "roas";
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Upload size cap in bytes.
    pub max_file_size: u64,
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
    /// MIME types accepted when the transport declares a specific one.
    pub allowed_mime_types: Vec<String>,
    /// lowercase vendor header → canonical field name.
    pub header_synonyms: HashMap<String, String>,
    /// Date formats tried in order; the first that parses wins.
    pub date_formats: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let mut synonyms = HashMap::new();
        for (alias, canonical) in [
            ("impressions", canonical::IMPRESSIONS),
            ("clicks", canonical::CLICKS),
            ("conversions", canonical::CONVERSIONS),
            ("cost", canonical::COST),
            ("spend", canonical::COST),
            ("revenue", canonical::REVENUE),
            ("sales", canonical::REVENUE),
            ("ctr", canonical::CTR),
            ("cpm", canonical::CPM),
            ("cpc", canonical::CPC),
            ("roas", canonical::ROAS),
            ("date", canonical::DATE),
            ("campaign", canonical::CAMPAIGN),
            ("ad_set", "conjunto_anuncios"),
            ("ad", "anuncio"),
        ] {
            synonyms.insert(alias.to_string(), canonical.to_string());
        }

        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: vec!["csv".into()],
            allowed_mime_types: vec![
                "text/csv".into(),
                "application/csv".into(),
                // Excel exports declare this for CSV files.
                "application/vnd.ms-excel".into(),
                "text/plain".into(),
            ],
            header_synonyms: synonyms,
            date_formats: vec![
                "%Y-%m-%d".into(),
                "%d/%m/%Y".into(),
                "%m/%d/%Y".into(),
                "%d-%m-%Y".into(),
                "%m-%d-%Y".into(),
            ],
        }
    }
}

impl IngestConfig {
    /// The shared process-wide configuration. Built once, never mutated.
    pub fn shared() -> &'static IngestConfig {
        static CONFIG: OnceLock<IngestConfig> = OnceLock::new();
        CONFIG.get_or_init(IngestConfig::default)
    }

    /// Canonical name for a raw CSV header: trim, lowercase, then map
    /// through the synonym table. Unknown headers pass through unchanged.
    pub fn canonical_header(&self, raw: &str) -> String {
        let normalized = raw.trim().to_lowercase();
        self.header_synonyms
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }
}

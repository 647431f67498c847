//! CSV normalizer — raw upload bytes to canonical metric rows.
//!
//! Parsing is deliberately tolerant: agency CSV exports come from
//! heterogeneous ad platforms with inconsistent column naming and the
//! occasional export artifact. Partial ingestion beats total rejection,
//! so malformed rows are skipped and only a fully empty result is fatal.

use crate::{
    config::{canonical, IngestConfig},
    error::{DashError, DashResult},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A date cell as it survived normalization. Unparseable inputs keep the
/// original text; downstream grouping simply won't bucket them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateField {
    Parsed(NaiveDate),
    Raw(String),
}

impl DateField {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateField::Parsed(d) => Some(*d),
            DateField::Raw(_) => None,
        }
    }
}

/// One advertising-platform data point. Canonical numeric fields default
/// to zero; anything the synonym table doesn't recognize lands in `extra`
/// untouched (forward-compatible with custom vendor columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<DateField>,
    #[serde(default)]
    pub impresiones: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversiones: u64,
    #[serde(default)]
    pub costo: f64,
    #[serde(default)]
    pub ingresos: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campana: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ParsedCsv {
    /// Canonicalized header list, in file order.
    pub headers: Vec<String>,
    pub rows: Vec<MetricRow>,
    /// Rows dropped because their field count didn't match the header.
    pub skipped: usize,
}

/// Parse raw CSV bytes into canonical rows.
///
/// The only hard failure is zero valid rows (empty or fully malformed
/// file). Everything else degrades: bad cells coerce to zero, bad dates
/// stay raw, short/long rows are dropped with a warning.
pub fn parse(bytes: &[u8], config: &IngestConfig) -> DashResult<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut records = reader.records();

    let header_record = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => return Err(DashError::Parse(format!("unreadable header row: {e}"))),
        None => return Err(DashError::Parse("csv file is empty".into())),
    };

    let headers: Vec<String> = header_record
        .iter()
        .map(|h| config.canonical_header(h))
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in records.enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping unreadable csv row {}: {e}", line + 2);
                skipped += 1;
                continue;
            }
        };
        if record.len() != headers.len() {
            log::warn!(
                "skipping csv row {} with {} fields (expected {})",
                line + 2,
                record.len(),
                headers.len()
            );
            skipped += 1;
            continue;
        }

        rows.push(build_row(&headers, &record, config));
    }

    if rows.is_empty() {
        return Err(DashError::Parse(
            "no valid data rows found in file".into(),
        ));
    }

    Ok(ParsedCsv {
        headers,
        rows,
        skipped,
    })
}

fn build_row(headers: &[String], record: &csv::StringRecord, config: &IngestConfig) -> MetricRow {
    let mut row = MetricRow::default();

    for (header, value) in headers.iter().zip(record.iter()) {
        match header.as_str() {
            canonical::IMPRESSIONS => row.impresiones = coerce_int(value),
            canonical::CLICKS => row.clicks = coerce_int(value),
            canonical::CONVERSIONS => row.conversiones = coerce_int(value),
            canonical::COST => row.costo = coerce_decimal(value),
            canonical::REVENUE => row.ingresos = coerce_decimal(value),
            canonical::CTR => row.ctr = Some(coerce_decimal(value)),
            canonical::CPM => row.cpm = Some(coerce_decimal(value)),
            canonical::CPC => row.cpc = Some(coerce_decimal(value)),
            canonical::ROAS => row.roas = Some(coerce_decimal(value)),
            canonical::DATE => row.fecha = Some(normalize_date(value, config)),
            canonical::CAMPAIGN => row.campana = Some(value.to_string()),
            _ => {
                row.extra.insert(header.clone(), value.to_string());
            }
        }
    }

    row
}

/// Non-negative integer coercion: integer parse first, then float
/// truncation, 0 on anything else.
fn coerce_int(raw: &str) -> u64 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return v.max(0) as u64;
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        if v.is_finite() && v > 0.0 {
            return v.trunc() as u64;
        }
    }
    0
}

/// Monetary/ratio coercion: 0.0 on parse failure or non-finite input.
fn coerce_decimal(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Try each configured date format in order; first match wins. Inputs
/// that match no format are kept verbatim.
fn normalize_date(raw: &str, config: &IngestConfig) -> DateField {
    let trimmed = raw.trim();
    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return DateField::Parsed(date);
        }
    }
    DateField::Raw(trimmed.to_string())
}

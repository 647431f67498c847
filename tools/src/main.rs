//! dash-runner: headless runner for the agency metrics core.
//!
//! Usage:
//!   dash-runner add-client --db dash.db --id c1 --name "Acme" --company "Acme Corp"
//!   dash-runner ingest --db dash.db --dir uploads --client c1 --file jan.csv \
//!       --period 2024-01 --start 2024-01-01 --end 2024-01-31
//!   dash-runner recalc --db dash.db --report <id>
//!   dash-runner dashboard --db dash.db [--json]
//!   dash-runner client-report --db dash.db --client c1 [--json]

use admetrics_core::{
    config::IngestConfig,
    entities::ClientRecord,
    files::CsvVault,
    ingest::{MetricsIngest, NewReport},
    intake::UploadMeta,
    reporting::ReportingAggregator,
    store::DashStore,
};
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::env;
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let db = flag(&args, "--db").unwrap_or_else(|| "dash.db".into());
    let store = DashStore::open(&db)?;
    store.migrate()?;

    match command {
        "add-client" => add_client(&store, &args),
        "ingest" => ingest(&store, &args),
        "recalc" => recalc(&store, &args),
        "dashboard" => dashboard(&store, &args),
        "client-report" => client_report(&store, &args),
        _ => {
            eprintln!("commands: add-client | ingest | recalc | dashboard | client-report");
            Ok(())
        }
    }
}

fn add_client(store: &DashStore, args: &[String]) -> Result<()> {
    let client_id = required_flag(args, "--id")?;
    let name = required_flag(args, "--name")?;
    store.insert_client(&ClientRecord {
        client_id: client_id.clone(),
        name,
        company: flag(args, "--company").unwrap_or_default(),
        email: flag(args, "--email").unwrap_or_default(),
        segment: flag(args, "--segment").unwrap_or_default(),
        industry: flag(args, "--industry").unwrap_or_default(),
        monthly_budget: flag(args, "--budget")
            .and_then(|b| b.parse().ok())
            .unwrap_or(0.0),
        active: true,
    })?;
    println!("client {client_id} created");
    Ok(())
}

fn ingest(store: &DashStore, args: &[String]) -> Result<()> {
    let client_id = required_flag(args, "--client")?;
    let file = required_flag(args, "--file")?;
    let dir = flag(args, "--dir").unwrap_or_else(|| "uploads".into());

    let bytes = fs::read(&file).with_context(|| format!("cannot read {file}"))?;
    let filename = Path::new(&file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.clone());

    let today = Local::now().date_naive();
    let meta = UploadMeta {
        filename,
        declared_mime: None,
        size_bytes: bytes.len() as u64,
        transfer_ok: true,
    };
    let request = NewReport {
        client_id,
        strategy_id: flag(args, "--strategy"),
        period_label: flag(args, "--period").unwrap_or_default(),
        period_start: date_flag(args, "--start").unwrap_or(today),
        period_end: date_flag(args, "--end").unwrap_or(today),
    };

    let vault = CsvVault::open(dir)?;
    let pipeline = MetricsIngest::new(store, &vault, IngestConfig::shared());
    let report = pipeline.upload(&meta, &bytes, &request)?;

    println!("report {} ({})", report.report_id, report.status.as_str());
    println!("  rows:    {}", report.rows.len());
    if let Some(summary) = &report.summary {
        println!("  summary: {summary}");
    }
    Ok(())
}

fn recalc(store: &DashStore, args: &[String]) -> Result<()> {
    let report_id = required_flag(args, "--report")?;
    let aggregator = admetrics_core::aggregator::MetricsAggregator::new(store);
    let report = aggregator.recalculate(&report_id)?;
    match &report.summary {
        Some(summary) => println!("report {report_id} recomputed: {summary}"),
        None => println!("report {report_id} recomputed"),
    }
    Ok(())
}

fn dashboard(store: &DashStore, args: &[String]) -> Result<()> {
    let today = Local::now().date_naive();
    let dashboard = ReportingAggregator::new(store).dashboard(today)?;

    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!("=== DASHBOARD ===");
    println!("  active clients:        {}", dashboard.totals.active_clients);
    println!("  strategies:            {} ({} active)",
        dashboard.totals.total_strategies, dashboard.totals.active_strategies);
    println!("  completed reports:     {}", dashboard.totals.completed_reports);
    println!("  pending optimizations: {}", dashboard.totals.pending_optimizations);
    println!();
    println!(
        "  spend {:.2} | revenue {:.2} | avg ROAS {:.2} | avg CTR {:.2}%",
        dashboard.performance.total_spend,
        dashboard.performance.total_revenue,
        dashboard.performance.avg_roas,
        dashboard.performance.avg_ctr
    );

    println!();
    println!("=== TOP CLIENTS ===");
    for (rank, client) in dashboard.top_clients.iter().enumerate() {
        println!(
            "  {}. {} ({}) — revenue {:.2}, avg ROAS {:.2}",
            rank + 1,
            client.name,
            client.company,
            client.total_revenue,
            client.avg_roas
        );
    }

    println!();
    println!("=== TRENDS (6 months) ===");
    for point in &dashboard.trends {
        println!(
            "  {} | spend {:.2} | revenue {:.2} | ROAS {:.2}",
            point.month, point.spend, point.revenue, point.avg_roas
        );
    }
    Ok(())
}

fn client_report(store: &DashStore, args: &[String]) -> Result<()> {
    let client_id = required_flag(args, "--client")?;
    let today = Local::now().date_naive();
    let report = ReportingAggregator::new(store).client_report(&client_id, today)?;

    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== CLIENT REPORT: {} ===", report.client.name);
    println!(
        "  strategies {} | reports {} | optimizations {}",
        report.stats.total_strategies, report.stats.total_reports, report.stats.total_optimizations
    );
    println!(
        "  spend {:.2} | revenue {:.2} | avg ROAS {:.2}",
        report.stats.total_spend, report.stats.total_revenue, report.stats.avg_roas
    );
    for entry in &report.strategies {
        println!(
            "  strategy {} [{}]: budget {:.2}, spent {:.2}, revenue {:.2} ({} reports)",
            entry.strategy.name,
            entry.strategy.status,
            entry.performance.planned_budget,
            entry.performance.actual_spend,
            entry.performance.revenue,
            entry.performance.report_count
        );
    }
    println!(
        "  optimizations: {} proposed, {} in progress, {} implemented, {} discarded",
        report.optimizations.proposed.len(),
        report.optimizations.in_progress.len(),
        report.optimizations.implemented.len(),
        report.optimizations.discarded.len()
    );
    for point in &report.trends {
        println!(
            "  {} | spend {:.2} | revenue {:.2} | ROAS {:.2}",
            point.month, point.spend, point.revenue, point.avg_roas
        );
    }
    Ok(())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn flag(args: &[String], name: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].clone())
}

fn required_flag(args: &[String], name: &str) -> Result<String> {
    match flag(args, name) {
        Some(value) => Ok(value),
        None => bail!("missing required flag {name}"),
    }
}

fn date_flag(args: &[String], name: &str) -> Option<NaiveDate> {
    flag(args, name).and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
}

use admetrics_core::aggregator::{self, MetricsAggregator};
use admetrics_core::entities::ClientRecord;
use admetrics_core::error::DashError;
use admetrics_core::normalizer::MetricRow;
use admetrics_core::report::{MetricReport, ReportStatus};
use admetrics_core::store::DashStore;
use chrono::NaiveDate;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn row(impressions: u64, clicks: u64, conversions: u64, spend: f64, revenue: f64) -> MetricRow {
    MetricRow {
        impresiones: impressions,
        clicks,
        conversiones: conversions,
        costo: spend,
        ingresos: revenue,
        ..Default::default()
    }
}

fn store_with_client(client_id: &str) -> DashStore {
    let store = DashStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
        .insert_client(&ClientRecord {
            client_id: client_id.into(),
            name: "Acme".into(),
            company: "Acme Corp".into(),
            email: "ops@acme.test".into(),
            segment: "mid".into(),
            industry: "retail".into(),
            monthly_budget: 5000.0,
            active: true,
        })
        .unwrap();
    store
}

fn report(report_id: &str, client_id: &str, rows: Vec<MetricRow>) -> MetricReport {
    MetricReport {
        report_id: report_id.into(),
        client_id: client_id.into(),
        strategy_id: None,
        period_label: "2024-01".into(),
        period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        stored_file: format!("{report_id}.csv"),
        original_filename: "jan.csv".into(),
        file_size: 128,
        rows,
        summary: None,
        status: ReportStatus::Processing,
        uploaded_at: "2024-02-01 09:00:00".into(),
    }
}

// ── Summary computation ──────────────────────────────────────────────────────

#[test]
fn derives_all_five_ratios_from_totals() {
    let summary = aggregator::compute_summary(&[row(1000, 50, 5, 20.0, 100.0)]);

    assert_eq!(summary.impressions, 1000);
    assert_eq!(summary.clicks, 50);
    assert_eq!(summary.conversions, 5);
    assert_eq!(summary.spend, 20.0);
    assert_eq!(summary.revenue, 100.0);
    assert_eq!(summary.ctr, 5.0);
    assert_eq!(summary.cpm, 20.0);
    assert_eq!(summary.cpc, 0.4);
    assert_eq!(summary.roas, 5.0);
    assert_eq!(summary.conversion_rate, 10.0);
}

#[test]
fn totals_sum_across_rows_before_ratios_are_derived() {
    let summary = aggregator::compute_summary(&[
        row(600, 30, 3, 12.0, 60.0),
        row(400, 20, 2, 8.0, 40.0),
    ]);

    // Same totals as the single-row case, so the same ratios.
    assert_eq!(summary.impressions, 1000);
    assert_eq!(summary.ctr, 5.0);
    assert_eq!(summary.roas, 5.0);
}

#[test]
fn zero_denominators_yield_exactly_zero() {
    let summary = aggregator::compute_summary(&[row(0, 0, 0, 0.0, 50.0)]);

    assert_eq!(summary.ctr, 0.0);
    assert_eq!(summary.cpm, 0.0);
    assert_eq!(summary.cpc, 0.0);
    assert_eq!(summary.roas, 0.0);
    assert_eq!(summary.conversion_rate, 0.0);
    assert!(summary.ctr.is_finite() && summary.roas.is_finite());
}

#[test]
fn ratios_are_rounded_to_four_decimals() {
    // 1 click over 3 impressions: 33.333...% rounds to 33.3333.
    let summary = aggregator::compute_summary(&[row(3, 1, 0, 0.0, 0.0)]);
    assert_eq!(summary.ctr, 33.3333);
}

#[test]
fn huge_count_cells_saturate_instead_of_overflowing() {
    let summary = aggregator::compute_summary(&[
        row(u64::MAX, u64::MAX, 0, 0.0, 0.0),
        row(u64::MAX, 1, 0, 0.0, 0.0),
    ]);

    assert_eq!(summary.impressions, u64::MAX);
    assert_eq!(summary.clicks, u64::MAX);
    assert!(summary.ctr.is_finite());
}

#[test]
fn empty_row_slice_produces_the_zero_summary() {
    let summary = aggregator::compute_summary(&[]);
    assert_eq!(summary, Default::default());
}

// ── Recalculation against the store ──────────────────────────────────────────

#[test]
fn recalculate_completes_the_report_and_persists_the_summary() {
    let store = store_with_client("c1");
    store
        .insert_report(&report("r1", "c1", vec![row(1000, 50, 5, 20.0, 100.0)]))
        .unwrap();

    let completed = MetricsAggregator::new(&store).recalculate("r1").unwrap();
    assert_eq!(completed.status, ReportStatus::Completed);
    let summary = completed.summary.expect("summary after completion");
    assert_eq!(summary.roas, 5.0);

    // And the store sees the same thing on a fresh read.
    let reread = store.get_report("r1").unwrap();
    assert_eq!(reread.status, ReportStatus::Completed);
    assert_eq!(reread.summary, Some(summary));
}

#[test]
fn recalculate_is_idempotent() {
    let store = store_with_client("c1");
    store
        .insert_report(&report("r1", "c1", vec![row(333, 17, 2, 7.77, 31.5)]))
        .unwrap();

    let aggregator = MetricsAggregator::new(&store);
    let first = aggregator.recalculate("r1").unwrap();
    let second = aggregator.recalculate("r1").unwrap();

    // Bit-identical summary both times.
    assert_eq!(first.summary, second.summary);
    assert_eq!(second.status, ReportStatus::Completed);
}

#[test]
fn a_report_flagged_as_error_leaves_the_completed_pool() {
    let store = store_with_client("c1");
    store
        .insert_report(&report("r1", "c1", vec![row(100, 10, 1, 2.0, 8.0)]))
        .unwrap();
    MetricsAggregator::new(&store).recalculate("r1").unwrap();
    assert_eq!(store.report_count(Some(ReportStatus::Completed)).unwrap(), 1);

    store.set_report_status("r1", ReportStatus::Error).unwrap();

    let flagged = store.get_report("r1").unwrap();
    assert_eq!(flagged.status, ReportStatus::Error);
    // Only the status changed; the last good summary stays visible.
    assert!(flagged.summary.is_some());
    assert_eq!(store.report_count(Some(ReportStatus::Completed)).unwrap(), 0);
}

#[test]
fn recalculate_unknown_report_is_not_found() {
    let store = store_with_client("c1");
    let err = MetricsAggregator::new(&store)
        .recalculate("no-such-report")
        .unwrap_err();
    assert!(matches!(err, DashError::NotFound { entity: "report", .. }));
}

#[test]
fn recalculate_with_no_rows_fails_and_keeps_the_prior_status() {
    let store = store_with_client("c1");
    store.insert_report(&report("r1", "c1", Vec::new())).unwrap();

    let err = MetricsAggregator::new(&store).recalculate("r1").unwrap_err();
    assert!(matches!(err, DashError::Compute(_)));

    let report = store.get_report("r1").unwrap();
    assert_eq!(report.status, ReportStatus::Processing);
    assert!(report.summary.is_none());
}

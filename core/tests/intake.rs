use admetrics_core::config::IngestConfig;
use admetrics_core::error::DashError;
use admetrics_core::intake::{self, UploadMeta};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn meta(filename: &str, size: u64) -> UploadMeta {
    UploadMeta {
        filename: filename.into(),
        declared_mime: None,
        size_bytes: size,
        transfer_ok: true,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn accepts_a_small_csv() {
    let config = IngestConfig::default();
    assert!(intake::validate(&meta("report.csv", 1024), &config).is_ok());
}

#[test]
fn extension_check_is_case_insensitive() {
    let config = IngestConfig::default();
    assert!(intake::validate(&meta("REPORT.CSV", 1024), &config).is_ok());
    assert!(intake::validate(&meta("mixed.Csv", 1024), &config).is_ok());
}

#[test]
fn rejects_incomplete_transfer_first() {
    let config = IngestConfig::default();
    // Also oversized and wrongly named, but the transfer error wins.
    let mut m = meta("data.exe", 99 * 1024 * 1024);
    m.transfer_ok = false;

    let err = intake::validate(&m, &config).unwrap_err();
    match err {
        DashError::Validation(reason) => assert!(reason.contains("did not complete")),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn rejects_file_over_10_mib_with_size_reason() {
    let config = IngestConfig::default();
    let err = intake::validate(&meta("big.csv", 10 * 1024 * 1024 + 1), &config).unwrap_err();
    match err {
        DashError::Validation(reason) => assert!(reason.contains("too large"), "{reason}"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn file_of_exactly_10_mib_passes() {
    let config = IngestConfig::default();
    assert!(intake::validate(&meta("edge.csv", 10 * 1024 * 1024), &config).is_ok());
}

#[test]
fn rejects_non_csv_extension() {
    let config = IngestConfig::default();
    for name in ["report.xlsx", "report.txt", "report", "csv"] {
        let err = intake::validate(&meta(name, 100), &config).unwrap_err();
        assert!(matches!(err, DashError::Validation(_)), "{name}");
    }
}

#[test]
fn generic_mime_defers_to_extension() {
    let config = IngestConfig::default();
    let mut m = meta("report.csv", 100);
    m.declared_mime = Some("application/octet-stream".into());
    assert!(intake::validate(&m, &config).is_ok());
}

#[test]
fn specific_csv_mime_is_accepted() {
    let config = IngestConfig::default();
    let mut m = meta("report.csv", 100);
    m.declared_mime = Some("text/csv".into());
    assert!(intake::validate(&m, &config).is_ok());
}

#[test]
fn specific_non_csv_mime_is_rejected() {
    let config = IngestConfig::default();
    let mut m = meta("report.csv", 100);
    m.declared_mime = Some("image/png".into());

    let err = intake::validate(&m, &config).unwrap_err();
    assert!(matches!(err, DashError::Validation(_)));
}

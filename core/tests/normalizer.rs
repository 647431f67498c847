use admetrics_core::config::IngestConfig;
use admetrics_core::error::DashError;
use admetrics_core::normalizer::{self, DateField};
use chrono::NaiveDate;

fn parse(bytes: &[u8]) -> Result<normalizer::ParsedCsv, DashError> {
    normalizer::parse(bytes, &IngestConfig::default())
}

fn date(y: i32, m: u32, d: u32) -> DateField {
    DateField::Parsed(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The reference scenario: English vendor headers normalize onto the
/// canonical field names with coerced types.
#[test]
fn canonicalizes_vendor_headers_and_coerces_types() {
    let csv = b"date,impressions,clicks,conversions,cost,revenue\n\
                2024-01-15,1000,50,5,20.00,100.00\n";
    let parsed = parse(csv).unwrap();

    assert_eq!(
        parsed.headers,
        vec!["fecha", "impresiones", "clicks", "conversiones", "costo", "ingresos"]
    );
    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.skipped, 0);

    let row = &parsed.rows[0];
    assert_eq!(row.fecha, Some(date(2024, 1, 15)));
    assert_eq!(row.impresiones, 1000);
    assert_eq!(row.clicks, 50);
    assert_eq!(row.conversiones, 5);
    assert_eq!(row.costo, 20.0);
    assert_eq!(row.ingresos, 100.0);
}

/// Synonym headers and canonical headers must normalize identically.
#[test]
fn synonyms_and_canonical_names_produce_the_same_row() {
    let with_synonyms = parse(b"impressions,spend,revenue\n100,5.50,30\n").unwrap();
    let with_canonical = parse(b"impresiones,costo,ingresos\n100,5.50,30\n").unwrap();

    assert_eq!(with_synonyms.headers, with_canonical.headers);
    assert_eq!(with_synonyms.rows, with_canonical.rows);
}

#[test]
fn sales_and_cost_aliases_map_to_revenue_and_spend() {
    let parsed = parse(b"cost,sales\n10,40\n").unwrap();
    assert_eq!(parsed.headers, vec!["costo", "ingresos"]);
    assert_eq!(parsed.rows[0].costo, 10.0);
    assert_eq!(parsed.rows[0].ingresos, 40.0);
}

#[test]
fn headers_are_trimmed_and_lowercased_before_mapping() {
    let parsed = parse(b"  Impressions , CLICKS \n10,2\n").unwrap();
    assert_eq!(parsed.headers, vec!["impresiones", "clicks"]);
}

/// Unknown columns pass through unchanged and land in the row's extra
/// map, verbatim.
#[test]
fn unmapped_headers_pass_through() {
    let parsed = parse(b"impressions,placement\n100,feed_top\n").unwrap();
    assert_eq!(parsed.headers, vec!["impresiones", "placement"]);
    assert_eq!(
        parsed.rows[0].extra.get("placement").map(String::as_str),
        Some("feed_top")
    );
}

#[test]
fn rows_with_wrong_field_count_are_skipped_silently() {
    let csv = b"impressions,clicks,cost\n\
                100,5,2.0\n\
                700,1\n\
                oops,too,many,fields\n\
                200,10,4.0\n";
    let parsed = parse(csv).unwrap();

    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.skipped, 2);
    assert_eq!(parsed.rows[0].impresiones, 100);
    assert_eq!(parsed.rows[1].impresiones, 200);
}

#[test]
fn empty_file_fails_with_parse_error() {
    assert!(matches!(parse(b"").unwrap_err(), DashError::Parse(_)));
}

#[test]
fn header_only_file_fails_with_parse_error() {
    let err = parse(b"impressions,clicks,cost\n").unwrap_err();
    assert!(matches!(err, DashError::Parse(_)));
}

#[test]
fn fully_malformed_file_fails_with_parse_error() {
    let err = parse(b"impressions,clicks\nonly-one-field\n1,2,3\n").unwrap_err();
    assert!(matches!(err, DashError::Parse(_)));
}

#[test]
fn all_five_date_formats_are_accepted() {
    let csv = b"date,clicks\n\
                2024-03-09,1\n\
                09/03/2024,1\n\
                03/09/2024,1\n\
                09-03-2024,1\n\
                03-09-2024,1\n";
    let parsed = parse(csv).unwrap();

    // Ambiguous day/month inputs resolve to the first matching format.
    assert_eq!(parsed.rows[0].fecha, Some(date(2024, 3, 9)));
    assert_eq!(parsed.rows[1].fecha, Some(date(2024, 3, 9)));
    assert_eq!(parsed.rows[2].fecha, Some(date(2024, 9, 3)));
    assert_eq!(parsed.rows[3].fecha, Some(date(2024, 3, 9)));
    assert_eq!(parsed.rows[4].fecha, Some(date(2024, 9, 3)));
}

/// A date matching no known format survives as the raw string so the
/// row is not lost — it just won't group by month downstream.
#[test]
fn unparseable_date_is_kept_verbatim() {
    let parsed = parse(b"date,clicks\nQ1 week 2,7\n").unwrap();
    assert_eq!(
        parsed.rows[0].fecha,
        Some(DateField::Raw("Q1 week 2".into()))
    );
    assert_eq!(parsed.rows[0].fecha.as_ref().unwrap().as_date(), None);
}

#[test]
fn numeric_garbage_coerces_to_zero() {
    let parsed = parse(b"impressions,clicks,cost,revenue\nn/a,-5,free,12.5\n").unwrap();
    let row = &parsed.rows[0];
    assert_eq!(row.impresiones, 0);
    // Negative counts clamp to zero.
    assert_eq!(row.clicks, 0);
    assert_eq!(row.costo, 0.0);
    assert_eq!(row.ingresos, 12.5);
}

#[test]
fn counts_beyond_u64_saturate_at_the_maximum() {
    let parsed = parse(b"impressions\n18446744073709551615\n99999999999999999999\n").unwrap();
    assert_eq!(parsed.rows[0].impresiones, u64::MAX);
    assert_eq!(parsed.rows[1].impresiones, u64::MAX);
}

#[test]
fn quoted_fields_with_commas_are_parsed_whole() {
    let csv = b"campaign,impressions,cost\n\"Spring, launch\",500,9.99\n";
    let parsed = parse(csv).unwrap();

    assert_eq!(parsed.rows[0].campana.as_deref(), Some("Spring, launch"));
    assert_eq!(parsed.rows[0].impresiones, 500);
}

#[test]
fn per_row_ratio_columns_are_coerced_when_present() {
    let parsed = parse(b"clicks,ctr,roas\n10,2.5,4.0\n").unwrap();
    let row = &parsed.rows[0];
    assert_eq!(row.ctr, Some(2.5));
    assert_eq!(row.roas, Some(4.0));
    assert_eq!(row.cpm, None);
}

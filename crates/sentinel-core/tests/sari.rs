use chrono::NaiveDate;
use sentinel_core::sari::{iso_week_monday, parse_sari, week_label_to_date, Field, SariError};

const FEED: &str = "\"KW\";\"REGION\";\"COVID\";\"RSV\";\"AUFNAHMEN\"\n\
\"19. KW 2023\";\"Wien\";\"12\";\"\";\"n/a\"\n\
\"1. KW 2021\";\"Tirol\";3;4;5\n\
\"short row\";\"x\"\n";

#[test]
fn decodes_rows_and_coerces_integers() {
    let table = parse_sari(FEED).expect("parse");
    assert_eq!(vec!["KW", "REGION", "COVID", "RSV", "AUFNAHMEN"], table.columns);
    assert_eq!(2, table.rows.len());

    let first = &table.rows[0];
    assert_eq!(Some(&Field::Text("Wien".to_string())), first.get("REGION"));
    assert_eq!(Some(&Field::Int(12)), first.get("COVID"));
    assert_eq!(Some(&Field::Int(0)), first.get("RSV"));
    assert_eq!(Some(&Field::Int(0)), first.get("AUFNAHMEN"));
    assert_eq!(NaiveDate::from_ymd_opt(2023, 5, 8), first.date);

    let json = serde_json::to_value(first).expect("serialize");
    assert_eq!("2023-05-08", json["date"]);
    assert_eq!(12, json["COVID"]);
}

#[test]
fn iso_week_one_contains_january_fourth() {
    // 2021-01-04 is itself a Monday.
    assert_eq!(NaiveDate::from_ymd_opt(2021, 1, 4), iso_week_monday(2021, 1));
    // 2026-01-04 is a Sunday, so week 1 starts in December.
    assert_eq!(NaiveDate::from_ymd_opt(2025, 12, 29), iso_week_monday(2026, 1));
    assert_eq!(NaiveDate::from_ymd_opt(2020, 12, 28), week_label_to_date("53. KW 2020"));
}

#[test]
fn unparseable_week_gives_null_date() {
    let table = parse_sari("KW;COVID\nirgendwann;1\n").expect("parse");
    assert_eq!(None, table.rows[0].date);
    let json = serde_json::to_value(&table.rows[0]).expect("serialize");
    assert!(json["date"].is_null());
}

#[test]
fn header_only_feed_is_an_error() {
    assert!(matches!(parse_sari("KW;COVID\n"), Err(SariError::NoRows)));
    assert!(matches!(parse_sari(""), Err(SariError::MissingHeader)));
}

#[test]
fn derived_date_replaces_existing_date_column() {
    let table = parse_sari("KW;date;COVID\n1. KW 2024;x;7\n").expect("parse");
    let json = serde_json::to_string(&table.rows[0]).expect("serialize");
    assert_eq!(
        r#"{"KW":"1. KW 2024","date":"2024-01-01","COVID":7}"#,
        json
    );
}

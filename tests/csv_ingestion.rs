// Tabular and payload sources agree on the same campaign

use std::fs;
use std::path::{Path, PathBuf};

use campaign_opt::config::{InputSource, OutputDestination};
use campaign_opt::data::{
    read_campaign_input, CsvSource, MatrixEntry, SqliteSource, TableNames,
};
use campaign_opt::{AppConfig, CampaignData, CampaignInput, CampaignPayload, CampaignTargets, Pipeline};
use rusqlite::Connection;
use testresult::TestResult;

fn demo_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

fn sorted(mut entries: Vec<MatrixEntry>) -> Vec<MatrixEntry> {
    entries.sort_by(|a, b| (&a.cluster, &a.product).cmp(&(&b.cluster, &b.product)));
    entries
}

fn targets() -> CampaignTargets {
    CampaignTargets {
        budget: 2500.0,
        min_roi_percent: 120.0,
    }
}

/// Copy every demo CSV table into a SQLite file.
fn seed_database(path: &Path) -> TestResult {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE cluster_data (Cluster TEXT, Count INTEGER);
         CREATE TABLE product_data (Product_Type TEXT, Count INTEGER);
         CREATE TABLE product_cost (Cluster TEXT, p1 REAL, p2 REAL);
         CREATE TABLE product_profit (Cluster TEXT, p1 REAL, p2 REAL);
         CREATE TABLE customer_data (Cluster TEXT, Customer TEXT, Product TEXT, Cost REAL, Profit REAL);",
    )?;

    for table in [
        "cluster_data",
        "product_data",
        "product_cost",
        "product_profit",
        "customer_data",
    ] {
        let mut reader = csv::Reader::from_path(demo_dir().join("data").join(format!("{table}.csv")))?;
        for record in reader.records() {
            let record = record?;
            let placeholders: Vec<String> = (1..=record.len()).map(|i| format!("?{i}")).collect();
            conn.execute(
                &format!("INSERT INTO {table} VALUES ({})", placeholders.join(", ")),
                rusqlite::params_from_iter(record.iter()),
            )?;
        }
    }
    Ok(())
}

#[test]
fn csv_tables_prepare_into_campaign_data() -> TestResult {
    let source = CsvSource::new(demo_dir().join("data"));
    let input = read_campaign_input(&source, &TableNames::default())?;
    let data = CampaignData::prepare(input, targets())?;

    assert_eq!(data.clusters().len(), 2);
    assert_eq!(data.products().len(), 2);
    assert_eq!(data.customers().len(), 20);
    assert_eq!(data.customer_products().len(), 20);
    assert_eq!(data.cluster_customers().len(), 10);
    Ok(())
}

#[test]
fn payload_matches_csv_tables() -> TestResult {
    let body = fs::read_to_string(demo_dir().join("request.json"))?;
    let payload = CampaignPayload::from_json(&body)?;
    let from_payload = payload.to_input();

    let from_csv = read_campaign_input(
        &CsvSource::new(demo_dir().join("data")),
        &TableNames::default(),
    )?;

    assert_eq!(from_payload.clusters, from_csv.clusters);
    assert_eq!(from_payload.products, from_csv.products);
    assert_eq!(sorted(from_payload.product_cost), sorted(from_csv.product_cost));
    assert_eq!(sorted(from_payload.product_profit), sorted(from_csv.product_profit));
    assert_eq!(from_payload.customers, from_csv.customers);
    assert_eq!(payload.budget, Some(2500.0));
    Ok(())
}

#[test]
fn sqlite_source_reads_the_same_campaign() -> TestResult {
    let scratch = tempfile::tempdir()?;
    let db = scratch.path().join("campaign.db");
    seed_database(&db)?;

    let from_db: CampaignInput =
        read_campaign_input(&SqliteSource::open(&db)?, &TableNames::default())?;
    let from_csv = read_campaign_input(
        &CsvSource::new(demo_dir().join("data")),
        &TableNames::default(),
    )?;

    assert_eq!(from_db.clusters, from_csv.clusters);
    assert_eq!(sorted(from_db.product_cost), sorted(from_csv.product_cost));
    assert_eq!(from_db.customers, from_csv.customers);
    Ok(())
}

#[test]
fn batch_run_from_database_exports_to_database() -> TestResult {
    let scratch = tempfile::tempdir()?;
    let input_db = scratch.path().join("campaign.db");
    seed_database(&input_db)?;

    let mut config = AppConfig::default();
    config.campaign.budget = 2500.0;
    config.input.source = InputSource::Database;
    config.input.database_path = input_db;
    config.output.destination = OutputDestination::Database;
    config.output.database_path = scratch.path().join("results.db");

    Pipeline::new(&config).run_batch()?;

    let conn = Connection::open(&config.output.database_path)?;
    let selected: i64 = conn.query_row(
        "SELECT SUM(selected) FROM operational_allocation_microlp",
        [],
        |row| row.get(0),
    )?;
    let summaries: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tactical_summary_microlp",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(selected, 10);
    assert_eq!(summaries, 1);
    Ok(())
}

mod common;

use common::{
    decoy_table, park_row, parks_page, report_page, units_feed, visits_grid, wrapper_page,
    FixtureConnector, FixtureHttp,
};
use nps_scraper::config::Config;
use nps_scraper::pipeline::{Pipeline, Stages};
use nps_scraper::types::FailureKind;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tempfile::tempdir;

fn fixture_pages(config: &Config) -> HashMap<String, String> {
    let sources = &config.sources;
    let mut pages = HashMap::new();

    pages.insert(
        sources.unit_designations_url.clone(),
        units_feed(&[("ACAD", "Acadia"), ("DENG", "Denali")]),
    );

    for code in ["ACAD", "DENA"] {
        let src = format!("/Stats/SSRSReports/ReportViewer.aspx?Park={code}");
        pages.insert(sources.visits_wrapper_url(code), wrapper_page(&src));
        pages.insert(
            format!("https://irma.nps.gov{src}"),
            report_page(&[decoy_table(), visits_grid(2011..=2022, 100), decoy_table()]),
        );
    }
    // NERI is added to the catalog but has no report pages

    pages.insert(
        sources.park_data_url.clone(),
        parks_page(&[
            park_row("Acadia", "Maine", "44.35; -68.21", "February 26, 1919", "49,071.40 acres (198.6 km2)", "Rocky coast."),
            park_row("Denali*", "Alaska", "63.33; -150.50", "February 26, 1917", "4,740,911.16 acres (19,185.8 km2)", "Tallest peak."),
            park_row("New River Gorge", "West Virginia", "38.07; -81.08", "December 27, 2020", "7,021 acres (28.4 km2)", "Whitewater."),
        ]),
    );
    pages
}

#[tokio::test]
async fn test_full_run_builds_all_tables() -> anyhow::Result<()> {
    let config = Config::default();
    let connector = FixtureConnector::new(FixtureHttp::new(fixture_pages(&config)));
    let connects = connector.connects.clone();
    let pipeline = Pipeline::new(config, Box::new(connector));

    let result = pipeline.run(Stages::ALL, None).await?;

    let codes: Vec<&str> = result.catalog.codes().collect();
    assert_eq!(codes, vec!["ACAD", "DENA", "NERI"]);

    let visits = result.visits.as_ref().expect("visits stage ran");
    assert_eq!(visits.table.park_codes().collect::<Vec<_>>(), vec!["ACAD", "DENA"]);
    assert_eq!(visits.table.index().len(), 12 * 12);
    assert_eq!(visits.table.get("DENA", 2022, 12), 112);
    assert_eq!(visits.failures.len(), 1);
    assert_eq!(visits.failures[0].code, "NERI");
    assert_eq!(visits.failures[0].kind, FailureKind::Transport);

    let parks = result.parks.as_ref().expect("parks stage ran");
    let park_codes: Vec<&str> = parks.rows().iter().map(|p| p.code.as_str()).collect();
    assert_eq!(park_codes, vec!["ACAD", "DENA", "NERI"]);
    assert_eq!(parks.get("ACAD").unwrap().acres, "49,071.40");
    assert_eq!(parks.get("DENA").unwrap().name, "Denali");

    // Each stage connects on its own
    assert_eq!(connects.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_units_only_run_skips_other_stages() -> anyhow::Result<()> {
    let config = Config::default();
    let connector = FixtureConnector::new(FixtureHttp::new(fixture_pages(&config)));
    let http = connector.http.clone();
    let pipeline = Pipeline::new(config, Box::new(connector));

    let result = pipeline.run(Stages::UNITS_ONLY, None).await?;
    assert_eq!(result.catalog.len(), 3);
    assert!(result.visits.is_none());
    assert!(result.parks.is_none());
    assert_eq!(http.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unit_feed_failure_aborts_the_run() {
    let pipeline = Pipeline::new(
        Config::default(),
        Box::new(FixtureConnector::new(FixtureHttp::new(HashMap::new()))),
    );
    assert!(pipeline.run(Stages::ALL, None).await.is_err());
}

#[tokio::test]
async fn test_results_are_written_as_json() -> anyhow::Result<()> {
    let config = Config::default();
    let pipeline = Pipeline::new(
        config.clone(),
        Box::new(FixtureConnector::new(FixtureHttp::new(fixture_pages(&config)))),
    );
    let result = pipeline.run(Stages::ALL, None).await?;

    let dir = tempdir()?;
    let output_dir = dir.path().to_str().unwrap();
    let written = Pipeline::persist_to_json(&result, output_dir)?;

    let names: Vec<String> = written
        .iter()
        .map(|p| {
            let file = std::path::Path::new(p).file_name().unwrap().to_string_lossy().to_string();
            file.split('_').next().unwrap().to_string()
        })
        .collect();
    assert_eq!(names, vec!["units", "visits", "visit", "parks"]);

    let units: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&written[0])?)?;
    assert_eq!(units["DENA"], "Denali");

    let visits: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&written[1])?)?;
    assert_eq!(visits.as_array().unwrap().len(), 144);
    assert_eq!(visits[0]["year"], 2011);
    assert_eq!(visits[0]["visitors"]["ACAD"], 101);
    Ok(())
}

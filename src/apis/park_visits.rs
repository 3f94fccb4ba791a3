use crate::app::ports::HttpClientPort;
use crate::config::{Config, SourcesConfig};
use crate::constants::{TOTAL_COLUMN, VISITS_SKIP_ROWS, VISITS_TABLE_MATCH, YEAR_COLUMN};
use crate::error::{Result, ScraperError};
use crate::parser::{read_tables, HtmlTable};
use crate::types::{
    FailureKind, ParkFailure, ParkVisitSeries, UnitCatalog, VisitationReport, VisitationTable,
};
use chrono::Month;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

static IFRAME: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe").expect("iframe selector"));

/// Collects monthly recreation visitors per park from the IRMA STATS portal.
///
/// Each park takes two requests: the report wrapper page, then the report
/// frame it embeds. A failing park is recorded and the batch moves on.
pub struct ParkVisitsCrawler {
    sources: SourcesConfig,
    min_table_rows: usize,
    timeout: Duration,
}

impl ParkVisitsCrawler {
    pub fn new(config: &Config) -> Self {
        Self {
            sources: config.sources.clone(),
            min_table_rows: config.visits.min_table_rows,
            timeout: config.http.report_timeout(),
        }
    }

    /// Fetch every park in the catalog, or only `only` when given.
    #[instrument(skip_all, fields(parks = catalog.len()))]
    pub async fn get_park_visits(
        &self,
        http: &dyn HttpClientPort,
        catalog: &UnitCatalog,
        only: Option<&[String]>,
    ) -> VisitationReport {
        let codes: Vec<&str> = match only {
            Some(requested) => requested
                .iter()
                .filter(|code| {
                    let known = catalog.contains(code);
                    if !known {
                        warn!("Skipping unknown park code {}", code);
                    }
                    known
                })
                .map(String::as_str)
                .collect(),
            None => catalog.codes().collect(),
        };

        info!("Fetching visitation reports for {} parks", codes.len());
        let mut report = VisitationReport {
            table: VisitationTable::new(),
            failures: Vec::new(),
        };

        for (i, code) in codes.iter().enumerate() {
            info!("Processing {} ({}/{})", code, i + 1, codes.len());
            match self.get_one_park(http, code).await {
                Ok(series) => {
                    debug!("{}: {} monthly values", code, series.len());
                    report.table.insert_series(series);
                }
                Err(e) => {
                    warn!("Visitation report for {} failed: {}", code, e);
                    report.failures.push(ParkFailure {
                        code: code.to_string(),
                        kind: failure_kind(&e),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Collected visitation for {} parks ({} failed)",
            report.table.park_count(),
            report.failures.len()
        );
        report
    }

    pub async fn get_one_park(&self, http: &dyn HttpClientPort, code: &str) -> Result<ParkVisitSeries> {
        let wrapper_url = self.sources.visits_wrapper_url(code);
        let wrapper = http.get_text(&wrapper_url, Some(self.timeout)).await?;
        let report_url = find_report_url(&wrapper, &self.sources.visits_domain, code)?;
        debug!("{}: report frame at {}", code, report_url);

        let report = http.get_text(&report_url, Some(self.timeout)).await?;
        parse_park_visits(code, &report, self.min_table_rows)
    }
}

/// Resolve the `src` of the wrapper page's first iframe against the portal domain.
pub fn find_report_url(wrapper_html: &str, domain: &str, code: &str) -> Result<String> {
    let document = Html::parse_document(wrapper_html);
    let src = document
        .select(&IFRAME)
        .next()
        .and_then(|iframe| iframe.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .ok_or_else(|| {
            ScraperError::parse(
                format!("visitation wrapper page for {}", code),
                "no iframe with a src attribute",
            )
        })?;

    Ok(Url::parse(domain)?.join(src)?.to_string())
}

/// The report's data table: among tables mentioning "Year" (first row skipped),
/// the last one with more than `min_rows` rows. Shorter tables are layout decoys.
pub fn select_visits_table(report_html: &str, min_rows: usize) -> Option<HtmlTable> {
    let candidates = read_tables(report_html, VISITS_TABLE_MATCH, VISITS_SKIP_ROWS);
    debug!(
        "Visitation candidates: row counts {:?}",
        candidates.iter().map(HtmlTable::len).collect::<Vec<_>>()
    );
    candidates.into_iter().filter(|t| t.len() > min_rows).last()
}

pub fn parse_park_visits(code: &str, report_html: &str, min_rows: usize) -> Result<ParkVisitSeries> {
    let table = select_visits_table(report_html, min_rows).ok_or_else(|| {
        ScraperError::parse(
            format!("visitation report for {}", code),
            format!("no table with more than {} rows", min_rows),
        )
    })?;
    flatten_visits_table(code, table)
}

/// Turn the year x month grid into a long-form series. Every year that appears
/// gets all twelve months; blank cells count as zero.
pub fn flatten_visits_table(code: &str, table: HtmlTable) -> Result<ParkVisitSeries> {
    let context = format!("visitation table for {}", code);
    let table = table.promote_first_row();
    let header = table.header.clone().unwrap_or_default();

    let year_col = header
        .iter()
        .position(|h| h == YEAR_COLUMN)
        .ok_or_else(|| ScraperError::parse(&context, "no Year column"))?;

    // month number -> column; repeated headers from colspan keep their first column
    let mut month_cols: BTreeMap<u32, usize> = BTreeMap::new();
    for (i, label) in header.iter().enumerate() {
        if i == year_col || label == TOTAL_COLUMN {
            continue;
        }
        if let Some(month) = parse_month(label) {
            month_cols.entry(month).or_insert(i);
        }
    }
    if month_cols.is_empty() {
        return Err(ScraperError::parse(&context, "no month columns"));
    }

    let mut series = ParkVisitSeries::new(code);
    for row in &table.rows {
        let year_cell = row.get(year_col).map(|c| c.trim()).unwrap_or_default();
        let Ok(year) = year_cell.parse::<i32>() else {
            debug!("{}: skipping row with Year {:?}", code, year_cell);
            continue;
        };

        for month in 1..=12u32 {
            let visitors = match month_cols.get(&month).and_then(|&col| row.get(col)) {
                Some(cell) => parse_count(cell).map_err(|message| ScraperError::parse(&context, message))?,
                None => 0,
            };
            series.counts.insert((year, month), visitors);
        }
    }

    if series.is_empty() {
        return Err(ScraperError::parse(&context, "no rows with a numeric Year"));
    }
    Ok(series)
}

/// Month number for headers like "JAN", "Feb" or "March".
fn parse_month(label: &str) -> Option<u32> {
    let label = label.trim();
    let mut chars = label.chars();
    let first = chars.next()?;
    let normalized: String = first
        .to_uppercase()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    normalized.parse::<Month>().ok().map(|m| m.number_from_month())
}

fn parse_count(cell: &str) -> std::result::Result<u64, String> {
    let cleaned: String = cell.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    cleaned
        .parse::<u64>()
        .map_err(|_| format!("invalid visitor count {:?}", cell))
}

pub fn failure_kind(err: &ScraperError) -> FailureKind {
    match err {
        ScraperError::Http(_) | ScraperError::Transport { .. } | ScraperError::Status { .. } => {
            FailureKind::Transport
        }
        ScraperError::Parse { .. } | ScraperError::Url(_) | ScraperError::Xml(_) => FailureKind::Parse,
        ScraperError::Match { .. } => FailureKind::Match,
        _ => FailureKind::Other,
    }
}

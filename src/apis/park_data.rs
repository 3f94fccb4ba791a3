use crate::app::ports::HttpClientPort;
use crate::config::{Config, MatchingConfig};
use crate::constants::PARK_DATA_TABLE_MATCH;
use crate::error::{Result, ScraperError};
use crate::matching::extract_one;
use crate::parser::{read_tables, HtmlTable};
use crate::types::{DescriptorTable, ParkDescriptor, UnitCatalog};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").expect("valid regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid regex"));
static NOT_STATE_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z\s.]").expect("valid regex"));
static FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d*?\]").expect("valid regex"));
static NOT_ACRES_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d,.]").expect("valid regex"));

const PAGE_CONTEXT: &str = "national parks list";
const MARKUP_ARTIFACT: &str = ".mw";

const NAME: &str = "Name";
const LOCATION: &str = "Location";
const ESTABLISHED: &str = "Established";
const ACRES: &str = "Acres";
const DESCRIPTION: &str = "Description";

/// Source headers renamed on import.
const RENAMES: [(&str, &str); 2] = [("Date established as park", ESTABLISHED), ("Area", ACRES)];

/// Reads the Wikipedia list of national parks and joins each row to a park code.
pub struct ParkDataCrawler {
    url: String,
    matching: MatchingConfig,
}

impl ParkDataCrawler {
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.sources.park_data_url.clone(),
            matching: config.matching.clone(),
        }
    }

    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn get_park_data(
        &self,
        http: &dyn HttpClientPort,
        catalog: &UnitCatalog,
    ) -> Result<DescriptorTable> {
        info!("Fetching national parks list");
        let body = http.get_text(&self.url, None).await?;
        let table = parse_park_data(&body, catalog, &self.matching)?;
        info!("Parsed {} park descriptions", table.len());
        Ok(table)
    }
}

/// Column positions of the cleaned page table.
struct Columns {
    name: usize,
    location: usize,
    established: usize,
    acres: usize,
    description: usize,
}

impl Columns {
    fn locate(table: &HtmlTable) -> Result<Self> {
        let header: Vec<String> = table
            .header
            .as_ref()
            .ok_or_else(|| ScraperError::parse(PAGE_CONTEXT, "table has no header row"))?
            .iter()
            .map(|h| rename_column(&clean_column_name(h)).to_string())
            .collect();
        debug!("Park list columns: {:?}", header);

        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ScraperError::parse(PAGE_CONTEXT, format!("missing column {}", name)))
        };
        Ok(Self {
            name: find(NAME)?,
            location: find(LOCATION)?,
            established: find(ESTABLISHED)?,
            acres: find(ACRES)?,
            description: find(DESCRIPTION)?,
        })
    }
}

pub fn parse_park_data(
    html: &str,
    catalog: &UnitCatalog,
    matching: &MatchingConfig,
) -> Result<DescriptorTable> {
    if catalog.is_empty() {
        return Err(ScraperError::Match {
            message: "unit catalog is empty".to_string(),
        });
    }

    let table = read_tables(html, PARK_DATA_TABLE_MATCH, 0)
        .into_iter()
        .next()
        .ok_or_else(|| {
            ScraperError::parse(
                PAGE_CONTEXT,
                format!("no table mentioning {:?}", PARK_DATA_TABLE_MATCH),
            )
        })?;
    let columns = Columns::locate(&table)?;

    let names = catalog.names();
    let mut claimed: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::with_capacity(table.len());

    for row in &table.rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or_default();

        let name = clean_name(cell(columns.name));
        let best = extract_one(&name, &names).ok_or_else(|| ScraperError::Match {
            message: "unit catalog is empty".to_string(),
        })?;
        let code = catalog
            .code_for_name(best.choice)
            .ok_or_else(|| ScraperError::Match {
                message: format!("matched name {:?} is not in the catalog", best.choice),
            })?
            .to_string();

        if best.score < matching.min_score {
            let message = format!(
                "{:?} matched {:?} ({}) with low confidence {:.2}",
                name, best.choice, code, best.score
            );
            if matching.strict {
                return Err(ScraperError::Match { message });
            }
            warn!("{}", message);
        }
        if let Some(previous) = claimed.insert(code.clone(), name.clone()) {
            let message = format!("{:?} and {:?} both matched {}", previous, name, code);
            if matching.strict {
                return Err(ScraperError::Match { message });
            }
            warn!("{}", message);
        }
        debug!("{} -> {} ({:.2})", name, code, best.score);

        let location = cell(columns.location);
        rows.push(ParkDescriptor {
            code,
            name,
            state: parse_state(location),
            location: parse_coordinates(location),
            established: clean_established(cell(columns.established)),
            acres: clean_acres(cell(columns.acres)),
            description: cell(columns.description).to_string(),
            match_score: best.score,
        });
    }

    Ok(DescriptorTable::new(rows))
}

/// Drop `(...)` and `[...]` annotations, e.g. "Area (2023)[8]" -> "Area".
pub fn clean_column_name(name: &str) -> String {
    let without_parens = PARENTHESIZED.replace_all(name, "");
    BRACKETED.replace_all(&without_parens, "").trim().to_string()
}

fn rename_column(name: &str) -> &str {
    RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Park names are starred on the page when they are also biosphere reserves.
pub fn clean_name(name: &str) -> String {
    name.replace('*', "").trim().to_string()
}

/// Leading state name of a Location cell, before the coordinates start.
pub fn parse_state(location: &str) -> String {
    NOT_STATE_CHAR
        .split(location)
        .next()
        .unwrap_or_default()
        .replace(MARKUP_ARTIFACT, "")
        .trim()
        .to_string()
}

/// Decimal coordinates: the text after the last `/` of a Location cell.
pub fn parse_coordinates(location: &str) -> String {
    location
        .rsplit_once('/')
        .map(|(_, tail)| tail)
        .unwrap_or(location)
        .trim()
        .to_string()
}

pub fn clean_established(established: &str) -> String {
    FOOTNOTE.replace_all(established, "").trim().to_string()
}

/// Leading number of an area cell: "1,234.5 acres" -> "1,234.5".
pub fn clean_acres(acres: &str) -> String {
    NOT_ACRES_CHAR
        .split(acres)
        .next()
        .unwrap_or_default()
        .to_string()
}

#![allow(dead_code)]

use async_trait::async_trait;
use nps_scraper::app::ports::{ConnectionProvider, HttpClientPort};
use nps_scraper::error::{Result, ScraperError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves canned pages by URL; anything else is a 404.
#[derive(Clone, Default)]
pub struct FixtureHttp {
    pages: Arc<HashMap<String, String>>,
    requests: Arc<Mutex<Vec<(String, Option<Duration>)>>>,
}

impl FixtureHttp {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages: Arc::new(pages),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<(String, Option<Duration>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientPort for FixtureHttp {
    async fn get_text(&self, url: &str, timeout: Option<Duration>) -> Result<String> {
        self.requests.lock().unwrap().push((url.to_string(), timeout));
        self.pages.get(url).cloned().ok_or_else(|| ScraperError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Hands out clients sharing one set of pages and counts connections.
pub struct FixtureConnector {
    pub http: FixtureHttp,
    pub connects: Arc<AtomicUsize>,
}

impl FixtureConnector {
    pub fn new(http: FixtureHttp) -> Self {
        Self {
            http,
            connects: Arc::default(),
        }
    }
}

impl ConnectionProvider for FixtureConnector {
    fn connect(&self) -> Result<Box<dyn HttpClientPort>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.http.clone()))
    }
}

pub fn units_feed(units: &[(&str, &str)]) -> String {
    let values: String = units
        .iter()
        .map(|(code, name)| format!("<Value><Code>{code}</Code><Name>{name}</Name></Value>"))
        .collect();
    format!(
        "<?xml version=\"1.0\"?><ArrayOfUnitDesignation>\
         <UnitDesignation><Code>NHP</Code><Name>National Historical Park</Name>\
         <Units><Value><Code>ADAM</Code><Name>Adams</Name></Value></Units></UnitDesignation>\
         <UnitDesignation><Code>NP</Code><Name>National Park</Name><Units>{values}</Units></UnitDesignation>\
         </ArrayOfUnitDesignation>"
    )
}

pub fn wrapper_page(src: &str) -> String {
    format!(
        "<html><body><div id=\"ReportViewer\"><iframe id=\"report\" src=\"{src}\"></iframe></div></body></html>"
    )
}

/// Year x month grid in the report layout: a title row, then the header row,
/// then one row per year. `base` offsets the counts so tables are distinguishable.
pub fn visits_grid(years: std::ops::RangeInclusive<i32>, base: u64) -> String {
    let mut html = String::from(
        "<table><tr><td colspan=\"14\">Recreation Visitors By Month</td></tr>\
         <tr><td>Year</td><td>JAN</td><td>FEB</td><td>MAR</td><td>APR</td><td>MAY</td><td>JUN</td>\
         <td>JUL</td><td>AUG</td><td>SEP</td><td>OCT</td><td>NOV</td><td>DEC</td><td>Total</td></tr>",
    );
    for year in years {
        html.push_str(&format!("<tr><td>{year}</td>"));
        for month in 1..=12u64 {
            html.push_str(&format!("<td>{}</td>", base + month));
        }
        html.push_str("<td>0</td></tr>");
    }
    html.push_str("</table>");
    html
}

/// Short tables sharing the "Year" header text with the data table.
pub fn decoy_table() -> String {
    "<table><tr><td>Park</td></tr><tr><td>Year</td><td>Report Date</td></tr><tr><td>1979</td><td>Last Calendar Year</td></tr></table>".to_string()
}

pub fn report_page(tables: &[String]) -> String {
    format!("<html><body>{}</body></html>", tables.concat())
}

pub const PARKS_HEADER: &str = "<tr><th>Name</th><th>Image</th><th>Location</th>\
    <th>Date established as park<sup>[12]</sup></th><th>Area (2023)<sup>[8]</sup></th>\
    <th>Recreation visitors (2022)<sup>[11]</sup></th><th>Description</th></tr>";

pub fn park_row(name: &str, state: &str, coords: &str, established: &str, area: &str, description: &str) -> String {
    format!(
        "<tr><th scope=\"row\"><a href=\"#\">{name}</a></th><td><img src=\"x.jpg\"></td>\
         <td>{state}<br><style>.mw-parser-output .geo-default{{display:inline}}</style>\
         <span>12°N 34°W</span> / <span>12.0°N 34.0°W</span> / <span>{coords}</span></td>\
         <td>{established}<sup>[14]</sup></td><td>{area}</td><td>1,000</td><td>{description}</td></tr>"
    )
}

pub fn parks_page(rows: &[String]) -> String {
    format!(
        "<html><body><table class=\"wikitable\"><tr><th>Legend</th></tr><tr><td>* biosphere</td></tr></table>\
         <table class=\"wikitable sortable\"><tbody>{}{}</tbody></table></body></html>",
        PARKS_HEADER,
        rows.concat()
    )
}

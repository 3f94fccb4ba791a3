use crate::app::ports::HttpClientPort;
use crate::config::SourcesConfig;
use crate::constants::{
    remap_unit_code, NATIONAL_PARK_DESIGNATION, NEW_RIVER_GORGE_CODE, NEW_RIVER_GORGE_NAME,
};
use crate::error::{Result, ScraperError};
use crate::types::{ParkUnit, UnitCatalog};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, instrument, warn};

const FEED_CONTEXT: &str = "unit designations feed";

/// Fetches the National Park units from the NPS designations feed.
pub struct ParkUnitsCrawler {
    url: String,
}

impl ParkUnitsCrawler {
    pub fn new(sources: &SourcesConfig) -> Self {
        Self {
            url: sources.unit_designations_url.clone(),
        }
    }

    #[instrument(skip(self, http), fields(url = %self.url))]
    pub async fn get_park_units(&self, http: &dyn HttpClientPort) -> Result<UnitCatalog> {
        info!("Fetching park unit designations");
        let body = http.get_text(&self.url, None).await?;
        let catalog = parse_park_units(&body)?;
        info!("Loaded {} national park units", catalog.len());
        Ok(catalog)
    }
}

/// Parse the designations feed into the corrected unit catalog.
pub fn parse_park_units(xml: &str) -> Result<UnitCatalog> {
    let units = parse_designation_units(xml, NATIONAL_PARK_DESIGNATION)?;
    Ok(build_catalog(units))
}

#[derive(Default)]
struct Designation {
    code: Option<String>,
    units: Vec<ParkUnit>,
}

/// Units listed under every `UnitDesignation` whose own `Code` is `designation`.
/// Elements are matched by local name, so namespace prefixes are ignored.
pub fn parse_designation_units(xml: &str, designation: &str) -> Result<Vec<ParkUnit>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut current: Option<Designation> = None;
    let mut unit_code: Option<String> = None;
    let mut unit_name: Option<String> = None;
    let mut found_designation = false;
    let mut units = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "UnitDesignation" {
                    current = Some(Designation::default());
                }
                path.push(name);
                if relative_path(&path).as_deref() == Some(&["Units", "Value"][..]) {
                    unit_code = None;
                    unit_name = None;
                }
                text.clear();
            }
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| ScraperError::parse(FEED_CONTEXT, e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(_) => {
                match relative_path(&path).as_deref() {
                    Some(["Code"]) => {
                        if let Some(d) = current.as_mut() {
                            d.code = Some(text.trim().to_string());
                        }
                    }
                    Some(["Units", "Value", "Code"]) => unit_code = Some(text.trim().to_string()),
                    Some(["Units", "Value", "Name"]) => unit_name = Some(text.trim().to_string()),
                    Some(["Units", "Value"]) => match (unit_code.take(), unit_name.take()) {
                        (Some(code), Some(name)) => {
                            if let Some(d) = current.as_mut() {
                                d.units.push(ParkUnit { code, name });
                            }
                        }
                        (code, _) => warn!("Skipping unit without code and name: {:?}", code),
                    },
                    Some([]) => {
                        if let Some(d) = current.take() {
                            if d.code.as_deref() == Some(designation) {
                                found_designation = true;
                                debug!("Designation {} lists {} units", designation, d.units.len());
                                units.extend(d.units);
                            }
                        }
                    }
                    _ => {}
                }
                path.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_designation {
        return Err(ScraperError::parse(
            FEED_CONTEXT,
            format!("no UnitDesignation with code {}", designation),
        ));
    }
    Ok(units)
}

/// Path below the innermost open `UnitDesignation`, or `None` outside one.
fn relative_path(path: &[String]) -> Option<Vec<&str>> {
    let start = path.iter().rposition(|p| p == "UnitDesignation")?;
    Some(path[start + 1..].iter().map(String::as_str).collect())
}

/// Apply the code corrections and make sure New River Gorge is present.
pub fn build_catalog(units: impl IntoIterator<Item = ParkUnit>) -> UnitCatalog {
    let mut catalog = UnitCatalog::new();
    let mut sources: Vec<(String, String)> = Vec::new();

    for unit in units {
        let code = remap_unit_code(&unit.code).to_string();
        if code != unit.code {
            debug!("Remapped unit code {} -> {}", unit.code, code);
        }
        if let Some((_, earlier)) = sources.iter().find(|(c, raw)| *c == code && *raw != unit.code) {
            warn!(
                "Unit codes {} and {} both map to {}; keeping the later",
                earlier, unit.code, code
            );
        }
        sources.push((code.clone(), unit.code));
        catalog.insert(code, unit.name);
    }

    if !catalog.contains(NEW_RIVER_GORGE_CODE) {
        info!("Adding {} ({}) missing from the feed", NEW_RIVER_GORGE_CODE, NEW_RIVER_GORGE_NAME);
        catalog.insert(NEW_RIVER_GORGE_CODE, NEW_RIVER_GORGE_NAME);
    }
    catalog
}

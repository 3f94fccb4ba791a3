use crate::apis::park_data::ParkDataCrawler;
use crate::apis::park_units::ParkUnitsCrawler;
use crate::apis::park_visits::ParkVisitsCrawler;
use crate::app::ports::ConnectionProvider;
use crate::config::Config;
use crate::error::Result;
use crate::types::{DescriptorTable, UnitCatalog, VisitationReport};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// Which stages run after the unit catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub visits: bool,
    pub parks: bool,
}

impl Stages {
    pub const UNITS_ONLY: Stages = Stages { visits: false, parks: false };
    pub const ALL: Stages = Stages { visits: true, parks: true };
}

/// Tables produced by a run. Stages that did not run are `None`.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub catalog: UnitCatalog,
    pub visits: Option<VisitationReport>,
    pub parks: Option<DescriptorTable>,
}

pub struct Pipeline {
    config: Config,
    connector: Box<dyn ConnectionProvider>,
}

impl Pipeline {
    pub fn new(config: Config, connector: Box<dyn ConnectionProvider>) -> Self {
        Self { config, connector }
    }

    pub async fn park_units(&self) -> Result<UnitCatalog> {
        let http = self.connector.connect()?;
        ParkUnitsCrawler::new(&self.config.sources)
            .get_park_units(http.as_ref())
            .await
    }

    pub async fn park_visits(
        &self,
        catalog: &UnitCatalog,
        only: Option<&[String]>,
    ) -> Result<VisitationReport> {
        let http = self.connector.connect()?;
        Ok(ParkVisitsCrawler::new(&self.config)
            .get_park_visits(http.as_ref(), catalog, only)
            .await)
    }

    pub async fn park_data(&self, catalog: &UnitCatalog) -> Result<DescriptorTable> {
        let http = self.connector.connect()?;
        ParkDataCrawler::new(&self.config)
            .get_park_data(http.as_ref(), catalog)
            .await
    }

    /// Unit catalog first, then the requested stages in order.
    #[instrument(skip(self))]
    pub async fn run(&self, stages: Stages, only: Option<&[String]>) -> Result<PipelineResult> {
        let started = Instant::now();
        info!("🚀 Starting pipeline");

        let catalog = self.park_units().await?;
        let visits = if stages.visits {
            Some(self.park_visits(&catalog, only).await?)
        } else {
            None
        };
        let parks = if stages.parks {
            Some(self.park_data(&catalog).await?)
        } else {
            None
        };

        info!("✅ Pipeline finished in {:.1}s", started.elapsed().as_secs_f64());
        Ok(PipelineResult {
            catalog,
            visits,
            parks,
        })
    }

    /// Write each produced table as `<table>_<timestamp>.json`; returns the paths.
    pub fn persist_to_json(result: &PipelineResult, output_dir: &str) -> Result<Vec<String>> {
        fs::create_dir_all(output_dir)?;
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let mut written = Vec::new();

        written.push(write_json(output_dir, "units", &timestamp, &result.catalog)?);
        if let Some(visits) = &result.visits {
            written.push(write_json(output_dir, "visits", &timestamp, &visits.table.rows())?);
            if !visits.failures.is_empty() {
                written.push(write_json(
                    output_dir,
                    "visit_failures",
                    &timestamp,
                    &visits.failures,
                )?);
            }
        }
        if let Some(parks) = &result.parks {
            written.push(write_json(output_dir, "parks", &timestamp, parks)?);
        }

        for path in &written {
            info!("💾 Saved {}", path);
        }
        Ok(written)
    }
}

fn write_json<T: Serialize + ?Sized>(
    output_dir: &str,
    table: &str,
    timestamp: &str,
    value: &T,
) -> Result<String> {
    let filepath = Path::new(output_dir).join(format!("{table}_{timestamp}.json"));
    let json_content = serde_json::to_string_pretty(value)?;
    fs::write(&filepath, json_content)?;
    Ok(filepath.to_string_lossy().to_string())
}

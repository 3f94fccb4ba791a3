use crate::constants;
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "NPS_SCRAPER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub sources: SourcesConfig,
    pub visits: VisitsConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
    pub report_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub unit_designations_url: String,
    pub visits_domain: String,
    pub visits_report_path: String,
    pub park_data_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisitsConfig {
    pub min_table_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub min_score: f64,
    /// Reject low-confidence and colliding joins instead of warning
    pub strict: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: constants::USER_AGENT.to_string(),
            max_retries: constants::MAX_RETRIES,
            backoff_factor: constants::BACKOFF_FACTOR,
            status_forcelist: constants::RETRY_STATUS_CODES.to_vec(),
            report_timeout_secs: constants::REPORT_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            unit_designations_url: constants::UNIT_DESIGNATIONS_URL.to_string(),
            visits_domain: constants::VISITS_DOMAIN.to_string(),
            visits_report_path: constants::VISITS_REPORT_PATH.to_string(),
            park_data_url: constants::PARK_DATA_URL.to_string(),
        }
    }
}

impl SourcesConfig {
    /// Wrapper page URL for one park's monthly visitation report.
    pub fn visits_wrapper_url(&self, park_code: &str) -> String {
        format!(
            "{}{}{}{}",
            self.visits_domain.trim_end_matches('/'),
            self.visits_report_path,
            constants::VISITS_PARK_PARAM,
            park_code
        )
    }
}

impl Default for VisitsConfig {
    fn default() -> Self {
        Self {
            min_table_rows: constants::VISITS_MIN_TABLE_ROWS,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: constants::MATCH_MIN_SCORE,
            strict: false,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the `NPS_SCRAPER_CONFIG`
    /// variable, or `config.toml`, falling back to built-in defaults when no
    /// file is named and the default one does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(|p| p.to_path_buf())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(Into::into));

        let config_path = match explicit {
            Some(p) => p,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path.to_path_buf()
            }
        };

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.matching.min_score) {
            return Err(ScraperError::Config(format!(
                "matching.min_score must be between 0 and 1, got {}",
                self.matching.min_score
            )));
        }
        if self.http.backoff_factor < 0.0 {
            return Err(ScraperError::Config(
                "http.backoff_factor must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

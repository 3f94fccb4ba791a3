use crate::app::ports::{ConnectionProvider, HttpClientPort};
use crate::config::HttpConfig;
use crate::constants::BACKOFF_MAX_SECS;
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Method, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Transport-level retry rules applied to every request a client sends.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
    pub allowed_methods: Vec<Method>,
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
            status_forcelist: config.status_forcelist.clone(),
            allowed_methods: vec![Method::HEAD, Method::GET, Method::OPTIONS],
        }
    }

    pub fn is_retryable_method(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Sleep before retry number `retry` (1-based). The first retry is immediate.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let secs = self.backoff_factor * 2f64.powi(retry as i32 - 1);
        Duration::from_secs_f64(secs.min(BACKOFF_MAX_SECS))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

/// `Retry-After` in whole seconds, honored on 429 and 503 only.
fn retry_after(response: &Response) -> Option<Duration> {
    let status = response.status().as_u16();
    if status != 429 && status != 503 {
        return None;
    }
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

pub struct ReqwestHttp {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl ReqwestHttp {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
        })
    }

    fn exhausted(&self, url: &str, message: String) -> ScraperError {
        ScraperError::Transport {
            url: url.to_string(),
            attempts: self.policy.max_retries + 1,
            message,
        }
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get_text(&self, url: &str, timeout: Option<Duration>) -> Result<String> {
        let method = Method::GET;
        let can_retry = self.policy.is_retryable_method(&method);
        let mut retries = 0u32;

        loop {
            let mut request = self.client.request(method.clone(), url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            let (reason, delay) = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!("GET {} -> {}", url, status.as_u16());
                        return Ok(response.text().await?);
                    }
                    if !(can_retry && self.policy.is_retryable_status(status.as_u16())) {
                        return Err(ScraperError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    (format!("status {}", status.as_u16()), retry_after(&response))
                }
                Err(e) if can_retry && is_transient(&e) => (e.to_string(), None),
                Err(e) => return Err(e.into()),
            };

            if retries >= self.policy.max_retries {
                return Err(self.exhausted(url, reason));
            }
            retries += 1;
            let delay = delay.unwrap_or_else(|| self.policy.backoff(retries));
            warn!(
                "GET {} failed ({}); retry {}/{} in {:?}",
                url, reason, retries, self.policy.max_retries, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builds a new `ReqwestHttp` per stage from the shared HTTP settings.
pub struct ReqwestConnector {
    config: HttpConfig,
}

impl ReqwestConnector {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

impl ConnectionProvider for ReqwestConnector {
    fn connect(&self) -> Result<Box<dyn HttpClientPort>> {
        Ok(Box::new(ReqwestHttp::new(&self.config)?))
    }
}

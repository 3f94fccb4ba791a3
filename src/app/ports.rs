use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Fetches a page as text. `timeout` overrides the client default for this call.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get_text(&self, url: &str, timeout: Option<Duration>) -> Result<String>;
}

/// Hands out a freshly configured client; each pipeline stage connects on its own.
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self) -> Result<Box<dyn HttpClientPort>>;
}

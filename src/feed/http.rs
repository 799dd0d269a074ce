use crate::feed::{FetchError, ReservationSource};
use serde_json::Value;
use tracing::debug;

/// One-shot GET against the configured feed URL. No retries; the refresh
/// cycle wraps each call in its own timeout.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpSource {
    pub fn new(url: reqwest::Url) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, url })
    }
}

impl ReservationSource for HttpSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!(url = %self.url, bytes = body.len(), "Fetched reservation feed");
        Ok(serde_json::from_slice(&body)?)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

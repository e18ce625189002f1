use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use common::{Error, Result, Signal, SignalSink};

/// Posts signals as JSON to the downstream signal API.
pub struct HttpSignalSink {
    url: String,
    http: Client,
}

impl HttpSignalSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SignalSink for HttpSignalSink {
    async fn send(&self, signal: &Signal) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(signal)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!("HTTP {status}: {body}")));
        }
        debug!(url = %self.url, %status, "Signal accepted");
        Ok(())
    }
}

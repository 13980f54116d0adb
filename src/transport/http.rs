use super::{Transport, TransportError, TransportResponse};
use crate::protocol::BackendConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// reqwest-backed transport for the configured endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout().min(Duration::from_secs(10)))
            .pool_max_idle_per_host(
                env::var("ORCH_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(config.max_concurrent_requests.max(1)),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .user_agent(concat!("chat-orchestrator/", env!("CARGO_PKG_VERSION")));

        if let Ok(proxy_url) = env::var("ORCH_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            url: config.request_url(),
            api_key: config.resolve_api_key(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
        for name in names {
            if let Some(v) = headers.get(*name) {
                if let Ok(s) = v.to_str() {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
            }
        }
        None
    }

    /// Only the `Retry-After: <seconds>` form is understood.
    fn retry_after(headers: &HeaderMap) -> Option<Duration> {
        let raw = Self::header_first(headers, &["retry-after"])?;
        let secs: u64 = raw.parse().ok()?;
        Some(Duration::from_secs(secs))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        body: &serde_json::Value,
        request_id: &str,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut req = self
            .client
            .post(&self.url)
            .json(body)
            .header("x-request-id", request_id);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Interrupted(e.to_string()))?;

        Ok(TransportResponse {
            status,
            body,
            retry_after: Self::retry_after(&headers),
            upstream_request_id: Self::header_first(
                &headers,
                &["x-request-id", "request-id", "x-amzn-requestid", "cf-ray"],
            ),
        })
    }
}

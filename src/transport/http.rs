use reqwest::header::CONTENT_TYPE;
use reqwest::Proxy;
use serde::Serialize;
use std::env;
use std::time::Duration;
use tracing::debug;

/// Status and decoded JSON body of a completed HTTP exchange.
///
/// Non-JSON error bodies decode to `Value::Null` so that classification can
/// still fall back to a generic message.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// A zero `timeout` leaves requests unbounded.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("GEMINI_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(16),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }

        if let Ok(proxy_url) = env::var("GEMINI_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST a JSON body with the API key attached as the `key` query parameter.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: &str,
        body: &T,
    ) -> Result<HttpReply, TransportError> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .query(&[("key", api_key)])
            .json(body);
        self.dispatch(url, request).await
    }

    pub async fn get_json(&self, url: &str, api_key: &str) -> Result<HttpReply, TransportError> {
        let request = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .query(&[("key", api_key)]);
        self.dispatch(url, request).await
    }

    async fn dispatch(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpReply, TransportError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(url, status, bytes = text.len(), "gemini http exchange completed");

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) if (200..300).contains(&status) => {
                    return Err(TransportError::Other(format!(
                        "invalid JSON in response body: {}",
                        e
                    )))
                }
                Err(_) => serde_json::Value::Null,
            }
        };

        Ok(HttpReply { status, body })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_timeout())
    }
}

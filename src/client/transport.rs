//! HTTP transport
//!
//! The [`Transport`] trait is the only place the crate performs network I/O.
//! [`HttpTransport`] implements it with `reqwest`.

use super::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// HTTP method used for `/query`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Parameters in the query string
    Get,
    /// Parameters in a form-encoded body
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Parse a method name, ignoring case
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one `/query` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    /// Query text
    pub q: String,
    pub u: Option<String>,
    pub p: Option<String>,
    pub db: Option<String>,
}

impl QueryParams {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            u: None,
            p: None,
            db: None,
        }
    }

    /// Encoded pairs; absent credentials and database are omitted
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone())];
        for (key, value) in [("u", &self.u), ("p", &self.p), ("db", &self.db)] {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs.push(("epoch", "ms".to_string()));
        pairs
    }
}

/// Sends requests to an openGemini server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a `/query` request and return the decoded JSON body
    async fn query(&self, method: HttpMethod, params: &QueryParams) -> ClientResult<Value>;

    /// Call `/ping` and return the HTTP status code
    async fn ping(&self) -> ClientResult<u16>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`
    pub fn new(base_url: &str, request_timeout_ms: u64) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(&self, method: HttpMethod, params: &QueryParams) -> ClientResult<Value> {
        let url = format!("{}/query", self.base_url);
        let pairs = params.pairs();

        tracing::debug!(method = method.as_str(), query = %params.q, "Sending query");

        let request = match method {
            HttpMethod::Get => self.client.get(&url).query(&pairs),
            HttpMethod::Post => self.client.post(&url).form(&pairs),
        };
        let response = request.send().await.map_err(ClientError::from_send)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::from_send)?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn ping(&self) -> ClientResult<u16> {
        let url = format!("{}/ping", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        Ok(response.status().as_u16())
    }
}

//! Datasource orchestration
//!
//! Executes editor targets against openGemini:
//!
//! 1. build the query text (or take the raw text)
//! 2. substitute template variables, `$__interval` and `$timeFilter`
//! 3. run every target concurrently and join the frames in target order
//!
//! Also provides metric-find (variable) queries and the connection health check.

mod error;
mod template;
mod time;

pub use error::{DataSourceError, DataSourceResult};
pub use template::{TemplateResolver, TemplateVariables};
pub use time::{time_filter, time_transform, TimeRangeRaw};

use crate::client::{GeminiClient, HttpTransport, Transport};
use crate::config::DatasourceConfig;
use crate::operators::OperatorRegistry;
use crate::query::{build_query, MetaQueryOptions, QueryConfig, TIME_FILTER};
use crate::response::Frame;
use chrono::Utc;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

/// Interval placeholder filled from the request or `min_time_interval`
pub const INTERVAL_VARIABLE: &str = "$__interval";

/// One query request covering several targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQueryRequest {
    pub targets: Vec<QueryConfig>,
    #[serde(default)]
    pub range: TimeRangeRaw,
    /// Value for `$__interval`
    #[serde(default)]
    pub interval: Option<String>,
    /// Request-scoped variables, applied over the datasource's own
    #[serde(default, skip)]
    pub scoped_vars: TemplateVariables,
}

/// Outcome of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
}

impl HealthStatus {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: HealthState::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthState::Error,
            message: message.into(),
        }
    }
}

/// openGemini datasource
pub struct DataSource<T: Transport = HttpTransport> {
    client: GeminiClient<T>,
    registry: OperatorRegistry,
    variables: TemplateVariables,
}

impl DataSource<HttpTransport> {
    /// Create a datasource talking HTTP to the configured server
    pub fn connect(config: DatasourceConfig) -> DataSourceResult<Self> {
        Ok(Self::new(GeminiClient::connect(config)?))
    }
}

impl<T: Transport> DataSource<T> {
    pub fn new(client: GeminiClient<T>) -> Self {
        Self {
            client,
            registry: OperatorRegistry::builtin(),
            variables: TemplateVariables::new(),
        }
    }

    /// Set datasource-wide template variables
    pub fn with_variables(mut self, variables: TemplateVariables) -> Self {
        self.variables = variables;
        self
    }

    pub fn client(&self) -> &GeminiClient<T> {
        &self.client
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Run every target of `request` and return all frames in target order
    pub async fn query(&self, request: &DataQueryRequest) -> DataSourceResult<Vec<Frame>> {
        let time_filter = time_filter(&request.range, Utc::now())?;
        let interval = request
            .interval
            .clone()
            .unwrap_or_else(|| self.client.config().min_time_interval.clone());

        let mut variables = self.variables.clone();
        variables.merge(&request.scoped_vars);

        let runs = request
            .targets
            .iter()
            .map(|target| self.run_target(target, &variables, &interval, &time_filter));
        let frames = try_join_all(runs).await?;

        tracing::debug!(targets = request.targets.len(), "Datasource query complete");
        Ok(frames.into_iter().flatten().collect())
    }

    async fn run_target(
        &self,
        target: &QueryConfig,
        variables: &TemplateVariables,
        interval: &str,
        time_filter: &str,
    ) -> DataSourceResult<Vec<Frame>> {
        let text = build_query(target, &self.registry)?;
        let text = variables.replace(&text);
        if text.trim().is_empty() {
            return Ok(vec![Frame::empty()]);
        }

        let text = text
            .replace(INTERVAL_VARIABLE, interval)
            .replace(TIME_FILTER, time_filter);
        Ok(self.client.query_data(&text, target).await?)
    }

    /// Run a variable query and return its distinct values
    pub async fn metric_find_query(
        &self,
        query: &str,
        scoped_vars: &TemplateVariables,
    ) -> DataSourceResult<Vec<String>> {
        let mut variables = self.variables.clone();
        variables.merge(scoped_vars);
        let text = variables.replace(query);

        let response = self.client.query_raw(&text).await?;
        Ok(crate::query::parse_distinct_values(&text, &response))
    }

    /// Run a metadata query, resolving `$database` through the datasource variables
    pub async fn meta_query(&self, options: &MetaQueryOptions) -> DataSourceResult<Vec<String>> {
        let resolver: &dyn TemplateResolver = &self.variables;
        Ok(self.client.meta_values(options, Some(resolver)).await?)
    }

    /// Check that the server answers and knows the configured database
    pub async fn test_datasource(&self) -> HealthStatus {
        match self.client.ping().await {
            Ok(204) => {}
            Ok(status) => {
                tracing::warn!(status, "Unexpected ping status");
                return HealthStatus::error("Failed to connect to openGemini");
            }
            Err(e) => {
                tracing::warn!("Ping failed: {}", e);
                return HealthStatus::error("Failed to connect to openGemini");
            }
        }

        let databases = match self.client.databases().await {
            Ok(databases) => databases,
            Err(e) => return HealthStatus::error(e.to_string()),
        };

        if databases.contains(&self.client.config().database) {
            HealthStatus::success("Success to connect to openGemini")
        } else {
            HealthStatus::error("database not found")
        }
    }
}

//! openGemini HTTP client
//!
//! [`GeminiClient`] issues InfluxQL statements against `/query` and decodes
//! the results. All network I/O goes through a [`Transport`], so the client
//! can run against a scripted transport in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use gemini_query::client::GeminiClient;
//! use gemini_query::config::DatasourceConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatasourceConfig {
//!     database: "NOAA_water_database".to_string(),
//!     ..Default::default()
//! };
//! let client = GeminiClient::connect(config)?;
//! for measurement in client.show_measurements().await? {
//!     println!("{}", measurement);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod transport;

pub use error::{ClientError, ClientResult};
pub use transport::{HttpMethod, HttpTransport, QueryParams, Transport};

use crate::config::DatasourceConfig;
use crate::datasource::TemplateResolver;
use crate::query::{build_meta_query, parse_distinct_values, MetaQueryOptions, MetadataQueryType, QueryConfig};
use crate::response::{cell_text, map_response, Frame, QueryResponse};
use serde_json::Value;

/// Client for one openGemini datasource
pub struct GeminiClient<T: Transport = HttpTransport> {
    transport: T,
    config: DatasourceConfig,
}

impl GeminiClient<HttpTransport> {
    /// Create a client using HTTP for the configured URL
    pub fn connect(config: DatasourceConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config.url, config.request_timeout_ms)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> GeminiClient<T> {
    pub fn new(transport: T, config: DatasourceConfig) -> Self {
        Self { transport, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &DatasourceConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn params(&self, sql: &str) -> QueryParams {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        QueryParams {
            q: sql.to_string(),
            u: non_empty(&self.config.user),
            p: non_empty(&self.config.password),
            db: non_empty(&self.config.database),
        }
    }

    /// Run `sql` and decode the full response
    pub async fn query_raw(&self, sql: &str) -> ClientResult<QueryResponse> {
        let body = self
            .transport
            .query(self.config.http_method, &self.params(sql))
            .await?;

        if let Some(error) = body.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            tracing::warn!(query = sql, "openGemini rejected query: {}", message);
            return Err(ClientError::RequestFailed(message));
        }

        serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Run `sql` and return the rows of the first series
    pub async fn query_sql(&self, sql: &str) -> ClientResult<Vec<Vec<Value>>> {
        let response = self.query_raw(sql).await?;
        Ok(response
            .first_series()
            .and_then(|series| series.first())
            .map(|s| s.values.clone())
            .unwrap_or_default())
    }

    /// Measurement names in the configured database
    pub async fn show_measurements(&self) -> ClientResult<Vec<String>> {
        Ok(flatten_cells(self.query_sql("SHOW MEASUREMENTS").await?))
    }

    /// Retention policy names, default policy first
    pub async fn retention_policies(&self) -> ClientResult<Vec<String>> {
        let sql = "SHOW RETENTION POLICIES";
        let response = self.query_raw(sql).await?;
        Ok(parse_distinct_values(sql, &response))
    }

    /// Database names on the server
    pub async fn databases(&self) -> ClientResult<Vec<String>> {
        Ok(flatten_cells(self.query_sql("SHOW DATABASES").await?))
    }

    /// Column keys suffixed `::tag` (tag keys first) or `::field`
    pub async fn column_config(
        &self,
        measurement: Option<&str>,
        rp: Option<&str>,
    ) -> ClientResult<Vec<String>> {
        let mut from = String::new();
        if let Some(measurement) = measurement.filter(|m| !m.is_empty()) {
            from.push_str(" FROM ");
            if let Some(rp) = rp.filter(|rp| !rp.is_empty()) {
                from.push_str(rp);
                from.push('.');
            }
            from.push_str(measurement);
        }

        let tags = self.query_sql(&format!("SHOW TAG KEYS{}", from)).await?;
        let fields = self.query_sql(&format!("SHOW FIELD KEYS{}", from)).await?;

        let first_cells = |rows: Vec<Vec<Value>>, suffix: &'static str| {
            rows.into_iter()
                .filter_map(move |row| row.first().and_then(cell_text))
                .map(move |key| format!("{}::{}", key, suffix))
        };
        Ok(first_cells(tags, "tag")
            .chain(first_cells(fields, "field"))
            .collect())
    }

    /// Run a metadata query and parse its distinct values
    pub async fn meta_values(
        &self,
        options: &MetaQueryOptions,
        resolver: Option<&dyn TemplateResolver>,
    ) -> ClientResult<Vec<String>> {
        let sql = build_meta_query(options, resolver);
        let response = self.query_raw(&sql).await?;
        Ok(parse_distinct_values(&sql, &response))
    }

    /// Tag keys of `measurement`
    pub async fn tag_keys(
        &self,
        measurement: &str,
        rp: &str,
        database: &str,
    ) -> ClientResult<Vec<String>> {
        let options = meta_options(MetadataQueryType::TagKeys, measurement, rp, database);
        self.meta_values(&options, None).await
    }

    /// Field keys of `measurement`
    pub async fn field_keys(
        &self,
        measurement: &str,
        rp: &str,
        database: &str,
    ) -> ClientResult<Vec<String>> {
        let options = meta_options(MetadataQueryType::FieldKeys, measurement, rp, database);
        self.meta_values(&options, None).await
    }

    /// Run `sql` and map the result into frames for `target`
    pub async fn query_data(&self, sql: &str, target: &QueryConfig) -> ClientResult<Vec<Frame>> {
        let response = self.query_raw(sql).await?;
        Ok(map_response(&response, target))
    }

    /// HTTP status of `/ping`
    pub async fn ping(&self) -> ClientResult<u16> {
        self.transport.ping().await
    }
}

fn meta_options(
    query_type: MetadataQueryType,
    measurement: &str,
    rp: &str,
    database: &str,
) -> MetaQueryOptions {
    MetaQueryOptions::new(query_type)
        .database(database)
        .measurement(measurement)
        .rp(rp)
}

fn flatten_cells(rows: Vec<Vec<Value>>) -> Vec<String> {
    rows.iter().flatten().filter_map(cell_text).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for tests

    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers queries from a map keyed by query text and records every request
    #[derive(Default)]
    pub struct FakeTransport {
        responses: HashMap<String, Value>,
        pub ping_status: u16,
        pub requests: Mutex<Vec<(HttpMethod, QueryParams)>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self {
                ping_status: 204,
                ..Default::default()
            }
        }

        /// Answer `q` with `body`
        pub fn respond(mut self, q: &str, body: Value) -> Self {
            self.responses.insert(q.to_string(), body);
            self
        }

        /// Answer `q` with a single series holding `values`
        pub fn respond_rows(self, q: &str, columns: &[&str], values: Value) -> Self {
            self.respond(
                q,
                json!({"results": [{"statement_id": 0, "series": [{
                    "name": "results",
                    "columns": columns,
                    "values": values
                }]}]}),
            )
        }

        pub fn queries(&self) -> Vec<String> {
            self.requests
                .lock()
                .map(|r| r.iter().map(|(_, p)| p.q.clone()).collect())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn query(&self, method: HttpMethod, params: &QueryParams) -> ClientResult<Value> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((method, params.clone()));
            }
            Ok(self
                .responses
                .get(&params.q)
                .cloned()
                .unwrap_or_else(|| json!({"results": [{"statement_id": 0}]})))
        }

        async fn ping(&self) -> ClientResult<u16> {
            Ok(self.ping_status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use crate::query::ResultFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> DatasourceConfig {
        DatasourceConfig {
            database: "monitor".to_string(),
            user: "admin".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_query_params_from_config() {
        let client = GeminiClient::new(FakeTransport::new(), config());
        client.query_raw("SHOW MEASUREMENTS").await.unwrap();

        let requests = client.transport().requests.lock().unwrap();
        let (method, params) = &requests[0];
        assert_eq!(*method, HttpMethod::Post);
        assert_eq!(params.u.as_deref(), Some("admin"));
        assert_eq!(params.p, None);
        assert_eq!(params.db.as_deref(), Some("monitor"));
    }

    #[tokio::test]
    async fn test_error_key_fails_request() {
        let transport = FakeTransport::new().respond("SELECT bogus", json!({"error": "error parsing query"}));
        let client = GeminiClient::new(transport, config());

        match client.query_raw("SELECT bogus").await {
            Err(ClientError::RequestFailed(message)) => assert_eq!(message, "error parsing query"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_sql_first_series_rows() {
        let transport = FakeTransport::new().respond_rows(
            "SHOW MEASUREMENTS",
            &["name"],
            json!([["h2o_feet"], ["h2o_pH"]]),
        );
        let client = GeminiClient::new(transport, config());

        assert_eq!(
            client.query_sql("SHOW MEASUREMENTS").await.unwrap(),
            vec![vec![json!("h2o_feet")], vec![json!("h2o_pH")]]
        );
        assert_eq!(client.show_measurements().await.unwrap(), vec!["h2o_feet", "h2o_pH"]);
        assert!(client.query_sql("SHOW DATABASES").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retention_policies_default_first() {
        let transport = FakeTransport::new().respond_rows(
            "SHOW RETENTION POLICIES",
            &["name", "duration", "shardGroupDuration", "replicaN", "default"],
            json!([["rp_7d", "168h0m0s", "24h0m0s", 1, false], ["autogen", "0s", "168h0m0s", 1, true]]),
        );
        let client = GeminiClient::new(transport, config());
        assert_eq!(client.retention_policies().await.unwrap(), vec!["autogen", "rp_7d"]);
    }

    #[tokio::test]
    async fn test_column_config() {
        let transport = FakeTransport::new()
            .respond_rows("SHOW TAG KEYS FROM autogen.h2o_pH", &["tagKey"], json!([["location"]]))
            .respond_rows(
                "SHOW FIELD KEYS FROM autogen.h2o_pH",
                &["fieldKey", "fieldType"],
                json!([["pH", "float"]]),
            );
        let client = GeminiClient::new(transport, config());

        let columns = client.column_config(Some("h2o_pH"), Some("autogen")).await.unwrap();
        assert_eq!(columns, vec!["location::tag", "pH::field"]);

        client.column_config(None, Some("autogen")).await.unwrap();
        let queries = client.transport().queries();
        assert_eq!(&queries[2..], &["SHOW TAG KEYS".to_string(), "SHOW FIELD KEYS".to_string()]);
    }

    #[tokio::test]
    async fn test_field_keys_via_meta_query() {
        let transport = FakeTransport::new().respond_rows(
            "SHOW FIELD KEYS on monitor FROM \"autogen\".\"h2o_pH\"",
            &["fieldKey", "fieldType"],
            json!([["pH", "float"], ["level description", "string"]]),
        );
        let client = GeminiClient::new(transport, config());

        let keys = client.field_keys("h2o_pH", "autogen", "monitor").await.unwrap();
        assert_eq!(keys, vec!["pH", "level description"]);
    }

    #[tokio::test]
    async fn test_query_raw_keeps_tag_order() {
        let transport = FakeTransport::new().respond(
            "SELECT mean(\"pH\") FROM h2o GROUP BY *",
            json!({"results": [{"statement_id": 0, "series": [{
                "name": "h2o",
                "tags": {"location": "coyote_creek", "depth": "shallow", "area": "north"},
                "columns": ["time", "mean"],
                "values": [[1, 7.5]]
            }]}]}),
        );
        let client = GeminiClient::new(transport, config());

        let response = client.query_raw("SELECT mean(\"pH\") FROM h2o GROUP BY *").await.unwrap();
        let series = &response.first_series().unwrap()[0];
        let keys: Vec<&str> = series.tag_set().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["location", "depth", "area"]);

        let target = QueryConfig::default().format(ResultFormat::Table);
        let frames = client
            .query_data("SELECT mean(\"pH\") FROM h2o GROUP BY *", &target)
            .await
            .unwrap();
        let names: Vec<&str> = frames[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Time", "location", "depth", "area", "mean"]);
    }

    #[tokio::test]
    async fn test_query_data_maps_frames() {
        let transport = FakeTransport::new().respond(
            "SELECT * FROM h2o",
            json!({"results": [{"statement_id": 0, "series": [{
                "name": "h2o",
                "columns": ["time", "level"],
                "values": [[1, 2.5]]
            }]}]}),
        );
        let client = GeminiClient::new(transport, config());
        let target = QueryConfig::default().format(ResultFormat::Table);

        let frames = client.query_data("SELECT * FROM h2o", &target).await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].fields[1].name, "level");
    }

    #[tokio::test]
    async fn test_ping() {
        let mut transport = FakeTransport::new();
        transport.ping_status = 500;
        let client = GeminiClient::new(transport, config());
        assert_eq!(client.ping().await.unwrap(), 500);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::queries::CatalogQuery;
use super::{CatalogRecord, RowSource};
use crate::error::{DumpError, QueryFailure};

/// Path of the SQL-executing RPC under a project URL.
const SQL_RPC_PATH: &str = "rest/v1/rpc/sql";

/// Catalog access through an HTTP endpoint that runs SQL and answers with a
/// JSON array of row objects. Used when no direct database connection is
/// available.
pub struct RemoteSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    service_key: String,
}

impl RemoteSource {
    pub fn new(
        project_url: &str,
        api_key: &str,
        service_key: Option<&str>,
        request_timeout: Duration,
    ) -> Result<Self, DumpError> {
        let endpoint = rpc_endpoint(project_url)?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DumpError::Connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(RemoteSource {
            client,
            endpoint,
            api_key: api_key.to_string(),
            service_key: service_key.unwrap_or(api_key).to_string(),
        })
    }
}

#[async_trait]
impl RowSource for RemoteSource {
    fn describe(&self) -> String {
        format!("{} (query endpoint)", self.endpoint.origin().ascii_serialization())
    }

    async fn fetch<T: CatalogRecord>(
        &self,
        query: &CatalogQuery,
        params: &[&str],
    ) -> Result<Vec<T>, QueryFailure> {
        let sql = inline_params(query.sql, params);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "query": sql }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(endpoint_failure(status, body));
        }

        let body: Value = response.json().await?;
        decode_rows(body)
    }
}

/// A non-2xx reply is a failed query, never an empty row set.
fn endpoint_failure(status: StatusCode, body: String) -> QueryFailure {
    QueryFailure::Endpoint {
        status: status.as_u16(),
        body,
    }
}

fn rpc_endpoint(project_url: &str) -> Result<Url, DumpError> {
    let base = project_url.trim_end_matches('/');
    Url::parse(&format!("{base}/{SQL_RPC_PATH}"))
        .map_err(|e| DumpError::Connection(format!("Invalid query endpoint URL: {e}")))
}

/// Substitute `$n` placeholders with quoted SQL literals.
///
/// The SQL is scanned once, so text inserted for one placeholder is never
/// searched again. A `$n` without a matching parameter is left as is.
pub fn inline_params(sql: &str, params: &[&str]) -> String {
    let mut rendered = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rendered.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        let param = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| params.get(idx));
        match param {
            Some(value) => rendered.push_str(&quote_literal(value)),
            None => rendered.push_str(&rest[pos..pos + 1 + digits]),
        }
        rest = &after[digits..];
    }
    rendered.push_str(rest);
    rendered
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// The endpoint answers `null` for a query with no rows.
pub fn decode_rows<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, QueryFailure> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(QueryFailure::from))
            .collect(),
        other => Err(QueryFailure::Decode(serde::de::Error::custom(format!(
            "expected an array of rows, got {other}"
        )))),
    }
}

//! REST client for the hosted backend.
//!
//! Speaks the PostgREST dialect: rows live under `{apiUrl}/rest/v1/{table}`,
//! filters are `column=eq.value`, ordering is `order=column.desc.nullslast`,
//! and counts come back in the `Content-Range` header of a `HEAD` request
//! sent with `Prefer: count=exact`.

use async_trait::async_trait;
use url::Url;

use super::{EqFilter, Query, RemoteCollection, Row, Table};
use crate::config::Config;
use crate::error::FetchError;

const REST_PREFIX: &str = "rest/v1";

pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn table_url(&self, table: Table, params: &[(String, String)]) -> Result<Url, FetchError> {
        let raw = format!("{}/{}/{}", self.base_url, REST_PREFIX, table.as_str());
        Url::parse_with_params(&raw, params)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            req = req
                .header("apikey", key.clone())
                .header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    async fn fetch_rows(&self, query: &Query) -> Result<Vec<Row>, FetchError> {
        let url = self.table_url(query.table, &query_params(query))?;
        let resp = self.request(reqwest::Method::GET, url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        match json {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(row) => Ok(row),
                    other => Err(FetchError::InvalidResponse(format!(
                        "expected row object, got {}",
                        other
                    ))),
                })
                .collect(),
            other => Err(FetchError::InvalidResponse(format!(
                "expected array of rows from {}, got {}",
                query.table, other
            ))),
        }
    }

    async fn fetch_count(&self, table: Table, filter: Option<&EqFilter>) -> Result<u64, FetchError> {
        let url = self.table_url(table, &count_params(filter))?;
        let resp = self
            .request(reqwest::Method::HEAD, url)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
                body: String::new(),
            });
        }

        let header = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                FetchError::InvalidResponse(format!("count for {} lacks Content-Range", table))
            })?;
        parse_content_range(header)
    }
}

#[async_trait]
impl RemoteCollection for RestBackend {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, FetchError> {
        self.fetch_rows(query).await
    }

    async fn count(&self, table: Table, filter: Option<&EqFilter>) -> Result<u64, FetchError> {
        self.fetch_count(table, filter).await
    }
}

/// URL parameters for a row query.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.selection.as_select().to_string())];
    if let Some(filter) = &query.filter {
        params.push(eq_param(filter));
    }
    if let Some(order) = &query.order {
        params.push(("order".to_string(), format!("{}.desc.nullslast", order.field)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// URL parameters for a count-only query.
pub fn count_params(filter: Option<&EqFilter>) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "id".to_string())];
    if let Some(filter) = filter {
        params.push(eq_param(filter));
    }
    params
}

fn eq_param(filter: &EqFilter) -> (String, String) {
    (filter.field.clone(), format!("eq.{}", filter.value))
}

/// Parse the total out of a `Content-Range` header (`0-24/156`, `*/0`).
pub fn parse_content_range(header: &str) -> Result<u64, FetchError> {
    let total = header
        .rsplit_once('/')
        .map(|(_, total)| total.trim())
        .ok_or_else(|| FetchError::InvalidResponse(format!("malformed Content-Range: {}", header)))?;

    total
        .parse::<u64>()
        .map_err(|_| FetchError::InvalidResponse(format!("Content-Range without exact total: {}", header)))
}

// API module: the two ways the tool talks to Purview. `QueryHelper` issues a
// single authenticated GET and never fails to its caller; `CatalogClient`
// covers the search and entity surface and propagates errors.

use crate::auth::Credential;
use crate::error::{CatalogError, QueryError};
use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

pub const SCAN_API_VERSION: &str = "2023-09-01";
pub const SEARCH_API_VERSION: &str = "2022-03-01-preview";
/// Upper bound on search hits; results beyond it are not paged in.
pub const SEARCH_LIMIT: u32 = 1000;

/// Blocking GET helper shared by every report that reads raw REST endpoints.
#[derive(Clone)]
pub struct QueryHelper {
    client: Client,
}

impl QueryHelper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client, shared with `CatalogClient`.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` with `headers`. Only a 200 counts as success.
    pub fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<Value, QueryError> {
        tracing::debug!(%url, "GET");
        let res = self.client.get(url).headers(headers.clone()).send()?;
        match res.status() {
            StatusCode::OK => Ok(res.json::<Value>()?),
            StatusCode::NOT_FOUND => Err(QueryError::NotFound),
            status => {
                let body = res.text().unwrap_or_default();
                Err(QueryError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Like `fetch`, but any failure is written to `out` as a diagnostic and
    /// turned into `None`.
    pub fn get(&self, url: &str, headers: &HeaderMap, out: &mut dyn Write) -> Option<Value> {
        match self.fetch(url, headers) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%url, error = ?e, "query failed");
                let _ = writeln!(out, "{}", e);
                None
            }
        }
    }
}

/// Body of a discovery query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub keywords: String,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl SearchRequest {
    pub fn keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            limit: SEARCH_LIMIT,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Catalog search/entity client bound to one endpoint and credential.
pub struct CatalogClient {
    client: Client,
    endpoint: String,
    credential: Credential,
}

impl CatalogClient {
    pub fn new(client: Client, endpoint: &str, credential: Credential) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// Run a discovery query; the hits are under `value`.
    pub fn search(&self, request: &SearchRequest) -> Result<Value, CatalogError> {
        let url = format!(
            "{}/catalog/api/search/query?api-version={}",
            self.endpoint, SEARCH_API_VERSION
        );
        tracing::debug!(%url, keywords = %request.keywords, "POST search");
        let res = self
            .client
            .post(&url)
            .bearer_auth(self.credential.token())
            .json(request)
            .send()?;
        Self::into_json(res)
    }

    /// Fetch an entity with its referred entities by GUID.
    pub fn entity_by_guid(&self, guid: &str) -> Result<Value, CatalogError> {
        let url = format!("{}/catalog/api/atlas/v2/entity/guid/{}", self.endpoint, guid);
        tracing::debug!(%url, "GET entity");
        let res = self
            .client
            .get(&url)
            .bearer_auth(self.credential.token())
            .send()?;
        Self::into_json(res)
    }

    fn into_json(res: Response) -> Result<Value, CatalogError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "catalog request failed");
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json::<Value>()?)
    }
}

//! HTTP client for the remote data catalog.
//!
//! Implements the core `CatalogApi` seam over the catalog's REST surface:
//! collection listing, discovery search (paginated), entity fetch by guid,
//! and the create-or-update upsert. Transient failures (5xx, 429, network
//! timeouts) are retried with exponential backoff; everything else maps to
//! a typed error.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use serde_json::Value;

use metasync_core::catalog::{CatalogApi, CatalogError, CollectionInfo, EntitySummary};
use metasync_core::entity::EntityEnvelope;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{ApiError, CollectionList, SearchRequest, SearchResults};

/// Page size used when exhausting discovery results.
const SEARCH_PAGE_SIZE: usize = 50;

/// Catalog HTTP client with automatic retries.
pub struct CatalogClient {
    http: ClientWithMiddleware,
    config: ClientConfig,
}

impl CatalogClient {
    /// Create a new client builder with the given endpoint.
    pub fn builder(endpoint: impl Into<String>) -> crate::config::ClientConfigBuilder {
        crate::config::ClientConfigBuilder::new(endpoint)
    }

    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("metasync-client")),
        );

        if let Some(ref token) = config.token {
            let auth_value = format!("Bearer {}", token);
            let mut value = HeaderValue::from_str(&auth_value)
                .map_err(|_| ClientError::Config("Invalid token format".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(config.retry_initial_delay, config.retry_max_delay)
            .build_with_max_retries(config.max_retries);

        let http = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                CatalogRetryStrategy,
            ))
            .build();

        Ok(Self { http, config })
    }

    /// Get the endpoint base URL.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// List every collection visible to the caller's credentials.
    pub async fn list_collections(&self) -> Result<Vec<crate::types::CollectionRecord>> {
        let response: CollectionList = self.get("/api/collections").await?;
        Ok(response.value)
    }

    /// Run a match-all discovery query for one collection, exhausting every
    /// page before returning.
    pub async fn search_by_collection(
        &self,
        collection_id: &str,
    ) -> Result<Vec<crate::types::SearchHit>> {
        let mut hits = Vec::new();
        let mut offset = 0;
        loop {
            let request =
                SearchRequest::match_all_in_collection(collection_id, SEARCH_PAGE_SIZE, offset);
            let page: SearchResults = self.post("/api/search/query", &request).await?;
            let page_len = page.value.len();
            hits.extend(page.value);
            if page_len < SEARCH_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }
        Ok(hits)
    }

    /// Fetch a full entity (attributes plus referred entities) by guid.
    pub async fn get_entity_by_guid(&self, guid: &str) -> Result<EntityEnvelope> {
        let path = format!("/api/atlas/v2/entity/guid/{}", urlencoding::encode(guid));
        self.get(&path).await
    }

    /// Idempotent upsert of a full entity payload.
    pub async fn create_or_update(&self, payload: &Value) -> Result<()> {
        let _: Value = self.post("/api/atlas/v2/entity", payload).await?;
        Ok(())
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.config.endpoint.trim_end_matches('/'), path);
        let start = std::time::Instant::now();

        tracing::debug!(method = %method, path = %path, "sending request");

        let request = if let Some(body) = body {
            let json_body = serde_json::to_vec(body)?;
            self.http.request(method.clone(), &url).body(json_body)
        } else {
            self.http.request(method.clone(), &url)
        };

        let response = request.send().await?;
        let status = response.status();
        let duration = start.elapsed();

        tracing::debug!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "received response"
        );

        if status.is_success() {
            let bytes = response.bytes().await?;
            serde_json::from_slice(&bytes).map_err(|e| {
                ClientError::InvalidResponse(format!(
                    "Failed to parse response: {} (body: {})",
                    e,
                    String::from_utf8_lossy(&bytes)
                ))
            })
        } else {
            let body = response.bytes().await.ok();
            let api_error: Option<ApiError> =
                body.as_ref().and_then(|b| serde_json::from_slice(b).ok());
            let message = api_error
                .map(|e| e.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    body.map(|b| String::from_utf8_lossy(&b).to_string())
                        .filter(|b| !b.is_empty())
                        .unwrap_or_else(|| status.to_string())
                });

            tracing::warn!(
                method = %method,
                path = %path,
                status = %status.as_u16(),
                error = %message,
                "request failed"
            );

            Err(Self::status_to_error(status, message))
        }
    }

    fn status_to_error(status: StatusCode, message: String) -> ClientError {
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited(message),
            s => ClientError::ServerError {
                status: s.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list_collections(&self) -> std::result::Result<Vec<CollectionInfo>, CatalogError> {
        let records = CatalogClient::list_collections(self).await?;
        Ok(records
            .into_iter()
            .map(|c| CollectionInfo {
                name: c.name,
                friendly_name: c.friendly_name,
            })
            .collect())
    }

    async fn search_by_collection(
        &self,
        collection_id: &str,
    ) -> std::result::Result<Vec<EntitySummary>, CatalogError> {
        let hits = CatalogClient::search_by_collection(self, collection_id).await?;
        Ok(hits
            .into_iter()
            .map(|h| EntitySummary {
                id: h.id,
                name: h.name,
                qualified_name: h.qualified_name,
            })
            .collect())
    }

    async fn get_entity_by_guid(
        &self,
        guid: &str,
    ) -> std::result::Result<EntityEnvelope, CatalogError> {
        Ok(CatalogClient::get_entity_by_guid(self, guid).await?)
    }

    async fn create_or_update(&self, payload: &Value) -> std::result::Result<(), CatalogError> {
        Ok(CatalogClient::create_or_update(self, payload).await?)
    }
}

/// Retry strategy for the catalog API.
///
/// Retries transient network errors, 5xx responses, and 429 rate limiting.
/// Other client errors are fatal: the upsert is idempotent, so retrying a
/// 4xx would only repeat the same rejection.
struct CatalogRetryStrategy;

impl RetryableStrategy for CatalogRetryStrategy {
    fn handle(&self, res: &reqwest_middleware::Result<reqwest::Response>) -> Option<Retryable> {
        match res {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    Some(Retryable::Transient)
                } else if status.is_success() {
                    None
                } else {
                    Some(Retryable::Fatal)
                }
            }
            Err(error) => {
                if error.is_timeout() || error.is_connect() {
                    Some(Retryable::Transient)
                } else {
                    Some(Retryable::Fatal)
                }
            }
        }
    }
}

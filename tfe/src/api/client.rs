use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::common::{ApiQueryParams, ErrorDocument, ErrorObject, ListDocument, ListOptions, ResourceObject};
use super::error::ApiError;

const JSON_API: &str = "application/vnd.api+json";

/// Default HCP Terraform hostname
pub const DEFAULT_HOSTNAME: &str = "app.terraform.io";

/// HCP Terraform / Terraform Enterprise API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
    retry_config: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

/// Version information reported by the remote instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteMetadata {
    /// `TFP-API-Version` header
    pub api_version: Option<String>,
    /// `X-TFE-Version` header; absent on HCP Terraform
    pub tfe_version: Option<String>,
}

impl RemoteMetadata {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        };
        Self {
            api_version: header("TFP-API-Version"),
            tfe_version: header("X-TFE-Version"),
        }
    }

    pub fn is_hcp_terraform(&self) -> bool {
        self.tfe_version.is_none()
    }
}

/// `https://{hostname}/api/v2`, or `{hostname}/api/v2` when a scheme is given
pub fn base_url(hostname: &str) -> Result<String, ApiError> {
    let hostname = hostname.trim().trim_end_matches('/');
    if hostname.is_empty() {
        return Err(ApiError::InvalidUrl("hostname is empty".to_string()));
    }

    let address = if hostname.starts_with("http://") || hostname.starts_with("https://") {
        hostname.to_string()
    } else {
        format!("https://{}", hostname)
    };

    let parsed = url::Url::parse(&address).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", address, e)))?;
    if parsed.host_str().is_none() {
        return Err(ApiError::InvalidUrl(address));
    }

    Ok(format!("{}/api/v2", parsed.as_str().trim_end_matches('/')))
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(hostname: &str, token: &str, ssl_skip_verify: bool) -> Result<Self, ApiError> {
        Self::with_config(hostname, token, ssl_skip_verify, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        hostname: &str,
        token: &str,
        ssl_skip_verify: bool,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(ssl_skip_verify)
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("terraform-provider-tfe-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url(hostname)?,
                auth_header: format!("Bearer {}", token),
                retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Scheme and host without the API prefix, used to build web URLs
    pub fn address(&self) -> &str {
        self.inner
            .base_url
            .strip_suffix("/api/v2")
            .unwrap_or(&self.inner.base_url)
    }

    /// Fetch remote version headers
    pub async fn ping(&self) -> Result<RemoteMetadata, ApiError> {
        let response = self
            .execute_with_retry(|| self.request(reqwest::Method::GET, "/ping"), "/ping")
            .await?;
        let metadata = RemoteMetadata::from_headers(response.headers());
        tracing::debug!(
            api_version = ?metadata.api_version,
            tfe_version = ?metadata.tfe_version,
            "Remote metadata"
        );
        Ok(metadata)
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .execute_with_retry(|| self.request(reqwest::Method::GET, path), path)
            .await?;
        self.parse_success_response(response).await
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(&full_path).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute_with_retry(
                || self.request(reqwest::Method::POST, path).json(body),
                path,
            )
            .await?;
        self.parse_success_response(response).await
    }

    /// POST where the response body is ignored (204 or action endpoints)
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.execute_with_retry(
            || self.request(reqwest::Method::POST, path).json(body),
            path,
        )
        .await
        .map(|_| ())
    }

    /// Execute a PATCH request with retry logic
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute_with_retry(
                || self.request(reqwest::Method::PATCH, path).json(body),
                path,
            )
            .await?;
        self.parse_success_response(response).await
    }

    /// PATCH where the response body is ignored
    pub async fn patch_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.execute_with_retry(
            || self.request(reqwest::Method::PATCH, path).json(body),
            path,
        )
        .await
        .map(|_| ())
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute_with_retry(|| self.request(reqwest::Method::DELETE, path), path)
            .await
            .map(|_| ())
    }

    /// DELETE with a JSON:API body, used by relationship endpoints
    pub async fn delete_with_body<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.execute_with_retry(
            || self.request(reqwest::Method::DELETE, path).json(body),
            path,
        )
        .await
        .map(|_| ())
    }

    /// Walk every page of a collection endpoint
    pub async fn list_all<A: DeserializeOwned>(
        &self,
        path: &str,
        options: ListOptions,
    ) -> Result<Vec<ResourceObject<A>>, ApiError> {
        let mut options = options;
        let mut items = Vec::new();

        loop {
            let page: ListDocument<ResourceObject<A>> = self
                .get_with_params(path, &options.to_query_params())
                .await?;
            let fetched = page.data.len();
            items.extend(page.data);

            let next = page
                .meta
                .and_then(|meta| meta.pagination)
                .and_then(|pagination| pagination.next_page);
            match next {
                Some(next) if fetched > 0 && next > options.page_number => {
                    options.page_number = next;
                }
                _ => break,
            }
        }

        Ok(items)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        self.inner
            .http_client
            .request(method, url)
            .header(AUTHORIZATION, &self.inner.auth_header)
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API)
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F>(&self, request_fn: F, path: &str) -> Result<reqwest::Response, ApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ApiError::Unauthorized);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        tracing::debug!("{} returned 404", path);
                        return Err(ApiError::NotFound);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        tracing::warn!("Rate limited on {}", path);
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        tracing::warn!("Server error {} on {}", status, path);
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(self.handle_error_response(response).await);
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::Request(e));
                    } else {
                        return Err(ApiError::Request(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;

        serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}", e);
            ApiError::Parse(format!("Failed to parse response: {}", e))
        })
    }

    /// Turn a 4xx body into an error carrying the JSON:API messages
    async fn handle_error_response(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let messages = match serde_json::from_str::<ErrorDocument>(&text) {
            Ok(doc) if !doc.errors.is_empty() => {
                doc.errors.iter().map(ErrorObject::message).collect()
            }
            _ if text.trim().is_empty() => vec![format!("HTTP {}", status)],
            _ => vec![text],
        };

        tracing::debug!(status, ?messages, "API error response");
        ApiError::Api { status, messages }
    }
}

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{PipeLensError, Result};

const MAX_RETRIES: u32 = 5;
const RETRY_DELAY_SECONDS: u64 = 2;
const MAX_CONCURRENT_REQUESTS: usize = 16;
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";
pub(super) const DEFAULT_API_VERSION: &str = "7.1";

pub struct AzureDevOpsClient {
    client: Client,
    base_url: String,
    organization: String,
    organization_url: Url,
    api_version: String,
    token: Option<Token>,
    semaphore: Arc<Semaphore>,
}

impl AzureDevOpsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid.
    pub fn new(
        base_url: &str,
        organization: &str,
        token: Option<Token>,
        api_version: Option<&str>,
    ) -> Result<Self> {
        if organization.trim().is_empty() {
            return Err(PipeLensError::Config("Organization must not be empty".into()));
        }

        let client = Client::builder()
            .user_agent(concat!("PipeLens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipeLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let organization_url = Url::parse(&format!(
            "{base_url}/{}/",
            urlencoding::encode(organization.trim())
        ))
        .map_err(|e| PipeLensError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            organization: organization.trim().to_string(),
            organization_url,
            api_version: api_version.unwrap_or(DEFAULT_API_VERSION).to_string(),
            token,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Personal access tokens go in as basic auth with an empty user name.
    pub fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.basic_auth("", Some(token.as_str()))
        } else {
            request
        }
    }

    /// `{org}/{project}/_apis/{path}?api-version=...`
    pub(super) fn api_url(&self, project: &str, path: &str) -> Result<Url> {
        let mut url = self
            .organization_url
            .join(&format!("{}/_apis/{path}", urlencoding::encode(project)))
            .map_err(|e| PipeLensError::Config(format!("Invalid API URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    pub(super) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(&url, "application/json").await?;
        Ok(response.json().await?)
    }

    /// Fetches one page and the continuation token for the next one, if any.
    pub(super) async fn get_json_page<T>(&self, url: Url) -> Result<(T, Option<String>)>
    where
        T: DeserializeOwned,
    {
        let response = self.send(&url, "application/json").await?;
        let continuation = response
            .headers()
            .get(CONTINUATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(ToString::to_string);
        Ok((response.json().await?, continuation))
    }

    pub(super) async fn get_text(&self, url: Url) -> Result<String> {
        let response = self.send(&url, "text/plain").await?;
        Ok(response.text().await?)
    }

    /// Sends a GET with retries on network errors, rate limits and server errors.
    async fn send(&self, url: &Url, accept: &'static str) -> Result<Response> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| PipeLensError::Api(format!("Request limiter closed: {e}")))?;

        let mut retry_count = 0;
        loop {
            debug!("GET {url}");
            let request = self.auth_request(
                self.client
                    .get(url.clone())
                    .header(ACCEPT, HeaderValue::from_static(accept)),
            );

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    if retry_count >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({e}), retrying in {RETRY_DELAY_SECONDS}s ({}/{MAX_RETRIES})...",
                        retry_count + 1
                    );
                    tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(PipeLensError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: MAX_RETRIES,
                    });
                }
                let delay = retry_after(&response).unwrap_or(RETRY_DELAY_SECONDS);
                warn!(
                    "Azure DevOps API error (status {status}). Waiting {delay} seconds before retry {}/{MAX_RETRIES}...",
                    retry_count + 1
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(PipeLensError::ApiError {
                    status: status.as_u16(),
                    message: error_message(&message),
                });
            }

            return Ok(response);
        }
    }
}

fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Azure DevOps wraps errors as `{"message": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(ToString::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

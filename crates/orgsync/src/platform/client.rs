//! HTTP implementation of [`PlatformApi`].

use async_trait::async_trait;
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::auth::{fetch_token, Credentials};
use super::error::ApiError;
use super::operation::Operation;
use super::types::{ListResponse, Page, RemoteApplication, RemoteComponent, RemoteMember, RemoteTeam};
use super::write::{classify, log_outcome, WriteOutcome};
use super::PlatformApi;

pub const DEFAULT_BASE_URL: &str = "https://api.demo.appsecphx.io";

/// Default connect timeout for platform requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for platform requests (60 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection and pacing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Pause after every write the platform applied.
    pub write_delay: Duration,
    pub auth_attempts: u32,
    pub auth_retry_delay: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            write_delay: Duration::from_secs(2),
            auth_attempts: 3,
            auth_retry_delay: Duration::from_secs(2),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }
}

/// Authenticated platform client. One request at a time.
pub struct PlatformClient {
    http: Client,
    base_url: String,
    token: SecretString,
    write_delay: Duration,
}

impl PlatformClient {
    /// Builds the HTTP client and obtains a bearer token.
    pub async fn connect(config: ClientConfig, credentials: &Credentials) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        let base_url = config.normalized_base_url();
        let token = fetch_token(
            &http,
            &base_url,
            credentials,
            config.auth_attempts,
            config.auth_retry_delay,
        )
        .await?;

        log::info!("Authenticated against {}", base_url);

        Ok(Self {
            http,
            base_url,
            token,
            write_delay: config.write_delay,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        page: Option<u32>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http
            .get(self.url(path))
            .bearer_auth(self.token.expose_secret());
        if let Some(page) = page {
            request = request.query(&[("pageNumber", page)]);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport {
            method: Method::GET.to_string(),
            path: path.to_string(),
            source: e,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            method: Method::GET.to_string(),
            path: path.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            return Err(ApiError::Fatal {
                method: Method::GET.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            method: Method::GET.to_string(),
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Reads every page of a paginated list endpoint.
    async fn get_all_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let first: Page<T> = self.get_json(path, None).await?;
        let total_pages = first.total_pages.unwrap_or(1);
        let mut items = first.content;

        for page in 1..total_pages {
            let next: Page<T> = self.get_json(path, Some(page)).await?;
            items.extend(next.content);
        }

        log::debug!("GET {}: {} items over {} pages", path, items.len(), total_pages);
        Ok(items)
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn teams(&self) -> Result<Vec<RemoteTeam>, ApiError> {
        let teams: ListResponse<RemoteTeam> = self.get_json("/v1/teams", None).await?;
        Ok(teams.into_items())
    }

    async fn team_members(&self, team_id: &str) -> Result<Vec<RemoteMember>, ApiError> {
        let members: ListResponse<RemoteMember> = self
            .get_json(&format!("/v1/teams/{}/users", team_id), None)
            .await?;
        Ok(members.into_items())
    }

    async fn applications(&self) -> Result<Vec<RemoteApplication>, ApiError> {
        self.get_all_pages("/v1/applications").await
    }

    async fn components(&self) -> Result<Vec<RemoteComponent>, ApiError> {
        self.get_all_pages("/v1/components").await
    }

    async fn execute(&self, operation: &Operation) -> Result<WriteOutcome, ApiError> {
        let request = operation.request();

        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .bearer_auth(self.token.expose_secret());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::Transport {
            method: request.method.to_string(),
            path: request.path.clone(),
            source: e,
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            method: request.method.to_string(),
            path: request.path.clone(),
            source: e,
        })?;

        let outcome = match classify(operation, status, &body) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("{} failed: {}", operation, e);
                return Err(e);
            }
        };
        log_outcome(operation, &outcome);

        if outcome.is_applied() && !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        Ok(outcome)
    }
}

//! Bearer-token acquisition.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::error::ApiError;
use super::types::TokenResponse;

pub const ACCESS_TOKEN_PATH: &str = "/v1/auth/access_token";

/// API client id and secret.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Exchanges client credentials for a bearer token, retrying with a fixed delay.
pub async fn fetch_token(
    client: &Client,
    base_url: &str,
    credentials: &Credentials,
    attempts: u32,
    retry_delay: Duration,
) -> Result<SecretString, ApiError> {
    let url = format!("{}{}", base_url, ACCESS_TOKEN_PATH);
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    log::info!("Requesting access token from {}", url);

    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(retry_delay).await;
        }

        match request_token(client, &url, credentials).await {
            Ok(token) => return Ok(token),
            Err(message) => {
                log::warn!(
                    "Error obtaining token (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    message
                );
                last_error = message;
            }
        }
    }

    Err(ApiError::AuthExhausted {
        attempts,
        message: last_error,
    })
}

async fn request_token(
    client: &Client,
    url: &str,
    credentials: &Credentials,
) -> Result<SecretString, String> {
    let response = client
        .get(url)
        .basic_auth(
            &credentials.client_id,
            Some(credentials.client_secret.expose_secret()),
        )
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {}: {}", status.as_u16(), body));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| format!("invalid token response: {}", e))?;

    if token.token.is_empty() {
        return Err("empty token in response".to_string());
    }
    Ok(SecretString::from(token.token))
}

// Token acquisition against the remote token endpoint

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::future::Future;

use super::types::{Token, TokenResponse};
use crate::error::FatalError;

/// Source of fresh tokens
///
/// Implementations must be shareable with the renewal task, so the
/// returned future has to be `Send`.
pub trait AuthEndpoint: Send + Sync + 'static {
    /// Acquire a new token; any failure is fatal for the caller
    fn acquire(&self) -> impl Future<Output = Result<Token, FatalError>> + Send;
}

/// Token endpoint reached over HTTP with Basic credentials
pub struct HttpAuthEndpoint {
    client: Client,
    token_url: String,
    user: String,
    password: String,
}

impl HttpAuthEndpoint {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

impl AuthEndpoint for HttpAuthEndpoint {
    async fn acquire(&self) -> Result<Token, FatalError> {
        tracing::info!("Obtaining new token via {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .body("")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    url = %self.token_url,
                    error = %e,
                    "Attempt to retrieve token failed due to transport error"
                );
                FatalError::AuthTransport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Attempt to retrieve token failed: received non-2xx response {} from {}",
                status.as_u16(),
                self.token_url
            );
            if !body.is_empty() {
                tracing::error!("Error response body was: {}", body);
            }
            return Err(FatalError::AuthRejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(FatalError::AuthTransport)?;
        let data: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(error = %e, "Token response could not be parsed");
            FatalError::AuthMalformed(e.to_string())
        })?;

        if data.access_token.is_empty() {
            return Err(FatalError::AuthMalformed(
                "response contains an empty access_token".to_string(),
            ));
        }

        Ok(data.into())
    }
}

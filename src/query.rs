use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use std::convert::Infallible;
use std::time::Duration;

use crate::auth::TokenReader;
use crate::error::FatalError;

/// Issues authenticated queries against the target API with whatever token
/// is currently published
pub struct RequestIssuer {
    /// Shared HTTP client
    client: Client,

    /// Full query URL (API base + query path)
    url: String,

    /// Current token
    token: TokenReader,
}

impl RequestIssuer {
    pub fn new(client: Client, url: impl Into<String>, token: TokenReader) -> Self {
        Self {
            client,
            url: url.into(),
            token,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one query.
    ///
    /// # Panics
    ///
    /// If no token has been published yet; the first acquisition has to
    /// complete before queries start.
    pub async fn issue(&self) -> Result<StatusCode, FatalError> {
        let token = self
            .token
            .get()
            .expect("query issued before the first token was published");

        tracing::debug!("Querying {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, token.bearer_header())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    url = %self.url,
                    error = %e,
                    "Query failed due to transport error"
                );
                FatalError::QueryTransport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Query failed: received non-2xx response {} from {}",
                status.as_u16(),
                self.url
            );
            if !body.is_empty() {
                tracing::error!("Error response body was: {}", body);
            }
            return Err(FatalError::QueryRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = %status, "Query succeeded");
        Ok(status)
    }

    /// Query every `interval` until a query fails
    pub async fn run(&self, interval: Duration) -> Result<Infallible, FatalError> {
        loop {
            self.issue().await?;
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Token, TokenCell};

    fn issuer(server: &mockito::Server, cell: &TokenCell) -> RequestIssuer {
        RequestIssuer::new(
            Client::new(),
            format!("{}/api/apps/datagen/query/datagen?q=blah+blah", server.url()),
            cell.reader(),
        )
    }

    #[tokio::test]
    async fn test_issue_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/api/apps/datagen/query/datagen".to_string()),
            )
            .match_query(mockito::Matcher::Regex(r"q=blah\+blah".to_string()))
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let cell = TokenCell::new();
        cell.set(Token::new("abc123", 20));

        let status = issuer(&server, &cell).issue().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_issue_uses_latest_token() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", mockito::Matcher::Any)
            .match_header("authorization", "Bearer first")
            .with_status(200)
            .create_async()
            .await;
        let second = server
            .mock("GET", mockito::Matcher::Any)
            .match_header("authorization", "Bearer second")
            .with_status(200)
            .create_async()
            .await;
        let cell = TokenCell::new();
        let issuer = issuer(&server, &cell);

        cell.set(Token::new("first", 300));
        issuer.issue().await.unwrap();
        cell.set(Token::new("second", 300));
        issuer.issue().await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_issue_non_2xx_is_query_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let cell = TokenCell::new();
        cell.set(Token::new("abc123", 300));

        let err = issuer(&server, &cell).issue().await.unwrap_err();

        assert!(matches!(err, FatalError::QueryRejected { status: 500, .. }));
        assert_eq!(err.body(), Some("boom"));
        // The published token is untouched
        assert_eq!(cell.get().unwrap().value, "abc123");
    }

    #[tokio::test]
    async fn test_run_stops_at_first_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(403)
            .expect(1)
            .create_async()
            .await;
        let cell = TokenCell::new();
        cell.set(Token::new("abc123", 300));

        let err = issuer(&server, &cell)
            .run(Duration::from_millis(10))
            .await
            .err()
            .unwrap();

        assert_eq!(err.status(), Some(403));
        mock.assert_async().await;
    }

    #[tokio::test]
    #[should_panic(expected = "before the first token")]
    async fn test_issue_without_token_panics() {
        let server = mockito::Server::new_async().await;
        let cell = TokenCell::new();

        let _ = issuer(&server, &cell).issue().await;
    }
}

//! HTTP client wrapper with retry logic.

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::api_types::DhanErrorResponse;
use super::config::{DhanConfig, RetryConfig};
use super::error::DhanError;

/// HTTP client for the Dhan API.
///
/// Idempotent requests (funds, quotes) are retried with exponential backoff.
/// Order placement goes through [`Self::post_once`] and is attempted exactly
/// once, since a placement that reached the broker must not be repeated.
///
/// Credentials may be blank; [`Self::has_credentials`] lets callers short
/// circuit before touching the network.
#[derive(Debug, Clone)]
pub struct DhanHttpClient {
    client: Client,
    client_id: String,
    access_token: String,
    base_url: String,
    retry: RetryConfig,
}

impl DhanHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &DhanConfig) -> Result<Self, DhanError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DhanError::Network(e.to_string()))?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            access_token: config.access_token.clone(),
            base_url: config.base_url.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Whether both credentials are present and non-blank.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.access_token.trim().is_empty()
    }

    /// The configured Dhan client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Make a GET request, retrying per the retry policy.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DhanError> {
        self.request(Method::GET, path, None::<&()>, ExponentialBackoff::new(&self.retry))
            .await
    }

    /// Make a POST request, retrying per the retry policy.
    #[allow(clippy::future_not_send)]
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DhanError> {
        self.request(Method::POST, path, Some(body), ExponentialBackoff::new(&self.retry))
            .await
    }

    /// Make a POST request with exactly one attempt.
    #[allow(clippy::future_not_send)]
    pub async fn post_once<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DhanError> {
        self.request(Method::POST, path, Some(body), ExponentialBackoff::single_attempt())
            .await
    }

    /// Internal request implementation with retry logic.
    #[allow(clippy::future_not_send)]
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        mut backoff: ExponentialBackoff,
    ) -> Result<T, DhanError> {
        let url = format!("{}{}", self.base_url, path);

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header("access-token", &self.access_token)
                .header("client-id", &self.client_id);
            if let Some(b) = body {
                request = request.json(b);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(DhanError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| DhanError::Network(e.to_string()))?;
                if text.is_empty() {
                    return serde_json::from_str("null")
                        .map_err(|e| DhanError::JsonParse(e.to_string()));
                }
                return serde_json::from_str(&text)
                    .map_err(|e| DhanError::JsonParse(e.to_string()));
            }

            let error_body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<DhanErrorResponse>(&error_body) {
                Ok(err) => err.error_message.unwrap_or(error_body),
                Err(_) => error_body,
            };

            if is_retryable(status) {
                if let Some(delay) = backoff.next_backoff() {
                    tracing::warn!(
                        status = status.as_u16(),
                        message = %message,
                        delay_ms = delay.as_millis(),
                        "Retryable error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(DhanError::MaxRetriesExceeded {
                    attempts: backoff.attempt,
                });
            }

            return Err(DhanError::Api {
                status: status.as_u16(),
                message,
            });
        }
    }
}

/// Whether a status code warrants a retry.
const fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    /// A backoff that allows exactly one attempt and never sleeps.
    const fn single_attempt() -> Self {
        Self {
            attempt: 0,
            max_attempts: 1,
            current_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable(StatusCode::GATEWAY_TIMEOUT));
    }

    #[test]
    fn test_non_retryable_statuses() {
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_exponential_backoff_increments() {
        let config = RetryConfig {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        };

        let mut backoff = ExponentialBackoff::new(&config);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn test_exponential_backoff_respects_max() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
            multiplier: 10.0,
        };

        let mut backoff = ExponentialBackoff::new(&config);

        backoff.next_backoff();
        // Second backoff is capped at max_backoff, not 10s.
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let mut backoff = ExponentialBackoff::single_attempt();
        assert_eq!(backoff.next_backoff(), None);
        assert_eq!(backoff.attempt, 1);
    }

    #[test]
    fn test_blank_credentials_detected() {
        let config = DhanConfig::new("", "");
        let client = DhanHttpClient::new(&config).unwrap();
        assert!(!client.has_credentials());

        let config = DhanConfig::new("client-1", "token-1");
        let client = DhanHttpClient::new(&config).unwrap();
        assert!(client.has_credentials());
    }
}

//! HTTP transport
//!
//! One thin layer owns the `reqwest` client, the credential, and the retry
//! wiring for a provider target. Idempotent GETs run under the
//! attempt-counted retry engine; POSTs are re-sent only when the connection
//! failed before the request went out, since generation endpoints are not
//! idempotent.

mod classify;

pub use classify::classify_http_error;

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use uuid::Uuid;

use crate::defaults;
use crate::error::GenError;
use crate::retry::{BackoffRetryExecutor, RetryPolicy};
use crate::utils::excerpt;

/// HTTP transport bound to one provider target.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    provider_id: String,
    api_key: Option<SecretString>,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Build a transport for one provider target.
    ///
    /// When `api_key` is `None` or empty, requests go out without an
    /// `Authorization` header, which is what local OpenAI-compatible servers
    /// expect.
    pub fn new(
        provider_id: impl Into<String>,
        api_key: Option<SecretString>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, GenError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(defaults::http::CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                GenError::ConfigurationError(format!("failed to build http client: {}", e))
            })?;
        Ok(Self::with_client(client, provider_id, api_key, policy))
    }

    /// Build a transport around a pre-configured `reqwest` client.
    ///
    /// The caller's client keeps its own timeout and TLS settings.
    pub fn with_client(
        client: reqwest::Client,
        provider_id: impl Into<String>,
        api_key: Option<SecretString>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            provider_id: provider_id.into(),
            api_key,
            policy,
        }
    }

    /// Identifier of the provider this transport talks to.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// The retry policy governing this transport.
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET with the transport's retry schedule applied.
    ///
    /// GETs are idempotent, so transient failures run under the
    /// elapsed-bounded backoff engine derived from the retry policy.
    pub async fn get_json(&self, url: &str) -> Result<Value, GenError> {
        BackoffRetryExecutor::from_policy(&self.policy)
            .execute(|| self.get_json_once(url))
            .await
    }

    /// Single-attempt GET, for callers that bring their own retry schedule.
    pub async fn get_json_once(&self, url: &str) -> Result<Value, GenError> {
        let headers = self.auth_headers()?;
        let response = self.send(Method::GET, url, headers, None).await?;
        self.read_json(response).await
    }

    /// POST returning the parsed JSON body.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value, GenError> {
        let response = self.post_with_connect_retry(url, body).await?;
        self.read_json(response).await
    }

    /// POST returning the raw body bytes, for binary payloads such as audio.
    pub async fn post_binary(&self, url: &str, body: &Value) -> Result<Vec<u8>, GenError> {
        let response = self.post_with_connect_retry(url, body).await?;
        if !response.status().is_success() {
            return Err(self.classify_failure(response).await);
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// POST once, re-sending only while the connection failed before the
    /// request reached the server. HTTP-level failures surface immediately.
    async fn post_with_connect_retry(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<reqwest::Response, GenError> {
        let headers = self.auth_headers()?;
        let mut attempt = 0u32;
        loop {
            match self
                .send(Method::POST, url, headers.clone(), Some(body))
                .await
            {
                Ok(response) => return Ok(response),
                Err(error) if error.is_connect() && attempt + 1 < self.policy.max_attempts => {
                    let delay = self.policy.calculate_delay(attempt);
                    tracing::warn!(
                        target: "anygen::http",
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "connection failed before send, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let request_id = Uuid::new_v4();
        tracing::debug!(
            target: "anygen::http",
            request_id = %request_id,
            method = %method,
            url,
            "sending request"
        );

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;

        tracing::debug!(
            target: "anygen::http",
            request_id = %request_id,
            status = response.status().as_u16(),
            "received response"
        );
        Ok(response)
    }

    fn auth_headers(&self) -> Result<HeaderMap, GenError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let secret = key.expose_secret();
            if !secret.is_empty() {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", secret))
                    .map_err(|_| {
                        GenError::ConfigurationError(
                            "api key is not a valid header value".to_string(),
                        )
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }
        Ok(headers)
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value, GenError> {
        if !response.status().is_success() {
            return Err(self.classify_failure(response).await);
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|_| {
            GenError::ParseError(format!(
                "response body is not valid JSON: {}",
                excerpt(&text)
            ))
        })
    }

    async fn classify_failure(&self, response: reqwest::Response) -> GenError {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        classify_http_error(&self.provider_id, status, &headers, &text)
    }
}

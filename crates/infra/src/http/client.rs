use std::time::Duration;

use nowplaying_domain::NowPlayingError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client shared by the provider and relay integrations.
///
/// [`HttpClient::send`] retries idempotent reads on 5xx and connection
/// failures. [`HttpClient::send_once`] never retries and is the only path
/// used for token endpoint POSTs, since an authorization code is single-use.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and retry settings.
    pub fn new() -> Result<Self, NowPlayingError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Underlying reqwest client, for components that build their own calls.
    pub fn inner(&self) -> &ReqwestClient {
        &self.client
    }

    /// Execute a single attempt.
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, NowPlayingError> {
        let request = builder.build().map_err(into_domain)?;
        let method = request.method().clone();
        let url = redacted(request.url());

        debug!(%method, url = %url, "sending HTTP request");
        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, url = %url, error = %err, "HTTP request failed");
            into_domain(err)
        })?;
        debug!(%method, url = %url, status = %response.status(), "received HTTP response");

        Ok(response)
    }

    /// Execute with retries on 5xx responses and transport failures.
    ///
    /// The final response is returned as-is, including a last 5xx.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, NowPlayingError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let cloned = builder.try_clone().ok_or_else(|| {
                NowPlayingError::Internal(
                    "request body cannot be cloned; use send_once for streaming bodies".into(),
                )
            })?;
            let request = cloned.build().map_err(into_domain)?;
            let method = request.method().clone();
            let url = redacted(request.url());
            let last = attempt == attempts;

            debug!(attempt, %method, url = %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, url = %url, %status, "received HTTP response");

                    if status.is_server_error() && !last {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt, %method, url = %url, error = %err, "HTTP request failed");

                    if !last && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(into_domain(err));
                }
            }
        }

        Err(NowPlayingError::Internal("http client exhausted retries without a result".into()))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: Some(concat!("nowplaying/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts for [`HttpClient::send`] (initial try +
    /// retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, NowPlayingError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(into_domain)?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn into_domain(err: reqwest::Error) -> NowPlayingError {
    let infra: InfraError = err.into();
    NowPlayingError::from(infra)
}

/// URL without its query string; queries may carry codes or challenges.
fn redacted(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

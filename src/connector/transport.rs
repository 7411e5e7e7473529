//! Transport seam to the HTTP client.
//!
//! # Responsibilities
//! - Turn an [`ApiRequest`] into a ready-to-run response future
//! - Report construction failures synchronously, before anything is tracked
//! - Map HTTP status codes and bodies onto [`ApiResponse`]
//!
//! # Design Decisions
//! - Connection pooling, TLS and timeouts are left to `reqwest`
//! - No retries; a failed call is reported once
//! - Cancellation is dropping the returned future

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use reqwest::Client;
use url::Url;

use crate::config::schema::ConnectorConfig;
use crate::connector::error::{ConnectorError, ConnectorResult};
use crate::connector::request::{ApiRequest, Placement};
use crate::connector::response::{decode_body, ApiPayload, ApiResponse};

/// Future resolving to the outcome of one call.
pub type ResponseFuture = Pin<Box<dyn Future<Output = ApiResponse> + Send + 'static>>;

/// Something that can execute [`ApiRequest`]s.
pub trait Transport: Send + Sync + 'static {
    /// Build the call. Errors here mean nothing was dispatched.
    fn prepare(&self, request: &ApiRequest) -> ConnectorResult<ResponseFuture>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    /// The base path is treated as a directory: `/v1` becomes `/v1/`.
    pub fn new(client: Client, base_url: Option<Url>) -> Self {
        let base_url = base_url.map(|mut url| {
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            url
        });
        Self { client, base_url }
    }

    /// Build the client from configuration.
    pub fn from_config(config: &ConnectorConfig) -> ConnectorResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .pool_max_idle_per_host(config.http.pool_max_idle_per_host)
            .user_agent(config.http.user_agent.clone())
            .build()?;

        let base_url = match &config.http.base_url {
            Some(raw) => Some(Url::parse(raw).map_err(|source| ConnectorError::InvalidUrl {
                endpoint: raw.clone(),
                source,
            })?),
            None => None,
        };

        tracing::debug!(
            base_url = ?base_url.as_ref().map(Url::as_str),
            connect_timeout_secs = config.timeouts.connect_secs,
            request_timeout_secs = config.timeouts.request_secs,
            "HTTP transport initialized"
        );

        Ok(Self::new(client, base_url))
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Absolute endpoints are used as-is, relative ones joined onto the base URL.
    ///
    /// A leading `/` does not escape the base path: `/users` against
    /// `https://host/v1/` resolves to `https://host/v1/users`.
    pub fn resolve(&self, endpoint: &str) -> ConnectorResult<Url> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base_url
                    .as_ref()
                    .ok_or_else(|| ConnectorError::MissingBaseUrl(endpoint.to_string()))?;
                base.join(endpoint.trim_start_matches('/'))
                    .map_err(|source| ConnectorError::InvalidUrl {
                        endpoint: endpoint.to_string(),
                        source,
                    })
            }
            Err(source) => Err(ConnectorError::InvalidUrl {
                endpoint: endpoint.to_string(),
                source,
            }),
        }
    }
}

impl Transport for HttpTransport {
    fn prepare(&self, request: &ApiRequest) -> ConnectorResult<ResponseFuture> {
        let url = self.resolve(&request.endpoint)?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers()?);

        builder = match request.placement()? {
            Placement::Empty => builder,
            Placement::Query(pairs) => builder.query(&pairs),
            Placement::Json(body) => builder.json(&body),
            Placement::Form(pairs) => builder.form(&pairs),
        };

        let built = builder.build()?;
        let client = self.client.clone();

        Ok(Box::pin(async move {
            let started = Instant::now();
            let response = client.execute(built).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;
            let body = decode_body(&bytes);

            if !status.is_success() {
                return Err(ConnectorError::Status { status, body });
            }

            Ok(ApiPayload {
                status,
                headers,
                body,
                elapsed: started.elapsed(),
            })
        }))
    }
}

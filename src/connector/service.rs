//! Service connector facade.
//!
//! # Responsibilities
//! - Expose one method per verb and body variant
//! - Generate a [`RequestId`] per call and register it before dispatch
//! - Guard the caller's completion so it runs at most once, and never
//!   after a cancellation
//!
//! # Design Decisions
//! - Calls run as abortable tasks on the runtime that built the connector
//! - Tasks only hold a weak reference to the registry; the registry entry is
//!   what keeps a call alive
//! - Dropping the connector cancels everything still outstanding

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{AbortHandle, Abortable};
use reqwest::Method;
use tokio::runtime::Handle;

use crate::config::schema::ConnectorConfig;
use crate::connector::error::{ConnectorError, ConnectorResult};
use crate::connector::registry::{InFlightRequest, RequestRegistry};
use crate::connector::request::{ApiRequest, BodyEncoding, Params, Payload};
use crate::connector::request_id::RequestId;
use crate::connector::response::ApiResponse;
use crate::connector::transport::{HttpTransport, Transport};
use crate::observability::metrics;

/// Returned for every dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    id: RequestId,
    method: Method,
    endpoint: String,
}

impl RequestHandle {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Issues HTTP calls and tracks them until they finish or are cancelled.
pub struct ServiceConnector {
    transport: Arc<dyn Transport>,
    registry: Arc<RequestRegistry>,
    runtime: Handle,
}

impl ServiceConnector {
    /// Create a connector over `transport`.
    ///
    /// Must be called from within a Tokio runtime; calls are spawned onto it.
    pub fn new(transport: impl Transport) -> ConnectorResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ConnectorError::NoRuntime)?;
        Ok(Self {
            transport: Arc::new(transport),
            registry: Arc::new(RequestRegistry::new()),
            runtime,
        })
    }

    /// Create a connector with the `reqwest` transport described by `config`.
    pub fn from_config(config: &ConnectorConfig) -> ConnectorResult<Self> {
        Self::new(HttpTransport::from_config(config)?)
    }

    // --- Basic verbs ---

    pub fn get<F>(
        &self,
        endpoint: &str,
        params: Option<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        self.with_params(Method::GET, endpoint, params, token, completion)
    }

    pub fn put<F>(
        &self,
        endpoint: &str,
        params: Option<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        self.with_params(Method::PUT, endpoint, params, token, completion)
    }

    pub fn post<F>(
        &self,
        endpoint: &str,
        params: Option<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        self.with_params(Method::POST, endpoint, params, token, completion)
    }

    pub fn delete<F>(
        &self,
        endpoint: &str,
        params: Option<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        self.with_params(Method::DELETE, endpoint, params, token, completion)
    }

    pub fn patch<F>(
        &self,
        endpoint: &str,
        params: Option<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        self.with_params(Method::PATCH, endpoint, params, token, completion)
    }

    // --- Body variants ---

    pub fn post_with_object_body<F>(
        &self,
        endpoint: &str,
        body: Params,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let request = ApiRequest::new(Method::POST, endpoint)
            .payload(Payload::Object(body))
            .token(token);
        self.issue(request, completion)
    }

    pub fn put_with_object_body<F>(
        &self,
        endpoint: &str,
        body: Params,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let request = ApiRequest::new(Method::PUT, endpoint)
            .payload(Payload::Object(body))
            .token(token);
        self.issue(request, completion)
    }

    pub fn put_with_array_object_body<F>(
        &self,
        endpoint: &str,
        body: Vec<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let request = ApiRequest::new(Method::PUT, endpoint)
            .payload(Payload::Array(body))
            .token(token);
        self.issue(request, completion)
    }

    /// POST with a form-urlencoded body.
    pub fn post_form_with_object_body<F>(
        &self,
        endpoint: &str,
        body: Params,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let request = ApiRequest::new(Method::POST, endpoint)
            .payload(Payload::Object(body))
            .encoding(BodyEncoding::FormUrlEncoded)
            .token(token);
        self.issue(request, completion)
    }

    /// GET with the object encoded into the query and a form content type.
    pub fn get_form_with_object_body<F>(
        &self,
        endpoint: &str,
        body: Params,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let request = ApiRequest::new(Method::GET, endpoint)
            .payload(Payload::Object(body))
            .encoding(BodyEncoding::FormUrlEncoded)
            .token(token);
        self.issue(request, completion)
    }

    fn with_params<F>(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<Params>,
        token: Option<&str>,
        completion: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let payload = params.map(Payload::Params).unwrap_or(Payload::None);
        let request = ApiRequest::new(method, endpoint).payload(payload).token(token);
        self.issue(request, completion)
    }

    // --- Tracking ---

    /// Dispatch `request` and track it until it resolves or is cancelled.
    ///
    /// Returns `None` if the transport could not build the call; nothing is
    /// tracked and `completion` is dropped without being called.
    pub fn issue<F>(&self, request: ApiRequest, completion: F) -> Option<RequestHandle>
    where
        F: FnOnce(ApiResponse) + Send + 'static,
    {
        let method = request.method.clone();
        let endpoint = request.endpoint.clone();

        let response = match self.transport.prepare(&request) {
            Ok(future) => future,
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint,
                    method = %method,
                    error = %e,
                    "Failed to construct request"
                );
                metrics::record_construction_failure(method.as_str(), e.kind());
                return None;
            }
        };

        let id = RequestId::generate(&endpoint);
        let (abort, registration) = AbortHandle::new_pair();
        self.registry.register(
            id.clone(),
            InFlightRequest::new(abort, method.clone(), endpoint.clone()),
        );

        let registry = Arc::downgrade(&self.registry);
        let task_id = id.clone();
        let task_method = method.clone();
        let task_endpoint = endpoint.clone();
        let started = Instant::now();

        let task = async move {
            let result = response.await;

            let Some(registry) = registry.upgrade() else {
                return;
            };
            if !registry.complete(&task_id) {
                tracing::trace!(
                    request_id = %task_id,
                    "Response arrived after cancellation, dropped"
                );
                return;
            }
            drop(registry);

            let elapsed = started.elapsed();
            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            tracing::debug!(
                request_id = %task_id,
                endpoint = %task_endpoint,
                method = %task_method,
                status = ?result.as_ref().ok().map(|p| p.status.as_u16()),
                outcome,
                elapsed_ms = elapsed.as_millis() as u64,
                "API call finished"
            );
            metrics::record_request(task_method.as_str(), outcome, elapsed);

            completion(result);
        };

        self.runtime.spawn(Abortable::new(task, registration));

        Some(RequestHandle {
            id,
            method,
            endpoint,
        })
    }

    /// Cancel one call. Unknown or finished ids are ignored.
    pub fn cancel(&self, id: &RequestId) -> bool {
        self.registry.cancel(id)
    }

    /// Cancel every call whose id starts with `api`.
    ///
    /// Matching is a plain prefix on the id, so `/user` also cancels calls
    /// to `/users`.
    pub fn cancel_api(&self, api: &str) -> usize {
        self.registry.cancel_by_prefix(api)
    }

    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }

    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn is_in_flight(&self, id: &RequestId) -> bool {
        self.registry.contains(id)
    }
}

impl Drop for ServiceConnector {
    fn drop(&mut self) {
        let count = self.registry.cancel_all();
        if count > 0 {
            tracing::debug!(count, "Connector dropped, outstanding requests cancelled");
        }
    }
}

impl std::fmt::Debug for ServiceConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConnector")
            .field("in_flight", &self.registry.len())
            .finish()
    }
}

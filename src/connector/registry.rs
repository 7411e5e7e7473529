//! In-flight request registry.
//!
//! # Responsibilities
//! - Own the cancellable handle of every outstanding call
//! - Cancel by exact id, by endpoint prefix, or everything
//! - Decide the single winner between completion and cancellation
//!
//! # Design Decisions
//! - Removal from the map is the only way to claim an entry; whoever
//!   removes it (completion or cancel) owns the outcome
//! - Handles are cancelled after they leave the map, never while a shard
//!   lock is held
//! - Dropping the registry cancels whatever is still outstanding

use dashmap::DashMap;
use futures_util::future::AbortHandle;
use reqwest::Method;

use crate::connector::request_id::RequestId;
use crate::observability::metrics;

/// Cancellable handle for one dispatched call.
#[derive(Debug)]
pub struct InFlightRequest {
    abort: AbortHandle,
    method: Method,
    endpoint: String,
}

impl InFlightRequest {
    pub fn new(abort: AbortHandle, method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            abort,
            method,
            endpoint: endpoint.into(),
        }
    }

    /// Consumes the handle so it can only be cancelled once.
    fn cancel(self) {
        self.abort.abort();
    }
}

/// Registry of outstanding calls keyed by [`RequestId`].
#[derive(Debug, Default)]
pub struct RequestRegistry {
    entries: DashMap<RequestId, InFlightRequest>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly issued call.
    ///
    /// An entry already stored under `id` is cancelled, never silently dropped.
    pub fn register(&self, id: RequestId, request: InFlightRequest) {
        tracing::trace!(request_id = %id, method = %request.method, "Request registered");
        match self.entries.insert(id.clone(), request) {
            Some(replaced) => {
                tracing::warn!(
                    request_id = %id,
                    endpoint = %replaced.endpoint,
                    "Duplicate request id, previous request cancelled"
                );
                replaced.cancel();
                metrics::record_cancelled("replaced", 1);
            }
            None => metrics::in_flight_added(1),
        }
    }

    /// Claim an entry for the completion path.
    ///
    /// Returns false if the entry was already cancelled, in which case the
    /// caller's completion must not run.
    pub fn complete(&self, id: &RequestId) -> bool {
        let claimed = self.entries.remove(id).is_some();
        if claimed {
            metrics::in_flight_removed(1);
        }
        claimed
    }

    /// Cancel one call. Unknown ids are ignored.
    pub fn cancel(&self, id: &RequestId) -> bool {
        match self.entries.remove(id) {
            Some((_, request)) => {
                tracing::debug!(
                    request_id = %id,
                    endpoint = %request.endpoint,
                    "Request cancelled"
                );
                request.cancel();
                metrics::record_cancelled("single", 1);
                metrics::in_flight_removed(1);
                true
            }
            None => false,
        }
    }

    /// Cancel every call whose id starts with `prefix`.
    pub fn cancel_by_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<RequestId> = self
            .entries
            .iter()
            .filter(|entry| entry.key().has_endpoint_prefix(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let removed: Vec<InFlightRequest> = keys
            .iter()
            .filter_map(|key| self.entries.remove(key).map(|(_, request)| request))
            .collect();

        let count = removed.len();
        for request in removed {
            request.cancel();
        }

        if count > 0 {
            tracing::debug!(prefix = %prefix, count, "Requests cancelled by endpoint prefix");
            metrics::record_cancelled("prefix", count);
            metrics::in_flight_removed(count);
        }
        count
    }

    /// Cancel everything currently outstanding.
    ///
    /// Calls registered while this runs may survive it.
    pub fn cancel_all(&self) -> usize {
        let keys: Vec<RequestId> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        let snapshot: Vec<InFlightRequest> = keys
            .iter()
            .filter_map(|key| self.entries.remove(key).map(|(_, request)| request))
            .collect();

        let count = snapshot.len();
        for request in snapshot {
            request.cancel();
        }

        if count > 0 {
            tracing::debug!(count, "All outstanding requests cancelled");
            metrics::record_cancelled("all", count);
            metrics::in_flight_removed(count);
        }
        count
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for RequestRegistry {
    fn drop(&mut self) {
        let count = self.cancel_all();
        if count > 0 {
            tracing::debug!(count, "Registry dropped with outstanding requests");
        }
    }
}

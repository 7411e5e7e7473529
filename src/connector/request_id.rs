//! Request identifiers.
//!
//! # Format
//! ```text
//! <endpoint>.<unix-seconds>.<microseconds>#<seq>
//! ```
//!
//! # Design Decisions
//! - Endpoint is always the leading slice, so prefix cancellation can work
//!   on the raw id
//! - Timestamp alone can collide for two calls in the same microsecond;
//!   the process-wide sequence number makes ids unique

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sequence counter appended to every id.
/// Relaxed is enough: only uniqueness matters, not ordering between threads.
static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identifier of one outstanding call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh id for a call to `endpoint`.
    pub fn generate(endpoint: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}.{}.{:06}#{}",
            endpoint,
            now.as_secs(),
            now.subsec_micros(),
            seq
        ))
    }

    /// Wrap an existing id string (e.g. one logged earlier).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the first `prefix.len()` bytes of the id equal `prefix`.
    ///
    /// Ids shorter than the prefix never match.
    pub fn has_endpoint_prefix(&self, prefix: &str) -> bool {
        self.0
            .as_bytes()
            .get(..prefix.len())
            .map(|head| head == prefix.as_bytes())
            .unwrap_or(false)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

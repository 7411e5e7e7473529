//! HTTP service connector with tracked, cancellable in-flight requests.

pub mod config;
pub mod connector;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ConnectorConfig;
pub use connector::{ApiResponse, RequestHandle, RequestId, ServiceConnector};
pub use lifecycle::Shutdown;

//! Request tracking and dispatch.
//!
//! # Data Flow
//! ```text
//! caller (get/post/... or issue)
//!     → request.rs (ApiRequest: method, payload, encoding, token)
//!     → transport.rs (build reqwest call; construction errors stop here)
//!     → request_id.rs (endpoint + timestamp id)
//!     → registry.rs (register abort handle)
//!     → spawned task awaits the response
//!     → registry.complete(id)? → completion(ApiResponse)
//!
//! cancel(id) / cancel_api(prefix) / cancel_all()
//!     → registry removes entries → abort handles fire
//! ```
//!
//! # Design Decisions
//! - Exactly one of completion or cancellation wins for each call
//! - Cancelling an unknown id is not an error
//! - No retries in this layer

pub mod error;
pub mod registry;
pub mod request;
pub mod request_id;
pub mod response;
pub mod service;
pub mod transport;

pub use error::{ConnectorError, ConnectorResult};
pub use registry::{InFlightRequest, RequestRegistry};
pub use request::{ApiRequest, BodyEncoding, Params, Payload};
pub use request_id::RequestId;
pub use response::{ApiPayload, ApiResponse};
pub use service::{RequestHandle, ServiceConnector};
pub use transport::{HttpTransport, ResponseFuture, Transport};

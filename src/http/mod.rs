//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routing)
//!     → request.rs (request ID)
//!     → relay route → crate::relay (resolve, relay, stream back)
//!     → other paths → endpoints.rs (root, health, api, 404)
//!     → response.rs (JSON error bodies)
//! ```

pub mod endpoints;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRelayRequestId, X_REQUEST_ID};
pub use response::ErrorBody;
pub use server::{AppState, HttpServer, ServerError};

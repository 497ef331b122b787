//! Forward HTTP/HTTPS relay library.
//!
//! A request to `/proxy/<target-url>` is re-issued to `<target-url>` and the
//! target's response is streamed back unchanged.

// Core
pub mod relay;

// Serving
pub mod config;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{RelayEngine, RelayError, TargetSpec, ValidationError};

//! Request-relaying core.
//!
//! # Data Flow
//! ```text
//! inbound path tail
//!     → target.rs (extract, default scheme, validate)   ── invalid → 400, no network
//!     → engine.rs (outbound request, body passthrough)
//!     → watchdog.rs (inactivity limit on every wait)
//!     → error.rs (transport fault → 502/504)            ── only before headers
//!     → streamed response
//! ```
//!
//! # Design Decisions
//! - Every entity is request-scoped; nothing is shared between relays
//!   except the outbound client's own pool
//! - The target is parsed once and that parse is what gets dispatched
//! - Redirects are relayed, never followed

pub mod engine;
pub mod error;
pub mod target;
pub mod watchdog;

pub use engine::{EngineError, RelayEngine};
pub use error::{RelayError, RelayErrorCode};
pub use target::{extract_target, resolve, Scheme, TargetSpec, ValidationError};

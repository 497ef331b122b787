//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Response from the relay's own endpoints:
//!     → headers.rs (nosniff, frame options, referrer policy)
//! Any request:
//!     → headers.rs (CORS)
//! ```
//!
//! # Design Decisions
//! - No authentication or rate limiting; the relay is open by intent
//! - Relayed responses are left untouched apart from CORS

pub mod headers;

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Relay request accepted by the HTTP layer
//!     → connection.rs (claim in-flight slot, assign relay ID)
//!     → slot held until the last response byte or caller disconnect
//!     → shutdown drains remaining slots
//! ```
//!
//! # Design Decisions
//! - The ceiling rejects (503) instead of queueing
//! - Each relay tracked for graceful shutdown

pub mod connection;

//! Transport failure classification.
//!
//! # Failure Table
//! ```text
//! name resolution failure      → 502 "cannot resolve target host"
//! connection refused           → 502 "connection refused"
//! connect / socket timeout     → 504 "connection timed out"
//! certificate expired          → 502 "TLS certificate expired"
//! other TLS-labelled failure   → 502 "TLS handshake failed"
//! inactivity timeout elapsed   → 504 "request exceeded time limit"
//! anything else                → 502 root cause message
//! ```

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use axum::http::StatusCode;

use super::target::TargetSpec;

const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
    "temporary failure in name resolution",
];

const TLS_MARKERS: &[&str] = &["tls", "ssl", "certificate", "handshake"];

pub const RELAY_SUGGESTION: &str =
    "check that the target URL is reachable from the relay, or try again later";

/// Classified transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorCode {
    NameResolution,
    ConnectionRefused,
    ConnectionTimedOut,
    CertificateExpired,
    TlsHandshake,
    RequestTimeout,
    Transport,
}

impl RelayErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayErrorCode::NameResolution => "name_resolution_failed",
            RelayErrorCode::ConnectionRefused => "connection_refused",
            RelayErrorCode::ConnectionTimedOut => "connection_timed_out",
            RelayErrorCode::CertificateExpired => "certificate_expired",
            RelayErrorCode::TlsHandshake => "tls_handshake_failed",
            RelayErrorCode::RequestTimeout => "request_timeout",
            RelayErrorCode::Transport => "transport_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayErrorCode::ConnectionTimedOut | RelayErrorCode::RequestTimeout => {
                StatusCode::GATEWAY_TIMEOUT
            }
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Fixed caller-facing message. `None` for unclassified faults, which
    /// carry the underlying message instead.
    fn message(&self) -> Option<&'static str> {
        match self {
            RelayErrorCode::NameResolution => Some("cannot resolve target host"),
            RelayErrorCode::ConnectionRefused => Some("connection refused"),
            RelayErrorCode::ConnectionTimedOut => Some("connection timed out"),
            RelayErrorCode::CertificateExpired => Some("TLS certificate expired"),
            RelayErrorCode::TlsHandshake => Some("TLS handshake failed"),
            RelayErrorCode::RequestTimeout => Some("request exceeded time limit"),
            RelayErrorCode::Transport => None,
        }
    }
}

/// A relay operation failed before response headers reached the caller.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} ({target})")]
pub struct RelayError {
    code: RelayErrorCode,
    message: String,
    target: String,
}

impl RelayError {
    pub fn new(code: RelayErrorCode, message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            target: target.into(),
        }
    }

    /// The inactivity watchdog fired while waiting on the target.
    pub fn timed_out(target: &TargetSpec, limit: Duration) -> Self {
        let message = format!(
            "{} ({}s without progress)",
            RelayErrorCode::RequestTimeout.message().unwrap_or_default(),
            limit.as_secs()
        );
        Self::new(RelayErrorCode::RequestTimeout, message, target.raw())
    }

    /// Classify an outbound client failure.
    pub fn from_transport(err: &(dyn StdError + 'static), target: &TargetSpec) -> Self {
        let code = classify(err);
        let message = match code.message() {
            Some(fixed) => fixed.to_string(),
            None => root_cause(err),
        };
        Self::new(code, message, target.raw())
    }

    pub fn code(&self) -> RelayErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The target URL as the caller wrote it.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn suggestion(&self) -> &'static str {
        RELAY_SUGGESTION
    }
}

/// Walk the full `source()` chain and pick the most specific code.
pub fn classify(err: &(dyn StdError + 'static)) -> RelayErrorCode {
    let mut dns = false;
    let mut refused = false;
    let mut timed_out = false;
    let mut expired = false;
    let mut tls = false;

    for cause in chain(err) {
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            timed_out |= e.is_timeout();
            // The top-level display embeds the URL, which may contain any marker.
            continue;
        }
        if let Some(e) = cause.downcast_ref::<hyper::Error>() {
            timed_out |= e.is_timeout();
        }
        if let Some(e) = cause.downcast_ref::<io::Error>() {
            match e.kind() {
                io::ErrorKind::ConnectionRefused => refused = true,
                io::ErrorKind::TimedOut => timed_out = true,
                _ => {}
            }
        }

        let text = cause.to_string().to_ascii_lowercase();
        dns |= DNS_MARKERS.iter().any(|m| text.contains(m));
        expired |= text.contains("expired") && text.contains("cert");
        tls |= TLS_MARKERS.iter().any(|m| text.contains(m));
    }

    if dns {
        RelayErrorCode::NameResolution
    } else if refused {
        RelayErrorCode::ConnectionRefused
    } else if timed_out {
        RelayErrorCode::ConnectionTimedOut
    } else if expired {
        RelayErrorCode::CertificateExpired
    } else if tls {
        RelayErrorCode::TlsHandshake
    } else {
        RelayErrorCode::Transport
    }
}

fn chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |e: &&'a (dyn StdError + 'static)| (*e).source())
}

/// Innermost message, prefixed when the client flags it as a connect failure.
fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let connect = chain(err).any(|cause| {
        cause
            .downcast_ref::<hyper_util::client::legacy::Error>()
            .is_some_and(|e| e.is_connect())
    });
    let root = chain(err).last().map(|e| e.to_string()).unwrap_or_default();

    if connect {
        format!("connect failed: {}", root)
    } else {
        root
    }
}

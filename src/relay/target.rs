//! Target resolution.
//!
//! # Responsibilities
//! - Strip the relay prefix from the inbound path
//! - Default a missing scheme to `https://`
//! - Parse and validate the absolute target URL exactly once
//!
//! # Design Decisions
//! - The tail of the path is taken verbatim (no percent-decoding)
//! - The parsed `Url` is the single source of truth for dispatch; nothing
//!   downstream re-parses the raw string

use std::fmt;

use url::Url;

/// Scheme prepended when the target carries none.
pub const DEFAULT_SCHEME: Scheme = Scheme::Https;

/// Schemes the relay is able to dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an inbound path could not be turned into a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no target URL was given after the relay prefix")]
    MissingTarget,

    #[error("target URL is malformed: {detail}")]
    MalformedTarget { target: String, detail: String },

    #[error("scheme `{scheme}` is not supported, only http and https targets can be relayed")]
    UnsupportedScheme { target: String, scheme: String },
}

impl ValidationError {
    /// Machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingTarget => "missing_target",
            ValidationError::MalformedTarget { .. } => "malformed_target",
            ValidationError::UnsupportedScheme { .. } => "unsupported_scheme",
        }
    }

    /// The offending target as the caller wrote it.
    pub fn target(&self) -> &str {
        match self {
            ValidationError::MissingTarget => "",
            ValidationError::MalformedTarget { target, .. }
            | ValidationError::UnsupportedScheme { target, .. } => target,
        }
    }
}

/// A validated relay destination. Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    raw: String,
    url: Url,
    scheme: Scheme,
    host: String,
    port: u16,
}

impl TargetSpec {
    /// The target exactly as it appeared in the inbound path.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed absolute URL used for dispatch.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, or 80/443 by scheme.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// Origin-form request target: path plus `?query` when present.
    pub fn request_target(&self) -> String {
        match self.query() {
            Some(query) => format!("{}?{}", self.path(), query),
            None => self.path().to_string(),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Return everything after `prefix` in the inbound path-and-query.
///
/// The bare prefix without its trailing slash (`/proxy`) yields an empty
/// target; a path outside the prefix yields `None`.
pub fn extract_target<'a>(path_and_query: &'a str, prefix: &str) -> Option<&'a str> {
    if let Some(rest) = path_and_query.strip_prefix(prefix) {
        return Some(rest);
    }

    let bare = prefix.trim_end_matches('/');
    let rest = path_and_query.strip_prefix(bare)?;
    if rest.is_empty() || rest.starts_with('?') {
        Some("")
    } else {
        None
    }
}

/// Resolve the literal target tail into a [`TargetSpec`].
pub fn resolve(raw: &str) -> Result<TargetSpec, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::MissingTarget);
    }

    let candidate = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, raw)
    };

    let url = Url::parse(&candidate).map_err(|e| ValidationError::MalformedTarget {
        target: raw.to_string(),
        detail: e.to_string(),
    })?;

    let scheme = match url.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => {
            return Err(ValidationError::UnsupportedScheme {
                target: raw.to_string(),
                scheme: other.to_string(),
            })
        }
    };

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => {
            return Err(ValidationError::MalformedTarget {
                target: raw.to_string(),
                detail: "target has no host".to_string(),
            })
        }
    };

    let port = url.port_or_known_default().unwrap_or(scheme.default_port());

    Ok(TargetSpec {
        raw: raw.to_string(),
        url,
        scheme,
        host,
        port,
    })
}

/// True when `raw` opens with an RFC 3986 scheme followed by `://`.
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

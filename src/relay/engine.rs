//! Relay engine: one inbound request in, one outbound request out, and the
//! target's response streamed back.
//!
//! # Data Flow
//! ```text
//! inbound (method, body stream)
//!     → outbound request (same method, synthetic headers, body passthrough)
//!     → [watchdog: no progress for the limit → 504, outbound dropped]
//!     → target response (status + headers verbatim, body streamed)
//!     → [watchdog: no progress mid-stream → stream terminated]
//! ```

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, LOCATION, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use axum::response::Response;
use futures_util::StreamExt;
use reqwest::redirect;

use crate::config::RelaySettings;
use crate::net::connection::InFlightGuard;

use super::error::RelayError;
use super::target::TargetSpec;
use super::watchdog::{Inactive, Watchdog};

/// Error building the outbound client.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid user agent `{0}`")]
    UserAgent(String),
    #[error("failed to build outbound client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Headers sent on every outbound request, regardless of what the caller sent.
pub fn synthetic_headers(user_agent: HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// `GET` and `HEAD` are dispatched with an empty body.
pub fn forwards_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

pub struct RelayEngine {
    client: reqwest::Client,
    headers: HeaderMap,
    inactivity: Duration,
}

impl RelayEngine {
    pub fn new(settings: &RelaySettings) -> Result<Self, EngineError> {
        let user_agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|_| EngineError::UserAgent(settings.user_agent.clone()))?;

        if settings.accept_invalid_certs {
            tracing::warn!(
                setting = "relay.accept_invalid_certs",
                "Certificate verification is disabled for outbound HTTPS"
            );
        }

        // Redirects are relayed to the caller, never followed. No decoding
        // features are enabled, so compressed bodies pass through untouched.
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            headers: synthetic_headers(user_agent),
            inactivity: Duration::from_secs(settings.inactivity_timeout_secs),
        })
    }

    pub fn outbound_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn inactivity_limit(&self) -> Duration {
        self.inactivity
    }

    /// Relay `inbound` to `target`.
    ///
    /// Errors are only returned before response headers exist. Once the
    /// response is handed back, a fault can only terminate its body stream.
    pub async fn relay(
        &self,
        inbound: Request<Body>,
        target: TargetSpec,
        mut guard: InFlightGuard,
    ) -> Result<Response, RelayError> {
        let (parts, body) = inbound.into_parts();
        let method = parts.method;
        let watchdog = Watchdog::new(self.inactivity);

        tracing::debug!(
            relay_id = %guard.id(),
            method = %method,
            target_url = %target,
            host = target.host(),
            port = target.port(),
            path = %target.request_target(),
            "Dispatching to target"
        );

        let mut outbound = self
            .client
            .request(method.clone(), target.url().clone())
            .headers(self.headers.clone());

        if forwards_body(&method) {
            let stream = watchdog.track(body.into_data_stream());
            outbound = outbound.body(reqwest::Body::wrap_stream(stream));
        }

        let response = match watchdog.guard(outbound.send()).await {
            Ok(Ok(response)) => {
                // Response headers are progress; the body gets a full window.
                watchdog.touch();
                response
            }
            Ok(Err(e)) => {
                let err = RelayError::from_transport(&e, &target);
                tracing::warn!(
                    relay_id = %guard.id(),
                    code = err.code().as_str(),
                    error = %e,
                    target_url = target.raw(),
                    "Relay failed"
                );
                guard.complete();
                return Err(err);
            }
            Err(Inactive) => {
                tracing::warn!(
                    relay_id = %guard.id(),
                    limit_secs = self.inactivity.as_secs(),
                    target_url = target.raw(),
                    "Target made no progress, outbound request aborted"
                );
                guard.complete();
                return Err(RelayError::timed_out(&target, self.inactivity));
            }
        };

        let status = response.status();
        if status.is_redirection() {
            if let Some(location) = response.headers().get(LOCATION) {
                tracing::info!(
                    relay_id = %guard.id(),
                    status = status.as_u16(),
                    location = ?location,
                    "Target redirected, relaying unchanged"
                );
            }
        }
        tracing::info!(
            relay_id = %guard.id(),
            status = status.as_u16(),
            target_url = target.raw(),
            "Relaying response"
        );

        let headers = response.headers().clone();
        let body = stream_body(response, watchdog, guard);

        let mut relayed = Response::new(body);
        *relayed.status_mut() = status;
        *relayed.headers_mut() = headers;
        Ok(relayed)
    }
}

/// Stream the target body to the caller. The in-flight guard lives as long
/// as the stream, so a caller that disconnects mid-body is observed on drop.
fn stream_body(response: reqwest::Response, watchdog: Watchdog, guard: InFlightGuard) -> Body {
    let chunks = watchdog.bounded(response.bytes_stream());
    let state = (Box::pin(chunks), guard);

    let stream = futures_util::stream::unfold(state, |(mut chunks, mut guard)| async move {
        match chunks.next().await {
            Some(Ok(chunk)) => Some((Ok(chunk), (chunks, guard))),
            Some(Err(e)) => {
                tracing::warn!(
                    relay_id = %guard.id(),
                    error = %e,
                    "Target stream failed after headers were sent, terminating response"
                );
                guard.complete();
                Some((Err(e), (chunks, guard)))
            }
            None => {
                guard.complete();
                None
            }
        }
    });

    Body::from_stream(stream)
}

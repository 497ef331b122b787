//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay route and service endpoints
//! - Wire up middleware (request ID, tracing, panic capture, CORS)
//! - Bind server to listener and serve until shutdown
//! - Hand relay requests to the relay engine
//! - Drain in-flight relays on shutdown

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::endpoints;
use crate::http::request::{request_id, MakeRelayRequestId, X_REQUEST_ID};
use crate::http::response::{panic_response, ErrorBody};
use crate::lifecycle::shutdown;
use crate::net::connection::InFlightTracker;
use crate::observability::metrics::{self, Outcome};
use crate::relay::{extract_target, resolve, EngineError, RelayEngine};
use crate::security::headers::{apply_security_headers, cors_layer};

/// How long in-flight relays may keep running after shutdown is signalled.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RelayEngine>,
    pub tracker: InFlightTracker,
    pub prefix: Arc<str>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    tracker: InFlightTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let engine = Arc::new(RelayEngine::new(&config.relay)?);
        let tracker = InFlightTracker::new(config.listener.max_connections);

        let state = AppState {
            engine,
            tracker: tracker.clone(),
            prefix: Arc::from(config.relay.prefix.as_str()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            tracker,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let base = config.relay.prefix.trim_end_matches('/');
        let relay = Router::new()
            .route(&format!("{base}/{{*target}}"), any(relay_handler))
            .route(&format!("{base}/"), any(relay_handler))
            .route(base, any(relay_handler));

        let mut service = Router::new()
            .route("/", get(endpoints::root))
            .route("/health", get(endpoints::health))
            .route("/api", get(endpoints::api_info))
            .fallback(endpoints::not_found);
        if config.security.enable_headers {
            service = service.layer(middleware::from_fn(apply_security_headers));
        }

        let router = relay.merge(service).with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRelayRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(CatchPanicLayer::custom(panic_response)),
        );

        if config.security.enable_cors {
            router.layer(cors_layer())
        } else {
            router
        }
    }

    /// Run the server until `shutdown` fires, then drain in-flight relays.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.relay.prefix,
            inactivity_timeout_secs = self.config.relay.inactivity_timeout_secs,
            max_in_flight = self.tracker.max_in_flight(),
            "HTTP server starting"
        );

        let drain_signal = shutdown.resubscribe();
        let tracker = self.tracker.clone();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .into_future();

        tokio::select! {
            res = serve => res?,
            _ = async {
                shutdown::wait(drain_signal).await;
                if tracker.drain(DRAIN_DEADLINE).await {
                    // Relays are done; let the server finish closing connections.
                    std::future::pending::<()>().await;
                }
            } => {
                tracing::warn!(
                    in_flight = tracker.active_count(),
                    deadline_secs = DRAIN_DEADLINE.as_secs(),
                    "Drain deadline elapsed, cutting off in-flight relays"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn tracker(&self) -> &InFlightTracker {
        &self.tracker
    }
}

/// Relay handler: resolve the target from the path, then hand off to the
/// engine. Validation failures never touch the network.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_default();
    let raw = extract_target(path_and_query, &state.prefix)
        .unwrap_or_default()
        .to_string();

    let target = match resolve(&raw) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, target_url = %raw, "Rejected relay target");
            metrics::record_request(&method, 400, Outcome::Rejected, start);
            return ErrorBody::validation(&e, &state.prefix).into_response_with(StatusCode::BAD_REQUEST);
        }
    };

    let Some(guard) = state.tracker.try_track() else {
        tracing::warn!(target_url = target.raw(), "In-flight ceiling reached, rejecting relay");
        metrics::record_request(&method, 503, Outcome::Rejected, start);
        return ErrorBody::at_capacity(target.raw(), state.tracker.max_in_flight())
            .into_response_with(StatusCode::SERVICE_UNAVAILABLE);
    };

    tracing::info!(relay_id = %guard.id(), method = %method, target_url = target.raw(), "Relaying request");

    match state.engine.relay(request, target, guard).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), Outcome::Relayed, start);
            response
        }
        Err(e) => {
            metrics::record_request(&method, e.status().as_u16(), Outcome::Failed, start);
            e.into_response()
        }
    }
}

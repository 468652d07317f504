//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum router that hands every request to the `App`
//! - Wire up middleware (tracing, body limit, timeout, request ID)
//! - Buffer request bodies and convert between axum and engine types
//! - Bind to a listener and serve until shutdown

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request as HttpRequest, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Router as AxumRouter,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::App;
use crate::config::AppConfig;
use crate::http::request::{Request, X_REQUEST_ID};
use crate::observability::metrics;

#[derive(Clone)]
struct ServerState {
    app: Arc<App>,
    max_body_bytes: usize,
}

/// HTTP front end for an [`App`].
pub struct HttpServer {
    router: AxumRouter,
}

impl HttpServer {
    pub fn new(app: App, config: &AppConfig) -> Self {
        let state = ServerState {
            app: Arc::new(app),
            max_body_bytes: config.limits.max_body_bytes,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: ServerState) -> AxumRouter {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        AxumRouter::new().fallback(dispatch_handler).with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.limits.request_timeout_secs,
                ))),
        )
    }

    /// The configured axum router, for embedding or in-process testing.
    pub fn into_router(self) -> AxumRouter {
        self.router
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the request, run it through the app, and convert the response.
async fn dispatch_handler(
    State(state): State<ServerState>,
    request: HttpRequest<Body>,
) -> HttpResponse {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(method = %method, path = %parts.uri.path(), error = %err, "Rejected request body");
            metrics::record_request(&method, StatusCode::PAYLOAD_TOO_LARGE.as_u16(), start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = Request::from_parts(parts, bytes);
    let response = state.app.handle(request).await;

    metrics::record_request(&method, response.status_code().as_u16(), start_time);
    response.into_http()
}

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{config, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let config = config();

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes())
        .fallback(fallback)
        // Global middleware
        .layer(middleware::map_response(method_not_allowed))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(collection_routes())
        .merge(request_routes())
        .merge(run_routes())
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn collection_routes() -> Router<AppState> {
    use protected::*;

    Router::new()
        .route("/api/collections", get(collection_list).post(collection_create))
        .route(
            "/api/collections/:id",
            get(collection_get)
                .patch(collection_update)
                .delete(collection_delete),
        )
        .route("/api/collections/:id/requests", get(collection_requests))
}

fn request_routes() -> Router<AppState> {
    use protected::*;

    Router::new()
        .route("/api/requests", get(request_list).post(request_create))
        .route(
            "/api/requests/:id",
            get(request_get).patch(request_update).delete(request_delete),
        )
        .route("/api/requests/:id/duplicate", post(request_duplicate))
}

fn run_routes() -> Router<AppState> {
    use protected::*;

    Router::new()
        // Run history for a single request
        .route(
            "/api/requests/:id/runs",
            get(run_list).post(run_create).delete(run_clear),
        )
        // Cross-request views
        .route("/api/runs", get(run_recent))
        .route("/api/runs/:id", get(run_get).delete(run_delete))
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Give the router's bare 405 the error envelope, keeping its Allow header
async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut response = ApiError::method_not_allowed("Method not allowed for this route").into_response();
    if let Some(allow) = allow {
        response.headers_mut().insert(header::ALLOW, allow);
    }
    response
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Bind and serve until ctrl-c
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("API tester listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

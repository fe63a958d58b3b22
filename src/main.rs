use axum::extract::{MatchedPath, Request};
use axum::Router;
use foodgram_server::api::{self, AppState};
use foodgram_server::config::Config;
use foodgram_server::db;
use foodgram_server::telemetry::init_telemetry;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// API routes are wrapped so trailing slashes are stripped before routing;
/// Swagger UI sits outside that wrapper since it redirects to its own
/// slash-terminated index.
fn app(state: AppState) -> Router {
    let api_routes = api::router()
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi()))
        .fallback_service(NormalizePathLayer::trim_trailing_slash().layer(api_routes))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        return match api::openapi().to_pretty_json() {
            Ok(spec) => {
                println!("{spec}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("failed to serialize OpenAPI document: {e}");
                ExitCode::FAILURE
            }
        };
    }

    init_telemetry();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match db::create_pool(&config.database_url, config.db_pool_size) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };

    let base_url = config.public_base_url.clone();
    let state = AppState {
        pool: Arc::new(pool),
        config: Arc::new(config),
    };

    tracing::info!("Server listening on {}", listen_addr(&listener));
    tracing::info!("Swagger UI available at {base_url}/swagger-ui/");
    tracing::info!("OpenAPI spec available at {base_url}/api-docs/openapi.json");

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn listen_addr(listener: &tokio::net::TcpListener) -> String {
    listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown address".to_string())
}

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use http::{HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::handlers::{jwt, session};
use crate::state::AppState;

/// Builds the HTTP surface for both credential schemes.
///
/// Login routes are rate limited per peer IP, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AppState) -> anyhow::Result<Router> {
    let origins = state
        .config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid CORS origin")?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let login_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.login_replenish_seconds)
            .burst_size(state.config.login_burst)
            .use_headers()
            .finish()
            .context("Invalid login rate limit (replenish interval and burst must be non-zero)")?,
    );

    let login_routes = Router::new()
        .route("/api/jwt/login", post(jwt::login))
        .route("/api/session/login", post(session::login))
        .layer(tower_governor::GovernorLayer::new(login_governor_conf))
        .with_state(state.clone());

    let credential_routes = Router::new()
        .route("/api/jwt/check", get(jwt::check_token))
        .route("/api/jwt/refresh", post(jwt::refresh))
        .route("/api/jwt/logout", post(jwt::logout))
        .route("/api/session/check", get(session::check_session))
        .route("/api/session/refresh", post(session::refresh))
        .route("/api/session/logout", post(session::logout))
        .with_state(state);

    Ok(Router::new()
        .merge(login_routes)
        .merge(credential_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors))
}

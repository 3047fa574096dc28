use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Artifact, Result},
    handlers::cookies::{self, SESSION_COOKIE},
    handlers::jwt::{AuthResponse, LoginRequest},
    models::principal::Principal,
    models::session::SessionSnapshot,
    state::AppState,
    validation::auth::validate_login,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheckResponse {
    pub success: bool,
    pub user: Principal,
    pub session_info: SessionSnapshot,
}

fn presented_session(cookies: &Cookies) -> Result<String> {
    cookies::read(cookies, SESSION_COOKIE).ok_or(AppError::ArtifactNotFound(Artifact::Session))
}

/// Handles session login.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies; receives the `sessionId` cookie.
/// * `payload` - The submitted username and password.
///
/// # Returns
///
/// A `Response` with an `AuthResponse` body, or `CredentialInvalid`.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Session login attempt for: {}", payload.username);
    validate_login(&payload.username, &payload.password)?;

    let principal = state
        .credentials
        .authenticate(&payload.username, &payload.password)
        .await?;
    let session = state.sessions.create(&principal).await?;

    cookies.add(cookies::expiring_cookie(
        SESSION_COOKIE,
        session.id.to_string(),
        session.expires_at,
        state.config.secure_cookies,
    )?);
    tracing::info!("✅ Session cookie added for user: {}", principal.id);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Looks up the presented session.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies carrying `sessionId`.
///
/// # Returns
///
/// The principal and a session snapshot, or a not-found, expired or invalid error.
#[axum::debug_handler]
pub async fn check_session(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<SessionCheckResponse>> {
    let session_id = presented_session(&cookies)?;
    let checked = state.sessions.check(&session_id).await?;

    Ok(Json(SessionCheckResponse {
        success: true,
        user: checked.principal,
        session_info: checked.snapshot,
    }))
}

/// Extends the presented session and re-issues its cookie.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies; `sessionId` is re-set with the new expiry.
///
/// # Returns
///
/// A `Response` with an `AuthResponse` body, or a not-found or expired error.
#[axum::debug_handler]
pub async fn refresh(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let session_id = presented_session(&cookies)?;
    let expires_at = state.sessions.refresh(&session_id).await?;

    cookies.add(cookies::expiring_cookie(
        SESSION_COOKIE,
        session_id,
        expires_at,
        state.config.secure_cookies,
    )?);

    let response = AuthResponse {
        success: true,
        message: "Session extended".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Deletes the presented session and its cookie.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies; `sessionId` is removed.
///
/// # Returns
///
/// A `Response` with an `AuthResponse` body. Succeeds without a session too.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    if let Some(session_id) = cookies::read(&cookies, SESSION_COOKIE) {
        state.sessions.revoke(&session_id).await?;
    }

    cookies::remove(&cookies, SESSION_COOKIE);
    tracing::info!("✅ Session cookie removed");

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

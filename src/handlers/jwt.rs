use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    error::{AppError, Artifact, Result},
    handlers::cookies::{self, JWT_COOKIE},
    models::claims::{TokenClaims, TokenHeader},
    models::principal::Principal,
    state::AppState,
    validation::auth::validate_login,
};

/// The request payload for a login form.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The response payload for state-changing requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// Everything the dashboard shows about a verified token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtInfo {
    pub token: String,
    pub header: TokenHeader,
    pub payload: TokenClaims,
    pub signature: String,
    pub is_valid: bool,
    /// Human-readable expiry.
    pub expires_in: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtCheckResponse {
    pub success: bool,
    pub user: Principal,
    pub jwt_info: JwtInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtLogoutResponse {
    pub success: bool,
    pub message: String,
    /// When set, the discarded token would still verify until this instant.
    pub still_valid_until: Option<DateTime<Utc>>,
}

fn presented_token(cookies: &Cookies) -> Result<String> {
    cookies::read(cookies, JWT_COOKIE).ok_or(AppError::ArtifactNotFound(Artifact::Token))
}

/// Handles token login.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies; receives the `jwt` cookie.
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
    tracing::info!("🔐 JWT login attempt for: {}", payload.username);
    validate_login(&payload.username, &payload.password)?;

    let principal = state
        .credentials
        .authenticate(&payload.username, &payload.password)
        .await?;
    let token = state.tokens.issue(&principal)?;

    cookies.add(cookies::max_age_cookie(
        JWT_COOKIE,
        token.encoded,
        state.tokens.ttl(),
        state.config.secure_cookies,
    ));
    tracing::info!("✅ JWT cookie added for user: {}", principal.id);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Verifies the presented token and returns its decoded parts.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies carrying `jwt`.
///
/// # Returns
///
/// The principal and decoded token, or a not-found, expired or invalid error.
#[axum::debug_handler]
pub async fn check_token(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<JwtCheckResponse>> {
    let token = presented_token(&cookies)?;
    let verified = state.tokens.verify(&token)?;

    let expires_in = verified.claims.expires_display();
    Ok(Json(JwtCheckResponse {
        success: true,
        user: verified.principal,
        jwt_info: JwtInfo {
            token: verified.encoded,
            header: verified.header,
            payload: verified.claims,
            signature: verified.signature,
            is_valid: true,
            expires_in,
        },
    }))
}

/// Swaps the presented token for a freshly issued one.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies; `jwt` is overwritten on success.
///
/// # Returns
///
/// A `Response` with an `AuthResponse` body, or the verification error.
#[axum::debug_handler]
pub async fn refresh(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let token = presented_token(&cookies)?;
    let fresh = state.tokens.refresh(&token)?;

    cookies.add(cookies::max_age_cookie(
        JWT_COOKIE,
        fresh.encoded,
        state.tokens.ttl(),
        state.config.secure_cookies,
    ));

    let response = AuthResponse {
        success: true,
        message: "Token refreshed".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Drops the token cookie. The token itself stays valid until it expires.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies; `jwt` is removed.
///
/// # Returns
///
/// A `Response` reporting until when the discarded token would still verify.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let token = cookies::read(&cookies, JWT_COOKIE);
    let still_valid_until = state.tokens.revoke(token.as_deref());

    cookies::remove(&cookies, JWT_COOKIE);
    tracing::info!("✅ JWT cookie removed");

    let response = JwtLogoutResponse {
        success: true,
        message: "Logout successful".to_string(),
        still_valid_until,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

//! Axum-based HTTP gateway for the auth core.
//!
//! - Request body size limits and request timeouts
//! - CORS locked to the configured client origin, with credentials enabled
//!   so the browser sends the httpOnly refresh cookie
//! - Refresh secrets travel only in the protected cookie, never in JSON
//!   bodies or URLs; access tokens only in the Authorization header

use crate::auth::service::{RefreshOutcome, RegisterRequest};
use crate::auth::sweeper::Sweeper;
use crate::auth::{AuthError, AuthService, ClientContext, Role, SessionStore, TokenCodec};
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (10KB) — auth payloads are tiny
pub const MAX_BODY_SIZE: usize = 10_240;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Name of the refresh-secret cookie.
const REFRESH_COOKIE: &str = "refresh_token";
/// Cookie path: the secret is only ever sent back to the auth routes.
const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AuthService>,
    pub refresh_ttl_secs: u64,
    pub secure_cookies: bool,
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    if config.auth.token_secret.trim().is_empty() {
        anyhow::bail!(
            "token signing secret is not configured — set {} or [auth] token_secret",
            crate::config::TOKEN_SECRET_ENV
        );
    }

    std::fs::create_dir_all(&config.workspace_dir).with_context(|| {
        format!(
            "failed to create workspace dir {}",
            config.workspace_dir.display()
        )
    })?;
    let db_path = config.db_path();
    let store = Arc::new(SessionStore::open(&db_path)?);
    tracing::info!("session store initialized at {}", db_path.display());

    let codec = TokenCodec::new(&config.auth.token_secret, config.auth.access_ttl_secs);
    let service = Arc::new(AuthService::new(
        Arc::clone(&store),
        codec,
        config.auth.refresh_ttl_secs,
    ));

    let sweeper = Sweeper::new(
        Arc::clone(&store),
        config.auth.sweep_interval_secs,
        config.auth.revoked_retention_secs,
    )
    .spawn();

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let display_addr = listener.local_addr()?;

    println!("🔐 membergate listening on http://{display_addr}");
    println!("  POST  /api/auth/login                    — authenticate, set refresh cookie");
    println!("  POST  /api/auth/refresh                  — rotate refresh token (cookie)");
    println!("  POST  /api/auth/logout                   — revoke current session");
    println!("  GET   /api/auth/me                       — current user (bearer token)");
    println!("  POST  /api/auth/register                 — create staff account (admin)");
    println!("  GET   /api/auth/staff                    — list accounts (admin)");
    println!("  PATCH /api/auth/staff/{{id}}/deactivate    — deactivate + revoke (admin)");
    println!("  PATCH /api/auth/staff/{{id}}/reactivate    — reactivate (admin)");
    println!("  GET   /health                            — health check");
    println!("  Press Ctrl+C to stop.\n");

    let state = AppState {
        service,
        refresh_ttl_secs: config.auth.refresh_ttl_secs,
        secure_cookies: config.gateway.secure_cookies,
    };

    // ── CORS — credentials:true required for the httpOnly cookie ──
    let client_origin: HeaderValue = config
        .gateway
        .client_url
        .parse()
        .with_context(|| format!("invalid client_url {:?}", config.gateway.client_url))?;
    let cors = CorsLayer::new()
        .allow_origin(client_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/refresh", post(handle_refresh))
        .route("/api/auth/logout", post(handle_logout))
        .route("/api/auth/me", get(handle_me))
        .route("/api/auth/register", post(handle_register))
        .route("/api/auth/staff", get(handle_staff_list))
        .route(
            "/api/auth/staff/{id}/deactivate",
            patch(handle_staff_deactivate),
        )
        .route(
            "/api/auth/staff/{id}/reactivate",
            patch(handle_staff_reactivate),
        )
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    sweeper.shutdown().await;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ══════════════════════════════════════════════════════════════════════════════

/// Concrete return type for plain JSON handlers.
type ApiResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(err: &AuthError) -> ApiResponse {
    let status = match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::MissingToken
        | AuthError::TokenExpired
        | AuthError::TokenInvalid
        | AuthError::MissingRefreshToken
        | AuthError::InvalidRefresh
        | AuthError::ReuseDetected => StatusCode::UNAUTHORIZED,
        AuthError::Inactive | AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        AuthError::NotFound(_) => StatusCode::NOT_FOUND,
        AuthError::Conflict(_) => StatusCode::CONFLICT,
        AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({"success": false, "error": err.to_string()})),
    )
}

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Validate the bearer token and return its claims.
fn require_claims(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<crate::auth::AccessClaims, ApiResponse> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| error_response(&AuthError::MissingToken))?;
    state
        .service
        .authenticate_access(token)
        .map_err(|e| error_response(&e))
}

/// Validate the bearer token and require the admin role.
fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<crate::auth::AccessClaims, ApiResponse> {
    let claims = require_claims(state, headers)?;
    if claims.role != Role::Admin {
        return Err(error_response(&AuthError::Forbidden(
            "Access denied — required: admin".into(),
        )));
    }
    Ok(claims)
}

/// Pull the refresh secret out of the Cookie header.
fn refresh_cookie_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Build the protected refresh cookie: httpOnly, cross-site-strict, scoped
/// to the auth routes.
fn build_refresh_cookie(secret: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{REFRESH_COOKIE}={secret}; HttpOnly; SameSite=Strict; \
         Path={REFRESH_COOKIE_PATH}; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expire the refresh cookie on the client.
fn clear_refresh_cookie(secure: bool) -> String {
    build_refresh_cookie("", 0, secure)
}

/// Originating client address, preferring proxy-set headers.
fn client_context(headers: &HeaderMap) -> ClientContext {
    let mut ip = None;
    for header_name in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                ip = Some(first.to_owned());
                break;
            }
        }
    }
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    ClientContext { ip, user_agent }
}

fn with_cookie(status: StatusCode, cookie: String, body: serde_json::Value) -> Response {
    (status, [(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// GET /health — always public (no secrets leaked)
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "status": "healthy",
        "timestamp": crate::auth::epoch_secs(),
    }))
}

/// Request body for login.
#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

/// POST /api/auth/login — verify credentials, issue both tokens.
async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginBody>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(&AuthError::Validation(
            "Email and password are required".into(),
        ))
        .into_response();
    };

    let ctx = client_context(&headers);
    match state.service.login(&body.email, &body.password, &ctx) {
        Ok(outcome) => with_cookie(
            StatusCode::OK,
            build_refresh_cookie(
                &outcome.refresh_secret,
                state.refresh_ttl_secs,
                state.secure_cookies,
            ),
            serde_json::json!({
                "success": true,
                "message": "Login successful",
                "accessToken": outcome.access_token,
                "user": outcome.principal,
            }),
        ),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST /api/auth/refresh — silent token rotation. The refresh secret
/// arrives only via the protected cookie; there is no body.
async fn handle_refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(raw_secret) = refresh_cookie_from_headers(&headers) else {
        return error_response(&AuthError::MissingRefreshToken).into_response();
    };

    let ctx = client_context(&headers);
    match state.service.refresh(&raw_secret, &ctx) {
        Ok(RefreshOutcome {
            access_token,
            refresh_secret,
        }) => with_cookie(
            StatusCode::OK,
            build_refresh_cookie(&refresh_secret, state.refresh_ttl_secs, state.secure_cookies),
            serde_json::json!({"success": true, "accessToken": access_token}),
        ),
        Err(e @ AuthError::ReuseDetected) => {
            // Instruct the caller to drop its local session token too.
            let (status, Json(body)) = error_response(&e);
            with_cookie(status, clear_refresh_cookie(state.secure_cookies), body)
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST /api/auth/logout — always succeeds, clears the cookie.
async fn handle_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(raw_secret) = refresh_cookie_from_headers(&headers) {
        if let Err(e) = state.service.logout(&raw_secret) {
            return error_response(&e).into_response();
        }
    }
    with_cookie(
        StatusCode::OK,
        clear_refresh_cookie(state.secure_cookies),
        serde_json::json!({"success": true, "message": "Logged out successfully"}),
    )
}

/// GET /api/auth/me — current principal from the bearer token.
async fn handle_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let claims = match require_claims(&state, &headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.service.me(&claims) {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "user": user})),
        ),
        Err(e) => error_response(&e),
    }
}

/// Request body for staff registration.
#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
    #[serde(default = "default_role")]
    role: String,
    full_name: Option<String>,
    phone: Option<String>,
}

fn default_role() -> String {
    "staff".into()
}

/// POST /api/auth/register — admin only; creates staff accounts.
async fn handle_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RegisterBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let claims = match require_admin(&state, &headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Ok(Json(body)) = body else {
        return error_response(&AuthError::Validation(
            "Username, email and password are required".into(),
        ));
    };

    let request = RegisterRequest {
        username: &body.username,
        email: &body.email,
        password: &body.password,
        role: &body.role,
        full_name: body.full_name.as_deref(),
        phone: body.phone.as_deref(),
    };
    match state.service.register_staff(&claims.sub, &request) {
        Ok(user) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Staff account created successfully",
                "user": user,
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /api/auth/staff — admin only; all accounts with creator info.
async fn handle_staff_list(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    if let Err(resp) = require_admin(&state, &headers) {
        return resp;
    }
    match state.service.list_staff() {
        Ok(staff) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "staff": staff})),
        ),
        Err(e) => error_response(&e),
    }
}

/// PATCH /api/auth/staff/{id}/deactivate — admin only.
async fn handle_staff_deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    let claims = match require_admin(&state, &headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.service.deactivate_staff(&claims.sub, &id) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Staff member deactivated"})),
        ),
        Err(e) => error_response(&e),
    }
}

/// PATCH /api/auth/staff/{id}/reactivate — admin only.
async fn handle_staff_reactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    if let Err(resp) = require_admin(&state, &headers) {
        return resp;
    }
    match state.service.reactivate_staff(&id) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Staff member reactivated"})),
        ),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn refresh_cookie_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(refresh_cookie_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            "theme=dark; refresh_token=s3cret; lang=en".parse().unwrap(),
        );
        assert_eq!(
            refresh_cookie_from_headers(&headers).as_deref(),
            Some("s3cret")
        );

        headers.insert(header::COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(refresh_cookie_from_headers(&headers), None);
    }

    #[test]
    fn refresh_cookie_attributes() {
        let cookie = build_refresh_cookie("s3cret", 604_800, true);
        assert!(cookie.starts_with("refresh_token=s3cret;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/api/auth"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.ends_with("Secure"));

        let dev_cookie = build_refresh_cookie("s3cret", 604_800, false);
        assert!(!dev_cookie.contains("Secure"));

        let cleared = clear_refresh_cookie(true);
        assert!(cleared.starts_with("refresh_token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn client_context_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", "203.0.113.9, 10.0.0.2".parse().unwrap());
        headers.insert(header::USER_AGENT, "test-agent/1.0".parse().unwrap());

        let ctx = client_context(&headers);
        assert_eq!(ctx.ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(ctx.user_agent.as_deref(), Some("test-agent/1.0"));

        let empty = client_context(&HeaderMap::new());
        assert_eq!(empty.ip, None);
        assert_eq!(empty.user_agent, None);
    }

    #[test]
    fn error_statuses_match_taxonomy() {
        let cases = [
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::TokenInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidRefresh, StatusCode::UNAUTHORIZED),
            (AuthError::ReuseDetected, StatusCode::UNAUTHORIZED),
            (AuthError::Inactive, StatusCode::FORBIDDEN),
            (AuthError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AuthError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AuthError::Conflict("x".into()), StatusCode::CONFLICT),
            (AuthError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, _) = error_response(&err);
            assert_eq!(status, expected, "wrong status for {err:?}");
        }
    }

    #[test]
    fn internal_error_message_is_suppressed() {
        let (_, Json(body)) = error_response(&AuthError::Internal);
        let message = body["error"].as_str().unwrap();
        assert_eq!(message, "Something went wrong. Please try again later.");
    }
}

use axum::{
    Extension, Json,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::extract::ApiJson;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{AuthError, AuthUser, LoginResult, RegisterResult, UserInfo};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ConfirmEmailQuery {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::unauthorized("Invalid credentials"),
            AuthError::EmailNotConfirmed => Self::unauthorized("Email not confirmed"),
            AuthError::InvalidToken => Self::unauthorized("Invalid or expired token"),
            AuthError::UserNotFound => Self::NotFound("User not found".to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Conflict(msg) => Self::Conflict(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <jwt>` to an [`AuthUser`] request extension.
/// Requests without a valid token are rejected with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return ApiError::unauthorized("Missing bearer token").into_response();
    };

    match state.auth_service().verify_token(&token) {
        Ok(user) => {
            tracing::Span::current().record("user_id", user.id.as_str());
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and email a confirmation link
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResult>>), ApiError> {
    let result = state
        .auth_service()
        .register(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

/// GET /auth/confirm-email?user_id=..&token=..
pub async fn confirm_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .confirm_email(
            query.user_id.as_deref().unwrap_or_default(),
            query.token.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Email confirmed successfully".to_string(),
    })))
}

/// POST /auth/login
/// Authenticate with email and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state.auth_service().current_user(&user.id).await?;
    Ok(Json(ApiResponse::success(info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer abc.def.ghi")).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(
            extract_bearer_token(&headers("bearer  abc ")).as_deref(),
            Some("abc")
        );
        assert!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")).is_none());
        assert!(extract_bearer_token(&headers("Bearer ")).is_none());
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
    }
}

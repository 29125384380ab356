/// Access guard primitives for Axum
///
/// Extracts a candidate token from a request, verifies it with the
/// [`TokenService`], and produces the [`AuthContext`] that downstream
/// handlers read from request extensions.
///
/// # Token Sources
///
/// Checked in order of precedence; the first non-empty value wins:
///
/// 1. `x-auth-token` header
/// 2. `Authorization: Bearer <token>` header
/// 3. `token` cookie
///
/// A leading `Bearer ` prefix is stripped from whichever source supplied
/// the token.
///
/// # Example
///
/// ```
/// use axum::http::{HeaderMap, HeaderValue};
/// use tasklist_shared::auth::jwt::TokenService;
/// use tasklist_shared::auth::middleware::authenticate;
/// use tasklist_shared::models::id::RecordId;
///
/// let tokens = TokenService::new("secret");
/// let user_id = RecordId::generate();
///
/// let mut headers = HeaderMap::new();
/// let token = tokens.issue(&user_id).unwrap();
/// headers.insert("x-auth-token", HeaderValue::from_str(&token).unwrap());
///
/// let auth = authenticate(&headers, &tokens).unwrap();
/// assert_eq!(auth.user_id, user_id);
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{JwtError, TokenService};
use crate::models::id::RecordId;

/// Custom header carrying a raw token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Cookie carrying a raw token
pub const AUTH_TOKEN_COOKIE: &str = "token";

const BEARER_SCHEME: &str = "Bearer";

/// Where a token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// `x-auth-token` header
    Header,

    /// `Authorization: Bearer` header
    Bearer,

    /// `token` cookie
    Cookie,
}

/// Authentication context added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: RecordId,

    /// Where the token came from
    pub source: TokenSource,
}

/// Error type for the access guard
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token in any supported location
    #[error("No authentication token provided. Access denied.")]
    MissingCredentials,

    /// Token was valid but has expired
    #[error("Token has expired. Please login again.")]
    Expired,

    /// Token failed signature or structure checks
    #[error("Invalid token. Access denied.")]
    InvalidToken,

    /// Unexpected failure while verifying
    #[error("Authentication error")]
    Internal(String),
}

impl AuthError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            JwtError::Malformed(_) => AuthError::InvalidToken,
            JwtError::CreateError(msg) => AuthError::Internal(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref detail) = self {
            tracing::error!(error = %detail, "Auth middleware error");
        }

        let code = match self {
            AuthError::Internal(_) => "internal_error",
            _ => "unauthorized",
        };

        let body = Json(json!({
            "success": false,
            "error": code,
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.strip_prefix(BEARER_SCHEME) {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => value,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = strip_bearer(value);
    (!value.is_empty()).then_some(value)
}

/// Finds the candidate token in a request's headers
///
/// Returns `None` if no source carries a non-empty value.
pub fn extract_token(headers: &HeaderMap) -> Option<(String, TokenSource)> {
    let custom = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(non_empty)
        .map(|t| (t.to_string(), TokenSource::Header));

    if custom.is_some() {
        return custom;
    }

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(non_empty)
        .map(|t| (t.to_string(), TokenSource::Bearer));

    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(headers)
        .get(AUTH_TOKEN_COOKIE)
        .and_then(|cookie| non_empty(cookie.value()).map(str::to_string))
        .map(|t| (t, TokenSource::Cookie))
}

/// Resolves the authenticated user for a request
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if no token is present
/// - `AuthError::Expired` / `AuthError::InvalidToken` if verification fails
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthContext, AuthError> {
    let (token, source) = extract_token(headers).ok_or(AuthError::MissingCredentials)?;
    let user_id = tokens.verify(&token)?;

    Ok(AuthContext { user_id, source })
}

/// Account endpoints
///
/// - `POST /api/users/signup` - Create an account
/// - `POST /api/users/login` - Exchange credentials for a 24h token
/// - `GET  /api/users/test` - Liveness probe for the users router
///
/// Passwords are hashed and verified on the blocking pool so a slow
/// Argon2id run never stalls the async workers. Plaintext passwords are
/// never logged.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tasklist_shared::{
    auth::password,
    models::user::{
        CreateUser, UserSummary, EMAIL_MAX_LENGTH, PASSWORD_MIN_LENGTH, USERNAME_MAX_LENGTH,
        USERNAME_MIN_LENGTH,
    },
    store::StoreError,
};
use validator::Validate;

/// Signup request
///
/// Fields are optional so that a missing field produces the friendly
/// message rather than a deserialization error.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(
        min = USERNAME_MIN_LENGTH,
        max = USERNAME_MAX_LENGTH,
        message = "Username must be between 3 and 30 characters"
    ))]
    pub username: Option<String>,

    #[validate(
        email(message = "Please enter a valid email"),
        length(max = EMAIL_MAX_LENGTH, message = "Please enter a valid email")
    )]
    pub email: Option<String>,

    #[validate(length(min = PASSWORD_MIN_LENGTH, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// Public fields of a freshly created account
#[derive(Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

/// Signup response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user: NewUser,
}

/// Login request; `username` may hold either the username or the email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

/// Generic `{success, message}` body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.is_empty()).unwrap_or(false)
}

/// Creates a new account
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, invalid shape, or the username or
///   email is already taken ("User already exists")
/// - `500 Internal Server Error`: Store or hashing failure
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let Json(req) = body?;

    let missing = || ApiError::BadRequest("Please provide username, email, and password".to_string());

    if !(present(&req.username) && present(&req.email) && present(&req.password)) {
        tracing::debug!("Signup rejected: missing fields");
        return Err(missing());
    }

    req.validate()?;

    let (Some(username), Some(email), Some(plain)) = (req.username, req.email, req.password) else {
        return Err(missing());
    };

    tracing::info!(username = %username, email = %email, "Signup attempt");

    let exists = state
        .stores
        .users
        .exists_by_username_or_email(&username, &email)
        .await
        .map_err(|e| ApiError::internal("Server error during signup", e))?;

    if exists {
        tracing::info!(username = %username, "Signup rejected: user already exists");
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let params = state.hash_params();
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password_with(&plain, &params))
            .await?
            .map_err(|e| ApiError::internal("Server error during signup", e))?;

    // The existence check can race with a concurrent signup; the store
    // rejects the loser with DuplicateUser
    let user = state
        .stores
        .users
        .create(CreateUser {
            username,
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateUser => ApiError::from(StoreError::DuplicateUser),
            other => ApiError::internal("Server error during signup", other),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            message: "User created successfully".to_string(),
            user: NewUser {
                username: user.username,
                email: user.email,
            },
        }),
    ))
}

/// Authenticates a user and issues a token
///
/// Unknown user and wrong password produce the same response.
///
/// # Errors
///
/// - `400 Bad Request`: Missing field or "Invalid credentials"
/// - `500 Internal Server Error`: Store, verification, or signing failure
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;

    let (identifier, plain) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            tracing::debug!("Login rejected: missing fields");
            return Err(ApiError::BadRequest(
                "Please provide username and password".to_string(),
            ));
        }
    };

    tracing::info!(identifier = %identifier, "Login attempt");

    let invalid = || ApiError::BadRequest("Invalid credentials".to_string());

    let user = state
        .stores
        .users
        .find_by_username_or_email(&identifier)
        .await
        .map_err(|e| ApiError::internal("Server error during login", e))?;

    let Some(user) = user else {
        tracing::info!(identifier = %identifier, "Login failed: unknown user");
        return Err(invalid());
    };

    let stored_hash = user.password_hash.clone();
    let matched = tokio::task::spawn_blocking(move || password::verify_password(&plain, &stored_hash))
        .await?
        .map_err(|e| ApiError::internal("Server error during login", e))?;

    if !matched {
        tracing::info!(user_id = %user.id, "Login failed: password mismatch");
        return Err(invalid());
    }

    let token = state
        .tokens
        .issue(&user.id)
        .map_err(|e| ApiError::internal("Server error during login", e))?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: user.summary(),
    }))
}

/// Confirms the users router is mounted
pub async fn test_route() -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: "Users route is working!".to_string(),
    })
}

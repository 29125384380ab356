/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tasklist_api::{app::{build_router, AppState}, config::Config};
/// use tasklist_shared::store::Stores;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Stores::in_memory(), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tasklist_shared::{
    auth::{
        jwt::TokenService,
        middleware::{authenticate, AuthError},
        password::HashParams,
    },
    store::Stores,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// User and task stores
    pub stores: Stores,

    /// Issues and verifies identity tokens
    pub tokens: TokenService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(stores: Stores, config: Config) -> Self {
        Self {
            stores,
            tokens: TokenService::new(&config.jwt.secret),
            config: Arc::new(config),
        }
    }

    /// Password hashing work factor
    pub fn hash_params(&self) -> HashParams {
        self.config.password
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// ├── /api/
/// │   ├── /users/                  # public
/// │   │   ├── POST /signup
/// │   │   ├── POST /login
/// │   │   └── GET  /test
/// │   ├── /tasks/                  # access guard
/// │   │   ├── GET    / (trailing slash accepted)
/// │   │   ├── POST   /add
/// │   │   ├── GET    /:id
/// │   │   ├── PUT    /:id
/// │   │   ├── DELETE /:id
/// │   │   └── PATCH  /:id/toggle
/// │   └── *                        # 404 JSON
/// └── *                            # frontend bundle (production) or 404 JSON
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (permissive)
/// 3. JSON body for 405 responses
/// 4. Access guard (task routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let user_routes = Router::new()
        .route("/signup", post(routes::users::signup))
        .route("/login", post(routes::users::login))
        .route("/test", get(routes::users::test_route));

    let guard = axum::middleware::from_fn_with_state(state.clone(), auth_layer);

    // route_layer: unmatched paths under /api/tasks fall through to the 404
    // handler instead of answering 401
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/add", post(routes::tasks::add_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/toggle", patch(routes::tasks::toggle_task))
        .route_layer(guard.clone());

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        // Nesting only registers /api/tasks for the list route
        .route("/tasks/", get(routes::tasks::list_tasks).route_layer(guard))
        .fallback(api_not_found);

    let router = Router::new()
        .merge(health_routes)
        .nest("/api", api_routes);

    let router = if state.config.api.production {
        let static_dir = &state.config.api.static_dir;
        tracing::info!(dir = %static_dir.display(), "Serving frontend bundle");

        // Client-side routes resolve to the SPA entry point
        router.fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        )
    } else {
        router.fallback(not_found)
    };

    router
        .layer(axum::middleware::from_fn(json_method_not_allowed))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Access guard
///
/// Resolves the caller from `x-auth-token`, `Authorization: Bearer`, or the
/// `token` cookie (first present wins) and injects `AuthContext` into the
/// request extensions.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = authenticate(req.headers(), &state.tokens).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected request");
        e
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("API endpoint not found".to_string())
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Gives the router's bodiless 405 responses the JSON error envelope,
/// keeping the `Allow` header
async fn json_method_not_allowed(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut json = ApiError::MethodNotAllowed("Method not allowed".to_string()).into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(header::ALLOW, allow);
    }
    json
}

/// Application state and router builder
///
/// Defines the state shared by every handler and assembles the router with
/// its middleware stack.
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::{app::{build_router, AppState}, config::Config};
/// use projectdesk_shared::auth::throttle::MemoryAttemptStore;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let attempts = Arc::new(MemoryAttemptStore::new(config.throttle_policy()));
/// let app = build_router(AppState::new(pool, config, attempts));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use projectdesk_shared::auth::{middleware::authenticate, throttle::AttemptStore};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    pub config: Arc<Config>,

    /// Failed login counters, in memory or in Redis
    pub attempts: Arc<dyn AttemptStore>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, attempts: Arc<dyn AttemptStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            attempts,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /v1/
///     ├── /auth/login, /auth/logout     # public
///     ├── /auth/me                      # session
///     ├── /users/lookup, /users/signup  # public
///     ├── /users                        # Admin
///     ├── /team-leads, /developers      # Admin (+ Developer workspace)
///     ├── /projects                     # role checked per handler
///     ├── /modules                      # Developer
///     ├── /finance                      # Finance
///     └── /team-lead/reports            # Team Lead
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Compression
/// 4. Request tracing
/// 5. Session authentication (protected routers only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/users/lookup", get(routes::users::lookup))
        .route("/users/signup", put(routes::users::sign_up));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/users",
            post(routes::users::register).get(routes::users::list_users),
        )
        .route(
            "/team-leads",
            post(routes::team_leads::create_team_lead).get(routes::team_leads::list_team_leads),
        )
        .route("/team-leads/:id", put(routes::team_leads::update_team_lead))
        .route(
            "/developers",
            post(routes::developers::create_developer).get(routes::developers::list_developers),
        )
        .route("/developers/me/projects", get(routes::developers::my_projects))
        .route("/developers/:id", put(routes::developers::update_developer))
        .route(
            "/projects",
            post(routes::projects::create_projects).get(routes::projects::list_projects),
        )
        .route("/projects/stats", get(routes::projects::project_stats))
        .route("/projects/pending", get(routes::projects::pending_projects))
        .route("/projects/approved", get(routes::projects::approved_projects))
        .route("/projects/mine", get(routes::projects::my_projects))
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/:id/review", put(routes::projects::review_project))
        .route(
            "/projects/:id/appeal",
            get(routes::projects::get_appeal).post(routes::projects::appeal_project),
        )
        .route("/projects/:id/progress", patch(routes::projects::update_progress))
        .route("/projects/:id/complete", post(routes::projects::complete_project))
        .route(
            "/modules",
            post(routes::modules::create_module).get(routes::modules::list_my_modules),
        )
        .route(
            "/modules/:id",
            put(routes::modules::update_module).delete(routes::modules::delete_module),
        )
        .route("/modules/:id/start", post(routes::modules::start_module))
        .route("/modules/:id/complete", post(routes::modules::complete_module))
        .route("/finance", get(routes::finance::list_payments))
        .route("/finance/report", get(routes::finance::finance_report))
        .route("/finance/:id", patch(routes::finance::process_payment))
        .route("/team-lead/reports", get(routes::reports::team_lead_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive when `*` is configured, otherwise an explicit origin list
///
/// Credentials are allowed for listed origins so the session cookie is sent.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Session authentication middleware
///
/// Accepts the `authToken` cookie or an `Authorization: Bearer` header and
/// injects the caller's `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

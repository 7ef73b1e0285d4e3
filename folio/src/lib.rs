//! REST backend for a personal portfolio site.
//!
//! The service exposes a JSON API for blog posts, portfolio projects,
//! downloadable files, and inbound contact messages, guarded by JWT
//! authentication with three roles (admin, editor, viewer). Content reads
//! are public but capped to published rows for anonymous callers; writes
//! require a staff role, with ownership checks on updates and deletes.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum) -> api::handlers -> db::handlers (sqlx/Postgres)
//!                     |                 |
//!               api::models       db::models
//! ```
//!
//! - [`api`]: route handlers and the wire-format request/response types
//! - [`auth`]: password hashing, JWT issue/verify, request extractors, and
//!   the role/ownership policy helpers
//! - [`db`]: repositories and database-facing models
//! - [`uploads`]: multipart file intake and cleanup
//! - [`config`]: figment-based configuration (YAML + environment)
//!
//! # Example
//!
//! ```ignore
//! let args = folio::config::Args::parse();
//! let config = folio::Config::load(&args)?;
//! folio::telemetry::init_telemetry()?;
//! folio::Application::new(config).await?.serve(shutdown).await?;
//! ```

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Instant;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use bon::Builder;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;
pub mod uploads;

pub use config::Config;

use crate::{
    api::models::users::Role,
    auth::password,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
    types::UserId,
};

/// Shared application state passed to all request handlers
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Liveness endpoint: JSON status plus seconds since startup
async fn health() -> Json<serde_json::Value> {
    let uptime = STARTED_AT.get_or_init(Instant::now).elapsed().as_secs();
    Json(serde_json::json!({ "status": "ok", "uptime": uptime }))
}

/// Create the bootstrap admin account if no admin exists yet.
///
/// Idempotent: once any user holds the admin role this is a no-op, so a
/// demoted bootstrap account is not silently resurrected on restart.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, admin_password: &str, db: &PgPool) -> anyhow::Result<Option<UserId>> {
    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    if users.admin_exists().await? {
        return Ok(None);
    }

    let password_hash = password::hash_string(admin_password).context("hash bootstrap admin password")?;

    // Username defaults to the local part of the email
    let username = email.split('@').next().unwrap_or(email).to_string();

    let user = users
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            username,
            password_hash,
            role: Role::Admin,
            first_name: None,
            last_name: None,
        })
        .await?;

    tx.commit().await?;
    info!(email = %email, "Created bootstrap admin user");
    Ok(Some(user.id))
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = &config.cors.allowed_origins;

    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let mut header_values = Vec::new();
    for origin in origins {
        header_values.push(origin.parse::<HeaderValue>().with_context(|| format!("invalid CORS origin: {origin}"))?);
    }

    Ok(CorsLayer::new()
        .allow_origin(header_values)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Build the application router with all endpoints and middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    STARTED_AT.get_or_init(Instant::now);

    let auth_routes = Router::new()
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/refresh", post(api::handlers::auth::refresh))
        .route("/me", get(api::handlers::auth::me).put(api::handlers::auth::update_me))
        .route("/me/password", put(api::handlers::auth::change_password));

    let user_routes = Router::new()
        .route("/", get(api::handlers::users::list_users).post(api::handlers::users::create_user))
        .route(
            "/{user_id}",
            get(api::handlers::users::get_user)
                .put(api::handlers::users::update_user)
                .delete(api::handlers::users::delete_user),
        )
        .route("/{user_id}/stats", get(api::handlers::users::user_stats));

    let post_routes = Router::new()
        .route("/", get(api::handlers::posts::list_posts).post(api::handlers::posts::create_post))
        .route("/search", get(api::handlers::posts::search_posts))
        .route("/categories", get(api::handlers::posts::post_categories))
        .route("/tags", get(api::handlers::posts::post_tags))
        .route(
            "/{selector}",
            get(api::handlers::posts::get_post)
                .put(api::handlers::posts::update_post)
                .delete(api::handlers::posts::delete_post),
        );

    let project_routes = Router::new()
        .route(
            "/",
            get(api::handlers::projects::list_projects).post(api::handlers::projects::create_project),
        )
        .route("/featured", get(api::handlers::projects::featured_projects))
        .route("/categories", get(api::handlers::projects::project_categories))
        .route("/tags", get(api::handlers::projects::project_tags))
        .route("/technologies", get(api::handlers::projects::project_technologies))
        .route(
            "/{selector}",
            get(api::handlers::projects::get_project)
                .put(api::handlers::projects::update_project)
                .delete(api::handlers::projects::delete_project),
        );

    // The multipart routes need room for the file payload on top of the
    // text fields; everything else keeps the default body limit.
    let upload_body_limit =
        DefaultBodyLimit::max((state.config.uploads.max_file_size as usize) * state.config.uploads.max_files + 1024 * 1024);

    let download_routes = Router::new()
        .route(
            "/",
            get(api::handlers::downloads::list_downloads).post(api::handlers::downloads::create_download),
        )
        .route("/categories", get(api::handlers::downloads::download_categories))
        .route("/tags", get(api::handlers::downloads::download_tags))
        .route("/{selector}/file", get(api::handlers::downloads::fetch_download_file))
        .route(
            "/{selector}",
            get(api::handlers::downloads::get_download)
                .put(api::handlers::downloads::update_download)
                .delete(api::handlers::downloads::delete_download),
        )
        .layer(upload_body_limit);

    let contact_routes = Router::new()
        .route(
            "/",
            get(api::handlers::contacts::list_contacts).post(api::handlers::contacts::create_contact),
        )
        .route("/stats", get(api::handlers::contacts::contact_stats))
        .route(
            "/{contact_id}",
            get(api::handlers::contacts::get_contact).delete(api::handlers::contacts::delete_contact),
        )
        .route("/{contact_id}/status", put(api::handlers::contacts::update_contact_status))
        .route("/{contact_id}/spam", put(api::handlers::contacts::mark_contact_spam));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/posts", post_routes)
        .nest("/projects", project_routes)
        .nest("/downloads", download_routes)
        .nest("/contacts", contact_routes);

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled application: database pool, router, and configuration
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the database, run migrations, prepare the upload
    /// directory, seed the bootstrap admin, and build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database_url = config
            .database_url
            .as_deref()
            .context("database_url is not configured. Set DATABASE_URL or add database_url to the config file")?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        migrator().run(&pool).await.context("run database migrations")?;

        tokio::fs::create_dir_all(&config.uploads.dir)
            .await
            .with_context(|| format!("create upload directory {}", config.uploads.dir.display()))?;

        if let (Some(email), Some(admin_password)) = (&config.admin_email, &config.admin_password) {
            create_initial_admin_user(email, admin_password, &pool).await?;
        }

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Serve until the shutdown future resolves, then drain connections
    /// and close the pool.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Listening on http://{}", bind_addr);

        // Connect info is needed so contact submissions can record the
        // peer address when no proxy header is present.
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_origins(origins: &[&str]) -> Config {
        let mut config = Config::default();
        config.cors.allowed_origins = origins.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn cors_wildcard_builds() {
        assert!(create_cors_layer(&config_with_origins(&["*"])).is_ok());
    }

    #[test]
    fn cors_explicit_origins_build() {
        let config = config_with_origins(&["https://example.com", "http://localhost:5173"]);
        assert!(create_cors_layer(&config).is_ok());
    }

    #[test]
    fn cors_rejects_unparseable_origin() {
        let config = config_with_origins(&["https://example.com\u{0}"]);
        assert!(create_cors_layer(&config).is_err());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let body = health().await.0;
        assert_eq!(body["status"], "ok");
        assert!(body["uptime"].is_u64());
    }
}

//! api-server: HTTP API for the exercise tracker workspace.
//!
//! Records users and their logged exercises and serves filtered logs:
//! - `POST /api/exercise/new-user` (form or JSON: `username`)
//! - `POST /api/exercise/add` (form or JSON: `userId, description, duration, date?`)
//! - `GET  /api/exercise/log?userId=..&from=..&to=..&limit=..`
//! - `GET  /api/exercise/users`
//! - `GET  /` landing page, other GET paths from the public directory.
//!
//! Errors are answered with a status code and a plain-text body.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # throwaway in-memory store
//! DATABASE_URL=memory:// cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;
mod error;
mod extract;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{Query, State},
    handler::HandlerWithoutStateExt,
    routing::{get, get_service, post},
    Json, Router,
};
use chrono::NaiveDate;
use domain::adapters::memory_repo::InMemoryRepo;
use domain::service::ExerciseService;
use domain::{
    Clock, CoreError, Exercise, IdGenerator, LogQuery, NewExercise, User, UserId, UserRepository,
    Username,
};
use http_common::lenient;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{ApiError, ApiResult};
use crate::extract::FormOrJson;

// Local repo abstraction supporting memory or sqlite (feature-gated).
enum RepoKind {
    Memory(InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteRepo),
}

#[derive(Clone)]
struct AnyRepo {
    kind: Arc<RepoKind>,
}

impl AnyRepo {
    fn memory() -> Self {
        Self {
            kind: Arc::new(RepoKind::Memory(InMemoryRepo::new())),
        }
    }

    #[cfg(feature = "sqlite")]
    fn sqlite(path: &std::path::Path) -> Result<Self, CoreError> {
        Ok(Self {
            kind: Arc::new(RepoKind::Sqlite(sqlite_adapter::SqliteRepo::new(path)?)),
        })
    }
}

impl UserRepository for AnyRepo {
    fn get(&self, id: &UserId) -> Result<Option<User>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.get(id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.get(id),
        }
    }

    fn find_by_username(&self, username: &Username) -> Result<Option<User>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.find_by_username(username),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.find_by_username(username),
        }
    }

    fn insert(&self, user: User) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.insert(user),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.insert(user),
        }
    }

    fn push_exercise(&self, id: &UserId, exercise: Exercise) -> Result<Option<User>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.push_exercise(id, exercise),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.push_exercise(id, exercise),
        }
    }

    fn list(&self) -> Result<Vec<User>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.list(),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.list(),
        }
    }
}

/// Server-local calendar day.
#[derive(Clone, Copy)]
struct LocalClock;
impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Random user ids (UUID v4, 32 lowercase hex characters).
#[derive(Clone, Copy)]
struct UuidIds;
impl IdGenerator for UuidIds {
    fn next_id(&self) -> Result<UserId, CoreError> {
        UserId::new(uuid::Uuid::new_v4().simple().to_string())
    }
}

type AppService = ExerciseService<AnyRepo, UuidIds, LocalClock>;

#[derive(Clone)]
struct AppState {
    service: Arc<AppService>,
}

impl AppState {
    fn new(repo: AnyRepo) -> Self {
        Self {
            service: Arc::new(ExerciseService::new(repo, UuidIds, LocalClock)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);

    let repo = match build_repo(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, "failed to open store");
            std::process::exit(1);
        }
    };

    let app = app(AppState::new(repo), &cfg);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "bind failed");
            std::process::exit(1);
        }
    };
    info!(%addr, "api-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct a repository instance based on the configured connection string.
fn build_repo(cfg: &config::Config) -> Result<AnyRepo, CoreError> {
    match &cfg.store {
        config::StoreConfig::Memory => {
            info!("using in-memory store; data is lost on restart");
            Ok(AnyRepo::memory())
        }
        #[cfg(feature = "sqlite")]
        config::StoreConfig::Sqlite(path) => {
            info!(path = %path.display(), "using sqlite store");
            AnyRepo::sqlite(path)
        }
        // Rejected by Config::from_env when the feature is off.
        #[cfg(not(feature = "sqlite"))]
        config::StoreConfig::Sqlite(_) => Err(CoreError::Repository(
            "sqlite support not compiled in".into(),
        )),
    }
}

/// Build the full application router: API routes, static files, the 404
/// fallback, and the tracing/request-id/CORS layers.
fn app(state: AppState, cfg: &config::Config) -> Router {
    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let public = ServeDir::new(&cfg.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(not_found.into_service());

    let app = Router::new()
        .route(
            "/",
            get_service(ServeFile::new(&cfg.index_file)).fallback(not_found),
        )
        .route(
            "/api/exercise/new-user",
            post(create_user).fallback(not_found),
        )
        .route("/api/exercise/add", post(add_exercise).fallback(not_found))
        .route("/api/exercise/log", get(get_log).fallback(not_found))
        .route("/api/exercise/users", get(list_users).fallback(not_found))
        .fallback_service(public)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .with_state(state);

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app.layer(cors)
}

async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

#[derive(Deserialize)]
struct NewUserReq {
    #[serde(default, deserialize_with = "lenient::opt_scalar")]
    username: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddExerciseReq {
    #[serde(default, deserialize_with = "lenient::opt_scalar")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_scalar")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_scalar")]
    duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_scalar")]
    date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogParams {
    user_id: Option<String>,
    from: Option<String>,
    to: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize)]
struct NewUserOut {
    username: String,
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Serialize)]
struct ExerciseAddedOut {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    description: String,
    duration: serde_json::Value,
    /// Short human form, e.g. `Mon Jan 06 2020`.
    date: String,
}

#[derive(Serialize)]
struct ExerciseOut {
    description: String,
    duration: serde_json::Value,
    /// `YYYY-MM-DD`
    date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogOut {
    user_id: String,
    log: Vec<ExerciseOut>,
}

#[derive(Serialize)]
struct UserOut {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    exercises: Vec<ExerciseOut>,
}

fn exercise_to_out(ex: Exercise) -> ExerciseOut {
    ExerciseOut {
        description: ex.description,
        duration: http_common::json_number(ex.duration),
        date: http_common::iso_date(ex.date),
    }
}

fn user_to_out(user: User) -> UserOut {
    UserOut {
        id: user.id.as_str().to_string(),
        username: user.username.as_str().to_string(),
        exercises: user.exercises.into_iter().map(exercise_to_out).collect(),
    }
}

async fn create_user(
    State(state): State<AppState>,
    FormOrJson(body): FormOrJson<NewUserReq>,
) -> ApiResult<Json<NewUserOut>> {
    let user = state.service.create_user(body.username.as_deref())?;
    info!(user_id = %user.id.as_str(), username = %user.username.as_str(), "user created");
    Ok(Json(NewUserOut {
        username: user.username.as_str().to_string(),
        id: user.id.as_str().to_string(),
    }))
}

async fn add_exercise(
    State(state): State<AppState>,
    FormOrJson(body): FormOrJson<AddExerciseReq>,
) -> ApiResult<Json<ExerciseAddedOut>> {
    let input = NewExercise {
        user_id: body.user_id,
        description: body.description,
        duration: body.duration,
        date: body.date,
    };
    let added = state.service.add_exercise(&input)?;
    info!(user_id = %added.user_id.as_str(), date = %added.exercise.date, "exercise added");
    Ok(Json(ExerciseAddedOut {
        id: added.user_id.as_str().to_string(),
        username: added.username.as_str().to_string(),
        description: added.exercise.description,
        duration: http_common::json_number(added.exercise.duration),
        date: http_common::short_date(added.exercise.date),
    }))
}

async fn get_log(
    State(state): State<AppState>,
    Query(params): Query<LogParams>,
) -> ApiResult<Json<LogOut>> {
    let query = LogQuery {
        user_id: params.user_id,
        from: params.from,
        to: params.to,
        limit: params.limit,
    };
    let log = state.service.query_log(&query)?;
    Ok(Json(LogOut {
        user_id: log.user_id.as_str().to_string(),
        log: log.log.into_iter().map(exercise_to_out).collect(),
    }))
}

async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserOut>>> {
    let users = state.service.list_users()?;
    Ok(Json(users.into_iter().map(user_to_out).collect()))
}

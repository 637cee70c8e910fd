use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::PermissionTable;
use crate::errors::AppError;
use crate::gate::{self, GateConfig};
use crate::jwt::JwtConfig;
use crate::routes::{attendance, auth, courses, health, leaves, organizations, pages, results, staff, students};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub permissions: Arc<PermissionTable>,
    pub gate: Arc<GateConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, permissions: PermissionTable, gate: GateConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            permissions: Arc::new(permissions),
            gate: Arc::new(gate),
        }
    }
}

/// Builds the application from environment configuration.
pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let permissions = PermissionTable::from_env()?;
    let gate_config = GateConfig::from_env();

    Ok(build_router(AppState::new(pool, jwt_config, permissions, gate_config)))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let organization_routes = Router::new()
        .route("/", get(organizations::list_organizations).post(organizations::create_organization))
        .route("/:id", get(organizations::get_organization).delete(organizations::delete_organization));

    let staff_routes = Router::new()
        .route("/", get(staff::list_staff).post(staff::create_staff))
        .route("/:id", get(staff::get_staff).put(staff::update_staff).delete(staff::delete_staff));

    let student_routes = Router::new()
        .route("/", get(students::list_students).post(students::create_student))
        .route(
            "/:id",
            get(students::get_student).put(students::update_student).delete(students::delete_student),
        );

    let course_routes = Router::new()
        .route("/", get(courses::list_courses).post(courses::create_course))
        .route("/:id", axum::routing::delete(courses::delete_course));

    let leave_routes = Router::new()
        .route("/", get(leaves::list_leaves).post(leaves::create_leave))
        .route("/:id", put(leaves::review_leave));

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/organizations", organization_routes)
        .nest("/staff", staff_routes)
        .nest("/students", student_routes)
        .nest("/courses", course_routes)
        .route("/attendance", get(attendance::list_attendance).post(attendance::mark_attendance))
        .nest("/leaves", leave_routes)
        .route("/results", get(results::list_results).post(results::create_result));

    Router::new()
        .nest("/api", api)
        .merge(pages::routes())
        .layer(middleware::from_fn_with_state(state.clone(), gate::session_gate))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

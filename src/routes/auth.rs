use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Principal, Role};
use crate::db::conflict_on_unique;
use crate::errors::{AppError, AppResult};
use crate::gate::{cleared_session_cookie, session_cookie};
use crate::jwt::AuthUser;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, SignupRequest, User, USER_COLUMNS};
use crate::utils::{hash_password, normalize_email, required, utc_now, verify_password, DUMMY_PASSWORD_HASH};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

type WithCookie<T> = ([(axum::http::HeaderName, HeaderValue); 1], T);

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created; the session cookie is set for self-signups only", body = AuthResponse),
        (status = 403, description = "Role cannot be created by this caller"),
        (status = 404, description = "Organization not found"),
        (status = 409, description = "Email already in use")
    ),
    security((), ("bearerAuth" = []))
)]
pub async fn signup(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
    authorize_signup(caller.as_ref().map(|auth| &auth.principal), payload.role, payload.organization_id)?;

    let name = required("name", &payload.name)?;
    let email = normalize_email(&payload.email)?;
    ensure_organization_exists(&state.pool, payload.organization_id).await?;
    ensure_email_available(&state.pool, &email).await?;

    let password_hash = hash_password(&payload.password)?;
    let user_id = create_user(
        &state.pool,
        &name,
        &email,
        &password_hash,
        payload.role,
        Some(payload.organization_id),
    )
    .await?;

    let user: User = fetch_user_by_id(&state.pool, user_id).await?.try_into()?;
    let token = state.jwt.issue(&user.principal())?;

    // Provisioning by a signed-in admin must not replace the admin's own session.
    let mut headers = HeaderMap::new();
    if caller.is_none() {
        headers.insert(SET_COOKIE, session_cookie(&token, state.gate.secure_cookies)?);
    }

    tracing::info!(
        user_id = %user.id,
        role = %user.role,
        created_by = ?caller.as_ref().map(|auth| auth.user_id),
        "account created"
    );

    Ok((StatusCode::CREATED, headers, Json(AuthResponse { token, user })))
}

/// Anyone may sign up as a student. Staff accounts are created by an admin of
/// the same organization or the super admin; admin accounts by the super admin
/// only. Super admins come from the CLI.
pub fn authorize_signup(caller: Option<&Principal>, role: Role, organization_id: Uuid) -> AppResult<()> {
    let allowed = match role {
        Role::Student => true,
        Role::Staff => caller.is_some_and(|caller| {
            caller.is_super_admin() || (caller.role == Role::Admin && caller.can_reach(organization_id))
        }),
        Role::Admin => caller.is_some_and(Principal::is_super_admin),
        Role::SuperAdmin => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("{role} accounts cannot be created by this caller")))
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<WithCookie<Json<AuthResponse>>> {
    let email = normalize_email(&payload.email).map_err(|_| AppError::unauthorized("invalid credentials"))?;

    let db_user = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;

    let Some(db_user) = db_user else {
        // Same argon2 cost as a wrong password, so response time does not reveal the account.
        let _ = verify_password(&payload.password, DUMMY_PASSWORD_HASH);
        return Err(AppError::unauthorized("invalid credentials"));
    };

    if !verify_password(&payload.password, &db_user.password_hash)? {
        tracing::debug!(user_id = %db_user.id, "password mismatch");
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let user: User = db_user.try_into()?;
    let token = state.jwt.issue(&user.principal())?;
    let cookie = session_cookie(&token, state.gate.secure_cookies)?;

    Ok(([(SET_COOKIE, cookie)], Json(AuthResponse { token, user })))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let user: User = fetch_user_by_id(&state.pool, auth.user_id).await?.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session cookie cleared", body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>) -> AppResult<WithCookie<Json<MessageResponse>>> {
    let cookie = cleared_session_cookie(state.gate.secure_cookies)?;

    Ok((
        [(SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Inserts an account row and returns its id. Shared with the CLI bootstrap.
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    organization_id: Option<Uuid>,
) -> AppResult<Uuid> {
    if role != Role::SuperAdmin && organization_id.is_none() {
        return Err(AppError::bad_request("organization_id is required for this role"));
    }

    let now = utc_now();
    let user_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, organization_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(organization_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|err| conflict_on_unique(err, "email already in use"))?;

    Ok(user_id)
}

async fn ensure_email_available(pool: &SqlitePool, email: &str) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::conflict("email already in use"));
    }

    Ok(())
}

async fn ensure_organization_exists(pool: &SqlitePool, organization_id: Uuid) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM organizations WHERE id = ?")
        .bind(organization_id)
        .fetch_one(pool)
        .await?;

    if count == 0 {
        return Err(AppError::not_found("organization not found"));
    }

    Ok(())
}

async fn fetch_user_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

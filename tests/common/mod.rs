#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

use campus_gate::authz::{PermissionTable, Principal, Role};
use campus_gate::gate::GateConfig;
use campus_gate::jwt::JwtConfig;
use campus_gate::routes::auth::create_user;
use campus_gate::utils::hash_password;
use campus_gate::{build_router, AppState};

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub jwt: JwtConfig,
    _dir: TempDir,
}

pub async fn test_pool() -> Result<(SqlitePool, TempDir)> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("campus.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok((pool, dir))
}

pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(PermissionTable::standard()).await
}

pub async fn spawn_app_with(permissions: PermissionTable) -> Result<TestApp> {
    let (pool, dir) = test_pool().await?;
    let state = AppState::new(pool.clone(), JwtConfig::new(SECRET)?, permissions, GateConfig::default());

    Ok(TestApp {
        app: build_router(state),
        pool,
        jwt: JwtConfig::new(SECRET)?,
        _dir: dir,
    })
}

impl TestApp {
    pub async fn seed_org(&self, name: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        sqlx::query("INSERT INTO organizations (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Inserts an account and returns its principal with a signed session token.
    pub async fn seed_user(&self, email: &str, role: Role, organization_id: Option<Uuid>) -> Result<(Principal, String)> {
        let password_hash = hash_password(PASSWORD)?;
        let user_id = create_user(&self.pool, "Test User", email, &password_hash, role, organization_id).await?;

        let principal = Principal {
            user_id,
            email: email.to_string(),
            name: "Test User".to_string(),
            role,
            organization_id,
        };
        let token = self.jwt.issue(&principal)?;
        Ok((principal, token))
    }

    pub async fn send(&self, req: Request<Body>) -> Result<(StatusCode, HeaderMap, Value)> {
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok((status, headers, json))
    }
}

pub fn page(path: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("token={token}"));
    }
    Ok(builder.body(Body::empty())?)
}

pub fn api(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    Ok(builder.body(body)?)
}

pub fn location(headers: &HeaderMap) -> Option<&str> {
    headers.get("location").and_then(|value| value.to_str().ok())
}

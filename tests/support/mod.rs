#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::test::TestRequest;
use std::path::PathBuf;

use miti::AppState;
use miti::auth;
use miti::config::Config;
use miti::db;
use miti::models::{NewUser, Role, User};

pub const BOUNDARY: &str = "miti-test-boundary";

/// Fresh state over an in-memory database and per-test scratch directories.
pub async fn build_state() -> AppState {
    let root = scratch_dir();
    let config: Config = envy::from_iter(vec![
        ("SECRET_KEY".to_string(), "test-secret".to_string()),
        ("DATABASE_URL".to_string(), "sqlite::memory:".to_string()),
        ("BCRYPT_COST".to_string(), "4".to_string()),
        (
            "UPLOAD_DIR".to_string(),
            root.join("uploads").display().to_string(),
        ),
        (
            "STATIC_DIR".to_string(),
            root.join("static").display().to_string(),
        ),
    ])
    .expect("test config");

    let pool = db::connect(&config.database_url)
        .await
        .expect("connect memory db");
    db::init_schema(&pool).await.expect("schema");
    db::ensure_admin(&pool, &config).await.expect("admin bootstrap");
    AppState::new(pool, config)
}

pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("miti-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

pub async fn create_user(state: &AppState, username: &str, password: &str) -> User {
    let password_hash = bcrypt::hash(password, 4).expect("hash");
    db::create_user(
        &state.pool,
        &NewUser {
            username: username.to_string(),
            password_hash,
            email: Some(format!("{username}@example.com")),
            phone_number: None,
            is_subscribed: false,
            role: Role::User,
        },
    )
    .await
    .expect("create user")
}

pub async fn set_usage(state: &AppState, username: &str, usage: i64) {
    sqlx::query("UPDATE users SET usage_count = ? WHERE username = ?")
        .bind(usage)
        .bind(username)
        .execute(&state.pool)
        .await
        .expect("set usage");
}

pub async fn fetch(state: &AppState, username: &str) -> Option<User> {
    db::get_user_by_username(&state.pool, username)
        .await
        .expect("fetch user")
}

pub fn session_for(state: &AppState, username: &str) -> Cookie<'static> {
    auth::issue_session(&state.config, username).expect("session cookie")
}

/// Single-file multipart body under `field`.
pub fn multipart(field: &str, filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub fn upload_request(uri: &str, field: &str, filename: &str, bytes: &[u8]) -> TestRequest {
    let (content_type, body) = multipart(field, filename, bytes);
    TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

pub fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn has_cookie(resp: &actix_web::dev::ServiceResponse, name: &str) -> bool {
    resp.response()
        .cookies()
        .any(|c| c.name() == name && !c.value().is_empty())
}

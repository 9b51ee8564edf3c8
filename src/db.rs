// src/db.rs
use crate::config::{Config, DEFAULT_ADMIN_PASSWORD};
use crate::error::AppError;
use crate::models::{NewUser, Role, User};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const USER_COLUMNS: &str = "id, username, password_hash, email, phone_number, usage_count, \
     is_subscribed, custom_qr, role, created_at";

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool_options = if database_url.contains(":memory:") {
        // an in-memory database lives only as long as its single connection
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    pool_options.connect_with(options).await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email TEXT,
            phone_number TEXT,
            usage_count INTEGER NOT NULL DEFAULT 0,
            is_subscribed BOOLEAN NOT NULL DEFAULT 0,
            custom_qr TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<User, AppError> {
    let result = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password_hash, email, phone_number, is_subscribed, role) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(user.is_subscribed)
    .bind(user.role)
    .fetch_one(pool)
    .await;

    match result {
        Ok(created) => Ok(created),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::DuplicateUsername)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(pool)
        .await
}

/// Adds one trial use for a non-subscribed user. Returns the fresh record.
pub async fn increment_usage(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query(
        "UPDATE users SET usage_count = usage_count + 1 WHERE username = ? AND is_subscribed = 0",
    )
    .bind(username)
    .execute(pool)
    .await?;
    get_user_by_username(pool, username).await
}

pub async fn set_subscription(
    pool: &SqlitePool,
    id: i64,
    subscribed: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_subscribed = ? WHERE id = ?")
        .bind(subscribed)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_custom_qr(pool: &SqlitePool, id: i64, path: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET custom_qr = ? WHERE id = ?")
        .bind(path)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Creates the administrative account on first startup; later calls leave it untouched.
pub async fn ensure_admin(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    if config.admin_password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!(
            username = %config.admin_username,
            "admin account uses the default password, set ADMIN_PASSWORD"
        );
    }
    if get_user_by_username(pool, &config.admin_username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let password_hash = bcrypt::hash(&config.admin_password, config.bcrypt_cost)?;
    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO users (username, password_hash, email, phone_number, is_subscribed, role) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&config.admin_username)
    .bind(password_hash)
    .bind("admin@example.com")
    .bind("0000000000")
    .bind(true)
    .bind(Role::Admin)
    .execute(pool)
    .await?;
    if inserted.rows_affected() > 0 {
        tracing::info!(username = %config.admin_username, "admin account created");
    }
    Ok(())
}

// src/lib.rs
pub mod admin;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod converter;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod paywall;
pub mod qr;
pub mod spreadsheet;
pub mod upload;
pub mod views;

use actix_web::web;
use moka::future::Cache;
use sqlx::SqlitePool;

use crate::calendar::BsCalendar;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    /// Generated payment QR references, keyed by username.
    pub qr_cache: Cache<String, String>,
    pub calendar: BsCalendar,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config,
            qr_cache: Cache::new(1000),
            calendar: BsCalendar,
        }
    }
}

/// Mounts every route of the application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::init_routes)
        .configure(handlers::init_routes)
        .configure(admin::init_routes);
}

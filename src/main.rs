// src/main.rs
use actix_web::{App, HttpServer, middleware::Logger, web};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use miti::{AppState, config, db};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("miti=info,actix_web=info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    tracing::info!("Starting miti date converter");

    let config = config::Config::from_env().expect("Failed to load config from environment");
    std::fs::create_dir_all(&config.upload_dir)?;
    std::fs::create_dir_all(config.qr_dir())?;

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to open SQLite database");
    db::init_schema(&pool)
        .await
        .expect("Failed to create users table");
    db::ensure_admin(&pool, &config)
        .await
        .expect("Failed to bootstrap admin account");

    let bind = (config.host.clone(), config.port);
    let state = web::Data::new(AppState::new(pool, config));
    tracing::info!(host = %bind.0, port = bind.1, "listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(miti::configure)
    })
    .bind(bind)?
    .run()
    .await
}

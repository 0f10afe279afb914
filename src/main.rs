// src/main.rs
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{Compress, DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Module declarations
mod config;
mod db;
mod error;
mod handlers;
mod medication_handlers;
mod models;
mod monitoring;
mod repositories;
mod validator;

use config::{load_config, Config};
use error::ApiError;
use monitoring::{Metrics, RequestLogger};
use repositories::MedicationRepository;

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub medications: MedicationRepository,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            db_pool,
            config,
            medications: MedicationRepository::new(),
        }
    }
}

/// Route table shared by the server and the handler tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        .service(
            web::scope("/health")
                .route("", web::get().to(monitoring::health_check))
                .route("/ready", web::get().to(monitoring::readiness_check))
                .route("/metrics", web::get().to(monitoring::metrics_endpoint))
        )
        .route("/", web::get().to(handlers::get_dashboard))
        .route("/view", web::get().to(handlers::view_medications))
        .route("/alerts", web::get().to(handlers::get_alerts))
        .service(
            web::resource("/add")
                .route(web::get().to(medication_handlers::add_medication_form))
                .route(web::post().to(medication_handlers::add_medication))
        )
        .route("/delete/{id}", web::get().to(medication_handlers::delete_medication))
        .service(
            web::resource("/edit/{id}")
                .route(web::get().to(medication_handlers::edit_medication_form))
                .route(web::post().to(medication_handlers::edit_medication))
        );
}

fn form_config(limit: usize) -> web::FormConfig {
    web::FormConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

// ==================== MAIN ====================

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    db::setup_database(&config.database.url).await?;
    let pool = db::create_database_pool(&config.database)
        .await
        .context("Failed to open database pool")?;
    db::run_migrations(&pool).await?;

    let app_state = Arc::new(AppState::new(pool.clone(), config.clone()));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let metrics_arc = Arc::new(Metrics::new());
    let metrics = web::Data::from(metrics_arc.clone());

    let server_config = config.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(setup_cors(&server_config.security.allowed_origins))
            .wrap(setup_security_headers(&server_config.security))
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(RequestLogger::new(metrics_arc.clone()))
            .app_data(web::Data::new(app_state.clone()))
            .app_data(metrics.clone())
            .app_data(form_config(server_config.security.max_request_size))
            .configure(configure_routes)
    })
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)?
        .run()
        .await
        .context("Server failed to run")?;

    pool.close().await;
    log::info!("Server shut down");
    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        log::warn!("⚠️  Using wildcard CORS (*)");
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins.iter().filter(|o| !o.is_empty()) {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

fn setup_security_headers(config: &config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains"
        ));
    }

    headers
}

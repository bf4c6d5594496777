//! Vista server - Main entry point.
//!
//! Applies pending migrations, then starts the Actix-web server with
//! configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use vista_lib::api::{self, ApiDoc, UploadLimit};
use vista_lib::config::{self, Config};
use vista_lib::db::{DbPool, MigrationRunner, ProjectStore};
use vista_lib::middleware;
use vista_lib::services::{ProjectService, VideoAssetStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(config::log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be 'development' or 'production'");
            error!("  - VISTA_PORT and VISTA_MAX_UPLOAD_SIZE must be positive numbers");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Vista Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Initialize database (synchronous)
    let pool = match DbPool::open(&config.database_path) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Migrations must succeed before anything is served
    match MigrationRunner::new(&config.migrations_dir).apply(&pool) {
        Ok(applied) if applied.is_empty() => info!("Database schema is up to date"),
        Ok(applied) => info!("Applied {} migration(s): {}", applied.len(), applied.join(", ")),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            std::process::exit(1);
        }
    }

    let service = ProjectService::new(
        ProjectStore::new(pool.clone()),
        VideoAssetStore::new(&config.upload_dir),
    );
    info!("Storing uploads in {}", config.upload_dir.display());

    // Prepare shared state
    let bind_address = config.bind_address();
    let max_upload_size = config.max_upload_size;
    let cors_origin = config.cors_origin.clone();
    let is_development = config.is_development();
    let openapi = ApiDoc::openapi();

    info!("Upload limit: {}MB per request", max_upload_size / 1024 / 1024);

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // The UI dev server runs on its own origin
            Cors::default()
                .allowed_origin(&cors_origin)
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(UploadLimit(max_upload_size)))
            .app_data(web::PayloadConfig::new(max_upload_size))
            .configure(api::configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    });

    let result = server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await;

    info!("Server stopped, closing database");
    if let Err(e) = pool.close() {
        error!("Failed to close database: {}", e);
    }

    result
}

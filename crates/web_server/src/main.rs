//! Main entry point for the campground bookings API server.

mod config;

use std::sync::Arc;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::Context;
use auth_services::jwt::JwtService;
use auth_services::service::{AuthService, UserDirectory};
use bookings::{BookingService, CampgroundService, PgStore};
use postgres::database::*;
use web_handlers::{AuthSettings, api_scope};

use crate::config::ServerConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting campground bookings server...");

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    let pool = create_connection_pool(&config.database_url, config.max_connections)
        .await
        .context("failed to create database pool")?;
    log::info!("🗃️ Database pool created successfully");

    if let Err(e) = test_connection(&pool).await {
        log::error!("❌ Database connection test failed: {}", e);
    }

    if config.run_migrations {
        run_migrations(&pool)
            .await
            .context("failed to apply database migrations")?;
        log::info!("📦 Database migrations applied");
    }

    let store = Arc::new(PgStore::new(pool.clone()));
    let booking_service = BookingService::new(store.clone(), store.clone());
    let campground_service = CampgroundService::new(store);
    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expire_days);
    let users: Arc<dyn UserDirectory> = Arc::new(AuthService::new(pool.clone()));
    let auth_settings = AuthSettings {
        secure_cookies: config.production,
    };

    let (host, port) = config.bind_address();
    log::info!("🌐 Server will be available at: http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(campground_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_settings))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("Referrer-Policy", "no-referrer")),
            )
            .service(api_scope(&jwt_service, users.clone()))
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}

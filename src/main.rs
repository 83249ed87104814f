mod api;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");

    log::info!("🚀 Starting Charm Service...");
    log::info!("📊 Database: {}", database_url);

    // Diretório de uploads precisa existir antes do primeiro upload
    let uploads_dir = utils::upload::uploads_dir();
    std::fs::create_dir_all(&uploads_dir)?;
    log::info!("🖼️ Uploads directory: {}", uploads_dir);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed default supa account (first boot)
    seeds::admin_seed::seed_default_admin(&db).await;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000") // Frontend Web (Expo)
            .allowed_origin("http://localhost:8081")
            .allowed_origin("http://localhost:19006")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_origin("http://127.0.0.1:8081")
            .allowed_origin("http://127.0.0.1:19006")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .allowed_header("x-platform")
            .expose_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::CONTENT_DISPOSITION,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Fotos servidas estáticas (paths relativos gravados no banco)
            .service(actix_files::Files::new("/uploads", uploads_dir.clone()))
            .service(
                web::scope("/charm")
                    // ==================== PUBLIC ====================

                    // Auth
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/forgot-password", web::post().to(api::auth::forgot_password))
                    .route("/verify-otp", web::post().to(api::auth::verify_otp))
                    .route("/reset-password", web::post().to(api::auth::reset_password))

                    // Scan tracking: endpoint público do QR
                    .route("/track/{card_id}", web::post().to(api::scans::track_scan))

                    // Landing pública do cartão (o QR aponta pra cá)
                    .route("/cards/{card_id}/public", web::get().to(api::vcards::public_card))

                    // Formulários de contato (POST público, GET admin abaixo)
                    .route("/complain", web::post().to(api::contact::submit_complaint))
                    .route("/feedback", web::post().to(api::contact::submit_feedback))

                    // ==================== PROFILE ====================
                    .service(
                        web::scope("/profile")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::profile::get_profile))
                            .route("", web::put().to(api::profile::update_profile))
                            .route("", web::delete().to(api::profile::delete_account))
                            .route("/password", web::put().to(api::profile::change_password))
                            .route("/avatar", web::post().to(api::profile::upload_avatar))
                            .route("/avatar", web::delete().to(api::profile::remove_avatar))
                    )

                    // ==================== CARDS ====================
                    .service(
                        web::scope("/cards")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::post().to(api::vcards::create_card))
                            .route("", web::get().to(api::vcards::list_cards))
                            .route("/overview", web::get().to(api::vcards::cards_overview))
                            .route("/{card_id}/photo", web::post().to(api::vcards::upload_card_photo))
                            .route("/{card_id}/scans", web::get().to(api::vcards::card_scans))
                            // catch-all, DEVE FICAR POR ÚLTIMO
                            .route("/{card_id}", web::get().to(api::vcards::get_card))
                            .route("/{card_id}", web::put().to(api::vcards::update_card))
                            .route("/{card_id}", web::delete().to(api::vcards::delete_card))
                    )

                    // ==================== SCAN HISTORY ====================
                    .service(
                        web::scope("/scans")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::scans::my_scans))
                    )

                    // ==================== NOTIFICATIONS ====================
                    .service(
                        web::scope("/notifications")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::notifications::list_notifications))
                            .route("", web::delete().to(api::notifications::delete_all_notifications))
                            .route("/read-all", web::put().to(api::notifications::mark_all_read))
                            .route("/{id}/read", web::put().to(api::notifications::mark_read))
                            .route("/{id}", web::delete().to(api::notifications::delete_notification))
                    )

                    // ==================== ADMINISTRATION ====================
                    .service(
                        web::scope("/staff")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::admin::list_staff))
                            .route("", web::post().to(api::admin::create_staff))
                            .route("/{user_id}", web::delete().to(api::admin::delete_staff))
                    )
                    .service(
                        web::scope("/users")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::admin::list_users))
                            .route("/{user_id}", web::delete().to(api::admin::delete_user))
                    )
                    .service(
                        web::scope("/bills")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("/{user_id}", web::put().to(api::admin::update_bills))
                    )
                    .service(
                        web::scope("/complain")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::contact::list_complaints))
                    )
                    .service(
                        web::scope("/feedback")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::get().to(api::contact::list_feedback))
                    )
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}

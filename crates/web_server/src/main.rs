//! Main entry point for the CampMarket backend server.
//! This crate provides REST API endpoints and serves the frontend application.

use std::path::Path;
use std::sync::Arc;

use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, Result, middleware::Logger, web};

use auth_services::middleware::AuthMiddleware;
use booking_services::{BookingNotifier, EmailService, SmsService};
use notification_services::{NotificationService, create_verification_store};
use postgres::database::*;
use web_handlers::*;

mod cache;
mod delivery;
mod lifecycle_manager;
mod rate_limit;

use cache::{CacheMiddleware, ResponseCache};
use delivery::{MockEmailService, MockSmsService, SesEmailService, SnsSmsService};
use lifecycle_manager::LifecycleManager;
use rate_limit::{RateLimitConfig, RateLimitMiddleware, SimpleRateLimiter};

async fn api_hello() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Hello from the CampMarket backend!",
        "status": "running"
    })))
}

fn get_frontend_path() -> &'static str {
    // Check multiple possible locations for frontend files
    if Path::new("./frontend-build").exists() {
        log::info!("✅ Using Docker frontend path: ./frontend-build");
        "./frontend-build"
    } else if Path::new("../frontend/build").exists() {
        log::info!("✅ Using local frontend path: ../frontend/build");
        "../frontend/build"
    } else {
        log::info!("❌ Frontend files not found in either location");
        "./frontend-build" // fallback
    }
}

/// Picks the booking delivery channels: real AWS clients when
/// `NOTIFY_DELIVERY=aws`, logging mocks otherwise.
fn delivery_channels(
    notification_service: &NotificationService,
) -> (Arc<dyn EmailService>, Arc<dyn SmsService>) {
    let mode = std::env::var("NOTIFY_DELIVERY").unwrap_or_else(|_| "mock".to_string());

    if mode == "aws" {
        log::info!("📧 Booking notifications will be delivered via AWS SES/SNS");
        (
            Arc::new(SesEmailService::new(notification_service.clone())),
            Arc::new(SnsSmsService::new(notification_service.clone())),
        )
    } else {
        log::info!("📧 Booking notifications will be logged (mock delivery)");
        (Arc::new(MockEmailService), Arc::new(MockSmsService))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting CampMarket server...");

    // Create database connection pool
    let pool = match create_connection_pool().await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Make sure PostgreSQL is running and DATABASE_URL is set");
            std::process::exit(1);
        }
    };

    // Create notification service
    let notification_service = match NotificationService::new().await {
        Ok(service) => {
            log::info!("📧 Notification service initialized successfully");
            service
        }
        Err(e) => {
            log::error!("❌ Failed to initialize notification service: {}", e);
            log::warn!("🔧 Check AWS credentials and SES setup");
            std::process::exit(1);
        }
    };

    // Create verification store
    let verification_store = create_verification_store();

    // Booking notifier shared by the handlers and the lifecycle worker
    let (email_channel, sms_channel) = delivery_channels(&notification_service);
    let notifier = Arc::new(BookingNotifier::new(
        pool.clone(),
        Some(email_channel),
        Some(sms_channel),
    ));

    // Start the booking lifecycle worker
    let mut lifecycle_manager = LifecycleManager::new(pool.clone());
    lifecycle_manager.start(notifier.clone());

    // Shared middleware state
    let rate_limiter = SimpleRateLimiter::new(RateLimitConfig::from_env());
    let catalog_cache = ResponseCache::from_env();

    let frontend_path = get_frontend_path();
    log::info!("📁 Frontend files location: {}", frontend_path);
    log::info!("🌐 Server will be available at: http://0.0.0.0:8080");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(verification_store.clone()))
            .app_data(web::Data::from(notifier.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(RateLimitMiddleware::new(rate_limiter.clone()))
                    // Public routes
                    .route("/hello", web::get().to(api_hello))
                    .route("/dev/delete-user", web::delete().to(delete_user_by_email))
                    .service(
                        web::scope("/auth")
                            .route("/health", web::get().to(auth_health))
                            .route("/signup", web::post().to(signup))
                            .route("/login", web::post().to(login))
                            .route("/refresh", web::post().to(refresh)),
                    )
                    // Public catalog, served through the response cache
                    .service(
                        web::scope("/catalog")
                            .wrap(CacheMiddleware::new(catalog_cache.clone()))
                            .route("/resources", web::get().to(list_resources))
                            .route("/resources/{resource_id}", web::get().to(get_resource))
                            .route(
                                "/resources/{resource_id}/reviews",
                                web::get().to(list_resource_reviews),
                            ),
                    )
                    // Account routes (require authentication)
                    .service(
                        web::scope("/user")
                            .wrap(AuthMiddleware)
                            .route("/profile", web::get().to(get_profile))
                            .route("/profile/update", web::put().to(update_profile))
                            .route("/logout", web::post().to(logout))
                            .route(
                                "/verify/email/send",
                                web::post().to(send_email_verification),
                            )
                            .route("/verify/email", web::post().to(verify_email))
                            .route("/verify/sms/send", web::post().to(send_sms_verification))
                            .route("/verify/sms", web::post().to(verify_phone))
                            .route("/notifications", web::get().to(list_notifications))
                            .route(
                                "/notifications/{notification_id}/read",
                                web::post().to(mark_notification_read),
                            ),
                    )
                    // Booking routes (require authentication)
                    .service(
                        web::scope("/bookings")
                            .wrap(AuthMiddleware)
                            .route("", web::post().to(create_booking))
                            .route("", web::get().to(get_my_bookings))
                            .route("/checkout", web::post().to(checkout))
                            .route("/{booking_id}", web::get().to(get_booking))
                            .route("/{booking_id}/cancel", web::post().to(cancel_booking))
                            .route("/{booking_id}/pay", web::post().to(pay_booking))
                            .route("/{booking_id}/payment", web::get().to(get_booking_payment)),
                    )
                    // Review routes (require authentication)
                    .service(
                        web::scope("/resources")
                            .wrap(AuthMiddleware)
                            .route("/{resource_id}/reviews", web::post().to(create_review)),
                    )
                    // Admin routes (require authentication + admin role)
                    .service(
                        web::scope("/admin")
                            .wrap(AuthMiddleware)
                            .route("/resources", web::post().to(create_resource))
                            .route("/resources/{resource_id}", web::put().to(update_resource))
                            .route(
                                "/resources/{resource_id}",
                                web::delete().to(retire_resource),
                            )
                            .route("/bookings", web::get().to(list_all_bookings))
                            .route(
                                "/bookings/{booking_id}/approve",
                                web::post().to(approve_booking),
                            )
                            .route(
                                "/bookings/{booking_id}/reject",
                                web::post().to(reject_booking),
                            )
                            .route(
                                "/bookings/{booking_id}/complete",
                                web::post().to(complete_booking),
                            )
                            .route("/lifecycle/sweep", web::post().to(run_lifecycle_sweep))
                            .route("/dashboard", web::get().to(dashboard))
                            .route("/users", web::get().to(list_users)),
                    ),
            )
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
            .service(Files::new("/", frontend_path).index_file("index.html"))
    })
    .bind("0.0.0.0:8080")?
    .run();

    let result = server.await;

    lifecycle_manager.stop().await;

    result
}

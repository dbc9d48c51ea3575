use actix_web::{HttpResponse, Result, web};
use sqlx::{PgPool, Row};
use validator::Validate;

use auth_services::middleware::AdminUser;
use auth_services::types::AuthError;
use booking_services::{
    BookingError, BookingListQuery, BookingNotifier, BookingService, BookingStatus,
    LifecycleWorker, booking_from_row,
};
use catalog_services::{
    CatalogError, CatalogService, CreateResourceRequest, UpdateResourceRequest,
};
use notification_services::types::DeleteUserQuery;

/// Creates a new catalog resource (admin only)
pub async fn create_resource(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<CreateResourceRequest>,
) -> Result<HttpResponse, CatalogError> {
    request
        .validate()
        .map_err(|e| CatalogError::Validation(format!("Validation error: {}", e)))?;

    let catalog_service = CatalogService::new(pool.get_ref().clone());
    let resource = catalog_service.create_resource(&request).await?;

    Ok(HttpResponse::Created().json(resource))
}

/// Updates an existing catalog resource (admin only)
pub async fn update_resource(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<uuid::Uuid>,
    request: web::Json<UpdateResourceRequest>,
) -> Result<HttpResponse, CatalogError> {
    request
        .validate()
        .map_err(|e| CatalogError::Validation(format!("Validation error: {}", e)))?;

    let resource_id = path.into_inner();

    let catalog_service = CatalogService::new(pool.get_ref().clone());
    let resource = catalog_service.update_resource(&resource_id, &request).await?;

    Ok(HttpResponse::Ok().json(resource))
}

/// Retires a catalog resource so it stops accepting bookings (admin only)
pub async fn retire_resource(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, CatalogError> {
    let resource_id = path.into_inner();

    let catalog_service = CatalogService::new(pool.get_ref().clone());
    catalog_service.retire_resource(&resource_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Resource retired",
        "resource_id": resource_id
    })))
}

/// Lists bookings across all users with an optional status filter (admin only)
pub async fn list_all_bookings(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<BookingListQuery>,
) -> Result<HttpResponse, BookingError> {
    let booking_service = BookingService::new(pool.get_ref().clone());
    let response = booking_service.list_all(&query).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Approves a pending booking (admin only)
pub async fn approve_booking(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    _admin: AdminUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, BookingError> {
    let booking_id = path.into_inner();

    let booking_service = BookingService::new(pool.get_ref().clone());
    let booking = booking_service.approve(&booking_id).await?;

    if let Err(e) = notifier
        .notify_status_change(&booking, BookingStatus::Approved)
        .await
    {
        log::warn!("Failed to notify booking approval: {}", e);
    }

    Ok(HttpResponse::Ok().json(booking))
}

/// Rejects a pending booking (admin only)
pub async fn reject_booking(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    _admin: AdminUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, BookingError> {
    let booking_id = path.into_inner();

    let booking_service = BookingService::new(pool.get_ref().clone());
    let booking = booking_service.reject(&booking_id).await?;

    if let Err(e) = notifier
        .notify_status_change(&booking, BookingStatus::Rejected)
        .await
    {
        log::warn!("Failed to notify booking rejection: {}", e);
    }

    Ok(HttpResponse::Ok().json(booking))
}

/// Marks an approved booking completed without waiting for the worker (admin only)
pub async fn complete_booking(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    _admin: AdminUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, BookingError> {
    let booking_id = path.into_inner();

    let booking_service = BookingService::new(pool.get_ref().clone());
    let booking = booking_service.complete(&booking_id).await?;

    if let Err(e) = notifier
        .notify_status_change(&booking, BookingStatus::Completed)
        .await
    {
        log::warn!("Failed to notify booking completion: {}", e);
    }

    Ok(HttpResponse::Ok().json(booking))
}

/// Runs one lifecycle sweep immediately instead of waiting for the interval (admin only)
pub async fn run_lifecycle_sweep(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    _admin: AdminUser,
) -> Result<HttpResponse, BookingError> {
    let worker = LifecycleWorker::new(pool.get_ref().clone(), notifier.into_inner(), None);
    let stats = worker.sweep_once().await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// Aggregated marketplace numbers for the admin dashboard (admin only)
pub async fn dashboard(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<HttpResponse, BookingError> {
    let users_row = sqlx::query("SELECT COUNT(*) as total FROM users WHERE is_active = true")
        .fetch_one(pool.get_ref())
        .await?;

    let resources_row =
        sqlx::query("SELECT COUNT(*) as total FROM resources WHERE is_active = true")
            .fetch_one(pool.get_ref())
            .await?;

    let status_rows = sqlx::query("SELECT status, COUNT(*) as count FROM bookings GROUP BY status")
        .fetch_all(pool.get_ref())
        .await?;

    let mut bookings_by_status = serde_json::Map::new();
    for row in &status_rows {
        let status: String = row.get("status");
        let count: i64 = row.get("count");
        bookings_by_status.insert(status, serde_json::json!(count));
    }

    let revenue_row = sqlx::query(
        "SELECT COALESCE(SUM(amount_cents), 0) as revenue FROM payments WHERE status = 'settled'",
    )
    .fetch_one(pool.get_ref())
    .await?;

    let recent_rows = sqlx::query(
        r#"
        SELECT
            b.id, b.user_id, b.resource_id, b.check_in_date, b.check_out_date,
            b.quantity, b.unit_price_cents, b.total_price_cents, b.status,
            b.created_at, b.updated_at, r.name as resource_name, r.kind as resource_kind
        FROM bookings b
        JOIN resources r ON b.resource_id = r.id
        ORDER BY b.created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    let recent_bookings = recent_rows
        .iter()
        .map(booking_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "users": users_row.get::<i64, _>("total"),
        "active_resources": resources_row.get::<i64, _>("total"),
        "bookings_by_status": bookings_by_status,
        "settled_revenue_cents": revenue_row.get::<i64, _>("revenue"),
        "recent_bookings": recent_bookings
    })))
}

/// Lists users for the admin view
pub async fn list_users(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<HttpResponse, AuthError> {
    let rows = sqlx::query(
        "SELECT id, name, email, phone, role, email_verified, phone_verified, created_at FROM users ORDER BY created_at DESC"
    )
    .fetch_all(pool.get_ref())
    .await?;

    let users: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "id": row.get::<uuid::Uuid, _>("id"),
                "name": row.get::<String, _>("name"),
                "email": row.get::<String, _>("email"),
                "phone": row.get::<Option<String>, _>("phone"),
                "role": row.get::<String, _>("role"),
                "email_verified": row.get::<bool, _>("email_verified"),
                "phone_verified": row.get::<bool, _>("phone_verified"),
                "created_at": row.get::<chrono::DateTime<chrono::Utc>, _>("created_at")
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "users": users,
        "count": users.len()
    })))
}

/// Handles user deletion by email, deleting dependent rows first to avoid
/// foreign key constraints. Development tooling, not exposed in production.
pub async fn delete_user_by_email(
    pool: web::Data<PgPool>,
    query: web::Query<DeleteUserQuery>,
) -> Result<HttpResponse, AuthError> {
    let email = &query.email;

    log::warn!("🚨 DELETING USER WITH EMAIL: {}", email);

    // Delete dependent rows first (foreign key constraints)
    for table in ["user_sessions", "notifications", "payments", "reviews", "bookings"] {
        sqlx::query(&format!(
            "DELETE FROM {table} WHERE user_id IN (SELECT id FROM users WHERE email = $1)"
        ))
        .bind(email)
        .execute(pool.get_ref())
        .await?;
    }

    // Delete the user
    let result = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() > 0 {
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": format!("User with email {} deleted successfully", email),
            "deleted": true
        })))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": format!("No user found with email {}", email),
            "deleted": false
        })))
    }
}

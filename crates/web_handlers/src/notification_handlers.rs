use actix_web::{HttpResponse, Result, web};

use auth_services::middleware::AuthenticatedUser;
use booking_services::BookingNotifier;

/// Lists the authenticated user's in-app notifications
pub async fn list_notifications(
    notifier: web::Data<BookingNotifier>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let notifications = notifier
        .list_for_user(&user.0)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total": notifications.len(),
        "notifications": notifications
    })))
}

/// Marks one of the authenticated user's notifications as read
pub async fn mark_notification_read(
    notifier: web::Data<BookingNotifier>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse> {
    let notification_id = path.into_inner();

    let marked = notifier
        .mark_read(&user.0, &notification_id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if marked {
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Notification marked as read"
        })))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "notification_not_found",
            "message": "Notification not found or already read"
        })))
    }
}

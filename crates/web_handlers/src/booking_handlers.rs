use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use booking_services::{
    BookingError, BookingNotifier, BookingService, BookingStatus, CheckoutRequest,
    CreateBookingRequest, ListBookingsResponse, PaymentError, PaymentService,
};

/// Places a single booking for the authenticated user
pub async fn create_booking(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    user: AuthenticatedUser,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, BookingError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| BookingError::Validation(format!("Validation error: {}", e)))?;

    let booking_service = BookingService::new(pool.get_ref().clone());
    let booking = booking_service.create_booking(&user.0, &request).await?;

    // Record the placement notification; the booking stands even if this fails
    if let Err(e) = notifier
        .notify_status_change(&booking, BookingStatus::Pending)
        .await
    {
        log::warn!("Failed to notify booking placement: {}", e);
    }

    Ok(HttpResponse::Created().json(booking))
}

/// Places a cart of bookings atomically
pub async fn checkout(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    user: AuthenticatedUser,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, BookingError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| BookingError::Validation(format!("Validation error: {}", e)))?;

    let booking_service = BookingService::new(pool.get_ref().clone());
    let bookings = booking_service.checkout(&user.0, &request).await?;

    for booking in &bookings {
        if let Err(e) = notifier
            .notify_status_change(booking, BookingStatus::Pending)
            .await
        {
            log::warn!("Failed to notify booking placement: {}", e);
        }
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "total": bookings.len(),
        "bookings": bookings
    })))
}

/// Gets all bookings for the authenticated user
pub async fn get_my_bookings(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, BookingError> {
    let booking_service = BookingService::new(pool.get_ref().clone());
    let bookings = booking_service.get_user_bookings(&user.0).await?;

    let response = ListBookingsResponse {
        total: bookings.len() as i64,
        bookings,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Gets a specific booking owned by the authenticated user
pub async fn get_booking(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, BookingError> {
    let booking_id = path.into_inner();

    let booking_service = BookingService::new(pool.get_ref().clone());
    let booking = booking_service.get_booking(&booking_id, Some(&user.0)).await?;

    Ok(HttpResponse::Ok().json(booking))
}

/// Cancels one of the authenticated user's bookings
pub async fn cancel_booking(
    pool: web::Data<PgPool>,
    notifier: web::Data<BookingNotifier>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, BookingError> {
    let booking_id = path.into_inner();

    let booking_service = BookingService::new(pool.get_ref().clone());
    let booking = booking_service.cancel(&user.0, &booking_id).await?;

    if let Err(e) = notifier
        .notify_status_change(&booking, BookingStatus::Cancelled)
        .await
    {
        log::warn!("Failed to notify booking cancellation: {}", e);
    }

    Ok(HttpResponse::Ok().json(booking))
}

/// Settles payment for one of the authenticated user's bookings
pub async fn pay_booking(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, PaymentError> {
    let booking_id = path.into_inner();

    let payment_service = PaymentService::new(pool.get_ref().clone());
    let payment = payment_service.process_payment(&user.0, &booking_id).await?;

    Ok(HttpResponse::Created().json(payment))
}

/// Gets the payment recorded for one of the authenticated user's bookings
pub async fn get_booking_payment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, PaymentError> {
    let booking_id = path.into_inner();

    let payment_service = PaymentService::new(pool.get_ref().clone());
    let payment = payment_service
        .get_payment_for_booking(&user.0, &booking_id)
        .await?;

    Ok(HttpResponse::Ok().json(payment))
}

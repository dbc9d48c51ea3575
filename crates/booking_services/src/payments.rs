use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::BookingStatus;

/// A settled payment for a booking
#[derive(Debug, Serialize)]
pub struct Payment {
    /// Unique identifier for the payment
    pub id: Uuid,
    /// Booking the payment settles
    pub booking_id: Uuid,
    /// User who paid
    pub user_id: Uuid,
    /// Amount charged in cents
    pub amount_cents: i64,
    /// Settlement status reported by the gateway
    pub status: String,
    /// Reference returned by the (simulated) gateway
    pub transaction_ref: String,
    /// When the payment was recorded
    pub created_at: DateTime<Utc>,
}

/// Custom error type for payment operations
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Booking not found for this user
    #[error("Booking not found")]
    BookingNotFound,

    /// The booking is in a state that cannot be paid for
    #[error("Booking cannot be paid in its current state")]
    NotPayable,

    /// The booking already has a settled payment
    #[error("Booking is already paid")]
    AlreadySettled,

    /// No payment exists for the booking
    #[error("No payment found for booking")]
    PaymentNotFound,
}

impl actix_web::ResponseError for PaymentError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            PaymentError::BookingNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "booking_not_found",
                "message": "Booking not found"
            })),
            PaymentError::NotPayable => HttpResponse::Conflict().json(serde_json::json!({
                "error": "not_payable",
                "message": "Only pending or approved bookings can be paid"
            })),
            PaymentError::AlreadySettled => HttpResponse::Conflict().json(serde_json::json!({
                "error": "already_paid",
                "message": "This booking is already paid"
            })),
            PaymentError::PaymentNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "payment_not_found",
                "message": "No payment found for this booking"
            })),
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An internal error occurred"
            })),
        }
    }
}

/// Service for the simulated payment gateway.
///
/// There is no real card network behind this: settling a payment just records
/// the charge with a generated gateway reference, which is what the dashboards
/// and revenue aggregates read.
pub struct PaymentService {
    pool: PgPool,
}

impl PaymentService {
    /// Creates a new instance of `PaymentService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Settles payment for one of the user's bookings.
    /// Allowed while the booking is pending or approved; settles exactly once.
    pub async fn process_payment(
        &self,
        user_id: &Uuid,
        booking_id: &Uuid,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let booking = sqlx::query(
            r#"
            SELECT status, total_price_cents FROM bookings
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PaymentError::BookingNotFound)?;

        let status_raw: String = booking.get("status");
        let payable = matches!(
            BookingStatus::parse(&status_raw),
            Some(BookingStatus::Pending) | Some(BookingStatus::Approved)
        );
        if !payable {
            return Err(PaymentError::NotPayable);
        }

        let settled = sqlx::query(
            "SELECT id FROM payments WHERE booking_id = $1 AND status = 'settled'",
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        if settled.is_some() {
            return Err(PaymentError::AlreadySettled);
        }

        let amount_cents: i64 = booking.get("total_price_cents");
        let transaction_ref = generate_transaction_ref();

        let row = sqlx::query(
            r#"
            INSERT INTO payments (booking_id, user_id, amount_cents, status, transaction_ref)
            VALUES ($1, $2, $3, 'settled', $4)
            RETURNING id, created_at
            "#,
        )
        .bind(booking_id)
        .bind(user_id)
        .bind(amount_cents)
        .bind(&transaction_ref)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            amount_cents,
            "💳 Simulated gateway settled payment {}",
            transaction_ref
        );

        Ok(Payment {
            id: row.get("id"),
            booking_id: *booking_id,
            user_id: *user_id,
            amount_cents,
            status: "settled".to_string(),
            transaction_ref,
            created_at: row.get("created_at"),
        })
    }

    /// Gets the settled payment for one of the user's bookings
    pub async fn get_payment_for_booking(
        &self,
        user_id: &Uuid,
        booking_id: &Uuid,
    ) -> Result<Payment, PaymentError> {
        let row = sqlx::query(
            r#"
            SELECT id, booking_id, user_id, amount_cents, status, transaction_ref, created_at
            FROM payments
            WHERE booking_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PaymentError::PaymentNotFound)?;

        Ok(Payment {
            id: row.get("id"),
            booking_id: row.get("booking_id"),
            user_id: row.get("user_id"),
            amount_cents: row.get("amount_cents"),
            status: row.get("status"),
            transaction_ref: row.get("transaction_ref"),
            created_at: row.get("created_at"),
        })
    }
}

/// Generates a gateway-style transaction reference, e.g. `SIM-9F2KQ7X1BLM4`.
pub fn generate_transaction_ref() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let chars = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";

    let suffix: String = (0..12)
        .map(|_| chars[rng.random_range(0..chars.len())] as char)
        .collect();

    format!("SIM-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_refs_have_the_gateway_shape() {
        let reference = generate_transaction_ref();
        assert!(reference.starts_with("SIM-"));
        assert_eq!(reference.len(), 16);
        assert!(
            reference[4..]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() && !c.is_lowercase())
        );
    }

    #[test]
    fn transaction_refs_are_unique_enough() {
        let a = generate_transaction_ref();
        let b = generate_transaction_ref();
        assert_ne!(a, b);
    }
}

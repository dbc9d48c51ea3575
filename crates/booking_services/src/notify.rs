use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::{error, info};
use uuid::Uuid;

use crate::types::{BookingStatus, BookingWithResource};

/// Trait for email service implementations
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    /// Sends an email and returns the provider's message ID
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotifyError>;
}

/// Trait for SMS service implementations
#[async_trait::async_trait]
pub trait SmsService: Send + Sync {
    /// Sends an SMS and returns the provider's message ID
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotifyError>;
}

/// Errors raised while recording or delivering notifications
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Email provider error
    #[error("Email error: {0}")]
    Email(String),
    /// SMS provider error
    #[error("SMS error: {0}")]
    Sms(String),
}

/// User contact data and preferences loaded for delivery
#[derive(Debug, Deserialize)]
struct ContactPreferences {
    email: bool,
    sms: bool,
}

/// An in-app notification as returned to clients
#[derive(Debug, Serialize)]
pub struct Notification {
    /// Unique identifier for the notification
    pub id: Uuid,
    /// Booking the notification refers to, if any
    pub booking_id: Option<Uuid>,
    /// Machine-readable category, e.g. "booking_approved"
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// When the user marked the notification read
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Records booking notifications and fans them out over the channels the
/// user opted into. Delivery failures are logged, never bubbled up to the
/// request that triggered them.
pub struct BookingNotifier {
    pool: PgPool,
    email_service: Option<Arc<dyn EmailService>>,
    sms_service: Option<Arc<dyn SmsService>>,
}

impl BookingNotifier {
    /// Creates a new notifier. Either channel may be absent.
    pub fn new(
        pool: PgPool,
        email_service: Option<Arc<dyn EmailService>>,
        sms_service: Option<Arc<dyn SmsService>>,
    ) -> Self {
        Self {
            pool,
            email_service,
            sms_service,
        }
    }

    /// Records a status-change notification and delivers it per user preferences.
    pub async fn notify_status_change(
        &self,
        booking: &BookingWithResource,
        status: BookingStatus,
    ) -> Result<(), NotifyError> {
        let category = category_for(status);
        let (subject, message) = compose_status_message(booking, status);

        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, booking_id, category, message)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(booking.booking.user_id)
        .bind(booking.booking.id)
        .bind(category)
        .bind(&message)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT email, phone, notification_preferences FROM users WHERE id = $1",
        )
        .bind(booking.booking.user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(());
        };

        let email: String = row.get("email");
        let phone: Option<String> = row.get("phone");
        let preferences: ContactPreferences =
            serde_json::from_value(row.get("notification_preferences")).unwrap_or(
                ContactPreferences {
                    email: true,
                    sms: false,
                },
            );

        if preferences.email {
            if let Some(ref service) = self.email_service {
                match service.send_email(&email, &subject, &message).await {
                    Ok(message_id) => {
                        info!("📧 Booking email {} sent to {}", message_id, email);
                    }
                    Err(e) => error!("Failed to send booking email to {}: {}", email, e),
                }
            }
        }

        if preferences.sms {
            if let (Some(service), Some(phone)) = (&self.sms_service, phone) {
                match service.send_sms(&phone, &message).await {
                    Ok(message_id) => info!("📱 Booking SMS {} sent to {}", message_id, phone),
                    Err(e) => error!("Failed to send booking SMS to {}: {}", phone, e),
                }
            }
        }

        Ok(())
    }

    /// Lists the user's most recent notifications
    pub async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<Notification>, NotifyError> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, category, message, read_at, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Notification {
                id: row.get("id"),
                booking_id: row.get("booking_id"),
                category: row.get("category"),
                message: row.get("message"),
                read_at: row.get("read_at"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Marks one of the user's notifications read. Returns false when it does not exist.
    pub async fn mark_read(
        &self,
        user_id: &Uuid,
        notification_id: &Uuid,
    ) -> Result<bool, NotifyError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read_at = NOW()
            WHERE id = $1 AND user_id = $2 AND read_at IS NULL
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn category_for(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "booking_placed",
        BookingStatus::Approved => "booking_approved",
        BookingStatus::Rejected => "booking_rejected",
        BookingStatus::Cancelled => "booking_cancelled",
        BookingStatus::Completed => "booking_completed",
    }
}

/// Builds the subject and body for a booking status change.
pub fn compose_status_message(
    booking: &BookingWithResource,
    status: BookingStatus,
) -> (String, String) {
    let name = &booking.resource_name;
    let dates = format!(
        "{} to {}",
        booking.booking.check_in_date, booking.booking.check_out_date
    );
    let total = booking.booking.total_price_cents as f64 / 100.0;

    match status {
        BookingStatus::Pending => (
            format!("Booking request received for {}", name),
            format!(
                "We received your booking request for {} ({}). Total: ${:.2}. \
                 You'll hear from us once it is reviewed.",
                name, dates, total
            ),
        ),
        BookingStatus::Approved => (
            format!("Your booking for {} is confirmed!", name),
            format!(
                "Good news! Your booking for {} ({}) was approved. Total: ${:.2}.",
                name, dates, total
            ),
        ),
        BookingStatus::Rejected => (
            format!("Your booking for {} was declined", name),
            format!(
                "Unfortunately your booking for {} ({}) could not be accommodated.",
                name, dates
            ),
        ),
        BookingStatus::Cancelled => (
            format!("Your booking for {} was cancelled", name),
            format!("Your booking for {} ({}) has been cancelled.", name, dates),
        ),
        BookingStatus::Completed => (
            format!("Thanks for staying with {}!", name),
            format!(
                "Your booking for {} ({}) is complete. We'd love to hear how it went — \
                 leave a review!",
                name, dates
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Booking;
    use chrono::NaiveDate;

    struct MockEmailService;

    #[async_trait::async_trait]
    impl EmailService for MockEmailService {
        async fn send_email(
            &self,
            _to: &str,
            _subject: &str,
            _body: &str,
        ) -> Result<String, NotifyError> {
            Ok("mock-email-id".to_string())
        }
    }

    struct MockSmsService;

    #[async_trait::async_trait]
    impl SmsService for MockSmsService {
        async fn send_sms(&self, _to: &str, _message: &str) -> Result<String, NotifyError> {
            Ok("mock-sms-id".to_string())
        }
    }

    fn sample_booking(status: BookingStatus) -> BookingWithResource {
        BookingWithResource {
            booking: Booking {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                resource_id: Uuid::new_v4(),
                check_in_date: NaiveDate::from_ymd_opt(2026, 7, 3).unwrap(),
                check_out_date: NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
                quantity: 2,
                unit_price_cents: 4500,
                total_price_cents: 27_000,
                status,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            resource_name: "Eagle Ridge Campground".to_string(),
            resource_kind: "campsite".to_string(),
        }
    }

    #[test]
    fn approved_message_mentions_resource_and_total() {
        let booking = sample_booking(BookingStatus::Approved);
        let (subject, message) = compose_status_message(&booking, BookingStatus::Approved);

        assert!(subject.contains("Eagle Ridge Campground"));
        assert!(message.contains("2026-07-03 to 2026-07-06"));
        assert!(message.contains("$270.00"));
    }

    #[test]
    fn completed_message_asks_for_a_review() {
        let booking = sample_booking(BookingStatus::Completed);
        let (_, message) = compose_status_message(&booking, BookingStatus::Completed);
        assert!(message.contains("review"));
    }

    #[tokio::test]
    async fn mock_channels_report_provider_ids() {
        let email_id = MockEmailService
            .send_email("camper@example.com", "subject", "body")
            .await
            .unwrap();
        let sms_id = MockSmsService
            .send_sms("+15558675309", "message")
            .await
            .unwrap();

        assert_eq!(email_id, "mock-email-id");
        assert_eq!(sms_id, "mock-sms-id");
    }

    #[test]
    fn every_status_has_a_category() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Approved,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(category_for(status).starts_with("booking_"));
        }
    }
}

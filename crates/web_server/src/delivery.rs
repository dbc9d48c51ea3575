//! Delivery adapters plugging the AWS notification channels into the
//! booking notifier's service traits, plus mock channels for development.

use async_trait::async_trait;
use tracing::info;

use booking_services::{EmailService, NotifyError, SmsService};
use notification_services::NotificationService;

/// AWS SES email channel for booking notifications
pub struct SesEmailService {
    service: NotificationService,
}

impl SesEmailService {
    /// Wraps the shared notification service as a booking email channel
    pub fn new(service: NotificationService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EmailService for SesEmailService {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<String, NotifyError> {
        self.service
            .send_transactional_email(to, subject, body)
            .await
            .map_err(|e| NotifyError::Email(e.to_string()))
    }
}

/// AWS SNS SMS channel for booking notifications
pub struct SnsSmsService {
    service: NotificationService,
}

impl SnsSmsService {
    /// Wraps the shared notification service as a booking SMS channel
    pub fn new(service: NotificationService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SmsService for SnsSmsService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotifyError> {
        self.service
            .send_text_message(to, message)
            .await
            .map_err(|e| NotifyError::Sms(e.to_string()))
    }
}

/// Mock email service for development/testing
pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<String, NotifyError> {
        info!("📧 [MOCK EMAIL] To: {}", to);
        info!("📧 [MOCK EMAIL] Subject: {}", subject);
        info!("📧 [MOCK EMAIL] Body:\n{}", body);

        let mock_id = format!("mock-email-{}", uuid::Uuid::new_v4());
        Ok(mock_id)
    }
}

/// Mock SMS service for development/testing
pub struct MockSmsService;

#[async_trait]
impl SmsService for MockSmsService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotifyError> {
        info!("📱 [MOCK SMS] To: {}", to);
        info!("📱 [MOCK SMS] Message: {}", message);

        let mock_id = format!("mock-sms-{}", uuid::Uuid::new_v4());
        Ok(mock_id)
    }
}

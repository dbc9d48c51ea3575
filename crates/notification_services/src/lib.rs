//! # Notification Services
//!
//! This crate provides outbound notification channels for the CampMarket
//! application: transactional email over AWS SES, SMS over AWS SNS, and the
//! in-memory store for short-lived verification codes.

/// Service definitions for email and SMS delivery.
pub mod service;
/// Types and structures used in notification services.
pub mod types;

pub use service::{
    NotificationService, create_verification_store, store_verification_code, verify_code,
};
pub use types::{NotificationError, VerificationStore};

//! # Web Handlers for the CampMarket Web Application
//!
//! This crate provides the HTTP handlers for the CampMarket application.

/// Authentication handlers (signup, login, refresh, logout)
mod auth_handlers;
pub use auth_handlers::*;

/// User profile handlers (get/update profile)
mod profile_handlers;
pub use profile_handlers::*;

/// Email and SMS verification handlers
mod verification_handlers;
pub use verification_handlers::*;

/// Public catalog browsing handlers
mod catalog_handlers;
pub use catalog_handlers::*;

/// Booking and payment handlers
mod booking_handlers;
pub use booking_handlers::*;

/// Review handlers
mod review_handlers;
pub use review_handlers::*;

/// In-app notification handlers
mod notification_handlers;
pub use notification_handlers::*;

/// Admin and development handlers
mod admin_handlers;
pub use admin_handlers::*;

//! # Catalog Services
//!
//! This crate provides the resource catalog for the CampMarket application.
//! It handles campsites, guided activities, and rental equipment, along with
//! the reviews users leave on them.

/// Types for catalog resources and listings
mod types;
pub use types::*;

/// Service for catalog database operations
mod service;
pub use service::*;

/// Types and service for resource reviews
mod reviews;
pub use reviews::*;

//! # Booking Services
//!
//! This crate implements the reservation ledger at the heart of CampMarket.
//! Every bookable resource (campsite, activity, equipment) goes through the
//! same ledger: a date range, a quantity, a capacity check against other
//! demand-holding reservations, and a five-state status machine.

/// Types for bookings and the booking status machine
mod types;
pub use types::*;

/// Pure ledger core: overlap, concurrent-demand and price computation
mod ledger;
pub use ledger::*;

/// Service for booking database operations
mod service;
pub use service::*;

/// Simulated payment processing
mod payments;
pub use payments::*;

/// In-app notification records and delivery fan-out
mod notify;
pub use notify::*;

/// Background worker that completes and expires bookings
mod worker;
pub use worker::*;

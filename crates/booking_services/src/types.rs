use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The five states a booking can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created by the owner, awaiting an admin decision
    Pending,
    /// Accepted by an admin; holds capacity until completed or cancelled
    Approved,
    /// Declined by an admin, or expired by the lifecycle worker
    Rejected,
    /// Withdrawn by the owner
    Cancelled,
    /// The stay has ended
    Completed,
}

/// Who is asking for a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    /// The user who placed the booking
    Owner,
    /// An admin acting through the admin endpoints
    Admin,
    /// The background lifecycle worker
    System,
}

impl BookingStatus {
    /// Returns the database representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Parses the database representation back into a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Whether no further transitions are possible from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    /// Whether a booking in this state counts against resource capacity.
    /// Cancelled and rejected bookings release their demand.
    pub fn holds_demand(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Approved | BookingStatus::Completed
        )
    }

    /// Whether `actor` may move a booking from this state to `to`.
    ///
    /// The full transition table:
    /// pending -> approved (admin), pending -> rejected (admin or worker expiry),
    /// pending|approved -> cancelled (owner), approved -> completed (admin or worker).
    pub fn transition_allowed(&self, to: BookingStatus, actor: TransitionActor) -> bool {
        use BookingStatus::*;
        use TransitionActor::*;

        matches!(
            (self, to, actor),
            (Pending, Approved, Admin)
                | (Pending, Rejected, Admin)
                | (Pending, Rejected, System)
                | (Pending, Cancelled, Owner)
                | (Approved, Cancelled, Owner)
                | (Approved, Completed, Admin)
                | (Approved, Completed, System)
        )
    }
}

/// A booking as stored in the database
#[derive(Debug, Serialize)]
pub struct Booking {
    /// Unique identifier for the booking
    pub id: Uuid,
    /// User who placed the booking
    pub user_id: Uuid,
    /// Resource the booking is for
    pub resource_id: Uuid,
    /// First day of the stay or rental
    pub check_in_date: NaiveDate,
    /// Day the stay ends (exclusive for per-night pricing)
    pub check_out_date: NaiveDate,
    /// Units booked: pitches, rental items, or participants
    pub quantity: i32,
    /// Unit price captured at booking time, in cents
    pub unit_price_cents: i64,
    /// Computed total price in cents
    pub total_price_cents: i64,
    /// Current status
    pub status: BookingStatus,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with display fields from its resource
#[derive(Debug, Serialize)]
pub struct BookingWithResource {
    /// The booking itself
    #[serde(flatten)]
    pub booking: Booking,
    /// Display name of the booked resource
    pub resource_name: String,
    /// Kind of the booked resource
    pub resource_kind: String,
}

/// Request structure for placing a single booking
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// Resource to book
    pub resource_id: Uuid,

    /// First day of the stay or rental
    pub check_in_date: NaiveDate,

    /// Day the stay ends
    pub check_out_date: NaiveDate,

    /// Units booked: pitches, rental items, or participants
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100"))]
    pub quantity: i32,
}

/// Request structure for checking out a cart of bookings atomically
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Bookings to place; all succeed or none do
    #[validate(
        length(min = 1, max = 20, message = "Checkout requires between 1 and 20 items"),
        nested
    )]
    pub items: Vec<CreateBookingRequest>,
}

/// Query parameters for the admin booking listing
#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    /// Restrict results to one status
    pub status: Option<String>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Results per page
    pub per_page: Option<i64>,
}

/// Response structure for booking listings
#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    /// Bookings on this page
    pub bookings: Vec<BookingWithResource>,
    /// Total count of matching bookings
    pub total: i64,
}

/// Custom error type for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Booking not found
    #[error("Booking not found")]
    NotFound,

    /// The requested resource does not exist or is retired
    #[error("Resource not available")]
    ResourceUnavailable,

    /// Check-out must be after check-in
    #[error("Invalid date range: check-out date must be after check-in date")]
    InvalidDateRange,

    /// The requested dates would exceed the resource capacity
    #[error("Requested dates are no longer available")]
    CapacityExceeded,

    /// The requested status change is not allowed
    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition {
        /// Status the booking is currently in
        from: &'static str,
        /// Status the caller asked for
        to: &'static str,
    },

    /// A stored enum column held an unknown value
    #[error("Corrupt booking row: {0}")]
    CorruptRow(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for BookingError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            BookingError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "booking_not_found",
                "message": "Booking not found"
            })),
            BookingError::ResourceUnavailable => HttpResponse::NotFound().json(serde_json::json!({
                "error": "resource_unavailable",
                "message": "Resource does not exist or is no longer bookable"
            })),
            BookingError::InvalidDateRange => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_date_range",
                "message": "Check-out date must be after check-in date"
            })),
            BookingError::CapacityExceeded => HttpResponse::Conflict().json(serde_json::json!({
                "error": "capacity_exceeded",
                "message": "Requested dates are no longer available"
            })),
            BookingError::InvalidTransition { from, to } => {
                HttpResponse::Conflict().json(serde_json::json!({
                    "error": "invalid_transition",
                    "message": format!("Cannot move booking from {} to {}", from, to)
                }))
            }
            BookingError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An internal error occurred"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_decides_pending_bookings() {
        assert!(
            BookingStatus::Pending
                .transition_allowed(BookingStatus::Approved, TransitionActor::Admin)
        );
        assert!(
            BookingStatus::Pending
                .transition_allowed(BookingStatus::Rejected, TransitionActor::Admin)
        );
        assert!(
            !BookingStatus::Pending
                .transition_allowed(BookingStatus::Approved, TransitionActor::Owner)
        );
        assert!(
            !BookingStatus::Pending
                .transition_allowed(BookingStatus::Approved, TransitionActor::System)
        );
    }

    #[test]
    fn owner_cancels_pending_and_approved_only() {
        assert!(
            BookingStatus::Pending
                .transition_allowed(BookingStatus::Cancelled, TransitionActor::Owner)
        );
        assert!(
            BookingStatus::Approved
                .transition_allowed(BookingStatus::Cancelled, TransitionActor::Owner)
        );
        assert!(
            !BookingStatus::Completed
                .transition_allowed(BookingStatus::Cancelled, TransitionActor::Owner)
        );
        assert!(
            !BookingStatus::Rejected
                .transition_allowed(BookingStatus::Cancelled, TransitionActor::Owner)
        );
    }

    #[test]
    fn worker_expires_and_completes() {
        assert!(
            BookingStatus::Pending
                .transition_allowed(BookingStatus::Rejected, TransitionActor::System)
        );
        assert!(
            BookingStatus::Approved
                .transition_allowed(BookingStatus::Completed, TransitionActor::System)
        );
        assert!(
            !BookingStatus::Pending
                .transition_allowed(BookingStatus::Completed, TransitionActor::System)
        );
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(terminal.is_terminal());
            for to in [
                BookingStatus::Pending,
                BookingStatus::Approved,
                BookingStatus::Rejected,
                BookingStatus::Cancelled,
                BookingStatus::Completed,
            ] {
                for actor in [
                    TransitionActor::Owner,
                    TransitionActor::Admin,
                    TransitionActor::System,
                ] {
                    assert!(!terminal.transition_allowed(to, actor));
                }
            }
        }
    }

    #[test]
    fn demand_follows_the_invariant() {
        assert!(BookingStatus::Pending.holds_demand());
        assert!(BookingStatus::Approved.holds_demand());
        assert!(BookingStatus::Completed.holds_demand());
        assert!(!BookingStatus::Cancelled.holds_demand());
        assert!(!BookingStatus::Rejected.holds_demand());
    }

    #[test]
    fn status_round_trips_through_storage() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Approved,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("on-hold"), None);
    }
}

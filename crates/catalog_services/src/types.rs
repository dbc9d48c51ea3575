use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The kind of bookable resource offered on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A campsite or pitch at a campground
    Campsite,
    /// A guided outdoor activity (kayak tour, climbing course, ...)
    Activity,
    /// Rental equipment (tent, stove, canoe, ...)
    Equipment,
}

impl ResourceKind {
    /// Returns the database representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Campsite => "campsite",
            ResourceKind::Activity => "activity",
            ResourceKind::Equipment => "equipment",
        }
    }

    /// Parses the database representation back into a kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "campsite" => Some(ResourceKind::Campsite),
            "activity" => Some(ResourceKind::Activity),
            "equipment" => Some(ResourceKind::Equipment),
            _ => None,
        }
    }
}

/// How a resource's unit price is applied when computing a booking total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    /// Price applies per night of the stay (campsites)
    PerNight,
    /// Price applies per rental day, check-out day included (equipment)
    PerDay,
    /// Flat price per participant regardless of date range (activities)
    PerPerson,
}

impl PricingUnit {
    /// Returns the database representation of the pricing unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingUnit::PerNight => "per_night",
            PricingUnit::PerDay => "per_day",
            PricingUnit::PerPerson => "per_person",
        }
    }

    /// Parses the database representation back into a pricing unit.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "per_night" => Some(PricingUnit::PerNight),
            "per_day" => Some(PricingUnit::PerDay),
            "per_person" => Some(PricingUnit::PerPerson),
            _ => None,
        }
    }
}

/// A bookable resource as stored in the database
#[derive(Debug, Serialize)]
pub struct Resource {
    /// Unique identifier for the resource
    pub id: Uuid,
    /// Kind of resource
    pub kind: ResourceKind,
    /// Display name of the resource
    pub name: String,
    /// Longer description shown on the detail page
    pub description: String,
    /// Region or area the resource is located in
    pub region: String,
    /// How many units can be booked for the same dates
    pub capacity: i32,
    /// How the unit price is applied
    pub pricing_unit: PricingUnit,
    /// Price per unit in cents
    pub unit_price_cents: i64,
    /// Amenities or features, free-form tags
    pub amenities: Vec<String>,
    /// Whether the resource can currently be booked
    pub is_active: bool,
    /// When the resource was created
    pub created_at: DateTime<Utc>,
    /// When the resource was last updated
    pub updated_at: DateTime<Utc>,
}

/// Request structure for creating a catalog resource (admin only)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    /// Kind of resource
    pub kind: ResourceKind,

    /// Display name of the resource
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Longer description shown on the detail page
    #[validate(length(min = 1, max = 4000, message = "Description is required"))]
    pub description: String,

    /// Region or area the resource is located in
    #[validate(length(min = 1, max = 255, message = "Region is required"))]
    pub region: String,

    /// How many units can be booked for the same dates
    #[validate(range(min = 1, max = 10000, message = "Capacity must be at least 1"))]
    pub capacity: i32,

    /// How the unit price is applied
    pub pricing_unit: PricingUnit,

    /// Price per unit in cents
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub unit_price_cents: i64,

    /// Amenities or features, free-form tags
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Request structure for updating a catalog resource (admin only)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResourceRequest {
    /// Display name of the resource
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Longer description shown on the detail page
    #[validate(length(min = 1, max = 4000, message = "Description is required"))]
    pub description: String,

    /// Region or area the resource is located in
    #[validate(length(min = 1, max = 255, message = "Region is required"))]
    pub region: String,

    /// How many units can be booked for the same dates
    #[validate(range(min = 1, max = 10000, message = "Capacity must be at least 1"))]
    pub capacity: i32,

    /// How the unit price is applied
    pub pricing_unit: PricingUnit,

    /// Price per unit in cents
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub unit_price_cents: i64,

    /// Amenities or features, free-form tags
    #[serde(default)]
    pub amenities: Vec<String>,

    /// Whether the resource can currently be booked
    pub is_active: bool,
}

/// Query parameters accepted by the catalog listing endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ResourceFilter {
    /// Restrict results to one resource kind
    pub kind: Option<ResourceKind>,
    /// Restrict results to a region (exact, case-insensitive)
    pub region: Option<String>,
    /// Free-text search over name and description
    pub q: Option<String>,
    /// Minimum unit price in cents
    pub min_price_cents: Option<i64>,
    /// Maximum unit price in cents
    pub max_price_cents: Option<i64>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Results per page
    pub per_page: Option<i64>,
}

/// Aggregated review data shown with a resource
#[derive(Debug, Serialize)]
pub struct RatingSummary {
    /// Average rating across all reviews, if any exist
    pub average: Option<f64>,
    /// Number of reviews
    pub count: i64,
}

/// A resource together with its rating aggregate
#[derive(Debug, Serialize)]
pub struct ResourceDetail {
    /// The resource itself
    #[serde(flatten)]
    pub resource: Resource,
    /// Aggregated review data
    pub rating: RatingSummary,
}

/// Response structure for the catalog listing endpoint
#[derive(Debug, Serialize)]
pub struct ListResourcesResponse {
    /// Resources on this page
    pub resources: Vec<Resource>,
    /// Total number of matching resources
    pub total: i64,
    /// 1-based page number
    pub page: i64,
    /// Results per page
    pub per_page: i64,
}

/// Custom error type for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Resource not found")]
    NotFound,

    /// A stored enum column held an unknown value
    #[error("Corrupt catalog row: {0}")]
    CorruptRow(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for CatalogError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            CatalogError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "resource_not_found",
                "message": "Resource not found"
            })),
            CatalogError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
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

/// Default number of results per page
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Upper bound on results per page
pub const MAX_PER_PAGE: i64 = 100;

/// Clamps pagination parameters, returning `(page, per_page, offset)`.
/// `per_page` doubles as the SQL limit.
pub fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_pricing_unit_round_trip() {
        for kind in [
            ResourceKind::Campsite,
            ResourceKind::Activity,
            ResourceKind::Equipment,
        ] {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        for unit in [
            PricingUnit::PerNight,
            PricingUnit::PerDay,
            PricingUnit::PerPerson,
        ] {
            assert_eq!(PricingUnit::parse(unit.as_str()), Some(unit));
        }
        assert_eq!(ResourceKind::parse("yurt"), None);
    }

    #[test]
    fn page_bounds_defaults() {
        assert_eq!(page_bounds(None, None), (1, 20, 0));
    }

    #[test]
    fn page_bounds_clamps_out_of_range_values() {
        assert_eq!(page_bounds(Some(0), Some(500)), (1, MAX_PER_PAGE, 0));
        assert_eq!(page_bounds(Some(3), Some(10)), (3, 10, 20));
        assert_eq!(page_bounds(Some(-2), Some(0)), (1, 1, 0));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;
use validator::Validate;

/// Request structure for leaving a review on a resource
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    /// Star rating from 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    /// Free-form comment
    #[validate(length(max = 2000, message = "Comment is too long"))]
    #[serde(default)]
    pub comment: String,
}

/// A review as returned to clients
#[derive(Debug, Serialize)]
pub struct Review {
    /// Unique identifier for the review
    pub id: Uuid,
    /// Resource the review is about
    pub resource_id: Uuid,
    /// Display name of the reviewer
    pub author_name: String,
    /// Star rating from 1 to 5
    pub rating: i32,
    /// Free-form comment
    pub comment: String,
    /// When the review was created
    pub created_at: DateTime<Utc>,
}

/// Custom error type for review operations
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Resource not found")]
    ResourceNotFound,

    /// The user has no completed booking for this resource
    #[error("A completed booking is required before reviewing")]
    NotEligible,

    /// The user already reviewed this resource
    #[error("Resource already reviewed")]
    AlreadyReviewed,

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for ReviewError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            ReviewError::ResourceNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "resource_not_found",
                "message": "Resource not found"
            })),
            ReviewError::NotEligible => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "not_eligible",
                "message": "You can only review resources after a completed booking"
            })),
            ReviewError::AlreadyReviewed => HttpResponse::Conflict().json(serde_json::json!({
                "error": "already_reviewed",
                "message": "You have already reviewed this resource"
            })),
            ReviewError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
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

/// Service for review operations
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    /// Creates a new instance of `ReviewService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a review, enforcing the completed-booking and one-per-user rules
    pub async fn create_review(
        &self,
        user_id: &Uuid,
        resource_id: &Uuid,
        request: &CreateReviewRequest,
    ) -> Result<Review, ReviewError> {
        // The resource must exist and be visible
        let resource = sqlx::query("SELECT id FROM resources WHERE id = $1 AND is_active = true")
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;

        if resource.is_none() {
            return Err(ReviewError::ResourceNotFound);
        }

        // The reviewer must have completed a stay there
        let eligible = sqlx::query(
            r#"
            SELECT 1 as one FROM bookings
            WHERE user_id = $1 AND resource_id = $2 AND status = 'completed'
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;

        if eligible.is_none() {
            return Err(ReviewError::NotEligible);
        }

        // One review per user per resource
        let existing = sqlx::query("SELECT id FROM reviews WHERE user_id = $1 AND resource_id = $2")
            .bind(user_id)
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Err(ReviewError::AlreadyReviewed);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO reviews (resource_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(resource_id)
        .bind(user_id)
        .bind(request.rating)
        .bind(request.comment.trim())
        .fetch_one(&self.pool)
        .await?;

        let author_name = sqlx::query("SELECT name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|r| r.get("name"))
            .unwrap_or_else(|| "Anonymous".to_string());

        Ok(Review {
            id: row.get("id"),
            resource_id: *resource_id,
            author_name,
            rating: request.rating,
            comment: request.comment.trim().to_string(),
            created_at: row.get("created_at"),
        })
    }

    /// Lists the most recent reviews for a resource
    pub async fn list_for_resource(&self, resource_id: &Uuid) -> Result<Vec<Review>, ReviewError> {
        let rows = sqlx::query(
            r#"
            SELECT
                r.id, r.resource_id, r.rating, r.comment, r.created_at,
                COALESCE(u.name, 'Anonymous') as author_name
            FROM reviews r
            LEFT JOIN users u ON r.user_id = u.id
            WHERE r.resource_id = $1
            ORDER BY r.created_at DESC
            LIMIT 50
            "#,
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;

        let reviews = rows
            .into_iter()
            .map(|row| Review {
                id: row.get("id"),
                resource_id: row.get("resource_id"),
                author_name: row.get("author_name"),
                rating: row.get("rating"),
                comment: row.get("comment"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(reviews)
    }
}

use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use catalog_services::{CreateReviewRequest, ReviewError, ReviewService};

/// Creates a review for a resource the authenticated user has stayed at
pub async fn create_review(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ReviewError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| ReviewError::Validation(format!("Validation error: {}", e)))?;

    let resource_id = path.into_inner();

    let review_service = ReviewService::new(pool.get_ref().clone());
    let review = review_service
        .create_review(&user.0, &resource_id, &request)
        .await?;

    Ok(HttpResponse::Created().json(review))
}

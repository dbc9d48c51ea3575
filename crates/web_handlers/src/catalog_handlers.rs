use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;

use catalog_services::{CatalogError, CatalogService, ResourceFilter, ReviewError, ReviewService};

/// Lists active catalog resources with filtering and pagination
pub async fn list_resources(
    pool: web::Data<PgPool>,
    filter: web::Query<ResourceFilter>,
) -> Result<HttpResponse, CatalogError> {
    let catalog_service = CatalogService::new(pool.get_ref().clone());
    let response = catalog_service.list_resources(&filter).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Gets a single resource with its rating aggregate
pub async fn get_resource(
    pool: web::Data<PgPool>,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, CatalogError> {
    let resource_id = path.into_inner();

    let catalog_service = CatalogService::new(pool.get_ref().clone());
    let detail = catalog_service.get_resource_detail(&resource_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Lists the most recent reviews for a resource
pub async fn list_resource_reviews(
    pool: web::Data<PgPool>,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, ReviewError> {
    let resource_id = path.into_inner();

    let review_service = ReviewService::new(pool.get_ref().clone());
    let reviews = review_service.list_for_resource(&resource_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total": reviews.len(),
        "reviews": reviews
    })))
}

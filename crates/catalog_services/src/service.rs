use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::*;

const RESOURCE_COLUMNS: &str = r#"
    id, kind, name, description, region, capacity, pricing_unit,
    unit_price_cents, amenities, is_active, created_at, updated_at
"#;

/// Service for catalog resource operations
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    /// Creates a new instance of `CatalogService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new catalog resource
    pub async fn create_resource(
        &self,
        request: &CreateResourceRequest,
    ) -> Result<Resource, CatalogError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO resources (
                kind, name, description, region, capacity,
                pricing_unit, unit_price_cents, amenities
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(request.kind.as_str())
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.region.trim())
        .bind(request.capacity)
        .bind(request.pricing_unit.as_str())
        .bind(request.unit_price_cents)
        .bind(&request.amenities)
        .fetch_one(&self.pool)
        .await?;

        resource_from_row(&row)
    }

    /// Updates an existing catalog resource
    pub async fn update_resource(
        &self,
        resource_id: &Uuid,
        request: &UpdateResourceRequest,
    ) -> Result<Resource, CatalogError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE resources
            SET name = $1,
                description = $2,
                region = $3,
                capacity = $4,
                pricing_unit = $5,
                unit_price_cents = $6,
                amenities = $7,
                is_active = $8,
                updated_at = NOW()
            WHERE id = $9
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.region.trim())
        .bind(request.capacity)
        .bind(request.pricing_unit.as_str())
        .bind(request.unit_price_cents)
        .bind(&request.amenities)
        .bind(request.is_active)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CatalogError::NotFound)?;

        resource_from_row(&row)
    }

    /// Retires a resource so it no longer appears in listings or accepts bookings
    pub async fn retire_resource(&self, resource_id: &Uuid) -> Result<(), CatalogError> {
        let result =
            sqlx::query("UPDATE resources SET is_active = false, updated_at = NOW() WHERE id = $1")
                .bind(resource_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound);
        }

        Ok(())
    }

    /// Gets a single resource by ID, regardless of active status
    pub async fn get_resource(&self, resource_id: &Uuid) -> Result<Resource, CatalogError> {
        let row = sqlx::query(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CatalogError::NotFound)?;

        resource_from_row(&row)
    }

    /// Gets an active resource together with its rating aggregate
    pub async fn get_resource_detail(
        &self,
        resource_id: &Uuid,
    ) -> Result<ResourceDetail, CatalogError> {
        let resource = self.get_resource(resource_id).await?;
        if !resource.is_active {
            return Err(CatalogError::NotFound);
        }

        let row = sqlx::query(
            r#"
            SELECT AVG(rating)::float8 as average, COUNT(*) as count
            FROM reviews WHERE resource_id = $1
            "#,
        )
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await?;

        let rating = RatingSummary {
            average: row.get("average"),
            count: row.get("count"),
        };

        Ok(ResourceDetail { resource, rating })
    }

    /// Lists active resources matching the filter, newest first, with a total count
    pub async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<ListResourcesResponse, CatalogError> {
        let (page, per_page, offset) = page_bounds(filter.page, filter.per_page);

        let kind = filter.kind.map(|k| k.as_str());
        let region = filter.region.as_deref().map(str::trim);
        let q = filter.q.as_deref().map(str::trim);

        // Optional filters collapse to TRUE when the parameter is NULL
        const MATCH_CLAUSE: &str = r#"
            is_active = true
            AND ($1::text IS NULL OR kind = $1)
            AND ($2::text IS NULL OR LOWER(region) = LOWER($2))
            AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')
            AND ($4::bigint IS NULL OR unit_price_cents >= $4)
            AND ($5::bigint IS NULL OR unit_price_cents <= $5)
        "#;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS} FROM resources
            WHERE {MATCH_CLAUSE}
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(kind)
        .bind(region)
        .bind(q)
        .bind(filter.min_price_cents)
        .bind(filter.max_price_cents)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_row = sqlx::query(&format!(
            "SELECT COUNT(*) as total FROM resources WHERE {MATCH_CLAUSE}"
        ))
        .bind(kind)
        .bind(region)
        .bind(q)
        .bind(filter.min_price_cents)
        .bind(filter.max_price_cents)
        .fetch_one(&self.pool)
        .await?;

        let resources = rows
            .iter()
            .map(resource_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResourcesResponse {
            resources,
            total: total_row.get("total"),
            page,
            per_page,
        })
    }
}

pub(crate) fn resource_from_row(row: &PgRow) -> Result<Resource, CatalogError> {
    let kind_raw: String = row.get("kind");
    let unit_raw: String = row.get("pricing_unit");

    let kind = ResourceKind::parse(&kind_raw)
        .ok_or_else(|| CatalogError::CorruptRow(format!("unknown kind '{}'", kind_raw)))?;
    let pricing_unit = PricingUnit::parse(&unit_raw)
        .ok_or_else(|| CatalogError::CorruptRow(format!("unknown pricing unit '{}'", unit_raw)))?;

    Ok(Resource {
        id: row.get("id"),
        kind,
        name: row.get("name"),
        description: row.get("description"),
        region: row.get("region"),
        capacity: row.get("capacity"),
        pricing_unit,
        unit_price_cents: row.get("unit_price_cents"),
        amenities: row.get("amenities"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use catalog_services::{PricingUnit, page_bounds};

use crate::ledger::{HeldRange, capacity_exceeded, compute_total_cents};
use crate::types::*;

const BOOKING_COLUMNS: &str = r#"
    b.id, b.user_id, b.resource_id, b.check_in_date, b.check_out_date,
    b.quantity, b.unit_price_cents, b.total_price_cents, b.status,
    b.created_at, b.updated_at, r.name as resource_name, r.kind as resource_kind
"#;

/// Statuses that count against capacity. Must match `BookingStatus::holds_demand`.
const DEMAND_STATUSES: &str = "('pending', 'approved', 'completed')";

/// Service implementing the reservation ledger over the bookings table
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    /// Creates a new instance of `BookingService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Places a single booking, running the capacity check inside a transaction
    pub async fn create_booking(
        &self,
        user_id: &Uuid,
        request: &CreateBookingRequest,
    ) -> Result<BookingWithResource, BookingError> {
        let mut tx = self.pool.begin().await?;
        let booking = create_in_tx(&mut tx, user_id, request).await?;
        tx.commit().await?;

        Ok(booking)
    }

    /// Places a cart of bookings atomically: a conflict on any item aborts all of them
    pub async fn checkout(
        &self,
        user_id: &Uuid,
        request: &CheckoutRequest,
    ) -> Result<Vec<BookingWithResource>, BookingError> {
        let mut tx = self.pool.begin().await?;

        let mut bookings = Vec::with_capacity(request.items.len());
        for item in &request.items {
            bookings.push(create_in_tx(&mut tx, user_id, item).await?);
        }

        tx.commit().await?;
        Ok(bookings)
    }

    /// Gets all bookings for a user, newest first
    pub async fn get_user_bookings(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<BookingWithResource>, BookingError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            JOIN resources r ON b.resource_id = r.id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    /// Gets a single booking. When `owner` is given, the booking must belong to them.
    pub async fn get_booking(
        &self,
        booking_id: &Uuid,
        owner: Option<&Uuid>,
    ) -> Result<BookingWithResource, BookingError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            JOIN resources r ON b.resource_id = r.id
            WHERE b.id = $1 AND ($2::uuid IS NULL OR b.user_id = $2)
            "#
        ))
        .bind(booking_id)
        .bind(owner.copied())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BookingError::NotFound)?;

        booking_from_row(&row)
    }

    /// Lists bookings across all users for the admin view, with an optional status filter
    pub async fn list_all(
        &self,
        query: &BookingListQuery,
    ) -> Result<ListBookingsResponse, BookingError> {
        let status = match query.status.as_deref() {
            Some(raw) => Some(
                BookingStatus::parse(raw)
                    .ok_or_else(|| {
                        BookingError::Validation(format!("Unknown status '{}'", raw))
                    })?
                    .as_str(),
            ),
            None => None,
        };

        let (_, per_page, offset) = page_bounds(query.page, query.per_page);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            JOIN resources r ON b.resource_id = r.id
            WHERE ($1::text IS NULL OR b.status = $1)
            ORDER BY b.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_row =
            sqlx::query("SELECT COUNT(*) as total FROM bookings WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        let bookings = rows
            .iter()
            .map(booking_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListBookingsResponse {
            bookings,
            total: total_row.get("total"),
        })
    }

    /// Admin approval of a pending booking
    pub async fn approve(&self, booking_id: &Uuid) -> Result<BookingWithResource, BookingError> {
        self.apply_transition(booking_id, BookingStatus::Approved, TransitionActor::Admin, None)
            .await
    }

    /// Admin rejection of a pending booking
    pub async fn reject(&self, booking_id: &Uuid) -> Result<BookingWithResource, BookingError> {
        self.apply_transition(booking_id, BookingStatus::Rejected, TransitionActor::Admin, None)
            .await
    }

    /// Owner cancellation of a pending or approved booking
    pub async fn cancel(
        &self,
        user_id: &Uuid,
        booking_id: &Uuid,
    ) -> Result<BookingWithResource, BookingError> {
        self.apply_transition(
            booking_id,
            BookingStatus::Cancelled,
            TransitionActor::Owner,
            Some(user_id),
        )
        .await
    }

    /// Marks an approved booking completed on behalf of an admin
    pub async fn complete(&self, booking_id: &Uuid) -> Result<BookingWithResource, BookingError> {
        self.apply_transition(
            booking_id,
            BookingStatus::Completed,
            TransitionActor::Admin,
            None,
        )
        .await
    }

    /// Loads a booking under a row lock, checks the status machine, and applies
    /// the transition. `owner` restricts the operation to the booking's owner.
    async fn apply_transition(
        &self,
        booking_id: &Uuid,
        to: BookingStatus,
        actor: TransitionActor,
        owner: Option<&Uuid>,
    ) -> Result<BookingWithResource, BookingError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            JOIN resources r ON b.resource_id = r.id
            WHERE b.id = $1 AND ($2::uuid IS NULL OR b.user_id = $2)
            FOR UPDATE OF b
            "#
        ))
        .bind(booking_id)
        .bind(owner.copied())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BookingError::NotFound)?;

        let mut booking = booking_from_row(&row)?;

        if !booking.booking.status.transition_allowed(to, actor) {
            return Err(BookingError::InvalidTransition {
                from: booking.booking.status.as_str(),
                to: to.as_str(),
            });
        }

        let updated = sqlx::query(
            "UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING updated_at",
        )
        .bind(to.as_str())
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        booking.booking.status = to;
        booking.booking.updated_at = updated.get("updated_at");
        Ok(booking)
    }
}

/// Creates one booking inside an open transaction. The resource row is locked
/// first so concurrent capacity checks for the same resource serialize.
async fn create_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &Uuid,
    request: &CreateBookingRequest,
) -> Result<BookingWithResource, BookingError> {
    let resource = sqlx::query(
        r#"
        SELECT id, kind, name, capacity, pricing_unit, unit_price_cents
        FROM resources
        WHERE id = $1 AND is_active = true
        FOR UPDATE
        "#,
    )
    .bind(request.resource_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BookingError::ResourceUnavailable)?;

    let capacity: i32 = resource.get("capacity");
    let unit_price_cents: i64 = resource.get("unit_price_cents");
    let unit_raw: String = resource.get("pricing_unit");
    let pricing_unit = PricingUnit::parse(&unit_raw)
        .ok_or_else(|| BookingError::CorruptRow(format!("unknown pricing unit '{}'", unit_raw)))?;

    // Rejects reversed/empty ranges before anything else
    let total_price_cents = compute_total_cents(
        unit_price_cents,
        pricing_unit,
        request.check_in_date,
        request.check_out_date,
        request.quantity,
    )?;

    let held = fetch_overlapping_holds(
        tx,
        &request.resource_id,
        request.check_in_date,
        request.check_out_date,
    )
    .await?;

    if capacity_exceeded(
        &held,
        request.check_in_date,
        request.check_out_date,
        request.quantity,
        capacity,
    ) {
        return Err(BookingError::CapacityExceeded);
    }

    let row = sqlx::query(
        r#"
        INSERT INTO bookings (
            user_id, resource_id, check_in_date, check_out_date,
            quantity, unit_price_cents, total_price_cents
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, status, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(request.resource_id)
    .bind(request.check_in_date)
    .bind(request.check_out_date)
    .bind(request.quantity)
    .bind(unit_price_cents)
    .bind(total_price_cents)
    .fetch_one(&mut **tx)
    .await?;

    let status_raw: String = row.get("status");
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| BookingError::CorruptRow(format!("unknown status '{}'", status_raw)))?;

    Ok(BookingWithResource {
        booking: Booking {
            id: row.get("id"),
            user_id: *user_id,
            resource_id: request.resource_id,
            check_in_date: request.check_in_date,
            check_out_date: request.check_out_date,
            quantity: request.quantity,
            unit_price_cents,
            total_price_cents,
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        resource_name: resource.get("name"),
        resource_kind: resource.get("kind"),
    })
}

async fn fetch_overlapping_holds(
    tx: &mut Transaction<'_, Postgres>,
    resource_id: &Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Vec<HeldRange>, BookingError> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT check_in_date, check_out_date, quantity
        FROM bookings
        WHERE resource_id = $1
          AND status IN {DEMAND_STATUSES}
          AND check_in_date < $3
          AND check_out_date > $2
        "#
    ))
    .bind(resource_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| HeldRange {
            check_in: row.get("check_in_date"),
            check_out: row.get("check_out_date"),
            quantity: row.get("quantity"),
        })
        .collect())
}

/// Maps a joined booking row (with `resource_name`/`resource_kind` aliases)
/// into a `BookingWithResource`.
pub fn booking_from_row(row: &PgRow) -> Result<BookingWithResource, BookingError> {
    let status_raw: String = row.get("status");
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| BookingError::CorruptRow(format!("unknown status '{}'", status_raw)))?;

    Ok(BookingWithResource {
        booking: Booking {
            id: row.get("id"),
            user_id: row.get("user_id"),
            resource_id: row.get("resource_id"),
            check_in_date: row.get("check_in_date"),
            check_out_date: row.get("check_out_date"),
            quantity: row.get("quantity"),
            unit_price_cents: row.get("unit_price_cents"),
            total_price_cents: row.get("total_price_cents"),
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        resource_name: row.get("resource_name"),
        resource_kind: row.get("resource_kind"),
    })
}

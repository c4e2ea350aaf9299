use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::booking_types::{
    Booking, BookingDetails, BookingScope, CampgroundSummary, NewBooking, UpdateBookingRequest,
};
use crate::campground_types::{Campground, CreateCampgroundRequest, UpdateCampgroundRequest};
use crate::store::{BookingStore, CampgroundStore, InsertOutcome, StoreError};

const BOOKING_DETAILS_SELECT: &str = r#"
    SELECT
        b.id, b.book_date, b.user_id, b.campground_id, b.created_at,
        c.name AS campground_name, c.address AS campground_address, c.tel AS campground_tel
    FROM bookings b
    JOIN campgrounds c ON c.id = b.campground_id
"#;

/// PostgreSQL-backed booking and campground store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new instance of `PgStore` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_bookings(&self, scope: &BookingScope) -> Result<Vec<BookingDetails>, StoreError> {
        let query = format!(
            r#"{BOOKING_DETAILS_SELECT}
            WHERE ($1::uuid IS NULL OR b.user_id = $1)
              AND ($2::uuid IS NULL OR b.id = $2)
              AND ($3::uuid IS NULL OR b.campground_id = $3)
            ORDER BY b.created_at DESC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(scope.owner)
            .bind(scope.booking_id)
            .bind(scope.campground_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(booking_details_from_row).collect()
    }

    async fn find_booking(&self, id: &Uuid) -> Result<Option<BookingDetails>, StoreError> {
        let query = format!("{BOOKING_DETAILS_SELECT} WHERE b.id = $1");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(booking_details_from_row).transpose()
    }

    async fn insert_booking(
        &self,
        booking: &NewBooking,
        limit: Option<usize>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Locking the owner's row serializes admissions for that owner until commit
        let owner = sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(booking.user)
            .fetch_optional(&mut *tx)
            .await?;

        if owner.is_none() {
            return Err(StoreError::UnknownUser(booking.user));
        }

        if let Some(limit) = limit {
            let held: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
                .bind(booking.user)
                .fetch_one(&mut *tx)
                .await?;
            let held = usize::try_from(held).unwrap_or(0);

            if held >= limit {
                tx.rollback().await?;
                return Ok(InsertOutcome::QuotaReached { held });
            }
        }

        let row = sqlx::query(
            r#"
            INSERT INTO bookings (id, book_date, user_id, campground_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, book_date, user_id, campground_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.book_date)
        .bind(booking.user)
        .bind(booking.campground)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await?;

        Ok(InsertOutcome::Created(booking_from_row(&row)?))
    }

    async fn update_booking(
        &self,
        id: &Uuid,
        changes: &UpdateBookingRequest,
    ) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET book_date = COALESCE($1, book_date),
                campground_id = COALESCE($2, campground_id)
            WHERE id = $3
            RETURNING id, book_date, user_id, campground_id, created_at
            "#,
        )
        .bind(changes.book_date)
        .bind(changes.campground)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn delete_booking(&self, id: &Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CampgroundStore for PgStore {
    async fn list_campgrounds(&self) -> Result<Vec<Campground>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, address, tel, created_at FROM campgrounds ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(campground_from_row).collect()
    }

    async fn find_campground(&self, id: &Uuid) -> Result<Option<Campground>, StoreError> {
        let row =
            sqlx::query("SELECT id, name, address, tel, created_at FROM campgrounds WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(campground_from_row).transpose()
    }

    async fn insert_campground(
        &self,
        request: &CreateCampgroundRequest,
    ) -> Result<Campground, StoreError> {
        let name = request.name.trim();

        let row = sqlx::query(
            r#"
            INSERT INTO campgrounds (id, name, address, tel)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, address, tel, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(request.address.trim())
        .bind(request.tel.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_name_or(e, name))?;

        campground_from_row(&row)
    }

    async fn update_campground(
        &self,
        id: &Uuid,
        changes: &UpdateCampgroundRequest,
    ) -> Result<Option<Campground>, StoreError> {
        let name = changes.name.as_deref().map(str::trim);

        let row = sqlx::query(
            r#"
            UPDATE campgrounds
            SET name = COALESCE($1, name),
                address = COALESCE($2, address),
                tel = COALESCE($3, tel)
            WHERE id = $4
            RETURNING id, name, address, tel, created_at
            "#,
        )
        .bind(name)
        .bind(changes.address.as_deref().map(str::trim))
        .bind(changes.tel.as_deref().map(str::trim))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_name_or(e, name.unwrap_or_default()))?;

        row.as_ref().map(campground_from_row).transpose()
    }

    async fn delete_campground(&self, id: &Uuid) -> Result<bool, StoreError> {
        // Bookings go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM campgrounds WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn classify(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::MissingReference,
        _ => StoreError::Database(e),
    }
}

fn duplicate_name_or(e: sqlx::Error, name: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateName(name.to_string())
        }
        _ => StoreError::Database(e),
    }
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    Ok(Booking {
        id: row.try_get("id")?,
        book_date: row.try_get("book_date")?,
        user: row.try_get("user_id")?,
        campground: row.try_get("campground_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn booking_details_from_row(row: &PgRow) -> Result<BookingDetails, StoreError> {
    Ok(BookingDetails {
        id: row.try_get("id")?,
        book_date: row.try_get("book_date")?,
        user: row.try_get("user_id")?,
        campground: CampgroundSummary {
            id: row.try_get("campground_id")?,
            name: row.try_get("campground_name")?,
            address: row.try_get("campground_address")?,
            tel: row.try_get("campground_tel")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn campground_from_row(row: &PgRow) -> Result<Campground, StoreError> {
    Ok(Campground {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        tel: row.try_get("tel")?,
        created_at: row.try_get("created_at")?,
    })
}

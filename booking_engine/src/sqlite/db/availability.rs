use chrono::{Days, NaiveDate};
use log::{debug, warn};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{AvailabilityRecord, AvailabilityStatus},
    helpers::{date_range, days_inclusive},
    traits::BookingError,
};

// Keeps each bulk insert well below SQLite's bound-parameter limit.
const INSERT_CHUNK_SIZE: usize = 500;

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), BookingError> {
    if end < start {
        return Err(BookingError::InvalidState(format!("The date range {start} to {end} ends before it starts")));
    }
    Ok(())
}

pub async fn has_calendar(resource_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM availability WHERE resource_id = $1")
        .bind(resource_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Creates the resource's calendar. Call inside a transaction: the existence check and the inserts must be atomic.
pub async fn bulk_initialize(
    resource_id: i64,
    from: NaiveDate,
    horizon_days: u32,
    conn: &mut SqliteConnection,
) -> Result<u64, BookingError> {
    if horizon_days == 0 {
        return Err(BookingError::InvalidState("The availability horizon must be at least one day".into()));
    }
    if has_calendar(resource_id, conn).await? {
        return Err(BookingError::InvalidState(format!(
            "Resource {resource_id} already has an availability calendar"
        )));
    }
    let end = from
        .checked_add_days(Days::new(u64::from(horizon_days) - 1))
        .ok_or_else(|| BookingError::InvalidState(format!("A {horizon_days} day horizon overflows the calendar")))?;
    let days = date_range(from, end).collect::<Vec<NaiveDate>>();
    let mut inserted = 0;
    for chunk in days.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO availability (resource_id, date, status) ");
        builder.push_values(chunk, |mut row, day| {
            row.push_bind(resource_id).push_bind(*day).push_bind(AvailabilityStatus::Available);
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    debug!("📅️ Created {inserted} availability records for resource {resource_id}, from {from} to {end}");
    Ok(inserted)
}

pub async fn fetch_range(
    resource_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<AvailabilityRecord>, BookingError> {
    check_range(start, end)?;
    let records = sqlx::query_as(
        "SELECT * FROM availability WHERE resource_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date ASC",
    )
    .bind(resource_id)
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;
    Ok(records)
}

/// Books every day in the range for `order_id`. Either all days are booked, or none are.
pub async fn reserve(
    resource_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, BookingError> {
    let records = fetch_range(resource_id, start, end, conn).await?;
    let expected = days_inclusive(start, end);
    if i64::try_from(records.len()).unwrap_or(i64::MAX) != expected {
        return Err(BookingError::Conflict(format!(
            "Resource {resource_id} has no availability calendar for some days between {start} and {end}"
        )));
    }
    let blocked = records
        .iter()
        .filter(|r| match r.status {
            AvailabilityStatus::Available => false,
            AvailabilityStatus::Booked => r.order_id != Some(order_id),
            AvailabilityStatus::Maintenance => true,
        })
        .map(|r| r.date.to_string())
        .collect::<Vec<String>>();
    if !blocked.is_empty() {
        return Err(BookingError::Conflict(format!(
            "Resource {resource_id} is not available on {}",
            blocked.join(", ")
        )));
    }
    let result = sqlx::query(
        r#"
            UPDATE availability SET status = 'booked', order_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE resource_id = $2 AND date BETWEEN $3 AND $4 AND status = 'available'
        "#,
    )
    .bind(order_id)
    .bind(resource_id)
    .bind(start)
    .bind(end)
    .execute(conn)
    .await?;
    debug!("📅️ Resource {resource_id} reserved for order #{order_id} from {start} to {end}");
    Ok(result.rows_affected())
}

/// Marks every day in the range as available, whatever its status.
pub async fn release(
    resource_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<u64, BookingError> {
    check_range(start, end)?;
    let result = sqlx::query(
        r#"
            UPDATE availability SET status = 'available', order_id = NULL, updated_at = CURRENT_TIMESTAMP
            WHERE resource_id = $1 AND date BETWEEN $2 AND $3
        "#,
    )
    .bind(resource_id)
    .bind(start)
    .bind(end)
    .execute(conn)
    .await?;
    debug!("📅️ Released {} days for resource {resource_id} from {start} to {end}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Releases only the days in the range that are held by `order_id`. Used when an order is annulled, so that days
/// taken by another order (or put under maintenance since) are never freed by mistake.
pub async fn release_for_order(
    resource_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, BookingError> {
    check_range(start, end)?;
    let result = sqlx::query(
        r#"
            UPDATE availability SET status = 'available', order_id = NULL, updated_at = CURRENT_TIMESTAMP
            WHERE resource_id = $1 AND date BETWEEN $2 AND $3 AND order_id = $4
        "#,
    )
    .bind(resource_id)
    .bind(start)
    .bind(end)
    .bind(order_id)
    .execute(conn)
    .await?;
    let released = result.rows_affected();
    if released == 0 {
        warn!("📅️ Order #{order_id} held no days on resource {resource_id} between {start} and {end}");
    } else {
        debug!("📅️ Order #{order_id} released {released} days on resource {resource_id}");
    }
    Ok(released)
}

/// Takes the available days in the range out of service. Returns the number of days changed, and the dates that
/// could not be changed because they are booked.
pub async fn set_maintenance(
    resource_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<(u64, Vec<NaiveDate>), BookingError> {
    check_range(start, end)?;
    let result = sqlx::query(
        r#"
            UPDATE availability SET status = 'maintenance', order_id = NULL, updated_at = CURRENT_TIMESTAMP
            WHERE resource_id = $1 AND date BETWEEN $2 AND $3 AND status = 'available'
        "#,
    )
    .bind(resource_id)
    .bind(start)
    .bind(end)
    .execute(&mut *conn)
    .await?;
    let booked: Vec<NaiveDate> = sqlx::query_scalar(
        "SELECT date FROM availability WHERE resource_id = $1 AND date BETWEEN $2 AND $3 AND status = 'booked' ORDER \
         BY date",
    )
    .bind(resource_id)
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;
    Ok((result.rows_affected(), booked))
}

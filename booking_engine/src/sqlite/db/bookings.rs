use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{Booking, NewBooking, PaymentStatus};

pub async fn insert_booking(
    order_id: i64,
    booking: &NewBooking,
    conn: &mut SqliteConnection,
) -> Result<Booking, sqlx::Error> {
    let booking: Booking = sqlx::query_as(
        r#"
            INSERT INTO bookings (order_id, bookable_type, bookable_id, start_date, end_date, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(booking.bookable.kind)
    .bind(booking.bookable.id)
    .bind(booking.start_date)
    .bind(booking.end_date)
    .bind(Json(&booking.details))
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Booking #{} for {} saved against order #{order_id}", booking.id, booking.bookable);
    Ok(booking)
}

pub async fn fetch_booking_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// The SQL counterpart of [`Booking::cancel`].
pub async fn cancel_booking(
    order_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE bookings SET status = 'cancelled', payment_status = 'unpaid', updated_at = $1
            WHERE order_id = $2
            RETURNING *;
        "#,
    )
    .bind(now)
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// The SQL counterpart of [`Booking::mark_paid`].
pub async fn update_payment_status(
    order_id: i64,
    status: PaymentStatus,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as("UPDATE bookings SET payment_status = $1, updated_at = $2 WHERE order_id = $3 RETURNING *")
        .bind(status)
        .bind(now)
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

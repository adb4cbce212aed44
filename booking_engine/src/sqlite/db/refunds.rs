use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{RefundRequest, RefundStatus},
    sqlite::db::is_unique_violation,
    traits::BookingError,
};

pub async fn insert_refund_request(
    order_id: i64,
    user_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<RefundRequest, BookingError> {
    let result = sqlx::query_as::<_, RefundRequest>(
        "INSERT INTO refund_requests (order_id, user_id, reason) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(order_id)
    .bind(user_id)
    .bind(reason)
    .fetch_one(conn)
    .await;
    match result {
        Ok(request) => {
            debug!("🗃️ Refund request #{} created for order #{order_id}", request.id);
            Ok(request)
        },
        Err(e) if is_unique_violation(&e) => Err(BookingError::InvalidState(format!(
            "Order #{order_id} already has an open or approved refund request"
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_refund_request(id: i64, conn: &mut SqliteConnection) -> Result<Option<RefundRequest>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM refund_requests WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_refund_requests_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<RefundRequest>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM refund_requests WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// Moves a `pending` request to `status`. Returns `None` if the request was not pending, in which case nothing
/// changed.
pub async fn decide_if_pending(
    id: i64,
    status: RefundStatus,
    reversal_reference: Option<&str>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<RefundRequest>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE refund_requests SET status = $1, reversal_reference = $2, decided_at = $3
            WHERE id = $4 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(reversal_reference)
    .bind(now)
    .bind(id)
    .fetch_optional(conn)
    .await
}

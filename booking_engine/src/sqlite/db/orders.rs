use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderNumber, OrderStatusType, Rupiah},
    sqlite::db::is_unique_violation,
    traits::BookingError,
};

fn status_list(statuses: &[OrderStatusType]) -> String {
    statuses.iter().map(|s| format!("'{}'", s.as_str())).collect::<Vec<String>>().join(",")
}

/// Inserts a new order and its items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, BookingError> {
    if fetch_order_by_number(&order.order_number, conn).await?.is_some() {
        return Err(BookingError::OrderAlreadyExists(order.order_number.clone()));
    }
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                subtotal,
                discount_amount,
                total_amount,
                payment_deadline
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.subtotal())
    .bind(order.discount_amount)
    .bind(order.total())
    .bind(order.payment_deadline)
    .fetch_one(&mut *conn)
    .await;
    let saved: Order = match result {
        Ok(o) => o,
        Err(e) if is_unique_violation(&e) => return Err(BookingError::OrderAlreadyExists(order.order_number.clone())),
        Err(e) => return Err(e.into()),
    };
    for item in &order.items {
        insert_order_item(saved.id, item, conn).await?;
    }
    debug!("🗃️ Order {} inserted with id {} and {} items", saved.order_number, saved.id, order.items.len());
    Ok(saved)
}

async fn insert_order_item(
    order_id: i64,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, bookable_type, bookable_id, description, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.item.kind)
    .bind(item.item.id)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(conn)
    .await
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(order_number).fetch_optional(conn).await
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Takes the database write lock and returns the current state of the order.
///
/// This must be the first statement of every transaction that changes an order's status. SQLite only has one writer,
/// so starting with a write (rather than a read that is later upgraded) makes concurrent transitions queue up behind
/// each other instead of failing with `SQLITE_BUSY`.
pub async fn lock_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET updated_at = updated_at WHERE order_number = $1 RETURNING *")
        .bind(order_number)
        .fetch_optional(conn)
        .await
}

/// See [`lock_order_by_number`].
pub async fn lock_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET updated_at = updated_at WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Moves the order to `status`, but only if its current status is one of `from`.
///
/// Returns `None` if the precondition failed, in which case nothing was changed.
pub async fn update_status_if(
    id: i64,
    status: OrderStatusType,
    from: &[OrderStatusType],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status IN ({}) RETURNING *",
        status_list(from)
    );
    trace!("🗃️ Executing query: {sql}");
    let order: Option<Order> = sqlx::query_as(&sql).bind(status).bind(now).bind(id).fetch_optional(conn).await?;
    if order.is_none() {
        debug!("🗃️ Order #{id} was not in any of [{}]. It was not moved to {status}", status_list(from));
    }
    Ok(order)
}

/// Records a new cumulative paid amount and the matching status, on the condition that the order can still accept
/// payments.
pub async fn apply_payment(
    id: i64,
    paid_amount: Rupiah,
    status: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let from = [OrderStatusType::Pending, OrderStatusType::Processing, OrderStatusType::PartiallyPaid];
    let sql = format!(
        "UPDATE orders SET paid_amount = $1, status = $2, updated_at = $3 WHERE id = $4 AND status IN ({}) RETURNING *",
        status_list(&from)
    );
    sqlx::query_as(&sql).bind(paid_amount).bind(status).bind(now).bind(id).fetch_optional(conn).await
}

/// Orders that are still awaiting payment, and whose payment deadline is at or before `now`. The oldest deadlines
/// come first.
pub async fn fetch_expirable_orders(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM orders WHERE status IN ({}) AND julianday(payment_deadline) <= julianday($1) ORDER BY \
         payment_deadline ASC, id ASC",
        status_list(&OrderStatusType::AWAITING_PAYMENT)
    );
    let orders: Vec<Order> = sqlx::query_as(&sql).bind(now).fetch_all(conn).await?;
    trace!("🗃️ {} orders are past their payment deadline", orders.len());
    Ok(orders)
}

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{PaymentTransaction, Rupiah, TransactionStatus},
    traits::{InsertTransactionResult, ReversalReceipt, SettlementEvent},
};

/// Stores a gateway event against the order. The (order, transaction code, status) triple is unique, so a replayed
/// event returns `AlreadyExists` and leaves the table untouched.
pub async fn idempotent_insert(
    order_id: i64,
    event: &SettlementEvent,
    conn: &mut SqliteConnection,
) -> Result<InsertTransactionResult, sqlx::Error> {
    let record = NewTransactionRecord {
        transaction_code: &event.transaction_code,
        status: event.status,
        gross_amount: event.gross_amount,
        payment_type: &event.payment_type,
        raw_payload: &event.raw_payload,
        created_at: event.received_at,
    };
    insert_record(order_id, record, conn).await
}

/// Stores the `refund` record for a reversal that this service initiated. When the gateway later reports the same
/// refund, it is recognised as a replay.
pub async fn insert_reversal_record(
    order_id: i64,
    receipt: &ReversalReceipt,
    payment_type: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<InsertTransactionResult, sqlx::Error> {
    let raw_payload = serde_json::json!({
        "transaction_id": receipt.transaction_code,
        "transaction_status": TransactionStatus::Refund.as_str(),
        "refund_reference": receipt.reference,
        "refund_amount": receipt.amount,
    });
    let record = NewTransactionRecord {
        transaction_code: &receipt.transaction_code,
        status: TransactionStatus::Refund,
        gross_amount: receipt.amount,
        payment_type,
        raw_payload: &raw_payload,
        created_at: now,
    };
    insert_record(order_id, record, conn).await
}

struct NewTransactionRecord<'a> {
    transaction_code: &'a str,
    status: TransactionStatus,
    gross_amount: Rupiah,
    payment_type: &'a str,
    raw_payload: &'a Value,
    created_at: DateTime<Utc>,
}

async fn insert_record(
    order_id: i64,
    record: NewTransactionRecord<'_>,
    conn: &mut SqliteConnection,
) -> Result<InsertTransactionResult, sqlx::Error> {
    let txn: Option<PaymentTransaction> = sqlx::query_as(
        r#"
            INSERT INTO transactions (order_id, transaction_code, status, gross_amount, payment_type, raw_payload,
                created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (order_id, transaction_code, status) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(record.transaction_code)
    .bind(record.status)
    .bind(record.gross_amount)
    .bind(record.payment_type)
    .bind(Json(record.raw_payload))
    .bind(record.created_at)
    .fetch_optional(conn)
    .await?;
    Ok(match txn {
        Some(t) => {
            debug!("🗃️ Transaction {} [{}] stored as record #{}", t.transaction_code, t.status, t.id);
            InsertTransactionResult::Inserted(t)
        },
        None => InsertTransactionResult::AlreadyExists,
    })
}

pub async fn fetch_transactions_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// The most recent success-class transaction for the order.
pub async fn fetch_settled_transaction(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM transactions
            WHERE order_id = $1 AND status IN ('settlement', 'capture')
            ORDER BY id DESC
            LIMIT 1;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// True if another success-class record (other than `exclude_id`) already exists for the transaction code. Gateways
/// may report `capture` and then `settlement` for the same payment; the funds are only credited once.
pub async fn is_already_credited(
    order_id: i64,
    transaction_code: &str,
    exclude_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
            SELECT COUNT(*) FROM transactions
            WHERE order_id = $1 AND transaction_code = $2 AND status IN ('settlement', 'capture') AND id <> $3;
        "#,
    )
    .bind(order_id)
    .bind(transaction_code)
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}
